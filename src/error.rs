use crate::document::LoadFault;

/// Errors surfaced by [`crate::DocumentViewer`]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ViewerError {
    #[error("no document is open")]
    NoDocument,

    #[error("page {page} is outside the visible range")]
    PageNotVisible { page: usize },

    #[error("failed to load document: {0}")]
    Load(#[from] LoadFault),
}

pub type Result<T, E = ViewerError> = std::result::Result<T, E>;
