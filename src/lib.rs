//! Paginated document viewing core: page layout, scrolling, progressive
//! rendering, text selection and highlights.

pub mod document;
pub mod error;
pub mod panic_handler;
pub mod settings;
pub mod view;
pub mod widget;

pub use document::{DocumentChange, DocumentEngine, EngineFault, FixtureDocument, LoadFault};
pub use error::ViewerError;
pub use widget::page_view::{DocumentSlot, DocumentViewer};
