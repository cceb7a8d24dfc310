//! Document viewer facade

mod navigation;
mod rendering;
mod text;
mod viewer;

pub use viewer::{DocumentSlot, DocumentViewer};
