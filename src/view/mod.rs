//! Page layout, scrolling, rendering and selection geometry

pub mod cache;
pub mod canvas;
pub mod events;
pub mod highlight;
pub mod layout;
pub mod render;
pub mod selection;
pub mod state;
pub mod text_rects;
pub mod transform;
pub mod types;
pub mod viewport;
pub mod zoom;

pub use cache::PageCache;
pub use canvas::{Canvas, PixelRect};
pub use events::{EventQueue, ViewerEvent};
pub use highlight::{HighlightEntry, HighlightStore};
pub use layout::{
    Alignment, HorizontalAlignment, LayoutEngine, LayoutInput, LayoutMode, LayoutOutcome,
    LayoutParams, VerticalAlignment,
};
pub use render::{PageRenderStatus, PaintReport, PaintTarget, RenderScheduler};
pub use selection::{CharPosition, SelectionSpan, TextSelection};
pub use state::{Command, Effect, ViewState};
pub use text_rects::Glyph;
pub use transform::{DeviceMapping, PageGeometry, PageRotation, Rotation};
pub use types::*;
pub use viewport::{ScrollDirection, ViewportState};
pub use zoom::{EchoGuard, EchoSuppressor, SizingPolicy, Zoom};
