//! UI components for markdeck
//!
//! The rendered preview and the table of contents side panel.

mod preview;
mod toc_panel;

pub use preview::{MarkdownPreview, PreviewColors};
pub use toc_panel::TocPanel;
