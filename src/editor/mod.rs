//! Editor module for markdeck
//!
//! This module contains the editor handle, its document model and change
//! notifications, and the table of contents model.

pub mod document;
pub mod events;
mod handle;
pub mod outline;

pub use document::{EditorDocument, EditorNode, NodeKind};
pub use events::{EditorEvent, Subscription};
pub use handle::{Editor, Transaction};
pub use outline::TocEntry;
