//! File operations module for markdeck
//!
//! Native open, save and export dialogs.

pub mod dialogs;
