//! Document Export Module for markdeck
//!
//! Standalone HTML documents with inlined light or dark CSS.

pub mod html;

pub use html::export_to_html_file;
