//! Markdown processing
//!
//! comrak parses markdown into a flat token stream that named core rules
//! (block, inline, task lists, heading anchors, table of contents) rewrite in
//! order before a [`renderer::HtmlRenderer`] turns it into HTML. Rendered HTML can be
//! read back into an editor document through the node recognizers.
//!
//! # Example
//! ```ignore
//! use crate::markdown::{MarkdownPipeline, TaskListPlugin};
//!
//! let mut pipeline = MarkdownPipeline::default();
//! pipeline.use_plugin(TaskListPlugin::default())?;
//! let html = pipeline.render("- [x] buy milk\n- [ ] walk dog");
//! let doc = document_from_markup(&parse_markup(&html));
//! ```

pub mod markup;
pub mod nodes;
pub mod parser;
pub mod pipeline;
pub mod renderer;
pub mod task_list;
pub mod toc;
pub mod token;

pub use markup::parse_markup;
pub use nodes::document_from_markup;
pub use parser::MarkdownOptions;
pub use pipeline::MarkdownPipeline;
pub use task_list::{toggle_task_at_line, TaskListOptions, TaskListPlugin};
