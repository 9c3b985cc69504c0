//! Editor handle
//!
//! The [`Editor`] owns the markdown source and everything derived from it:
//! token stream, rendered HTML and the editor document. Changes go through
//! [`Editor::dispatch`], which rebuilds the derived state and notifies
//! listeners.

use log::{debug, warn};

use super::document::{EditorDocument, EditorNode};
use super::events::{EditorEvent, EventBus, ListenerId, Subscription, TransactionEvent};
use super::outline::{nest_headings, TocEntry};
use crate::error::Result;
use crate::markdown::token::Token;
use crate::markdown::{
    document_from_markup, parse_markup, toc, toggle_task_at_line, MarkdownOptions,
    MarkdownPipeline, TaskListOptions, TaskListPlugin,
};

/// A change to apply to the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Transaction {
    /// Replace the whole markdown source
    SetContent(String),
    /// Flip the task item on a 0-based source line
    ToggleTask { line: usize },
    /// Change task list options and re-render
    Reconfigure(TaskListOptions),
}

/// Markdown editor state with change notifications.
#[derive(Debug)]
pub struct Editor {
    source: String,
    markdown_options: MarkdownOptions,
    task_options: TaskListOptions,
    pipeline: MarkdownPipeline,
    tokens: Vec<Token>,
    html: String,
    document: EditorDocument,
    version: u64,
    events: EventBus,
}

fn build_pipeline(
    markdown_options: &MarkdownOptions,
    task_options: TaskListOptions,
) -> Result<MarkdownPipeline> {
    let mut pipeline = MarkdownPipeline::new(markdown_options.clone());
    pipeline.use_plugin(TaskListPlugin::new(task_options))?;
    Ok(pipeline)
}

impl Editor {
    /// Create an editor for `source` with default markdown options.
    pub fn new(source: impl Into<String>, task_options: TaskListOptions) -> Result<Self> {
        Self::with_options(source, MarkdownOptions::default(), task_options)
    }

    pub fn with_options(
        source: impl Into<String>,
        markdown_options: MarkdownOptions,
        task_options: TaskListOptions,
    ) -> Result<Self> {
        let pipeline = build_pipeline(&markdown_options, task_options)?;
        let mut editor = Self {
            source: source.into(),
            markdown_options,
            task_options,
            pipeline,
            tokens: Vec::new(),
            html: String::new(),
            document: EditorDocument::default(),
            version: 0,
            events: EventBus::new(),
        };
        editor.rebuild();
        Ok(editor)
    }

    /// Re-derive tokens, HTML and document from the source.
    fn rebuild(&mut self) -> bool {
        self.tokens = self.pipeline.parse(&self.source);
        self.html = self.pipeline.render_tokens(&self.tokens);
        let document = document_from_markup(&parse_markup(&self.html));
        let changed = document != self.document;
        self.document = document;
        changed
    }

    /// Apply a transaction. Returns whether the document changed.
    ///
    /// Listeners for [`EditorEvent::Transaction`] are always notified;
    /// [`EditorEvent::Update`] fires only when the document changed.
    pub fn dispatch(&mut self, transaction: Transaction) -> Result<bool> {
        let doc_changed = match transaction {
            Transaction::SetContent(source) => {
                if source == self.source {
                    false
                } else {
                    self.source = source;
                    self.rebuild()
                }
            }
            Transaction::ToggleTask { line } => match toggle_task_at_line(&self.source, line) {
                Some(source) => {
                    self.source = source;
                    self.rebuild()
                }
                None => {
                    warn!("No task item on line {}", line);
                    false
                }
            },
            Transaction::Reconfigure(task_options) => {
                if task_options == self.task_options {
                    false
                } else {
                    self.pipeline = build_pipeline(&self.markdown_options, task_options)?;
                    self.task_options = task_options;
                    self.rebuild()
                }
            }
        };

        self.version += 1;
        debug!(
            "Transaction applied (version {}, changed: {})",
            self.version, doc_changed
        );

        let event = TransactionEvent {
            document: &self.document,
            version: self.version,
            doc_changed,
        };
        self.events.emit(EditorEvent::Transaction, &event);
        if doc_changed {
            self.events.emit(EditorEvent::Update, &event);
        }
        Ok(doc_changed)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Listeners
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on<F>(&self, event: EditorEvent, listener: F) -> ListenerId
    where
        F: FnMut(&TransactionEvent<'_>) + 'static,
    {
        self.events.on(event, listener)
    }

    pub fn off(&self, event: EditorEvent, id: ListenerId) -> bool {
        self.events.off(event, id)
    }

    pub fn subscribe<F>(&self, event: EditorEvent, listener: F) -> Subscription
    where
        F: FnMut(&TransactionEvent<'_>) + 'static,
    {
        self.events.subscribe(event, listener)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn document(&self) -> &EditorDocument {
        &self.document
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn task_options(&self) -> TaskListOptions {
        self.task_options
    }

    /// All document nodes of a type, e.g. `"tableOfContents"`.
    pub fn find_nodes(&self, type_name: &str) -> Vec<&EditorNode> {
        self.document.find_nodes(type_name)
    }

    /// Nested table of contents with source lines.
    pub fn toc(&self) -> Vec<TocEntry> {
        nest_headings(toc::heading_entries(&self.tokens))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
