//! Editor document model
//!
//! A tree of typed block nodes rebuilt from rendered markup. Node type names
//! follow the rich-text editor schema (`paragraph`, `taskItem`,
//! `tableOfContents`...) so lookups by name read the same everywhere.

use super::outline::TocEntry;

// ─────────────────────────────────────────────────────────────────────────────
// Inline text
// ─────────────────────────────────────────────────────────────────────────────

/// Inline formatting flags of a text span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub code: bool,
    pub strike: bool,
}

/// A run of text with uniform formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub text: String,
    pub style: SpanStyle,
    /// Link target when the span is inside a link
    pub link: Option<String>,
}

impl TextSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
            link: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// Block node types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Heading {
        level: u8,
        id: Option<String>,
    },
    TaskList,
    BulletList,
    OrderedList {
        start: usize,
    },
    TaskItem {
        checked: bool,
        /// The checkbox can be clicked
        interactive: bool,
        /// 0-based source line of the item
        line: Option<usize>,
        id: Option<String>,
    },
    ListItem,
    Blockquote,
    CodeBlock {
        language: Option<String>,
    },
    HorizontalRule,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    TableOfContents,
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::TaskList => "taskList",
            NodeKind::BulletList => "bulletList",
            NodeKind::OrderedList { .. } => "orderedList",
            NodeKind::TaskItem { .. } => "taskItem",
            NodeKind::ListItem => "listItem",
            NodeKind::Blockquote => "blockquote",
            NodeKind::CodeBlock { .. } => "codeBlock",
            NodeKind::HorizontalRule => "horizontalRule",
            NodeKind::Table => "table",
            NodeKind::TableRow => "tableRow",
            NodeKind::TableHeader => "tableHeader",
            NodeKind::TableCell => "tableCell",
            NodeKind::TableOfContents => "tableOfContents",
        }
    }
}

/// A block node: inline spans for textblocks, child blocks for containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorNode {
    pub kind: NodeKind,
    pub spans: Vec<TextSpan>,
    pub children: Vec<EditorNode>,
}

impl EditorNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            spans: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_spans(mut self, spans: Vec<TextSpan>) -> Self {
        self.spans = spans;
        self
    }

    pub fn with_children(mut self, children: Vec<EditorNode>) -> Self {
        self.children = children;
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Text of this node's spans only.
    pub fn inline_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// Text of this node and all descendants, blocks separated by newlines.
    pub fn text_content(&self) -> String {
        let mut parts = Vec::new();
        if !self.spans.is_empty() {
            parts.push(self.inline_text());
        }
        parts.extend(self.children.iter().map(EditorNode::text_content));
        parts.join("\n")
    }

    fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a EditorNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EditorDocument
// ─────────────────────────────────────────────────────────────────────────────

/// The document held by the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EditorDocument {
    pub nodes: Vec<EditorNode>,
}

impl EditorDocument {
    pub fn new(nodes: Vec<EditorNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes of the given type, depth first in document order.
    pub fn find_nodes(&self, type_name: &str) -> Vec<&EditorNode> {
        let mut found = Vec::new();
        for node in &self.nodes {
            node.walk(&mut |n| {
                if n.type_name() == type_name {
                    found.push(n);
                }
            });
        }
        found
    }

    /// Check whether any node has the given type.
    pub fn contains(&self, type_name: &str) -> bool {
        !self.find_nodes(type_name).is_empty()
    }

    /// Headings as flat table of contents entries.
    pub fn headings(&self) -> Vec<TocEntry> {
        self.find_nodes("heading")
            .into_iter()
            .filter_map(|node| match &node.kind {
                NodeKind::Heading { level, id } => Some(TocEntry::new(
                    *level,
                    id.clone().unwrap_or_default(),
                    node.inline_text(),
                )),
                _ => None,
            })
            .collect()
    }

    pub fn text_content(&self) -> String {
        self.nodes
            .iter()
            .map(EditorNode::text_content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn paragraph(text: &str) -> EditorNode {
        EditorNode::new(NodeKind::Paragraph).with_spans(vec![TextSpan::plain(text)])
    }

    fn sample() -> EditorDocument {
        EditorDocument::new(vec![
            EditorNode::new(NodeKind::Heading {
                level: 1,
                id: Some("todo".to_string()),
            })
            .with_spans(vec![TextSpan::plain("Todo")]),
            EditorNode::new(NodeKind::TaskList).with_children(vec![EditorNode::new(
                NodeKind::TaskItem {
                    checked: true,
                    interactive: true,
                    line: Some(2),
                    id: Some("task-item-2".to_string()),
                },
            )
            .with_children(vec![paragraph("buy milk")])]),
            paragraph("end"),
        ])
    }

    #[test]
    fn test_find_nodes_is_depth_first() {
        let doc = sample();
        let paragraphs = doc.find_nodes("paragraph");
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].inline_text(), "buy milk");
        assert_eq!(paragraphs[1].inline_text(), "end");
        assert_eq!(doc.find_nodes("taskItem").len(), 1);
        assert!(doc.find_nodes("tableOfContents").is_empty());
    }

    #[test]
    fn test_contains() {
        let doc = sample();
        assert!(doc.contains("taskList"));
        assert!(!doc.contains("table"));
        assert!(!EditorDocument::default().contains("paragraph"));
    }

    #[test]
    fn test_headings() {
        let headings = sample().headings();
        assert_eq!(headings, vec![TocEntry::new(1, "todo", "Todo")]);
    }

    #[test]
    fn test_text_content() {
        assert_eq!(sample().text_content(), "Todo\nbuy milk\nend");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(NodeKind::TableOfContents.type_name(), "tableOfContents");
        assert_eq!(NodeKind::OrderedList { start: 1 }.type_name(), "orderedList");
        assert_eq!(NodeKind::HorizontalRule.type_name(), "horizontalRule");
    }
}
