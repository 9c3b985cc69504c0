//! Editor nodes from rendered markup
//!
//! Each [`NodeRecognizer`] claims markup elements by tag name (and a class or
//! attribute where tags are shared) and builds the matching editor node.
//! Phrasing content between recognized blocks becomes implicit paragraphs;
//! unrecognized containers such as `<div>`, `<thead>` or `<tbody>` are
//! transparent.

use super::markup::{MarkupElement, MarkupNode};
use crate::editor::document::{EditorDocument, EditorNode, NodeKind, SpanStyle, TextSpan};

// ─────────────────────────────────────────────────────────────────────────────
// Recognizers
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of node-from-markup recognizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRecognizer {
    Paragraph,
    Heading,
    TaskList,
    BulletList,
    OrderedList,
    TaskItem,
    ListItem,
    Blockquote,
    CodeBlock,
    HorizontalRule,
    Table,
    TableRow,
    TableHeader,
    TableCell,
    TableOfContents,
}

impl NodeRecognizer {
    /// Recognizers in priority order: specific variants come before the
    /// generic ones sharing their tag.
    pub const ALL: [NodeRecognizer; 15] = [
        NodeRecognizer::TableOfContents,
        NodeRecognizer::Paragraph,
        NodeRecognizer::Heading,
        NodeRecognizer::TaskList,
        NodeRecognizer::BulletList,
        NodeRecognizer::OrderedList,
        NodeRecognizer::TaskItem,
        NodeRecognizer::ListItem,
        NodeRecognizer::Blockquote,
        NodeRecognizer::CodeBlock,
        NodeRecognizer::HorizontalRule,
        NodeRecognizer::Table,
        NodeRecognizer::TableRow,
        NodeRecognizer::TableHeader,
        NodeRecognizer::TableCell,
    ];

    /// Editor node type produced by this recognizer.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeRecognizer::Paragraph => "paragraph",
            NodeRecognizer::Heading => "heading",
            NodeRecognizer::TaskList => "taskList",
            NodeRecognizer::BulletList => "bulletList",
            NodeRecognizer::OrderedList => "orderedList",
            NodeRecognizer::TaskItem => "taskItem",
            NodeRecognizer::ListItem => "listItem",
            NodeRecognizer::Blockquote => "blockquote",
            NodeRecognizer::CodeBlock => "codeBlock",
            NodeRecognizer::HorizontalRule => "horizontalRule",
            NodeRecognizer::Table => "table",
            NodeRecognizer::TableRow => "tableRow",
            NodeRecognizer::TableHeader => "tableHeader",
            NodeRecognizer::TableCell => "tableCell",
            NodeRecognizer::TableOfContents => "tableOfContents",
        }
    }

    pub fn matches(self, element: &MarkupElement) -> bool {
        let tag = element.tag_name();
        match self {
            NodeRecognizer::Paragraph => tag == "p",
            NodeRecognizer::Heading => heading_level(tag).is_some(),
            NodeRecognizer::TaskList => {
                (tag == "ul" || tag == "ol") && element.has_class("task-list")
            }
            NodeRecognizer::BulletList => tag == "ul",
            NodeRecognizer::OrderedList => tag == "ol",
            NodeRecognizer::TaskItem => {
                tag == "li"
                    && (element.has_class("task-list-item") || element.has_attr("data-checked"))
            }
            NodeRecognizer::ListItem => tag == "li",
            NodeRecognizer::Blockquote => tag == "blockquote",
            NodeRecognizer::CodeBlock => tag == "pre",
            NodeRecognizer::HorizontalRule => tag == "hr",
            NodeRecognizer::Table => tag == "table",
            NodeRecognizer::TableRow => tag == "tr",
            NodeRecognizer::TableHeader => tag == "th",
            NodeRecognizer::TableCell => tag == "td",
            NodeRecognizer::TableOfContents => tag == "nav" && element.has_class("table-of-contents"),
        }
    }

    /// First recognizer claiming `element`.
    pub fn recognize(element: &MarkupElement) -> Option<NodeRecognizer> {
        Self::ALL.into_iter().find(|r| r.matches(element))
    }

    /// Build the editor node for an element this recognizer matched.
    pub fn build(self, element: &MarkupElement) -> EditorNode {
        match self {
            NodeRecognizer::Paragraph
            | NodeRecognizer::TableHeader
            | NodeRecognizer::TableCell => {
                let kind = match self {
                    NodeRecognizer::TableHeader => NodeKind::TableHeader,
                    NodeRecognizer::TableCell => NodeKind::TableCell,
                    _ => NodeKind::Paragraph,
                };
                EditorNode::new(kind).with_spans(inline_spans(&element.children))
            }
            NodeRecognizer::Heading => EditorNode::new(NodeKind::Heading {
                level: heading_level(element.tag_name()).unwrap_or(1),
                id: element.attr("id").map(str::to_string),
            })
            .with_spans(inline_spans(&element.children)),
            NodeRecognizer::TaskList => container(NodeKind::TaskList, element),
            NodeRecognizer::BulletList => container(NodeKind::BulletList, element),
            NodeRecognizer::OrderedList => {
                let start = element
                    .attr("start")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1);
                container(NodeKind::OrderedList { start }, element)
            }
            NodeRecognizer::TaskItem => container(task_item_kind(element), element),
            NodeRecognizer::ListItem => container(NodeKind::ListItem, element),
            NodeRecognizer::Blockquote => container(NodeKind::Blockquote, element),
            NodeRecognizer::CodeBlock => {
                let language = element.find("code").and_then(|code| {
                    code.attr("class")?
                        .split_whitespace()
                        .find_map(|c| c.strip_prefix("language-"))
                        .map(str::to_string)
                });
                let span = TextSpan {
                    text: element.text_content(),
                    style: SpanStyle {
                        code: true,
                        ..Default::default()
                    },
                    link: None,
                };
                EditorNode::new(NodeKind::CodeBlock { language }).with_spans(vec![span])
            }
            NodeRecognizer::HorizontalRule => EditorNode::new(NodeKind::HorizontalRule),
            NodeRecognizer::Table => container(NodeKind::Table, element),
            NodeRecognizer::TableRow => container(NodeKind::TableRow, element),
            NodeRecognizer::TableOfContents => EditorNode::new(NodeKind::TableOfContents),
        }
    }
}

fn heading_level(tag: &str) -> Option<u8> {
    match tag.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}

fn container(kind: NodeKind, element: &MarkupElement) -> EditorNode {
    EditorNode::new(kind).with_children(convert_blocks(&element.children))
}

fn task_item_kind(element: &MarkupElement) -> NodeKind {
    let input = element.find("input");
    let checked = match input {
        Some(input) => input.has_attr("checked"),
        None => element.attr("data-checked") == Some("true"),
    };
    NodeKind::TaskItem {
        checked,
        interactive: input.is_some_and(|i| !i.has_attr("disabled")),
        line: input
            .and_then(|i| i.attr("data-line"))
            .and_then(|l| l.parse().ok()),
        id: input.and_then(|i| i.attr("id")).map(str::to_string),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversion
// ─────────────────────────────────────────────────────────────────────────────

/// Build an editor document from parsed markup.
pub fn document_from_markup(nodes: &[MarkupNode]) -> EditorDocument {
    EditorDocument::new(convert_blocks(nodes))
}

fn is_phrasing(tag: &str) -> bool {
    matches!(
        tag,
        "a" | "abbr"
            | "b"
            | "br"
            | "code"
            | "del"
            | "em"
            | "i"
            | "img"
            | "input"
            | "kbd"
            | "label"
            | "mark"
            | "s"
            | "small"
            | "span"
            | "strong"
            | "sub"
            | "sup"
            | "u"
    )
}

fn convert_blocks(nodes: &[MarkupNode]) -> Vec<EditorNode> {
    let mut blocks = Vec::new();
    let mut pending = Vec::new();

    for node in nodes {
        match node {
            MarkupNode::Text(text) => push_span(&mut pending, text, SpanStyle::default(), None),
            MarkupNode::Element(element) if is_phrasing(element.tag_name()) => {
                collect_spans(element, SpanStyle::default(), None, &mut pending)
            }
            MarkupNode::Element(element) => {
                flush_paragraph(&mut pending, &mut blocks);
                match NodeRecognizer::recognize(element) {
                    Some(recognizer) => blocks.push(recognizer.build(element)),
                    None => blocks.extend(convert_blocks(&element.children)),
                }
            }
        }
    }
    flush_paragraph(&mut pending, &mut blocks);

    blocks
}

/// Turn gathered loose spans into an implicit paragraph.
fn flush_paragraph(pending: &mut Vec<TextSpan>, blocks: &mut Vec<EditorNode>) {
    let mut spans = std::mem::take(pending);
    trim_spans(&mut spans);
    if !spans.is_empty() {
        blocks.push(EditorNode::new(NodeKind::Paragraph).with_spans(spans));
    }
}

fn trim_spans(spans: &mut Vec<TextSpan>) {
    if let Some(first) = spans.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = spans.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    spans.retain(|s| !s.text.is_empty());
}

fn inline_spans(nodes: &[MarkupNode]) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    for node in nodes {
        match node {
            MarkupNode::Text(text) => push_span(&mut spans, text, SpanStyle::default(), None),
            MarkupNode::Element(element) => {
                collect_spans(element, SpanStyle::default(), None, &mut spans)
            }
        }
    }
    trim_spans(&mut spans);
    spans
}

fn collect_spans<'a>(
    element: &'a MarkupElement,
    mut style: SpanStyle,
    mut link: Option<&'a str>,
    out: &mut Vec<TextSpan>,
) {
    match element.tag_name() {
        "strong" | "b" => style.strong = true,
        "em" | "i" => style.emphasis = true,
        "code" | "kbd" => style.code = true,
        "s" | "del" => style.strike = true,
        "a" => link = element.attr("href").or(link),
        "br" => return push_span(out, "\n", style, link),
        "img" => {
            let alt = element.attr("alt").unwrap_or_default();
            return push_span(out, alt, style, link);
        }
        "input" => return,
        _ => {}
    }

    for child in &element.children {
        match child {
            MarkupNode::Text(text) => push_span(out, text, style, link),
            MarkupNode::Element(inner) => collect_spans(inner, style, link, out),
        }
    }
}

/// Append text, merging with the previous span when formatting matches.
fn push_span(out: &mut Vec<TextSpan>, text: &str, style: SpanStyle, link: Option<&str>) {
    if text.is_empty() {
        return;
    }
    if let Some(last) = out.last_mut() {
        if last.style == style && last.link.as_deref() == link {
            last.text.push_str(text);
            return;
        }
    }
    out.push(TextSpan {
        text: text.to_string(),
        style,
        link: link.map(str::to_string),
    });
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
