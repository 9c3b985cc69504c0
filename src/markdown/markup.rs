//! Rendered HTML as an owned element tree
//!
//! html5ever parses the renderer's output into an `RcDom`; the body contents
//! are copied into plain [`MarkupNode`] values so recognizers can work on
//! them without touching `Rc`/`RefCell` handles.

use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

/// A node of the markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupNode {
    Element(MarkupElement),
    Text(String),
}

/// An HTML element with its attributes and children.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkupElement {
    /// Lowercase local tag name
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<MarkupNode>,
}

impl MarkupElement {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.push((name.to_string(), value.to_string()));
        self
    }

    #[cfg(test)]
    pub fn with_child(mut self, child: MarkupNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attr(name).is_some()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &MarkupElement> {
        self.children.iter().filter_map(|child| match child {
            MarkupNode::Element(element) => Some(element),
            MarkupNode::Text(_) => None,
        })
    }

    /// First descendant element with the given tag.
    pub fn find(&self, tag: &str) -> Option<&MarkupElement> {
        for element in self.elements() {
            if element.tag == tag {
                return Some(element);
            }
            if let Some(found) = element.find(tag) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[MarkupNode], out: &mut String) {
    for node in nodes {
        match node {
            MarkupNode::Text(text) => out.push_str(text),
            MarkupNode::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// Parse an HTML fragment and return the contents of its `<body>`.
pub fn parse_markup(html: &str) -> Vec<MarkupNode> {
    let dom = parse_document(RcDom::default(), ParseOpts::default()).one(html);
    match find_element(&dom.document, "body") {
        Some(body) => convert_children(&body),
        None => Vec::new(),
    }
}

fn find_element(handle: &Handle, tag: &str) -> Option<Handle> {
    for child in handle.children.borrow().iter() {
        if let NodeData::Element { name, .. } = &child.data {
            if &*name.local == tag {
                return Some(child.clone());
            }
        }
        if let Some(found) = find_element(child, tag) {
            return Some(found);
        }
    }
    None
}

fn convert_children(handle: &Handle) -> Vec<MarkupNode> {
    handle
        .children
        .borrow()
        .iter()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(handle: &Handle) -> Option<MarkupNode> {
    match &handle.data {
        NodeData::Element { name, attrs, .. } => {
            let attrs = attrs
                .borrow()
                .iter()
                .map(|attr| (attr.name.local.to_string(), attr.value.to_string()))
                .collect();
            Some(MarkupNode::Element(MarkupElement {
                tag: name.local.to_string(),
                attrs,
                children: convert_children(handle),
            }))
        }
        NodeData::Text { contents } => Some(MarkupNode::Text(contents.borrow().to_string())),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(nodes: &[MarkupNode]) -> &MarkupElement {
        nodes
            .iter()
            .find_map(|n| match n {
                MarkupNode::Element(e) => Some(e),
                MarkupNode::Text(_) => None,
            })
            .unwrap()
    }

    #[test]
    fn test_parse_paragraph() {
        let nodes = parse_markup("<p>Hello <em>world</em></p>");
        assert_eq!(nodes.len(), 1);
        let p = first_element(&nodes);
        assert_eq!(p.tag_name(), "p");
        assert_eq!(p.text_content(), "Hello world");
    }

    #[test]
    fn test_attributes_and_classes() {
        let nodes = parse_markup(
            "<ul class=\"contains-task-list task-list\"><li data-checked=\"true\">x</li></ul>",
        );
        let ul = first_element(&nodes);
        assert!(ul.has_class("task-list"));
        assert!(!ul.has_class("task"));
        let li = ul.elements().next().unwrap();
        assert_eq!(li.attr("data-checked"), Some("true"));
    }

    #[test]
    fn test_boolean_attributes() {
        let nodes = parse_markup("<input type=\"checkbox\" checked=\"\" id=\"task-item-0\">");
        let input = first_element(&nodes);
        assert!(input.has_attr("checked"));
        assert!(!input.has_attr("disabled"));
    }

    #[test]
    fn test_find_descendant() {
        let nodes = parse_markup("<li><label><input id=\"a\"><span></span></label></li>");
        let li = first_element(&nodes);
        assert_eq!(li.find("input").and_then(|i| i.attr("id")), Some("a"));
        assert!(li.find("table").is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(parse_markup("").is_empty());
    }

    #[test]
    fn test_builder() {
        let element = MarkupElement::new("P")
            .with_attr("id", "x")
            .with_child(MarkupNode::Text("hi".to_string()));
        assert_eq!(element.tag_name(), "p");
        assert_eq!(element.text_content(), "hi");
    }
}
