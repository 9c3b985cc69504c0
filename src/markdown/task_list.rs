//! GitHub style task lists
//!
//! A core rule that runs after `inline` and turns list items starting with
//! `[ ]`, `[x]` or `[X]` into task items: the marker is stripped, a checkbox
//! token (and optionally a label wrapper) is inserted into the item's inline
//! children, and the item and its list are tagged with classes.

use std::sync::OnceLock;

use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::pipeline::{MarkdownPipeline, MarkdownPlugin};
use super::renderer::escape_html;
use super::token::{find_parent, Nesting, Token, TokenKind};
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Task list configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskListOptions {
    /// Checkboxes can be clicked; when off they are rendered `disabled`
    pub enabled: bool,
    /// Wrap the item text in a label block
    pub label: bool,
    /// Emit `data-line` with the item's source line
    pub line_number: bool,
}

impl Default for TaskListOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            label: true,
            line_number: false,
        }
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r"^ *\[([ xX])\] ").expect("valid task marker pattern"))
}

fn source_item_regex() -> &'static Regex {
    static ITEM: OnceLock<Regex> = OnceLock::new();
    ITEM.get_or_init(|| {
        Regex::new(r"^((?:[ \t]*>)*[ \t]*(?:[-*+]|\d{1,9}[.)])[ \t]+)\[([ xX])\](?:[ \t\r]|$)")
            .expect("valid task item pattern")
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Core rule
// ─────────────────────────────────────────────────────────────────────────────

/// Annotate every task item in `tokens`.
///
/// Always returns `false`: the pass never ends the core rule chain. Running it
/// again over an annotated stream changes nothing.
pub fn annotate(tokens: &mut [Token], options: &TaskListOptions) -> bool {
    if let Some(first) = tokens.first_mut() {
        first.attrs.add_class("contains-task-list");
    }

    let mut auto_ids = 0usize;
    let mut annotated = 0usize;

    for i in 2..tokens.len() {
        let Some(checked) = task_marker(&tokens[i - 2..=i]) else {
            continue;
        };

        let id = match tokens[i].map {
            Some(map) => format!("task-item-{}", map.start),
            None => {
                auto_ids += 1;
                format!("task-item-auto-{}", auto_ids - 1)
            }
        };
        todoify(&mut tokens[i], checked, &id, options);

        let item = &mut tokens[i - 2];
        item.attrs.add_class("task-list-item");
        item.attrs.set("data-checked", checked.to_string());

        if let Some(parent) = find_parent(tokens, i - 2) {
            tokens[parent].attrs.add_class("task-list");
        }
        annotated += 1;
    }

    if annotated > 0 {
        debug!("Annotated {} task list items", annotated);
    }
    false
}

/// Match `[list_item_open, paragraph_open, inline]` whose text starts with a
/// task marker. Returns whether the marker is checked.
fn task_marker(window: &[Token]) -> Option<bool> {
    match window {
        [item, paragraph, inline]
            if item.is(&TokenKind::ListItem, Nesting::Open)
                && paragraph.is(&TokenKind::Paragraph, Nesting::Open)
                && inline.is_inline_container() =>
        {
            let children = inline.children.as_ref()?;
            if children
                .first()
                .is_some_and(|c| c.kind == TokenKind::TaskListItemCheckbox)
            {
                return None;
            }
            let caps = marker_regex().captures(&inline.content)?;
            Some(caps[1].eq_ignore_ascii_case("x"))
        }
        _ => None,
    }
}

fn todoify(inline: &mut Token, checked: bool, id: &str, options: &TaskListOptions) {
    let line = inline.map.map(|m| m.start);
    inline.content = marker_regex().replace(&inline.content, "").into_owned();

    let Some(children) = inline.children.as_mut() else {
        return;
    };
    if let Some(first) = children.first_mut().filter(|t| t.kind == TokenKind::Text) {
        first.content = marker_regex().replace(&first.content, "").into_owned();
    }

    let mut checkbox = Token::new(TokenKind::TaskListItemCheckbox, Nesting::SelfClosing);
    if !options.enabled {
        checkbox.attrs.set("disabled", "true");
    }
    if let Some(line) = line {
        checkbox.attrs.set("line", line.to_string());
    }
    checkbox.attrs.set("id", id);
    if checked {
        checkbox.attrs.set("checked", "true");
    }
    children.insert(0, checkbox);

    if options.label {
        let mut open = Token::new(TokenKind::TaskListItemLabel, Nesting::Open);
        open.attrs.set("id", id);
        children.insert(1, open);
        children.push(Token::new(TokenKind::TaskListItemLabel, Nesting::Close));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

fn render_checkbox(token: &Token, line_number: bool) -> String {
    let mut parts = vec![
        "class=\"task-list-item-checkbox\"".to_string(),
        "type=\"checkbox\"".to_string(),
    ];
    if token.attrs.contains("checked") {
        parts.push("checked=\"\"".to_string());
    }
    if token.attrs.contains("disabled") {
        parts.push("disabled=\"\"".to_string());
    }
    if line_number {
        if let Some(line) = token.attrs.get("line") {
            parts.push(format!("data-line=\"{}\"", escape_html(line)));
        }
    }
    if let Some(id) = token.attrs.get("id") {
        parts.push(format!("id=\"{}\"", escape_html(id)));
    }
    format!(
        "<label contenteditable=\"false\"><input {}><span></span></label>",
        parts.join(" ")
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugin
// ─────────────────────────────────────────────────────────────────────────────

/// Installs the `github-task-lists` core rule and its render rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskListPlugin {
    pub options: TaskListOptions,
}

impl TaskListPlugin {
    pub fn new(options: TaskListOptions) -> Self {
        Self { options }
    }
}

impl MarkdownPlugin for TaskListPlugin {
    fn install(self, pipeline: &mut MarkdownPipeline) -> Result<()> {
        let options = self.options;
        pipeline
            .core
            .insert_after("inline", "github-task-lists", move |state| {
                annotate(&mut state.tokens, &options)
            })?;

        let renderer = &mut pipeline.renderer;
        renderer.set_rule(
            "taskListItemCheckbox",
            Nesting::SelfClosing,
            move |tokens, idx, _| render_checkbox(&tokens[idx], options.line_number),
        );
        renderer.set_rule("taskListItemLabel", Nesting::Open, |_, _, _| {
            "<div><p>".to_string()
        });
        renderer.set_rule("taskListItemLabel", Nesting::Close, |_, _, _| {
            "</p></div>".to_string()
        });
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Source editing
// ─────────────────────────────────────────────────────────────────────────────

/// Flip the task marker on a 0-based source line (`[ ]` ↔ `[x]`).
///
/// Returns the updated source, or `None` when the line is not a task item.
pub fn toggle_task_at_line(source: &str, line: usize) -> Option<String> {
    let start: usize = source.split_inclusive('\n').take(line).map(str::len).sum();
    let text = source[start..].split('\n').next()?;
    let caps = source_item_regex().captures(text)?;
    let mark = caps.get(2)?;

    let replacement = if mark.as_str() == " " { "x" } else { " " };
    let at = start + mark.start();

    let mut out = String::with_capacity(source.len());
    out.push_str(&source[..at]);
    out.push_str(replacement);
    out.push_str(&source[at + 1..]);
    Some(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::markdown::pipeline::CoreRuler;
    use crate::markdown::renderer::HtmlRenderer;
    use crate::markdown::token::SourceMap;

    fn pipeline(options: TaskListOptions) -> MarkdownPipeline {
        let mut pipeline = MarkdownPipeline::default();
        pipeline.use_plugin(TaskListPlugin::new(options)).unwrap();
        pipeline
    }

    fn list_items(tokens: &[Token]) -> Vec<&Token> {
        tokens
            .iter()
            .filter(|t| t.is(&TokenKind::ListItem, Nesting::Open))
            .collect()
    }

    fn checkboxes(tokens: &[Token]) -> Vec<&Token> {
        tokens
            .iter()
            .filter_map(|t| t.children.as_ref())
            .flatten()
            .filter(|t| t.kind == TokenKind::TaskListItemCheckbox)
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Detection
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_unchecked_item() {
        let tokens = pipeline(TaskListOptions::default()).parse("- [ ] walk dog");
        let items = list_items(&tokens);
        assert_eq!(items[0].attrs.get("data-checked"), Some("false"));
        assert!(items[0].attrs.classes().contains("task-list-item"));

        let boxes = checkboxes(&tokens);
        assert_eq!(boxes.len(), 1);
        assert!(!boxes[0].attrs.contains("checked"));
    }

    #[test]
    fn test_checked_item_either_case() {
        for source in ["- [x] done", "- [X] done", "*   [x] done", "1. [X] done"] {
            let tokens = pipeline(TaskListOptions::default()).parse(source);
            let items = list_items(&tokens);
            assert_eq!(items[0].attrs.get("data-checked"), Some("true"), "{source}");
            assert!(checkboxes(&tokens)[0].attrs.contains("checked"), "{source}");
        }
    }

    #[test]
    fn test_marker_needs_trailing_space() {
        let tokens = pipeline(TaskListOptions::default()).parse("- [x]done\n- [y] no");
        assert!(checkboxes(&tokens).is_empty());
        assert!(list_items(&tokens)
            .iter()
            .all(|t| !t.attrs.classes().contains("task-list-item")));
    }

    #[test]
    fn test_marker_stripped_from_text() {
        let pipeline = pipeline(TaskListOptions::default());
        let html = pipeline.render("- [x] buy milk\n- [ ] walk dog");
        assert!(!html.contains("[x]"));
        assert!(!html.contains("[ ]"));
        assert!(html.contains("<div><p>buy milk</p></div>"));

        let tokens = pipeline.parse("- [x] buy milk");
        let inline = tokens.iter().find(|t| t.is_inline_container()).unwrap();
        assert_eq!(inline.content, "buy milk");
    }

    #[test]
    fn test_document_without_tasks() {
        let tokens = pipeline(TaskListOptions::default()).parse("Just text\n\n- plain item");
        assert!(tokens[0].attrs.classes().contains("contains-task-list"));
        assert!(list_items(&tokens)
            .iter()
            .all(|t| !t.attrs.classes().contains("task-list-item")));
        assert!(checkboxes(&tokens).is_empty());
    }

    #[test]
    fn test_empty_document() {
        let mut tokens = Vec::new();
        assert!(!annotate(&mut tokens, &TaskListOptions::default()));
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_parent_list_gets_class_once() {
        let tokens = pipeline(TaskListOptions::default()).parse("- [x] a\n- [ ] b\n- [ ] c");
        assert_eq!(
            tokens[0].attrs.classes().joined(),
            "contains-task-list task-list"
        );
    }

    #[test]
    fn test_nested_list_parent() {
        let tokens = pipeline(TaskListOptions::default()).parse("- outer\n  - [ ] inner");
        let lists: Vec<_> = tokens
            .iter()
            .filter(|t| t.is(&TokenKind::BulletList, Nesting::Open))
            .collect();
        assert_eq!(lists.len(), 2);
        assert!(!lists[0].attrs.classes().contains("task-list"));
        assert!(lists[1].attrs.classes().contains("task-list"));
    }

    #[test]
    fn test_paragraph_outside_list_ignored() {
        let tokens = pipeline(TaskListOptions::default()).parse("[x] not a list item");
        assert!(checkboxes(&tokens).is_empty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Options
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_disabled_when_not_enabled() {
        let options = TaskListOptions {
            enabled: false,
            ..Default::default()
        };
        let pipeline = pipeline(options);
        let tokens = pipeline.parse("- [x] one\n- [ ] two");
        let boxes = checkboxes(&tokens);
        assert_eq!(boxes.len(), 2);
        assert!(boxes.iter().all(|b| b.attrs.contains("disabled")));

        let html = pipeline.render("- [ ] two");
        assert!(html.contains("disabled=\"\""));
    }

    #[test]
    fn test_line_attribute() {
        let source = "a\n\nb\n\n- [ ] task";
        let with_lines = pipeline(TaskListOptions {
            line_number: true,
            ..Default::default()
        });
        let tokens = with_lines.parse(source);
        assert_eq!(checkboxes(&tokens)[0].attrs.get("line"), Some("4"));
        assert!(with_lines.render(source).contains("data-line=\"4\""));

        let without_lines = pipeline(TaskListOptions::default());
        let tokens = without_lines.parse(source);
        assert_eq!(checkboxes(&tokens)[0].attrs.get("line"), Some("4"));
        assert!(!without_lines.render(source).contains("data-line"));
    }

    #[test]
    fn test_without_label() {
        let options = TaskListOptions {
            label: false,
            ..Default::default()
        };
        let tokens = pipeline(options).parse("- [ ] bare");
        let inline = tokens.iter().find(|t| t.is_inline_container()).unwrap();
        let children = inline.children.as_ref().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[1].content, "bare");
        assert!(children
            .iter()
            .all(|c| c.kind != TokenKind::TaskListItemLabel));
    }

    #[test]
    fn test_options_from_json() {
        let options: TaskListOptions = serde_json::from_str(r#"{"lineNumber": true}"#).unwrap();
        assert!(options.enabled);
        assert!(options.label);
        assert!(options.line_number);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ids and idempotence
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_ids_from_source_lines() {
        let tokens = pipeline(TaskListOptions::default()).parse("- [x] buy milk\n- [ ] walk dog");
        let ids: Vec<_> = checkboxes(&tokens)
            .iter()
            .map(|b| b.attrs.get("id").unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["task-item-0", "task-item-1"]);
    }

    fn unmapped_item(text: &str) -> Vec<Token> {
        let mut item = Token::new(TokenKind::ListItem, Nesting::Open);
        item.level = 1;
        let mut paragraph = Token::new(TokenKind::Paragraph, Nesting::Open);
        paragraph.level = 2;
        let mut inline = Token::new(TokenKind::Inline, Nesting::SelfClosing);
        inline.level = 3;
        inline.content = text.to_string();
        inline.children = Some(vec![Token::text(text)]);
        vec![item, paragraph, inline]
    }

    #[test]
    fn test_deterministic_fallback_ids() {
        let mut tokens = vec![Token::new(TokenKind::BulletList, Nesting::Open)];
        tokens.extend(unmapped_item("[ ] one"));
        tokens.extend(unmapped_item("[x] two"));

        let run = |mut tokens: Vec<Token>| {
            annotate(&mut tokens, &TaskListOptions::default());
            checkboxes(&tokens)
                .iter()
                .map(|b| b.attrs.get("id").unwrap().to_string())
                .collect::<Vec<_>>()
        };
        let first = run(tokens.clone());
        assert_eq!(first, vec!["task-item-auto-0", "task-item-auto-1"]);
        assert_eq!(run(tokens), first);
    }

    #[test]
    fn test_inline_without_children_skipped() {
        let mut tokens = unmapped_item("[x] orphan");
        tokens[2].children = None;
        tokens[2].map = Some(SourceMap { start: 0, end: 1 });
        annotate(&mut tokens, &TaskListOptions::default());
        assert!(!tokens[0].attrs.classes().contains("task-list-item"));
        assert_eq!(tokens[2].content, "[x] orphan");
    }

    #[test]
    fn test_second_pass_is_noop() {
        let mut tokens = pipeline(TaskListOptions::default()).parse("- [x] buy milk\n- [ ] walk dog");
        let once = tokens.clone();
        assert!(!annotate(&mut tokens, &TaskListOptions::default()));
        assert_eq!(tokens, once);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering and installation
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_end_to_end_render() {
        let html = pipeline(TaskListOptions::default()).render("- [x] buy milk\n- [ ] walk dog");
        let expected = concat!(
            "<ul class=\"contains-task-list task-list\">\n",
            "<li class=\"task-list-item\" data-checked=\"true\">",
            "<label contenteditable=\"false\"><input class=\"task-list-item-checkbox\" type=\"checkbox\" checked=\"\" id=\"task-item-0\"><span></span></label>",
            "<div><p>buy milk</p></div></li>\n",
            "<li class=\"task-list-item\" data-checked=\"false\">",
            "<label contenteditable=\"false\"><input class=\"task-list-item-checkbox\" type=\"checkbox\" id=\"task-item-1\"><span></span></label>",
            "<div><p>walk dog</p></div></li>\n",
            "</ul>\n",
        );
        assert_eq!(html, expected);
    }

    #[test]
    fn test_core_rule_position() {
        let pipeline = pipeline(TaskListOptions::default());
        assert_eq!(
            pipeline.core.names(),
            vec!["block", "inline", "github-task-lists", "heading_ids", "toc"]
        );
    }

    #[test]
    fn test_install_requires_inline_rule() {
        let mut bare = MarkdownPipeline {
            core: CoreRuler::default(),
            renderer: HtmlRenderer::new(true),
        };
        let result = TaskListPlugin::default().install(&mut bare);
        assert!(matches!(result, Err(Error::UnknownRule(name)) if name == "inline"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Root class
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_root_class_survives_toc_marker() {
        let pipeline = pipeline(TaskListOptions::default());
        let tokens = pipeline.parse("[toc]\n\n- [x] a");
        assert_eq!(tokens[0].kind, TokenKind::TableOfContents);
        assert!(tokens[0].attrs.classes().contains("contains-task-list"));
        assert!(tokens[0].attrs.classes().contains("table-of-contents"));

        let html = pipeline.render_tokens(&tokens);
        assert!(html.starts_with("<nav class=\"contains-task-list table-of-contents\">"));
    }

    #[test]
    fn test_root_class_on_leading_fence() {
        let pipeline = pipeline(TaskListOptions::default());
        assert_eq!(
            pipeline.render("```\ncode\n```\n"),
            "<pre><code class=\"contains-task-list\">code\n</code></pre>\n"
        );
        assert!(pipeline
            .render("```rust\nlet a = 1;\n```\n\n- [ ] b")
            .starts_with("<pre><code class=\"contains-task-list language-rust\">"));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Source toggling
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_toggle_task_at_line() {
        let source = "# List\n\n- [ ] one\n- [x] two\n";
        let toggled = toggle_task_at_line(source, 2).unwrap();
        assert_eq!(toggled, "# List\n\n- [x] one\n- [x] two\n");
        let toggled = toggle_task_at_line(&toggled, 3).unwrap();
        assert_eq!(toggled, "# List\n\n- [x] one\n- [ ] two\n");
    }

    #[test]
    fn test_toggle_variants() {
        assert_eq!(
            toggle_task_at_line("  1. [X] nested", 0).as_deref(),
            Some("  1. [ ] nested")
        );
        assert_eq!(
            toggle_task_at_line("> - [ ] quoted\r\n", 0).as_deref(),
            Some("> - [x] quoted\r\n")
        );
        assert_eq!(toggle_task_at_line("- [ ]", 0).as_deref(), Some("- [x]"));
    }

    #[test]
    fn test_toggle_non_task_lines() {
        assert_eq!(toggle_task_at_line("# Heading", 0), None);
        assert_eq!(toggle_task_at_line("- plain", 0), None);
        assert_eq!(toggle_task_at_line("[ ] no bullet", 0), None);
        assert_eq!(toggle_task_at_line("- [ ] one", 5), None);
    }
}
