//! Heading anchors and the `[toc]` table of contents
//!
//! Headings get GitHub style anchor ids, and a paragraph consisting only of
//! `[toc]` or `[[toc]]` is replaced by a table of contents token that renders
//! as a nested list of links to those anchors.

use comrak::Anchorizer;

use super::renderer::{escape_html, render_attrs, HtmlRenderer};
use super::token::{Nesting, Token, TokenKind};
use crate::editor::outline::{nest_headings, TocEntry};

/// Give every heading without an `id` an anchor derived from its text.
pub fn assign_heading_ids(tokens: &mut [Token]) {
    let mut anchorizer = Anchorizer::new();
    for i in 0..tokens.len() {
        if !matches!(tokens[i].kind, TokenKind::Heading(_)) || tokens[i].nesting != Nesting::Open {
            continue;
        }
        let text = match tokens.get(i + 1) {
            Some(inline) if inline.is_inline_container() => inline.content.clone(),
            _ => continue,
        };
        // Run even for headings with explicit ids so duplicates stay unique
        let anchor = anchorizer.anchorize(text);
        if tokens[i].attrs.get("id").is_none() {
            tokens[i].attrs.set("id", anchor);
        }
    }
}

fn is_toc_marker(content: &str) -> bool {
    let marker = content.trim().to_ascii_lowercase();
    marker == "[toc]" || marker == "[[toc]]"
}

/// Replace `[toc]` paragraphs with a single table of contents token.
pub fn replace_toc_markers(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i + 2 < tokens.len() {
        let is_marker = matches!(
            &tokens[i..i + 3],
            [open, inline, close]
                if open.is(&TokenKind::Paragraph, Nesting::Open)
                    && inline.is_inline_container()
                    && close.is(&TokenKind::Paragraph, Nesting::Close)
                    && is_toc_marker(&inline.content)
        );
        if is_marker {
            let mut toc = Token::new(TokenKind::TableOfContents, Nesting::SelfClosing);
            toc.level = tokens[i].level;
            toc.map = tokens[i].map;
            toc.block = true;
            // Tight list paragraphs stay hidden; attrs set by earlier rules survive
            toc.hidden = tokens[i].hidden;
            toc.attrs = std::mem::take(&mut tokens[i].attrs);
            toc.attrs.add_class("table-of-contents");
            tokens.drain(i + 1..i + 3);
            tokens[i] = toc;
        }
        i += 1;
    }
}

/// Collect the headings of a token stream as flat table of contents entries.
pub fn heading_entries(tokens: &[Token]) -> Vec<TocEntry> {
    tokens
        .windows(2)
        .filter_map(|pair| match pair {
            [open, inline] if open.nesting == Nesting::Open && inline.is_inline_container() => {
                let TokenKind::Heading(level) = open.kind else {
                    return None;
                };
                let entry = TocEntry::new(
                    level,
                    open.attrs.get("id").unwrap_or_default(),
                    inline.content.clone(),
                );
                Some(match open.map {
                    Some(map) => entry.with_line(map.start),
                    None => entry,
                })
            }
            _ => None,
        })
        .collect()
}

/// Register the `<nav>` render rule for table of contents tokens.
pub fn register_render_rule(renderer: &mut HtmlRenderer) {
    renderer.set_rule(
        "table_of_contents",
        Nesting::SelfClosing,
        |tokens, idx, _| {
            let token = &tokens[idx];
            let tree = nest_headings(heading_entries(tokens));
            let mut out = format!("<nav{}>", render_attrs(&token.attrs));
            render_entries(&tree, &mut out);
            out.push_str("</nav>");
            if !token.hidden {
                out.push('\n');
            }
            out
        },
    );
}

fn render_entries(entries: &[TocEntry], out: &mut String) {
    if entries.is_empty() {
        return;
    }
    out.push_str("<ul>");
    for entry in entries {
        out.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
        render_entries(&entry.children, out);
        out.push_str("</li>");
    }
    out.push_str("</ul>");
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::pipeline::MarkdownPipeline;

    #[test]
    fn test_heading_ids() {
        let tokens = MarkdownPipeline::default().parse("# Hello World\n\n## Hello World");
        let ids: Vec<_> = tokens
            .iter()
            .filter(|t| matches!(t.kind, TokenKind::Heading(_)) && t.nesting == Nesting::Open)
            .map(|t| t.attrs.get("id").unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["hello-world", "hello-world-1"]);
    }

    #[test]
    fn test_heading_id_rendered() {
        let html = MarkdownPipeline::default().render("## Getting Started");
        assert_eq!(html, "<h2 id=\"getting-started\">Getting Started</h2>\n");
    }

    #[test]
    fn test_toc_marker_replaced() {
        let tokens = MarkdownPipeline::default().parse("[toc]\n\n# One");
        assert_eq!(tokens[0].kind, TokenKind::TableOfContents);
        assert_eq!(tokens[0].nesting, Nesting::SelfClosing);
        assert!(tokens
            .iter()
            .all(|t| t.kind != TokenKind::Paragraph));
    }

    #[test]
    fn test_toc_marker_variants() {
        assert!(is_toc_marker("[toc]"));
        assert!(is_toc_marker("[[TOC]]"));
        assert!(is_toc_marker("  [Toc] "));
        assert!(!is_toc_marker("[toc] and more"));
    }

    #[test]
    fn test_toc_render() {
        let html = MarkdownPipeline::default().render("[[toc]]\n\n# One\n\n## Two\n\n# Three");
        assert!(html.starts_with(
            "<nav class=\"table-of-contents\"><ul><li><a href=\"#one\">One</a><ul><li><a href=\"#two\">Two</a></li></ul></li><li><a href=\"#three\">Three</a></li></ul></nav>\n"
        ));
    }

    #[test]
    fn test_toc_without_headings() {
        let html = MarkdownPipeline::default().render("[toc]");
        assert_eq!(html, "<nav class=\"table-of-contents\"></nav>\n");
    }

    #[test]
    fn test_toc_keeps_replaced_attrs() {
        let mut pipeline = MarkdownPipeline::default();
        pipeline.core.insert_before("toc", "mark-root", |state| {
            if let Some(first) = state.tokens.first_mut() {
                first.attrs.add_class("root");
            }
            false
        })
        .unwrap();

        let tokens = pipeline.parse("[toc]\n\n# One");
        assert_eq!(tokens[0].kind, TokenKind::TableOfContents);
        assert!(tokens[0].attrs.classes().contains("root"));
        assert!(tokens[0].attrs.classes().contains("table-of-contents"));
        assert!(pipeline
            .render_tokens(&tokens)
            .starts_with("<nav class=\"root table-of-contents\">"));
    }

    #[test]
    fn test_toc_in_tight_list_stays_hidden() {
        let pipeline = MarkdownPipeline::default();
        let tokens = pipeline.parse("- [toc]\n- two");
        let toc = tokens
            .iter()
            .find(|t| t.kind == TokenKind::TableOfContents)
            .unwrap();
        assert!(toc.hidden);

        let html = pipeline.render_tokens(&tokens);
        assert_eq!(
            html,
            "<ul>\n<li><nav class=\"table-of-contents\"></nav></li>\n<li>two</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_heading_entries_lines() {
        let tokens = MarkdownPipeline::default().parse("intro\n\n# One\n\ntext\n\n## Two");
        let entries = heading_entries(&tokens);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line, Some(2));
        assert_eq!(entries[1].level, 2);
        assert_eq!(entries[1].line, Some(6));
    }
}
