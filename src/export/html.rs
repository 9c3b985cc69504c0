//! HTML Export Generation
//!
//! Wraps rendered markdown in a standalone HTML document with inlined CSS
//! for light or dark viewing.

use crate::error::{Error, Result};
use crate::markdown::renderer::escape_html;
use log::info;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Palette
// ─────────────────────────────────────────────────────────────────────────────

/// Colors used by the exported stylesheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Palette {
    color_scheme: &'static str,
    background: &'static str,
    text: &'static str,
    muted: &'static str,
    border: &'static str,
    link: &'static str,
    code_bg: &'static str,
    accent: &'static str,
}

impl Palette {
    fn for_theme(is_dark: bool) -> Self {
        if is_dark {
            Self {
                color_scheme: "dark",
                background: "rgb(30, 30, 30)",
                text: "rgb(220, 220, 220)",
                muted: "rgb(150, 150, 150)",
                border: "rgb(60, 60, 60)",
                link: "rgb(130, 180, 255)",
                code_bg: "rgb(45, 45, 45)",
                accent: "rgb(100, 160, 240)",
            }
        } else {
            Self {
                color_scheme: "light",
                background: "rgb(255, 255, 255)",
                text: "rgb(36, 41, 47)",
                muted: "rgb(100, 100, 100)",
                border: "rgb(210, 210, 210)",
                link: "rgb(9, 105, 218)",
                code_bg: "rgb(246, 248, 250)",
                accent: "rgb(40, 100, 180)",
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Generate a complete HTML document around a rendered body.
///
/// `body_html` is the output of the markdown pipeline. `title` defaults to
/// "Exported Document".
pub fn generate_html_document(body_html: &str, title: Option<&str>, is_dark: bool) -> String {
    let doc_title = title.unwrap_or("Exported Document");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="markdeck">
    <title>{title}</title>
    <style>
{base_css}
{theme_css}
    </style>
</head>
<body>
    <article class="markdown-body">
{body}
    </article>
</body>
</html>"#,
        title = escape_html(doc_title),
        base_css = BASE_CSS,
        theme_css = generate_theme_css(&Palette::for_theme(is_dark)),
        body = body_html,
    )
}

/// Write a standalone HTML document to `output_path`.
pub fn export_to_html_file(
    body_html: &str,
    title: Option<&str>,
    is_dark: bool,
    output_path: &Path,
) -> Result<()> {
    let html = generate_html_document(body_html, title, is_dark);
    std::fs::write(output_path, html).map_err(|e| Error::FileWrite {
        path: output_path.to_path_buf(),
        source: e,
    })?;
    info!("Exported HTML to {}", output_path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Base CSS for markdown rendering (layout, typography).
const BASE_CSS: &str = r#"
*, *::before, *::after {
    box-sizing: border-box;
}

body {
    margin: 0;
    padding: 0;
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
    font-size: 16px;
    line-height: 1.6;
}

.markdown-body {
    max-width: 900px;
    margin: 0 auto;
    padding: 32px 24px;
}

.markdown-body h1, .markdown-body h2, .markdown-body h3,
.markdown-body h4, .markdown-body h5, .markdown-body h6 {
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

.markdown-body h1 { font-size: 2em; border-bottom: 1px solid; padding-bottom: 0.3em; }
.markdown-body h2 { font-size: 1.5em; border-bottom: 1px solid; padding-bottom: 0.3em; }
.markdown-body h3 { font-size: 1.25em; }

.markdown-body p { margin-top: 0; margin-bottom: 16px; }
.markdown-body a { text-decoration: none; }
.markdown-body a:hover { text-decoration: underline; }

.markdown-body ul, .markdown-body ol {
    margin-top: 0;
    margin-bottom: 16px;
    padding-left: 2em;
}

/* Task lists */
.markdown-body ul.contains-task-list {
    list-style-type: none;
    padding-left: 0;
}

.markdown-body .task-list-item {
    display: flex;
    align-items: flex-start;
    gap: 0.5em;
}

.markdown-body .task-list-item > label {
    flex: 0 0 auto;
    user-select: none;
}

.markdown-body .task-list-item > div { flex: 1 1 auto; }
.markdown-body .task-list-item > div > p { margin: 0; }
.markdown-body .task-list-item-checkbox { margin: 0.35em 0 0 0; }
.markdown-body .task-list-item-checkbox:checked + span + * { text-decoration: line-through; }

/* Table of contents */
.markdown-body nav.table-of-contents {
    margin-bottom: 16px;
    padding: 8px 16px;
    border-left: 3px solid;
}

.markdown-body nav.table-of-contents ul { margin: 0; padding-left: 1.2em; list-style: none; }

.markdown-body blockquote {
    margin: 0 0 16px 0;
    padding: 0 1em;
    border-left: 4px solid;
}

.markdown-body code {
    font-family: 'JetBrains Mono', 'Fira Code', 'Consolas', 'Monaco', monospace;
    font-size: 0.9em;
    padding: 0.2em 0.4em;
    border-radius: 4px;
}

.markdown-body pre {
    margin-top: 0;
    margin-bottom: 16px;
    padding: 16px;
    overflow: auto;
    border-radius: 6px;
}

.markdown-body pre code { padding: 0; background: transparent; }

.markdown-body table { border-collapse: collapse; width: 100%; margin-bottom: 16px; }
.markdown-body th, .markdown-body td { padding: 8px 12px; border: 1px solid; }
.markdown-body th { font-weight: 600; text-align: left; }

.markdown-body hr { height: 2px; margin: 24px 0; border: none; }
.markdown-body del { text-decoration: line-through; }
"#;

fn generate_theme_css(palette: &Palette) -> String {
    format!(
        r#"
:root {{ color-scheme: {color_scheme}; }}
body {{ background-color: {bg}; color: {text}; }}
.markdown-body h1, .markdown-body h2 {{ border-bottom-color: {border}; }}
.markdown-body a {{ color: {link}; }}
.markdown-body blockquote {{ color: {muted}; border-left-color: {border}; }}
.markdown-body code, .markdown-body pre {{ background-color: {code_bg}; }}
.markdown-body th, .markdown-body td {{ border-color: {border}; }}
.markdown-body hr {{ background-color: {border}; }}
.markdown-body nav.table-of-contents {{ border-left-color: {accent}; }}
.markdown-body .task-list-item-checkbox {{ accent-color: {accent}; }}
"#,
        color_scheme = palette.color_scheme,
        bg = palette.background,
        text = palette.text,
        muted = palette.muted,
        border = palette.border,
        link = palette.link,
        code_bg = palette.code_bg,
        accent = palette.accent,
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
