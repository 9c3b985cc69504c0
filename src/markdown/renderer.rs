//! HTML renderer for the token stream
//!
//! Rendering is table driven: a rule registered for a token kind name and
//! nesting wins over the built-in rendering. Plugins register rules for the
//! synthetic tokens they introduce.

use std::collections::HashMap;

use super::token::{Attrs, Nesting, Token, TokenKind};

/// A render callback: receives the token slice being rendered (block stream
/// or inline children) and the index of the token to render.
pub type RenderRule = Box<dyn Fn(&[Token], usize, &HtmlRenderer) -> String>;

/// Renders token streams to HTML.
pub struct HtmlRenderer {
    rules: HashMap<(&'static str, Nesting), RenderRule>,
    allow_html: bool,
}

impl std::fmt::Debug for HtmlRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HtmlRenderer")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("allow_html", &self.allow_html)
            .finish()
    }
}

impl HtmlRenderer {
    /// Create a renderer with only built-in rendering.
    pub fn new(allow_html: bool) -> Self {
        Self {
            rules: HashMap::new(),
            allow_html,
        }
    }

    /// Register (or replace) the rule for a token kind name and nesting.
    pub fn set_rule<F>(&mut self, name: &'static str, nesting: Nesting, rule: F)
    where
        F: Fn(&[Token], usize, &HtmlRenderer) -> String + 'static,
    {
        self.rules.insert((name, nesting), Box::new(rule));
    }

    /// Render a block-level token stream.
    pub fn render(&self, tokens: &[Token]) -> String {
        let mut out = String::new();
        for (idx, token) in tokens.iter().enumerate() {
            if token.kind == TokenKind::Inline {
                if let Some(children) = &token.children {
                    out.push_str(&self.render_inline(children));
                }
            } else {
                out.push_str(&self.render_at(tokens, idx));
            }
        }
        out
    }

    /// Render the children of an inline token.
    pub fn render_inline(&self, tokens: &[Token]) -> String {
        (0..tokens.len())
            .map(|idx| self.render_at(tokens, idx))
            .collect()
    }

    fn render_at(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        match self.rules.get(&(token.kind.name(), token.nesting)) {
            Some(rule) => rule(tokens, idx, self),
            None => self.render_builtin(tokens, idx),
        }
    }

    fn render_builtin(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        match token.kind {
            TokenKind::Text => escape_html(&token.content),
            TokenKind::SoftBreak => "\n".to_string(),
            TokenKind::HardBreak => "<br>\n".to_string(),
            TokenKind::CodeInline => format!(
                "<code{}>{}</code>",
                render_attrs(&token.attrs),
                escape_html(&token.content)
            ),
            TokenKind::CodeBlock => format!(
                "<pre{}><code>{}</code></pre>\n",
                render_attrs(&token.attrs),
                escape_html(&token.content)
            ),
            TokenKind::Fence => {
                let mut attrs = token.attrs.clone();
                if !token.info.is_empty() {
                    attrs.add_class(&format!("language-{}", token.info));
                }
                format!(
                    "<pre><code{}>{}</code></pre>\n",
                    render_attrs(&attrs),
                    escape_html(&token.content)
                )
            }
            TokenKind::HtmlBlock | TokenKind::HtmlInline => {
                if self.allow_html {
                    token.content.clone()
                } else {
                    escape_html(&token.content)
                }
            }
            TokenKind::Image => {
                let mut attrs = token.attrs.clone();
                attrs.set("alt", token.content.clone());
                format!("<img{}>", render_attrs(&attrs))
            }
            _ => self.render_token(tokens, idx),
        }
    }

    /// Generic tag rendering with markdown-it's line feed rules.
    pub fn render_token(&self, tokens: &[Token], idx: usize) -> String {
        let token = &tokens[idx];
        if token.hidden {
            return String::new();
        }

        let mut out = String::new();

        // Block tokens after a hidden one start on a new line
        if token.block && token.nesting != Nesting::Close && idx > 0 && tokens[idx - 1].hidden {
            out.push('\n');
        }

        out.push_str(if token.nesting == Nesting::Close {
            "</"
        } else {
            "<"
        });
        out.push_str(token.kind.tag());
        if token.nesting != Nesting::Close {
            out.push_str(&render_attrs(&token.attrs));
        }
        out.push('>');

        let mut need_lf = token.block;
        if token.block && token.nesting == Nesting::Open {
            if let Some(next) = tokens.get(idx + 1) {
                if next.kind == TokenKind::Inline || next.hidden {
                    need_lf = false;
                } else if next.nesting == Nesting::Close && next.kind.tag() == token.kind.tag() {
                    need_lf = false;
                }
            }
        }
        if need_lf {
            out.push('\n');
        }

        out
    }
}

/// Render attributes as ` name="value"` pairs.
pub fn render_attrs(attrs: &Attrs) -> String {
    attrs
        .iter()
        .map(|(name, value)| format!(" {}=\"{}\"", escape_html(name), escape_html(&value)))
        .collect()
}

/// Escape text for HTML output.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
