//! Markdown processing pipeline
//!
//! A [`MarkdownPipeline`] runs an ordered list of named core rules over a
//! token stream and renders the result with an [`HtmlRenderer`]. Plugins hook
//! in by positioning their own core rules relative to the built-in ones and
//! registering render rules for the tokens they add.

use log::debug;

use super::parser::{join_text, tokenize, MarkdownOptions};
use super::renderer::HtmlRenderer;
use super::toc;
use super::token::Token;
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Core rules
// ─────────────────────────────────────────────────────────────────────────────

/// State shared by core rules during one parse.
#[derive(Debug)]
pub struct CoreState<'s> {
    /// Markdown source being parsed
    pub src: &'s str,
    /// Token stream, built by the `block` rule
    pub tokens: Vec<Token>,
}

/// A core rule. The return value follows the markdown-it convention and is
/// `false` for passes that never terminate the chain.
pub type CoreRule = Box<dyn Fn(&mut CoreState<'_>) -> bool>;

struct NamedRule {
    name: String,
    rule: CoreRule,
}

/// Ordered collection of named core rules.
#[derive(Default)]
pub struct CoreRuler {
    rules: Vec<NamedRule>,
}

impl std::fmt::Debug for CoreRuler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl CoreRuler {
    /// Append a rule to the end of the chain.
    pub fn push<F>(&mut self, name: &str, rule: F)
    where
        F: Fn(&mut CoreState<'_>) -> bool + 'static,
    {
        self.rules.push(NamedRule {
            name: name.to_string(),
            rule: Box::new(rule),
        });
    }

    /// Insert a rule directly after the rule named `after`.
    pub fn insert_after<F>(&mut self, after: &str, name: &str, rule: F) -> Result<()>
    where
        F: Fn(&mut CoreState<'_>) -> bool + 'static,
    {
        let index = self.position(after)?;
        self.rules.insert(
            index + 1,
            NamedRule {
                name: name.to_string(),
                rule: Box::new(rule),
            },
        );
        Ok(())
    }

    /// Insert a rule directly before the rule named `before`.
    #[allow(dead_code)]
    pub fn insert_before<F>(&mut self, before: &str, name: &str, rule: F) -> Result<()>
    where
        F: Fn(&mut CoreState<'_>) -> bool + 'static,
    {
        let index = self.position(before)?;
        self.rules.insert(
            index,
            NamedRule {
                name: name.to_string(),
                rule: Box::new(rule),
            },
        );
        Ok(())
    }

    /// Rule names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name.as_str()).collect()
    }

    fn position(&self, name: &str) -> Result<usize> {
        self.rules
            .iter()
            .position(|r| r.name == name)
            .ok_or_else(|| Error::UnknownRule(name.to_string()))
    }

    fn run(&self, state: &mut CoreState<'_>) {
        for rule in &self.rules {
            (rule.rule)(state);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Plugins
// ─────────────────────────────────────────────────────────────────────────────

/// Something that extends a pipeline with core and render rules.
pub trait MarkdownPlugin {
    fn install(self, pipeline: &mut MarkdownPipeline) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// MarkdownPipeline
// ─────────────────────────────────────────────────────────────────────────────

/// Parser + core rules + renderer.
#[derive(Debug)]
pub struct MarkdownPipeline {
    pub core: CoreRuler,
    pub renderer: HtmlRenderer,
}

impl Default for MarkdownPipeline {
    fn default() -> Self {
        Self::new(MarkdownOptions::default())
    }
}

impl MarkdownPipeline {
    /// Create a pipeline with the built-in rules:
    /// `block` → `inline` → `heading_ids` → `toc`.
    pub fn new(options: MarkdownOptions) -> Self {
        let mut core = CoreRuler::default();
        let mut renderer = HtmlRenderer::new(options.allow_html);

        core.push("block", move |state| {
            state.tokens = tokenize(state.src, &options);
            false
        });
        core.push("inline", |state| {
            join_text(&mut state.tokens);
            false
        });
        core.push("heading_ids", |state| {
            toc::assign_heading_ids(&mut state.tokens);
            false
        });
        core.push("toc", |state| {
            toc::replace_toc_markers(&mut state.tokens);
            false
        });
        toc::register_render_rule(&mut renderer);

        Self { core, renderer }
    }

    /// Install a plugin.
    pub fn use_plugin(&mut self, plugin: impl MarkdownPlugin) -> Result<&mut Self> {
        plugin.install(self)?;
        Ok(self)
    }

    /// Run all core rules and return the token stream.
    pub fn parse(&self, src: &str) -> Vec<Token> {
        let mut state = CoreState {
            src,
            tokens: Vec::new(),
        };
        self.core.run(&mut state);
        debug!("Parsed {} block tokens", state.tokens.len());
        state.tokens
    }

    /// Render an already parsed token stream.
    pub fn render_tokens(&self, tokens: &[Token]) -> String {
        self.renderer.render(tokens)
    }

    /// Parse and render markdown to HTML.
    pub fn render(&self, src: &str) -> String {
        self.render_tokens(&self.parse(src))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::token::{Nesting, TokenKind};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_builtin_rule_order() {
        let pipeline = MarkdownPipeline::default();
        assert_eq!(
            pipeline.core.names(),
            vec!["block", "inline", "heading_ids", "toc"]
        );
    }

    #[test]
    fn test_insert_after_and_before() {
        let mut pipeline = MarkdownPipeline::default();
        pipeline
            .core
            .insert_after("inline", "after_inline", |_| false)
            .unwrap();
        pipeline
            .core
            .insert_before("block", "first", |_| false)
            .unwrap();
        assert_eq!(
            pipeline.core.names(),
            vec!["first", "block", "inline", "after_inline", "heading_ids", "toc"]
        );
    }

    #[test]
    fn test_insert_after_unknown_rule_fails() {
        let mut pipeline = MarkdownPipeline::default();
        let result = pipeline.core.insert_after("missing", "x", |_| false);
        assert!(matches!(result, Err(Error::UnknownRule(name)) if name == "missing"));
    }

    #[test]
    fn test_rule_sees_joined_inline_children() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = MarkdownPipeline::default();
        let sink = Rc::clone(&seen);
        pipeline
            .core
            .insert_after("inline", "spy", move |state| {
                for token in state.tokens.iter().filter(|t| t.is_inline_container()) {
                    if let Some(first) = token.children.as_ref().and_then(|c| c.first()) {
                        sink.borrow_mut().push(first.content.clone());
                    }
                }
                false
            })
            .unwrap();

        pipeline.parse("- [ ] walk dog");
        assert_eq!(seen.borrow().as_slice(), ["[ ] walk dog"]);
    }

    #[test]
    fn test_render_end_to_end() {
        let pipeline = MarkdownPipeline::default();
        assert_eq!(pipeline.render("Some *text*"), "<p>Some <em>text</em></p>\n");
    }

    #[test]
    fn test_plugin_install() {
        struct Shout;
        impl MarkdownPlugin for Shout {
            fn install(self, pipeline: &mut MarkdownPipeline) -> Result<()> {
                pipeline
                    .renderer
                    .set_rule("text", Nesting::SelfClosing, |tokens, idx, _| {
                        tokens[idx].content.to_uppercase()
                    });
                Ok(())
            }
        }

        let mut pipeline = MarkdownPipeline::default();
        pipeline.use_plugin(Shout).unwrap();
        assert_eq!(pipeline.render("hey"), "<p>HEY</p>\n");
        assert!(pipeline
            .parse("hey")
            .iter()
            .any(|t| t.kind == TokenKind::Inline));
    }
}
