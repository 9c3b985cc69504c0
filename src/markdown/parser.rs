//! Markdown tokenizer built on comrak
//!
//! comrak does the actual CommonMark + GFM parsing. This module flattens the
//! comrak AST into the token stream the rest of the pipeline works on:
//! block tokens carry open/close nesting and levels, and every paragraph,
//! heading and table cell gets an `Inline` token whose children hold the
//! inline tokens.

use comrak::{
    nodes::{AstNode, ListType as ComrakListType, NodeValue, TableAlignment},
    parse_document, Arena, Options,
};

use super::token::{collect_text, CellAlignment, Nesting, SourceMap, Token, TokenKind};

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration options for markdown parsing and rendering.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable GitHub Flavored Markdown tables
    pub tables: bool,
    /// Enable strikethrough syntax (~~text~~)
    pub strikethrough: bool,
    /// Enable autolink URLs and emails
    pub autolink: bool,
    /// Pass raw HTML through instead of escaping it
    pub allow_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            autolink: true,
            allow_html: true,
        }
    }
}

impl MarkdownOptions {
    /// Convert to comrak Options.
    ///
    /// comrak's own tasklist extension stays off: task list items are
    /// recognized on the token stream so they can be annotated.
    fn to_comrak_options(&self) -> Options {
        let mut options = Options::default();

        options.extension.strikethrough = self.strikethrough;
        options.extension.table = self.tables;
        options.extension.autolink = self.autolink;
        options.extension.tasklist = false;

        options
    }
}

impl From<TableAlignment> for CellAlignment {
    fn from(align: TableAlignment) -> Self {
        match align {
            TableAlignment::None => CellAlignment::None,
            TableAlignment::Left => CellAlignment::Left,
            TableAlignment::Center => CellAlignment::Center,
            TableAlignment::Right => CellAlignment::Right,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Parse markdown into a flat token stream.
pub fn tokenize(markdown: &str, options: &MarkdownOptions) -> Vec<Token> {
    let arena = Arena::new();
    let root = parse_document(&arena, markdown, &options.to_comrak_options());

    let mut emitter = TokenEmitter {
        lines: markdown.lines().collect(),
        tokens: Vec::new(),
        level: 0,
    };
    emitter.block(root, false);
    emitter.tokens
}

/// Merge adjacent text children of every inline token.
///
/// comrak splits text around characters that might start inline syntax
/// (`[`, `]`, `*`...), so `[x] buy milk` can arrive as several text nodes.
pub fn join_text(tokens: &mut [Token]) {
    for token in tokens.iter_mut().filter(|t| t.is_inline_container()) {
        let Some(children) = token.children.as_mut() else {
            continue;
        };

        let mut joined: Vec<Token> = Vec::with_capacity(children.len());
        for child in children.drain(..) {
            if child.kind == TokenKind::Text {
                if let Some(last) = joined.last_mut().filter(|t| t.kind == TokenKind::Text) {
                    last.content.push_str(&child.content);
                    continue;
                }
            }
            joined.push(child);
        }
        *children = joined;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Conversion
// ─────────────────────────────────────────────────────────────────────────────

struct TokenEmitter<'s> {
    lines: Vec<&'s str>,
    tokens: Vec<Token>,
    level: usize,
}

impl<'s> TokenEmitter<'s> {
    fn open(&mut self, kind: TokenKind, map: Option<SourceMap>) -> &mut Token {
        let mut token = Token::new(kind, Nesting::Open);
        token.level = self.level;
        token.block = true;
        token.map = map;
        self.level += 1;
        self.push(token)
    }

    fn close(&mut self, kind: TokenKind) -> &mut Token {
        self.level = self.level.saturating_sub(1);
        let mut token = Token::new(kind, Nesting::Close);
        token.level = self.level;
        token.block = true;
        self.push(token)
    }

    fn leaf(&mut self, kind: TokenKind, map: Option<SourceMap>) -> &mut Token {
        let mut token = Token::new(kind, Nesting::SelfClosing);
        token.level = self.level;
        token.block = true;
        token.map = map;
        self.push(token)
    }

    fn push(&mut self, token: Token) -> &mut Token {
        self.tokens.push(token);
        let last = self.tokens.len() - 1;
        &mut self.tokens[last]
    }

    /// Emit the block tokens for `node`. `tight` hides paragraphs that are
    /// direct children of a tight list item.
    fn block<'a>(&mut self, node: &'a AstNode<'a>, tight: bool) {
        let ast = node.data.borrow();
        let map = source_map(node);

        match &ast.value {
            NodeValue::Paragraph => {
                self.open(TokenKind::Paragraph, map).hidden = tight;
                let content = self.paragraph_content(node);
                self.inline(node, map, content);
                self.close(TokenKind::Paragraph).hidden = tight;
            }
            NodeValue::Heading(heading) => {
                let kind = TokenKind::Heading(heading.level.clamp(1, 6));
                self.open(kind.clone(), map);
                self.inline(node, map, String::new());
                self.close(kind);
            }
            NodeValue::BlockQuote => {
                self.open(TokenKind::BlockQuote, map);
                self.children(node, false);
                self.close(TokenKind::BlockQuote);
            }
            NodeValue::List(list) => {
                let kind = match list.list_type {
                    ComrakListType::Bullet => TokenKind::BulletList,
                    ComrakListType::Ordered => TokenKind::OrderedList { start: list.start },
                };
                let list_tight = list.tight;
                self.open(kind.clone(), map);
                for item in node.children() {
                    self.block(item, list_tight);
                }
                self.close(kind);
            }
            NodeValue::Item(_) => {
                self.open(TokenKind::ListItem, map);
                self.children(node, tight);
                self.close(TokenKind::ListItem);
            }
            NodeValue::CodeBlock(code) => {
                let kind = if code.fenced {
                    TokenKind::Fence
                } else {
                    TokenKind::CodeBlock
                };
                let token = self.leaf(kind, map);
                token.content = code.literal.clone();
                token.info = code.info.split_whitespace().next().unwrap_or("").to_string();
            }
            NodeValue::HtmlBlock(html) => {
                self.leaf(TokenKind::HtmlBlock, map).content = html.literal.clone();
            }
            NodeValue::ThematicBreak => {
                self.leaf(TokenKind::ThematicBreak, map);
            }
            NodeValue::Table(table) => {
                let alignments: Vec<CellAlignment> =
                    table.alignments.iter().map(|a| CellAlignment::from(*a)).collect();
                self.table(node, map, &alignments);
            }
            NodeValue::FrontMatter(_) => {}
            _ => self.children(node, tight),
        }
    }

    fn children<'a>(&mut self, node: &'a AstNode<'a>, tight: bool) {
        for child in node.children() {
            self.block(child, tight);
        }
    }

    fn table<'a>(
        &mut self,
        node: &'a AstNode<'a>,
        map: Option<SourceMap>,
        alignments: &[CellAlignment],
    ) {
        self.open(TokenKind::Table, map);

        let rows: Vec<_> = node.children().collect();
        let is_header = |row: &&'a AstNode<'a>| {
            matches!(row.data.borrow().value, NodeValue::TableRow(true))
        };
        let (head, body): (Vec<_>, Vec<_>) = rows.into_iter().partition(is_header);

        if !head.is_empty() {
            self.open(TokenKind::TableHead, map);
            for row in head {
                self.table_row(row, true, alignments);
            }
            self.close(TokenKind::TableHead);
        }

        if !body.is_empty() {
            self.open(TokenKind::TableBody, None);
            for row in body {
                self.table_row(row, false, alignments);
            }
            self.close(TokenKind::TableBody);
        }

        self.close(TokenKind::Table);
    }

    fn table_row<'a>(&mut self, row: &'a AstNode<'a>, header: bool, alignments: &[CellAlignment]) {
        let map = source_map(row);
        self.open(TokenKind::TableRow, map);
        for (column, cell) in row.children().enumerate() {
            let align = alignments.get(column).copied().unwrap_or_default();
            let kind = TokenKind::TableCell { header, align };
            let token = self.open(kind.clone(), map);
            if let Some(style) = align.style() {
                token.attrs.set("style", style);
            }
            self.inline(cell, map, String::new());
            self.close(kind);
        }
        self.close(TokenKind::TableRow);
    }

    /// Emit an `Inline` token for the inline children of `node`. An empty
    /// `content` is replaced by the children's plain text.
    fn inline<'a>(&mut self, node: &'a AstNode<'a>, map: Option<SourceMap>, content: String) {
        let mut children = Vec::new();
        let mut level = 0;
        push_inline(node, &mut children, &mut level);

        let mut token = Token::new(TokenKind::Inline, Nesting::SelfClosing);
        token.level = self.level;
        token.block = true;
        token.map = map;
        token.children = Some(children);
        token.content = if content.is_empty() {
            token.children_text()
        } else {
            content
        };
        self.push(token);
    }

    /// Raw source text of a paragraph: the first line from the paragraph's
    /// start column, continuation lines with their indentation removed.
    fn paragraph_content<'a>(&self, node: &'a AstNode<'a>) -> String {
        let pos = node.data.borrow().sourcepos;
        if pos.start.line == 0 {
            return String::new();
        }

        let mut parts = Vec::new();
        for line_no in pos.start.line..=pos.end.line.max(pos.start.line) {
            let Some(line) = self.lines.get(line_no - 1) else {
                break;
            };
            let text = if line_no == pos.start.line {
                line.get(pos.start.column.saturating_sub(1)..).unwrap_or(line)
            } else {
                line.trim_start()
            };
            parts.push(text.trim_end());
        }
        parts.join("\n")
    }
}

/// Convert comrak inline nodes under `node` into inline tokens.
fn push_inline<'a>(node: &'a AstNode<'a>, out: &mut Vec<Token>, level: &mut usize) {
    for child in node.children() {
        let ast = child.data.borrow();
        match &ast.value {
            NodeValue::Text(text) => out.push(leveled(Token::text(text.clone()), *level)),
            NodeValue::SoftBreak => out.push(leveled(
                Token::new(TokenKind::SoftBreak, Nesting::SelfClosing),
                *level,
            )),
            NodeValue::LineBreak => out.push(leveled(
                Token::new(TokenKind::HardBreak, Nesting::SelfClosing),
                *level,
            )),
            NodeValue::Code(code) => {
                let mut token = leveled(
                    Token::new(TokenKind::CodeInline, Nesting::SelfClosing),
                    *level,
                );
                token.content = code.literal.clone();
                out.push(token);
            }
            NodeValue::HtmlInline(html) => {
                let mut token = leveled(
                    Token::new(TokenKind::HtmlInline, Nesting::SelfClosing),
                    *level,
                );
                token.content = html.clone();
                out.push(token);
            }
            NodeValue::Emph => push_pair(child, TokenKind::Emphasis, Vec::new(), out, level),
            NodeValue::Strong => push_pair(child, TokenKind::Strong, Vec::new(), out, level),
            NodeValue::Strikethrough => {
                push_pair(child, TokenKind::Strikethrough, Vec::new(), out, level)
            }
            NodeValue::Link(link) => {
                let mut attrs = vec![("href", link.url.clone())];
                if !link.title.is_empty() {
                    attrs.push(("title", link.title.clone()));
                }
                push_pair(child, TokenKind::Link, attrs, out, level);
            }
            NodeValue::Image(image) => {
                let mut token = leveled(Token::new(TokenKind::Image, Nesting::SelfClosing), *level);
                token.attrs.set("src", image.url.clone());
                token.attrs.set("alt", "");
                if !image.title.is_empty() {
                    token.attrs.set("title", image.title.clone());
                }
                let mut alt = Vec::new();
                push_inline(child, &mut alt, &mut 0);
                collect_text(&alt, &mut token.content);
                token.children = Some(alt);
                out.push(token);
            }
            _ => push_inline(child, out, level),
        }
    }
}

fn push_pair<'a>(
    node: &'a AstNode<'a>,
    kind: TokenKind,
    attrs: Vec<(&str, String)>,
    out: &mut Vec<Token>,
    level: &mut usize,
) {
    let mut open = leveled(Token::new(kind.clone(), Nesting::Open), *level);
    for (name, value) in attrs {
        open.attrs.set(name, value);
    }
    out.push(open);

    *level += 1;
    push_inline(node, out, level);
    *level -= 1;

    out.push(leveled(Token::new(kind, Nesting::Close), *level));
}

fn leveled(mut token: Token, level: usize) -> Token {
    token.level = level;
    token
}

fn source_map<'a>(node: &'a AstNode<'a>) -> Option<SourceMap> {
    let pos = node.data.borrow().sourcepos;
    if pos.start.line == 0 {
        return None;
    }
    Some(SourceMap {
        start: pos.start.line - 1,
        end: pos.end.line.max(pos.start.line),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
