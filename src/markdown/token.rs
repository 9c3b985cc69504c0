//! Token stream model
//!
//! A parsed document is a flat `Vec<Token>`. Nesting is carried by each
//! token's `nesting` and `level` rather than by an explicit tree: an open
//! token at level `L` is matched by a close token at level `L` further down
//! the stream, and a token's parent is the nearest preceding token at level
//! `L - 1`.

// ─────────────────────────────────────────────────────────────────────────────
// Nesting
// ─────────────────────────────────────────────────────────────────────────────

/// How a token affects nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nesting {
    /// Opens an element (level goes up after it)
    Open,
    /// Standalone element
    SelfClosing,
    /// Closes the element opened at the same level
    Close,
}

// ─────────────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────────────

/// Table cell alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellAlignment {
    #[default]
    None,
    Left,
    Center,
    Right,
}

impl CellAlignment {
    /// Inline style emitted on table cells.
    pub fn style(self) -> Option<&'static str> {
        match self {
            CellAlignment::None => None,
            CellAlignment::Left => Some("text-align:left"),
            CellAlignment::Center => Some("text-align:center"),
            CellAlignment::Right => Some("text-align:right"),
        }
    }
}

/// What a token represents. Open/close pairs share a kind and differ in
/// [`Nesting`].
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Block tokens
    Paragraph,
    Heading(u8),
    BlockQuote,
    BulletList,
    OrderedList { start: usize },
    ListItem,
    Fence,
    CodeBlock,
    HtmlBlock,
    ThematicBreak,
    Table,
    TableHead,
    TableBody,
    TableRow,
    TableCell { header: bool, align: CellAlignment },
    TableOfContents,
    /// Container for inline content; its `children` hold the inline tokens
    Inline,

    // Inline tokens
    Text,
    SoftBreak,
    HardBreak,
    CodeInline,
    HtmlInline,
    Emphasis,
    Strong,
    Strikethrough,
    Link,
    Image,

    // Synthetic task list tokens
    TaskListItemCheckbox,
    TaskListItemLabel,
}

impl TokenKind {
    /// Rule name used by the renderer registry.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Paragraph => "paragraph",
            TokenKind::Heading(_) => "heading",
            TokenKind::BlockQuote => "blockquote",
            TokenKind::BulletList => "bullet_list",
            TokenKind::OrderedList { .. } => "ordered_list",
            TokenKind::ListItem => "list_item",
            TokenKind::Fence => "fence",
            TokenKind::CodeBlock => "code_block",
            TokenKind::HtmlBlock => "html_block",
            TokenKind::ThematicBreak => "hr",
            TokenKind::Table => "table",
            TokenKind::TableHead => "thead",
            TokenKind::TableBody => "tbody",
            TokenKind::TableRow => "tr",
            TokenKind::TableCell { header: true, .. } => "th",
            TokenKind::TableCell { header: false, .. } => "td",
            TokenKind::TableOfContents => "table_of_contents",
            TokenKind::Inline => "inline",
            TokenKind::Text => "text",
            TokenKind::SoftBreak => "softbreak",
            TokenKind::HardBreak => "hardbreak",
            TokenKind::CodeInline => "code_inline",
            TokenKind::HtmlInline => "html_inline",
            TokenKind::Emphasis => "em",
            TokenKind::Strong => "strong",
            TokenKind::Strikethrough => "s",
            TokenKind::Link => "link",
            TokenKind::Image => "image",
            TokenKind::TaskListItemCheckbox => "taskListItemCheckbox",
            TokenKind::TaskListItemLabel => "taskListItemLabel",
        }
    }

    /// HTML tag used by the default renderer.
    pub fn tag(&self) -> &'static str {
        match self {
            TokenKind::Paragraph => "p",
            TokenKind::Heading(level) => match level {
                1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            TokenKind::BlockQuote => "blockquote",
            TokenKind::BulletList => "ul",
            TokenKind::OrderedList { .. } => "ol",
            TokenKind::ListItem => "li",
            TokenKind::Fence | TokenKind::CodeBlock => "code",
            TokenKind::ThematicBreak => "hr",
            TokenKind::Table => "table",
            TokenKind::TableHead => "thead",
            TokenKind::TableBody => "tbody",
            TokenKind::TableRow => "tr",
            TokenKind::TableCell { header: true, .. } => "th",
            TokenKind::TableCell { header: false, .. } => "td",
            TokenKind::TableOfContents => "nav",
            TokenKind::CodeInline => "code",
            TokenKind::Emphasis => "em",
            TokenKind::Strong => "strong",
            TokenKind::Strikethrough => "s",
            TokenKind::Link => "a",
            TokenKind::Image => "img",
            TokenKind::HardBreak => "br",
            TokenKind::TaskListItemCheckbox => "input",
            TokenKind::TaskListItemLabel => "label",
            TokenKind::HtmlBlock
            | TokenKind::Inline
            | TokenKind::Text
            | TokenKind::SoftBreak
            | TokenKind::HtmlInline => "",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attributes
// ─────────────────────────────────────────────────────────────────────────────

/// Ordered, duplicate-free set of class names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassList(Vec<String>);

impl ClassList {
    /// Add a class. Returns `false` if it was already present.
    pub fn add(&mut self, class: &str) -> bool {
        if self.contains(class) {
            return false;
        }
        self.0.push(class.to_string());
        true
    }

    pub fn contains(&self, class: &str) -> bool {
        self.0.iter().any(|c| c == class)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Space separated form used in the `class` attribute.
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

/// Token attributes: a class set plus ordered name/value pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    class: ClassList,
    entries: Vec<(String, String)>,
}

impl Attrs {
    /// Set an attribute, replacing any existing value. Setting `class`
    /// replaces the whole class set.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if name == "class" {
            self.class = ClassList::default();
            for class in value.split_whitespace() {
                self.class.add(class);
            }
            return;
        }
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name.to_string(), value)),
        }
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        if name == "class" {
            return !self.class.is_empty();
        }
        self.get(name).is_some()
    }

    /// Add a class name; repeated additions are no-ops.
    pub fn add_class(&mut self, class: &str) -> bool {
        self.class.add(class)
    }

    pub fn classes(&self) -> &ClassList {
        &self.class
    }

    /// All attributes in render order: `class` first, then insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        let class = (!self.class.is_empty()).then(|| ("class", self.class.joined()));
        class.into_iter().chain(
            self.entries
                .iter()
                .map(|(n, v)| (n.as_str(), v.clone())),
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────────────

/// Source line range a token was parsed from. `start` is 0-based, `end` is
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceMap {
    pub start: usize,
    pub end: usize,
}

/// A single element of the token stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub nesting: Nesting,
    pub level: usize,
    pub attrs: Attrs,
    /// Raw text for inline containers, text and code tokens
    pub content: String,
    /// Fence info string (language)
    pub info: String,
    pub map: Option<SourceMap>,
    /// Inline children; `Some` only for [`TokenKind::Inline`]
    pub children: Option<Vec<Token>>,
    /// Block-level token (affects line feeds when rendering)
    pub block: bool,
    /// Skipped by the renderer (paragraphs of tight lists)
    pub hidden: bool,
}

impl Token {
    pub fn new(kind: TokenKind, nesting: Nesting) -> Self {
        Self {
            kind,
            nesting,
            level: 0,
            attrs: Attrs::default(),
            content: String::new(),
            info: String::new(),
            map: None,
            children: None,
            block: false,
            hidden: false,
        }
    }

    /// Inline text token.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::new(TokenKind::Text, Nesting::SelfClosing)
        }
    }

    /// Check kind and nesting together.
    pub fn is(&self, kind: &TokenKind, nesting: Nesting) -> bool {
        &self.kind == kind && self.nesting == nesting
    }

    pub fn is_inline_container(&self) -> bool {
        self.kind == TokenKind::Inline
    }

    /// Concatenated text of this token's inline children.
    pub fn children_text(&self) -> String {
        let mut out = String::new();
        if let Some(children) = &self.children {
            collect_text(children, &mut out);
        }
        out
    }
}

/// Append the plain text carried by `tokens` (and nested children) to `out`.
pub fn collect_text(tokens: &[Token], out: &mut String) {
    for token in tokens {
        match token.kind {
            TokenKind::Text | TokenKind::CodeInline => out.push_str(&token.content),
            TokenKind::SoftBreak | TokenKind::HardBreak => out.push(' '),
            _ => {}
        }
        if let Some(children) = &token.children {
            collect_text(children, out);
        }
    }
}

/// Find the nearest token before `index` whose level is one less than the
/// level of `tokens[index]`.
pub fn find_parent(tokens: &[Token], index: usize) -> Option<usize> {
    let target = tokens.get(index)?.level.checked_sub(1)?;
    (0..index).rev().find(|&i| tokens[i].level == target)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
