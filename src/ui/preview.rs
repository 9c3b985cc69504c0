//! Rendered Markdown Preview
//!
//! Draws an [`EditorDocument`] with egui. Task item checkboxes are live when
//! the item is interactive and carries its source line; clicking one reports
//! that line so the caller can toggle it in the source.

use crate::editor::outline::flatten;
use crate::editor::{EditorDocument, EditorNode, NodeKind, TocEntry};
use crate::editor::document::TextSpan;
use eframe::egui::{self, Color32, RichText, Sense, Ui, Vec2};
use log::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Colors for the preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewColors {
    pub text: Color32,
    pub heading: Color32,
    pub muted: Color32,
    pub code_bg: Color32,
    pub code_text: Color32,
    pub quote_border: Color32,
    pub link: Color32,
    pub hr: Color32,
    pub list_marker: Color32,
}

impl PreviewColors {
    pub fn for_theme(is_dark: bool) -> Self {
        if is_dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn dark() -> Self {
        Self {
            text: Color32::from_rgb(220, 220, 220),
            heading: Color32::from_rgb(100, 180, 255),
            muted: Color32::from_rgb(140, 140, 140),
            code_bg: Color32::from_rgb(45, 45, 45),
            code_text: Color32::from_rgb(200, 200, 150),
            quote_border: Color32::from_rgb(80, 80, 80),
            link: Color32::from_rgb(100, 180, 255),
            hr: Color32::from_rgb(80, 80, 80),
            list_marker: Color32::from_rgb(150, 150, 150),
        }
    }

    pub fn light() -> Self {
        Self {
            text: Color32::from_rgb(30, 30, 30),
            heading: Color32::from_rgb(0, 100, 180),
            muted: Color32::from_rgb(120, 120, 120),
            code_bg: Color32::from_rgb(245, 245, 245),
            code_text: Color32::from_rgb(80, 80, 80),
            quote_border: Color32::from_rgb(200, 200, 200),
            link: Color32::from_rgb(0, 100, 180),
            hr: Color32::from_rgb(200, 200, 200),
            list_marker: Color32::from_rgb(100, 100, 100),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

/// User actions in the preview.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreviewOutput {
    /// Source line of a task item whose checkbox was clicked
    pub toggled_line: Option<usize>,
    /// Anchor of a clicked in-document link
    pub clicked_anchor: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// MarkdownPreview
// ─────────────────────────────────────────────────────────────────────────────

/// Read-only rendered view of a document.
pub struct MarkdownPreview<'a> {
    document: &'a EditorDocument,
    font_size: f32,
    colors: PreviewColors,
    max_width: f32,
    scroll_to_anchor: Option<&'a str>,
}

impl<'a> MarkdownPreview<'a> {
    pub fn new(document: &'a EditorDocument) -> Self {
        Self {
            document,
            font_size: 14.0,
            colors: PreviewColors::light(),
            max_width: f32::INFINITY,
            scroll_to_anchor: None,
        }
    }

    pub fn font_size(mut self, size: f32) -> Self {
        self.font_size = size;
        self
    }

    pub fn colors(mut self, colors: PreviewColors) -> Self {
        self.colors = colors;
        self
    }

    /// Limit the content column width.
    pub fn max_width(mut self, width: f32) -> Self {
        self.max_width = width;
        self
    }

    /// Scroll the heading with this anchor into view.
    pub fn scroll_to(mut self, anchor: Option<&'a str>) -> Self {
        self.scroll_to_anchor = anchor;
        self
    }

    pub fn show(self, ui: &mut Ui) -> PreviewOutput {
        let mut render = Render {
            colors: self.colors,
            font_size: self.font_size,
            scroll_to_anchor: self.scroll_to_anchor,
            headings: self.document.headings(),
            table_count: 0,
            output: PreviewOutput::default(),
        };

        let width = ui.available_width().min(self.max_width);
        let side = ((ui.available_width() - width) / 2.0).max(0.0);
        ui.horizontal_top(|ui| {
            ui.add_space(side);
            ui.vertical(|ui| {
                ui.set_width(width);
                if self.document.is_empty() {
                    ui.label(
                        RichText::new("Nothing to preview")
                            .size(self.font_size)
                            .color(self.colors.muted)
                            .italics(),
                    );
                }
                for node in &self.document.nodes {
                    render.node(ui, node, 0);
                }
            });
        });

        render.output
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Node Rendering
// ─────────────────────────────────────────────────────────────────────────────

struct Render<'a> {
    colors: PreviewColors,
    font_size: f32,
    scroll_to_anchor: Option<&'a str>,
    headings: Vec<TocEntry>,
    table_count: usize,
    output: PreviewOutput,
}

impl Render<'_> {
    fn node(&mut self, ui: &mut Ui, node: &EditorNode, depth: usize) {
        match &node.kind {
            NodeKind::Paragraph => {
                self.spans(ui, &node.spans, self.font_size, self.colors.text);
                ui.add_space(6.0);
            }
            NodeKind::Heading { level, id } => self.heading(ui, node, *level, id.as_deref()),
            NodeKind::TaskList | NodeKind::BulletList | NodeKind::OrderedList { .. } => {
                self.list(ui, node, depth)
            }
            NodeKind::TaskItem { .. } | NodeKind::ListItem => {
                // Stray item outside a list
                self.list_item(ui, node, None, depth)
            }
            NodeKind::Blockquote => self.blockquote(ui, node, depth),
            NodeKind::CodeBlock { .. } => self.code_block(ui, node),
            NodeKind::HorizontalRule => {
                ui.add_space(4.0);
                let (rect, _) =
                    ui.allocate_exact_size(Vec2::new(ui.available_width(), 1.0), Sense::hover());
                ui.painter().rect_filled(rect, 0.0, self.colors.hr);
                ui.add_space(4.0);
            }
            NodeKind::Table => self.table(ui, node),
            NodeKind::TableRow | NodeKind::TableHeader | NodeKind::TableCell => {
                self.spans(ui, &node.spans, self.font_size, self.colors.text);
                for child in &node.children {
                    self.node(ui, child, depth);
                }
            }
            NodeKind::TableOfContents => self.table_of_contents(ui),
        }
    }

    fn heading(&mut self, ui: &mut Ui, node: &EditorNode, level: u8, id: Option<&str>) {
        let size = heading_font_size(level, self.font_size);
        ui.add_space(match level {
            1 => 8.0,
            2 => 6.0,
            _ => 4.0,
        });
        let response = ui.label(
            RichText::new(node.inline_text())
                .size(size)
                .strong()
                .color(self.colors.heading),
        );
        if id.is_some() && id == self.scroll_to_anchor {
            response.scroll_to_me(Some(egui::Align::TOP));
        }
        ui.add_space(4.0);
    }

    fn list(&mut self, ui: &mut Ui, node: &EditorNode, depth: usize) {
        let mut number = match node.kind {
            NodeKind::OrderedList { start } => Some(start),
            _ => None,
        };
        for item in &node.children {
            self.list_item(ui, item, number, depth);
            number = number.map(|n| n + 1);
        }
        if depth == 0 {
            ui.add_space(4.0);
        }
    }

    fn list_item(&mut self, ui: &mut Ui, item: &EditorNode, number: Option<usize>, depth: usize) {
        ui.horizontal_top(|ui| {
            ui.add_space(4.0 + depth as f32 * 16.0);

            let mut done = false;
            match &item.kind {
                NodeKind::TaskItem {
                    checked,
                    interactive,
                    line,
                    ..
                } => {
                    done = *checked;
                    let mut value = *checked;
                    let enabled = *interactive && line.is_some();
                    let response = ui.add_enabled(enabled, egui::Checkbox::without_text(&mut value));
                    if response.changed() {
                        debug!("Preview: task checkbox clicked on line {:?}", line);
                        self.output.toggled_line = *line;
                    }
                }
                _ => {
                    ui.label(
                        RichText::new(list_marker(number, depth))
                            .size(self.font_size)
                            .color(self.colors.list_marker),
                    );
                }
            }

            ui.vertical(|ui| {
                for child in &item.children {
                    if done && child.kind == NodeKind::Paragraph {
                        self.spans(ui, &child.spans, self.font_size, self.colors.muted);
                    } else {
                        self.node(ui, child, depth + 1);
                    }
                }
            });
        });
    }

    fn blockquote(&mut self, ui: &mut Ui, node: &EditorNode, depth: usize) {
        ui.horizontal(|ui| {
            let (rect, _) =
                ui.allocate_exact_size(Vec2::new(4.0, ui.available_height()), Sense::hover());
            ui.painter().rect_filled(rect, 0.0, self.colors.quote_border);
            ui.add_space(8.0);
            ui.vertical(|ui| {
                for child in &node.children {
                    self.node(ui, child, depth + 1);
                }
            });
        });
    }

    fn code_block(&mut self, ui: &mut Ui, node: &EditorNode) {
        egui::Frame::none()
            .fill(self.colors.code_bg)
            .inner_margin(8.0)
            .rounding(4.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new(node.inline_text().trim_end_matches('\n'))
                        .monospace()
                        .size(self.font_size * 0.9)
                        .color(self.colors.code_text),
                );
            });
        ui.add_space(6.0);
    }

    fn table(&mut self, ui: &mut Ui, node: &EditorNode) {
        self.table_count += 1;
        egui::Grid::new(("preview_table", self.table_count))
            .striped(true)
            .spacing(Vec2::new(12.0, 4.0))
            .show(ui, |ui| {
                for row in &node.children {
                    for cell in &row.children {
                        let strong = cell.kind == NodeKind::TableHeader;
                        let mut text = RichText::new(cell.inline_text())
                            .size(self.font_size)
                            .color(self.colors.text);
                        if strong {
                            text = text.strong();
                        }
                        ui.label(text);
                    }
                    ui.end_row();
                }
            });
        ui.add_space(6.0);
    }

    /// Clickable heading list in place of the `tableOfContents` atom.
    fn table_of_contents(&mut self, ui: &mut Ui) {
        let entries = std::mem::take(&mut self.headings);
        egui::Frame::none()
            .stroke(egui::Stroke::new(1.0, self.colors.quote_border))
            .inner_margin(8.0)
            .rounding(4.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(
                    RichText::new("Contents")
                        .size(self.font_size * 0.9)
                        .strong()
                        .color(self.colors.muted),
                );
                for entry in flatten(&entries) {
                    ui.horizontal(|ui| {
                        ui.add_space(entry.indent_level() as f32 * 12.0);
                        let response = ui.add(
                            egui::Label::new(
                                RichText::new(&entry.text)
                                    .size(self.font_size)
                                    .color(self.colors.link),
                            )
                            .sense(Sense::click()),
                        );
                        if response.clicked() {
                            self.output.clicked_anchor = Some(entry.id.clone());
                        }
                    });
                }
            });
        self.headings = entries;
        ui.add_space(6.0);
    }

    fn spans(&mut self, ui: &mut Ui, spans: &[TextSpan], size: f32, color: Color32) {
        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            for span in spans {
                let mut text = RichText::new(&span.text).size(size).color(color);
                if span.style.strong {
                    text = text.strong();
                }
                if span.style.emphasis {
                    text = text.italics();
                }
                if span.style.code {
                    text = text.code().color(self.colors.code_text);
                }
                if span.style.strike {
                    text = text.strikethrough();
                }

                match &span.link {
                    Some(href) => {
                        let response = ui
                            .add(
                                egui::Label::new(text.color(self.colors.link).underline())
                                    .sense(Sense::click()),
                            )
                            .on_hover_text(href.as_str());
                        if response.clicked() {
                            match href.strip_prefix('#') {
                                Some(anchor) => self.output.clicked_anchor = Some(anchor.to_string()),
                                None => ui.ctx().open_url(egui::OpenUrl::new_tab(href)),
                            }
                        }
                    }
                    None => {
                        ui.label(text);
                    }
                }
            }
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

fn heading_font_size(level: u8, base: f32) -> f32 {
    match level {
        1 => base * 1.8,
        2 => base * 1.5,
        3 => base * 1.3,
        4 => base * 1.15,
        5 => base * 1.05,
        _ => base,
    }
}

fn list_marker(number: Option<usize>, depth: usize) -> String {
    match number {
        Some(n) => format!("{}.", n),
        None => match depth % 3 {
            0 => "•",
            1 => "◦",
            _ => "▪",
        }
        .to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
