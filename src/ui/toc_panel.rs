//! Table of Contents Panel Component
//!
//! A right side panel listing the document headings. It is only shown while
//! the document contains a table of contents node, and collapses to a strip
//! of level bars when the document uses the full window width.

use std::cell::Cell;
use std::rc::Rc;

use crate::config::DocumentWidth;
use crate::editor::outline::{flatten, summary, MAX_LEVEL};
use crate::editor::{Editor, EditorEvent, Subscription, TocEntry};
use eframe::egui::{self, Color32, Rect, Response, RichText, ScrollArea, Sense, Ui, Vec2};
use log::debug;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Panel width while collapsed.
pub const COLLAPSED_WIDTH: f32 = 56.0;

/// Panel width while expanded.
pub const EXPANDED_WIDTH: f32 = 180.0;

/// Indentation per heading level when expanded.
const INDENT_PER_LEVEL: f32 = 10.0;

/// Height of each expanded entry.
const ITEM_HEIGHT: f32 = 22.0;

/// Height of each collapsed bar row.
const BAR_ROW_HEIGHT: f32 = 10.0;

// ─────────────────────────────────────────────────────────────────────────────
// TocPanelOutput
// ─────────────────────────────────────────────────────────────────────────────

/// Output from the TOC panel indicating user actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TocPanelOutput {
    /// Anchor id of the clicked heading
    pub scroll_to_anchor: Option<String>,
    /// 0-based source line of the clicked heading, when known
    pub scroll_to_line: Option<usize>,
    /// Whether the collapse toggle was clicked
    pub collapse_toggled: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// TocPanel
// ─────────────────────────────────────────────────────────────────────────────

/// The table of contents side panel.
#[derive(Debug, Default)]
pub struct TocPanel {
    collapsed: bool,
    /// Whether the attached document has a table of contents node
    has_toc: Rc<Cell<bool>>,
    subscription: Option<Subscription>,
    /// Width seen by the last `sync_document_width` call
    last_width: Option<DocumentWidth>,
    /// Heading id of the section under the cursor
    current_section: Option<String>,
}

impl TocPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `editor`'s document, replacing any previous attachment.
    pub fn attach(&mut self, editor: &Editor) {
        if self.is_attached() {
            self.detach();
        }
        self.has_toc
            .set(editor.document().contains("tableOfContents"));

        let has_toc = Rc::clone(&self.has_toc);
        self.subscription = Some(editor.subscribe(EditorEvent::Transaction, move |event| {
            has_toc.set(event.document.contains("tableOfContents"));
        }));
        debug!("TOC panel attached (has toc: {})", self.has_toc.get());
    }

    /// Stop tracking the editor. The panel hides until attached again.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.has_toc.set(false);
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Whether the panel should be drawn at all.
    pub fn is_visible(&self) -> bool {
        self.has_toc.get()
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Collapse for full width documents and expand otherwise.
    ///
    /// Only a change of width has an effect, so a manual toggle sticks until
    /// the width setting changes again.
    pub fn sync_document_width(&mut self, width: DocumentWidth) {
        if self.last_width == Some(width) {
            return;
        }
        self.last_width = Some(width);
        self.collapsed = width == DocumentWidth::FullWidth;
        debug!("TOC panel collapsed: {}", self.collapsed);
    }

    pub fn toggle_collapsed(&mut self) {
        self.collapsed = !self.collapsed;
    }

    pub fn set_current_section(&mut self, id: Option<String>) {
        self.current_section = id;
    }

    /// Current panel width.
    pub fn width(&self) -> f32 {
        if self.collapsed {
            COLLAPSED_WIDTH
        } else {
            EXPANDED_WIDTH
        }
    }

    /// Render the panel.
    ///
    /// Draws nothing while the document has no table of contents node.
    pub fn show(&mut self, ctx: &egui::Context, entries: &[TocEntry], is_dark: bool) -> TocPanelOutput {
        let mut output = TocPanelOutput::default();
        if !self.is_visible() {
            return output;
        }

        let panel_bg = if is_dark {
            Color32::from_rgb(35, 35, 35)
        } else {
            Color32::from_rgb(250, 250, 250)
        };

        let border_color = if is_dark {
            Color32::from_rgb(60, 60, 60)
        } else {
            Color32::from_rgb(210, 210, 210)
        };

        let text_color = if is_dark {
            Color32::from_rgb(200, 200, 200)
        } else {
            Color32::from_rgb(50, 50, 50)
        };

        let muted_color = if is_dark {
            Color32::from_rgb(130, 130, 130)
        } else {
            Color32::from_rgb(120, 120, 120)
        };

        let colors = ItemColors {
            text: text_color,
            highlight: if is_dark {
                Color32::from_rgb(60, 80, 110)
            } else {
                Color32::from_rgb(220, 235, 250)
            },
            hover: if is_dark {
                Color32::from_rgb(50, 50, 55)
            } else {
                Color32::from_rgb(235, 235, 240)
            },
        };

        let items = flatten(entries);

        egui::SidePanel::right("toc_panel")
            .resizable(false)
            .exact_width(self.width())
            .frame(
                egui::Frame::none()
                    .fill(panel_bg)
                    .stroke(egui::Stroke::new(1.0, border_color)),
            )
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing = Vec2::new(0.0, 2.0);

                ui.horizontal(|ui| {
                    ui.add_space(6.0);
                    if !self.collapsed {
                        ui.label(RichText::new("Contents").size(12.0).strong().color(text_color));
                    }
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_space(4.0);
                        let (icon, hint) = if self.collapsed {
                            ("«", "Expand contents")
                        } else {
                            ("»", "Collapse contents")
                        };
                        if ui
                            .add(
                                egui::Button::new(RichText::new(icon).size(14.0).color(muted_color))
                                    .frame(false)
                                    .min_size(Vec2::new(20.0, 20.0)),
                            )
                            .on_hover_text(hint)
                            .clicked()
                        {
                            output.collapse_toggled = true;
                        }
                    });
                });
                ui.separator();

                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        if items.is_empty() {
                            if !self.collapsed {
                                ui.add_space(12.0);
                                ui.vertical_centered(|ui| {
                                    ui.label(
                                        RichText::new("No headings found")
                                            .size(11.0)
                                            .color(muted_color)
                                            .italics(),
                                    );
                                });
                            }
                            return;
                        }

                        if !self.collapsed {
                            ui.horizontal(|ui| {
                                ui.add_space(6.0);
                                ui.label(RichText::new(summary(entries)).size(10.0).color(muted_color));
                            });
                            ui.add_space(4.0);
                        }

                        for item in &items {
                            let is_current = self.current_section.as_deref() == Some(item.id.as_str());
                            let response = if self.collapsed {
                                render_bar(ui, item, is_current, &colors, is_dark)
                            } else {
                                render_entry(ui, item, is_current, &colors, is_dark)
                            };
                            if response.clicked() {
                                debug!("TOC: clicked heading '{}'", item.id);
                                output.scroll_to_anchor = Some(item.id.clone());
                                output.scroll_to_line = item.line;
                            }
                        }
                    });
            });

        if output.collapse_toggled {
            self.toggle_collapsed();
        }
        output
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Item Rendering
// ─────────────────────────────────────────────────────────────────────────────

struct ItemColors {
    text: Color32,
    highlight: Color32,
    hover: Color32,
}

fn paint_background(ui: &Ui, rect: Rect, response: &Response, is_current: bool, colors: &ItemColors) {
    if is_current {
        ui.painter()
            .rect_filled(rect, egui::Rounding::same(3.0), colors.highlight);
    } else if response.hovered() {
        ui.painter()
            .rect_filled(rect, egui::Rounding::same(3.0), colors.hover);
    }
}

/// Expanded entry: indented heading text.
fn render_entry(ui: &mut Ui, item: &TocEntry, is_current: bool, colors: &ItemColors, is_dark: bool) -> Response {
    let (rect, response) =
        ui.allocate_exact_size(Vec2::new(ui.available_width(), ITEM_HEIGHT), Sense::click());
    paint_background(ui, rect, &response, is_current, colors);

    let x = rect.min.x + 6.0 + item.indent_level() as f32 * INDENT_PER_LEVEL;
    ui.painter().rect_filled(
        Rect::from_min_size(egui::pos2(x, rect.center().y - 5.0), Vec2::new(2.0, 10.0)),
        egui::Rounding::same(1.0),
        heading_level_color(item.level, is_dark),
    );

    let title_x = x + 8.0;
    let title = truncate_text(&item.text, rect.max.x - title_x - 4.0, 11.0);
    ui.painter().text(
        egui::pos2(title_x, rect.center().y),
        egui::Align2::LEFT_CENTER,
        title,
        egui::FontId::proportional(11.0),
        colors.text,
    );

    response.on_hover_text(item.text.as_str())
}

/// Collapsed entry: a bar whose width shrinks with depth.
fn render_bar(ui: &mut Ui, item: &TocEntry, is_current: bool, colors: &ItemColors, is_dark: bool) -> Response {
    let (rect, response) =
        ui.allocate_exact_size(Vec2::new(ui.available_width(), BAR_ROW_HEIGHT), Sense::click());
    paint_background(ui, rect, &response, is_current, colors);

    let bar = Rect::from_min_size(
        egui::pos2(rect.max.x - 4.0 - bar_width(item.level), rect.center().y - 1.5),
        Vec2::new(bar_width(item.level), 3.0),
    );
    ui.painter().rect_filled(
        bar,
        egui::Rounding::same(1.5),
        heading_level_color(item.level, is_dark),
    );

    response.on_hover_text(item.text.as_str())
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Width of a collapsed bar: 8 px per level below `MAX_LEVEL`, plus one.
fn bar_width(level: u8) -> f32 {
    let level = level.clamp(1, MAX_LEVEL);
    8.0 * f32::from(MAX_LEVEL - level + 1)
}

/// Get a color for the heading level indicator.
fn heading_level_color(level: u8, is_dark: bool) -> Color32 {
    if is_dark {
        match level {
            1 => Color32::from_rgb(130, 180, 255), // Blue
            2 => Color32::from_rgb(150, 220, 150), // Green
            3 => Color32::from_rgb(220, 180, 120), // Orange
            4 => Color32::from_rgb(200, 150, 200), // Purple
            _ => Color32::from_rgb(160, 160, 160),
        }
    } else {
        match level {
            1 => Color32::from_rgb(40, 100, 180),
            2 => Color32::from_rgb(50, 140, 50),
            3 => Color32::from_rgb(180, 120, 40),
            4 => Color32::from_rgb(140, 80, 140),
            _ => Color32::from_rgb(110, 110, 110),
        }
    }
}

/// Truncate text to fit within a given width.
fn truncate_text(text: &str, max_width: f32, font_size: f32) -> String {
    // Rough average glyph width
    let char_width = font_size * 0.55;
    let max_chars = (max_width / char_width) as usize;

    if text.chars().count() <= max_chars || max_chars < 4 {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars - 1).collect();
        format!("{}…", kept)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Transaction;
    use crate::markdown::TaskListOptions;

    fn editor(source: &str) -> Editor {
        Editor::new(source, TaskListOptions::default()).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Visibility
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_hidden_until_attached() {
        let panel = TocPanel::new();
        assert!(!panel.is_visible());
        assert!(!panel.is_attached());
    }

    #[test]
    fn test_attach_reads_initial_document() {
        let mut panel = TocPanel::new();
        panel.attach(&editor("[toc]\n\n# Title"));
        assert!(panel.is_visible());

        panel.attach(&editor("# Title"));
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_visibility_follows_transactions() {
        let mut editor = editor("# Title");
        let mut panel = TocPanel::new();
        panel.attach(&editor);
        assert!(!panel.is_visible());

        editor
            .dispatch(Transaction::SetContent("[[toc]]\n\n# Title".into()))
            .unwrap();
        assert!(panel.is_visible());

        editor
            .dispatch(Transaction::SetContent("# Title".into()))
            .unwrap();
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_detach_releases_listener() {
        let mut editor = editor("# Title");
        let mut panel = TocPanel::new();
        panel.attach(&editor);
        panel.detach();
        assert!(!panel.is_attached());

        editor
            .dispatch(Transaction::SetContent("[toc]".into()))
            .unwrap();
        assert!(!panel.is_visible());
    }

    #[test]
    fn test_dropped_panel_releases_listener() {
        let mut editor = editor("# Title");
        {
            let mut panel = TocPanel::new();
            panel.attach(&editor);
        }
        // No listener left to call into the dropped panel state
        assert!(editor
            .dispatch(Transaction::SetContent("[toc]".into()))
            .unwrap());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Collapse state
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_sync_document_width() {
        let mut panel = TocPanel::new();
        panel.sync_document_width(DocumentWidth::FullWidth);
        assert!(panel.is_collapsed());
        assert_eq!(panel.width(), COLLAPSED_WIDTH);

        panel.sync_document_width(DocumentWidth::Standard);
        assert!(!panel.is_collapsed());
        assert_eq!(panel.width(), EXPANDED_WIDTH);
    }

    #[test]
    fn test_manual_toggle_survives_same_width() {
        let mut panel = TocPanel::new();
        panel.sync_document_width(DocumentWidth::Standard);
        panel.toggle_collapsed();
        assert!(panel.is_collapsed());

        // Same width again leaves the manual choice alone
        panel.sync_document_width(DocumentWidth::Standard);
        assert!(panel.is_collapsed());

        panel.sync_document_width(DocumentWidth::FullWidth);
        panel.toggle_collapsed();
        assert!(!panel.is_collapsed());
        panel.sync_document_width(DocumentWidth::FullWidth);
        assert!(!panel.is_collapsed());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_bar_width() {
        assert_eq!(bar_width(1), 48.0);
        assert_eq!(bar_width(2), 40.0);
        assert_eq!(bar_width(6), 8.0);
        assert_eq!(bar_width(9), 8.0);
        assert!(bar_width(1) <= COLLAPSED_WIDTH);
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("Hello", 100.0, 11.0), "Hello");

        let long = "This is a very long heading that should be truncated";
        let truncated = truncate_text(long, 100.0, 11.0);
        assert!(truncated.ends_with('…'));
        assert!(truncated.chars().count() < long.chars().count());

        // Multi-byte text is cut on char boundaries
        let accented = truncate_text("éééééééééééééééééééééééééééé", 60.0, 11.0);
        assert!(accented.ends_with('…'));
    }
}
