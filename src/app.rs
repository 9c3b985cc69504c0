//! Main application module for markdeck
//!
//! This module implements the eframe App trait for the main application:
//! menu bar, source editor, rendered preview and the table of contents panel.

use crate::config::{DocumentWidth, Theme, ViewMode, WindowSize};
use crate::editor::outline::find_current_section;
use crate::editor::TocEntry;
use crate::export::export_to_html_file;
use crate::files::dialogs::{export_html_dialog, open_file_dialog, save_file_dialog};
use crate::markdown::TaskListOptions;
use crate::state::{AppState, PendingAction};
use crate::ui::{MarkdownPreview, PreviewColors, TocPanel};
use crate::error::Result;
use eframe::egui::{self, FontId, RichText};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Keyboard shortcut actions that need to be deferred.
///
/// These actions are detected in the input handling closure and executed
/// afterwards to avoid borrow conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyboardAction {
    /// Save current file (Ctrl+S)
    Save,
    /// Save As dialog (Ctrl+Shift+S)
    SaveAs,
    /// Open file dialog (Ctrl+O)
    Open,
    /// New document (Ctrl+N)
    New,
    /// Export as HTML (Ctrl+Shift+E)
    ExportHtml,
    /// Toggle document width (Ctrl+Shift+W)
    ToggleDocumentWidth,
}

/// The main application struct that holds all state and implements eframe::App.
pub struct MarkdeckApp {
    /// Central application state
    state: AppState,
    /// Table of contents side panel
    toc_panel: TocPanel,
    /// Cached table of contents and the editor version it was built from
    toc_cache: (u64, Vec<TocEntry>),
    /// Theme last applied to the egui context
    applied_theme: Option<Theme>,
    /// Heading anchor to scroll the preview to on the next frame
    pending_anchor: Option<String>,
    /// Source line to scroll the editor to on the next frame
    pending_source_line: Option<usize>,
    /// Track if we should exit (after confirmation)
    should_exit: bool,
    /// Last known window size (for detecting changes)
    last_window_size: Option<egui::Vec2>,
}

impl MarkdeckApp {
    /// Create the app, optionally opening `initial_file`.
    pub fn new(cc: &eframe::CreationContext<'_>, initial_file: Option<PathBuf>) -> Result<Self> {
        info!("Initializing markdeck");

        let mut state = AppState::new()?;
        if let Some(path) = initial_file {
            if let Err(e) = state.open_file(path) {
                state.show_error(format!("Failed to open file:\n{}", e));
            }
        }

        let mut toc_panel = TocPanel::new();
        toc_panel.attach(&state.editor);
        toc_panel.sync_document_width(state.settings.document_width);

        let mut app = Self {
            state,
            toc_panel,
            toc_cache: (u64::MAX, Vec::new()),
            applied_theme: None,
            pending_anchor: None,
            pending_source_line: None,
            should_exit: false,
            last_window_size: None,
        };
        app.apply_theme(&cc.egui_ctx);
        Ok(app)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Theme & Window
    // ─────────────────────────────────────────────────────────────────────────

    fn apply_theme(&mut self, ctx: &egui::Context) {
        let theme = self.state.settings.theme;
        if self.applied_theme == Some(theme) {
            return;
        }
        match theme {
            Theme::Light => ctx.set_visuals(egui::Visuals::light()),
            Theme::Dark => ctx.set_visuals(egui::Visuals::dark()),
            Theme::System => {}
        }
        self.applied_theme = Some(theme);
        debug!("Applied theme: {:?}", theme);
    }

    fn is_dark(&self, ctx: &egui::Context) -> bool {
        match self.state.settings.theme {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => ctx.style().visuals.dark_mode,
        }
    }

    /// Update window size in settings if changed.
    fn update_window_state(&mut self, ctx: &egui::Context) {
        let (size, maximized) = ctx.input(|i| {
            (
                i.viewport().inner_rect.map(|r| r.size()),
                i.viewport().maximized.unwrap_or(false),
            )
        });
        let Some(size) = size else {
            return;
        };
        let changed = self
            .last_window_size
            .map(|s| (s - size).length() > 1.0)
            .unwrap_or(true);
        if changed {
            self.last_window_size = Some(size);
            self.state.settings.window_size = WindowSize {
                width: size.x,
                height: size.y,
                maximized,
            };
        }
    }

    /// Handle close request from the window.
    ///
    /// Returns `true` if the application should close.
    fn handle_close_request(&mut self) -> bool {
        if self.should_exit {
            return true;
        }
        self.state.request_action(PendingAction::Exit)
    }

    fn toc_entries(&mut self) -> &[TocEntry] {
        let version = self.state.editor.version();
        if self.toc_cache.0 != version {
            self.toc_cache = (version, self.state.editor.toc());
        }
        &self.toc_cache.1
    }

    // ─────────────────────────────────────────────────────────────────────────
    // File Actions
    // ─────────────────────────────────────────────────────────────────────────

    fn last_directory(&self) -> Option<PathBuf> {
        self.state
            .path()
            .or_else(|| self.state.settings.recent_files.first().map(PathBuf::as_path))
            .and_then(Path::parent)
            .map(Path::to_path_buf)
    }

    fn handle_open_file(&mut self) {
        let Some(path) = open_file_dialog(self.last_directory().as_deref()) else {
            debug!("File dialog cancelled");
            return;
        };
        self.state.request_action(PendingAction::OpenFile(path));
    }

    /// Save to the current path, or ask for one.
    fn handle_save_file(&mut self) {
        if self.state.path().is_none() {
            self.handle_save_as_file();
            return;
        }
        match self.state.save() {
            Ok(()) => self.state.set_status("Saved"),
            Err(e) => self.state.show_error(format!("Failed to save file:\n{}", e)),
        }
    }

    fn handle_save_as_file(&mut self) {
        let default_name = self
            .state
            .path()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("untitled.md")
            .to_string();
        let Some(path) = save_file_dialog(self.last_directory().as_deref(), Some(&default_name))
        else {
            debug!("Save dialog cancelled");
            return;
        };
        match self.state.save_as(path) {
            Ok(()) => self.state.set_status("Saved"),
            Err(e) => self.state.show_error(format!("Failed to save file:\n{}", e)),
        }
    }

    fn handle_export_html(&mut self, ctx: &egui::Context) {
        let initial_dir = self
            .state
            .settings
            .last_export_directory
            .clone()
            .or_else(|| self.last_directory());
        let Some(output) = export_html_dialog(initial_dir.as_deref(), &default_export_name(self.state.path()))
        else {
            debug!("Export dialog cancelled");
            return;
        };

        let title = self
            .state
            .path()
            .and_then(|p| p.file_stem())
            .and_then(|s| s.to_str())
            .map(str::to_string);
        let is_dark = self.is_dark(ctx);
        match export_to_html_file(self.state.editor.html(), title.as_deref(), is_dark, &output) {
            Ok(()) => {
                let dir = output.parent().map(Path::to_path_buf);
                self.state.update_settings(|s| s.last_export_directory = dir);
                self.state
                    .set_status(format!("Exported to {}", output.display()));
            }
            Err(e) => self.state.show_error(format!("Failed to export HTML:\n{}", e)),
        }
    }

    fn set_task_options(&mut self, options: TaskListOptions) {
        if let Err(e) = self.state.set_task_options(options) {
            self.state.show_error(e.to_string());
        }
    }

    fn set_document_width(&mut self, width: DocumentWidth) {
        self.state.update_settings(|s| s.document_width = width);
        self.toc_panel.sync_document_width(width);
    }

    fn handle_keyboard_shortcuts(&mut self, ctx: &egui::Context) {
        let action = ctx.input(|i| {
            let ctrl = i.modifiers.command;
            let shift = i.modifiers.shift;
            if ctrl && shift && i.key_pressed(egui::Key::S) {
                Some(KeyboardAction::SaveAs)
            } else if ctrl && shift && i.key_pressed(egui::Key::E) {
                Some(KeyboardAction::ExportHtml)
            } else if ctrl && shift && i.key_pressed(egui::Key::W) {
                Some(KeyboardAction::ToggleDocumentWidth)
            } else if ctrl && i.key_pressed(egui::Key::S) {
                Some(KeyboardAction::Save)
            } else if ctrl && i.key_pressed(egui::Key::O) {
                Some(KeyboardAction::Open)
            } else if ctrl && i.key_pressed(egui::Key::N) {
                Some(KeyboardAction::New)
            } else {
                None
            }
        });

        let Some(action) = action else {
            return;
        };
        debug!("Keyboard shortcut: {:?}", action);
        match action {
            KeyboardAction::Save => self.handle_save_file(),
            KeyboardAction::SaveAs => self.handle_save_as_file(),
            KeyboardAction::Open => self.handle_open_file(),
            KeyboardAction::New => {
                self.state.request_action(PendingAction::NewDocument);
            }
            KeyboardAction::ExportHtml => self.handle_export_html(ctx),
            KeyboardAction::ToggleDocumentWidth => {
                let width = self.state.settings.document_width.toggle();
                self.set_document_width(width);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        self.state.request_action(PendingAction::NewDocument);
                        ui.close_menu();
                    }
                    if ui.button("Open…").clicked() {
                        ui.close_menu();
                        self.handle_open_file();
                    }
                    ui.menu_button("Open Recent", |ui| {
                        let recent = self.state.settings.recent_files.clone();
                        if recent.is_empty() {
                            ui.label(RichText::new("No recent files").italics());
                        }
                        for path in recent {
                            if ui.button(path.display().to_string()).clicked() {
                                ui.close_menu();
                                self.state.request_action(PendingAction::OpenFile(path));
                            }
                        }
                    });
                    ui.separator();
                    if ui.button("Save").clicked() {
                        ui.close_menu();
                        self.handle_save_file();
                    }
                    if ui.button("Save As…").clicked() {
                        ui.close_menu();
                        self.handle_save_as_file();
                    }
                    if ui.button("Export HTML…").clicked() {
                        ui.close_menu();
                        self.handle_export_html(ui.ctx());
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.close_menu();
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    for mode in [ViewMode::Raw, ViewMode::Split, ViewMode::Rendered] {
                        if ui
                            .radio(self.state.settings.view_mode == mode, mode.label())
                            .clicked()
                        {
                            self.state.update_settings(|s| s.view_mode = mode);
                            ui.close_menu();
                        }
                    }
                    ui.separator();
                    for width in [DocumentWidth::Standard, DocumentWidth::FullWidth] {
                        if ui
                            .radio(self.state.settings.document_width == width, width.label())
                            .clicked()
                        {
                            self.set_document_width(width);
                            ui.close_menu();
                        }
                    }
                    ui.separator();
                    for theme in [Theme::Light, Theme::Dark, Theme::System] {
                        if ui
                            .radio(self.state.settings.theme == theme, theme.label())
                            .clicked()
                        {
                            self.state.update_settings(|s| s.theme = theme);
                            ui.close_menu();
                        }
                    }
                });

                ui.menu_button("Tasks", |ui| {
                    let mut options = self.state.settings.task_list;
                    let mut changed = ui
                        .checkbox(&mut options.enabled, "Clickable checkboxes")
                        .changed();
                    changed |= ui.checkbox(&mut options.label, "Wrap item text").changed();
                    changed |= ui
                        .checkbox(&mut options.line_number, "Track source lines")
                        .on_hover_text("Needed to toggle tasks from the preview")
                        .changed();
                    if changed {
                        self.set_task_options(options);
                    }
                });
            });
        });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let name = self
                    .state
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "Untitled".to_string());
                ui.label(RichText::new(name).size(11.0));
                if self.state.is_modified() {
                    ui.label(RichText::new("●").size(11.0));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let tasks = self.state.editor.find_nodes("taskItem");
                    let done = tasks
                        .iter()
                        .filter(|n| {
                            matches!(n.kind, crate::editor::NodeKind::TaskItem { checked: true, .. })
                        })
                        .count();
                    if !tasks.is_empty() {
                        ui.label(RichText::new(format!("{}/{} tasks", done, tasks.len())).size(11.0));
                    }
                    if let Some(message) = &self.state.ui.status_message {
                        ui.label(RichText::new(message).size(11.0).italics());
                    }
                });
            });
        });
    }

    fn render_toc_panel(&mut self, ctx: &egui::Context, is_dark: bool) {
        // Rebuild the cached entries before borrowing the panel
        self.toc_entries();
        let output = self.toc_panel.show(ctx, &self.toc_cache.1, is_dark);
        if let Some(anchor) = output.scroll_to_anchor {
            self.pending_anchor = Some(anchor);
        }
        if output.scroll_to_line.is_some() {
            self.pending_source_line = output.scroll_to_line;
        }
    }

    /// Source editor; returns the 0-based line of the cursor when focused.
    fn render_source(&mut self, ui: &mut egui::Ui) -> Option<usize> {
        let font_id = FontId::monospace(self.state.settings.font_size);
        let row_height = ui.fonts(|f| f.row_height(&font_id));

        let mut scroll = egui::ScrollArea::vertical()
            .id_source("source_scroll")
            .auto_shrink([false, false]);
        if let Some(line) = self.pending_source_line.take() {
            scroll = scroll.vertical_scroll_offset(line as f32 * row_height);
        }

        let mut text = self.state.editor.source().to_string();
        let output = scroll
            .show(ui, |ui| {
                egui::TextEdit::multiline(&mut text)
                    .id_source("source_editor")
                    .font(font_id)
                    .code_editor()
                    .frame(false)
                    .desired_width(f32::INFINITY)
                    .show(ui)
            })
            .inner;

        if output.response.changed() {
            if let Err(e) = self.state.set_content(text.clone()) {
                self.state.show_error(e.to_string());
            }
        }

        output
            .cursor_range
            .map(|range| char_index_to_line(&text, range.primary.ccursor.index))
    }

    fn render_preview(&mut self, ui: &mut egui::Ui, is_dark: bool) {
        let anchor = self.pending_anchor.take();
        let output = egui::ScrollArea::vertical()
            .id_source("preview_scroll")
            .auto_shrink([false, false])
            .show(ui, |ui| {
                MarkdownPreview::new(self.state.editor.document())
                    .font_size(self.state.settings.font_size)
                    .colors(PreviewColors::for_theme(is_dark))
                    .max_width(self.state.settings.document_width.max_content_width())
                    .scroll_to(anchor.as_deref())
                    .show(ui)
            })
            .inner;

        if let Some(line) = output.toggled_line {
            if let Err(e) = self.state.toggle_task(line) {
                self.state.show_error(e.to_string());
            }
        }
        if let Some(anchor) = output.clicked_anchor {
            self.pending_anchor = Some(anchor);
        }
    }

    fn render_dialogs(&mut self, ctx: &egui::Context) {
        // Confirmation dialog for unsaved changes
        if self.state.ui.show_confirm_dialog {
            egui::Window::new("Unsaved Changes")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(&self.state.ui.confirm_dialog_message);
                    ui.separator();
                    ui.horizontal(|ui| {
                        if ui.button("Save").clicked() {
                            self.handle_save_file();
                            if !self.state.is_modified() {
                                self.confirm_pending_action();
                            }
                        }
                        if ui.button("Discard").clicked() {
                            self.confirm_pending_action();
                        }
                        if ui.button("Cancel").clicked() {
                            self.state.cancel_pending_action();
                        }
                    });
                });
        }

        // Error modal
        if self.state.ui.show_error_modal {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(&self.state.ui.error_message);
                    ui.separator();
                    if ui.button("OK").clicked() {
                        self.state.dismiss_error();
                    }
                });
        }
    }

    fn confirm_pending_action(&mut self) {
        if self.state.handle_confirmed_action() == Some(PendingAction::Exit) {
            self.should_exit = true;
        }
    }
}

impl eframe::App for MarkdeckApp {
    /// Called each time the UI needs repainting.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_theme(ctx);
        let is_dark = self.is_dark(ctx);

        ctx.send_viewport_cmd(egui::ViewportCommand::Title(self.state.title()));
        self.update_window_state(ctx);

        // Handle close request from window
        if ctx.input(|i| i.viewport().close_requested()) && !self.handle_close_request() {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
        }

        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);
        self.render_toc_panel(ctx, is_dark);

        let view_mode = self.state.settings.view_mode;
        let mut cursor_line = None;
        if view_mode == ViewMode::Split {
            let screen_width = ctx.screen_rect().width();
            let panel = egui::SidePanel::left("source_panel")
                .resizable(true)
                .default_width(screen_width * self.state.settings.split_ratio)
                .show(ctx, |ui| self.render_source(ui));
            cursor_line = panel.inner;

            let ratio = panel.response.rect.width() / screen_width.max(1.0);
            if (ratio - self.state.settings.split_ratio).abs() > 0.01 {
                self.state.update_settings(|s| s.split_ratio = ratio);
                self.state.settings.sanitize();
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if view_mode.shows_preview() {
                self.render_preview(ui, is_dark);
            } else {
                cursor_line = self.render_source(ui);
            }
        });

        if let Some(line) = cursor_line {
            let current = find_current_section(self.toc_entries(), line).map(str::to_string);
            self.toc_panel.set_current_section(current);
        }

        self.render_dialogs(ctx);
        self.handle_keyboard_shortcuts(ctx);

        if self.should_exit {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    /// Called when the application is about to close.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Application exiting");
        self.toc_panel.detach();
        self.state.shutdown();
    }

    /// Save persistent state.
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        if !self.state.save_settings_if_dirty() && self.state.settings_dirty() {
            warn!("Settings could not be saved");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a character index to a 0-indexed line.
fn char_index_to_line(text: &str, char_index: usize) -> usize {
    text.chars()
        .take(char_index)
        .filter(|&ch| ch == '\n')
        .count()
}

/// File name offered for an HTML export of the document at `path`.
fn default_export_name(path: Option<&Path>) -> String {
    let stem = path
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("untitled");
    format!("{}.html", stem)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_index_to_line() {
        let text = "# Title\n\n- [ ] task\nlast";
        assert_eq!(char_index_to_line(text, 0), 0);
        assert_eq!(char_index_to_line(text, 7), 0);
        assert_eq!(char_index_to_line(text, 8), 1);
        assert_eq!(char_index_to_line(text, 9), 2);
        assert_eq!(char_index_to_line(text, 1000), 3);
    }

    #[test]
    fn test_char_index_counts_chars_not_bytes() {
        let text = "é\né\n";
        assert_eq!(char_index_to_line(text, 2), 1);
        assert_eq!(char_index_to_line(text, 4), 2);
    }

    #[test]
    fn test_default_export_name() {
        assert_eq!(default_export_name(None), "untitled.html");
        assert_eq!(
            default_export_name(Some(Path::new("/notes/todo.md"))),
            "todo.html"
        );
    }
}
