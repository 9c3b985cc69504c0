//! Application state management for markdeck
//!
//! `AppState` owns the settings, the editor for the open document, the
//! file it came from and transient UI state such as status and error
//! messages.

use crate::config::{load_config, save_config_silent, Settings};
use crate::editor::{Editor, Transaction};
use crate::error::{Error, Result};
use crate::markdown::TaskListOptions;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// UI State
// ─────────────────────────────────────────────────────────────────────────────

/// UI-related state flags.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Whether a confirmation dialog is open (e.g., unsaved changes)
    pub show_confirm_dialog: bool,
    /// Message for the confirmation dialog
    pub confirm_dialog_message: String,
    /// Pending action after confirmation
    pub pending_action: Option<PendingAction>,
    /// Status bar message
    pub status_message: Option<String>,
    /// Whether to show error modal
    pub show_error_modal: bool,
    /// Error message for modal
    pub error_message: String,
}

/// Actions that may need confirmation before execution.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingAction {
    /// Exit the application
    Exit,
    /// Open a file, replacing the current document
    OpenFile(PathBuf),
    /// Start a new empty document
    NewDocument,
}

// ─────────────────────────────────────────────────────────────────────────────
// Application State
// ─────────────────────────────────────────────────────────────────────────────

/// Central application state struct.
#[derive(Debug)]
pub struct AppState {
    /// User settings (loaded from config)
    pub settings: Settings,
    /// UI-related state
    pub ui: UiState,
    /// The open document
    pub editor: Editor,
    /// File path (None for unsaved/new documents)
    path: Option<PathBuf>,
    /// Content as last read or written (for detecting modifications)
    saved_content: String,
    /// Whether settings have been modified and need saving
    settings_dirty: bool,
}

impl AppState {
    /// Create an AppState with settings loaded from config.
    pub fn new() -> Result<Self> {
        let settings = load_config();
        debug!(
            "Theme: {:?}, document width: {:?}",
            settings.theme, settings.document_width
        );
        Self::with_settings(settings)
    }

    /// Create an AppState with custom settings and an empty document.
    pub fn with_settings(settings: Settings) -> Result<Self> {
        let editor = Editor::new("", settings.task_list)?;
        info!("AppState initialized");
        Ok(Self {
            settings,
            ui: UiState::default(),
            editor,
            path: None,
            saved_content: String::new(),
            settings_dirty: false,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document
    // ─────────────────────────────────────────────────────────────────────────

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Check if the document has unsaved changes.
    pub fn is_modified(&self) -> bool {
        self.editor.source() != self.saved_content
    }

    /// Get the display title for the window.
    pub fn title(&self) -> String {
        let name = self
            .path
            .as_ref()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or("Untitled");

        if self.is_modified() {
            format!("{}* - markdeck", name)
        } else {
            format!("{} - markdeck", name)
        }
    }

    /// Replace the document with an empty one.
    pub fn new_document(&mut self) -> Result<()> {
        self.editor.dispatch(Transaction::SetContent(String::new()))?;
        self.path = None;
        self.saved_content.clear();
        debug!("Created new document");
        Ok(())
    }

    /// Open a file, replacing the current document.
    pub fn open_file(&mut self, path: PathBuf) -> Result<()> {
        let content = std::fs::read_to_string(&path).map_err(|e| Error::FileRead {
            path: path.clone(),
            source: e,
        })?;

        self.editor.dispatch(Transaction::SetContent(content.clone()))?;
        self.saved_content = content;
        info!("Opened file: {}", path.display());

        self.settings.add_recent_file(path.clone());
        self.settings_dirty = true;
        self.path = Some(path);
        Ok(())
    }

    /// Apply an edit from the source editor.
    pub fn set_content(&mut self, content: String) -> Result<bool> {
        self.editor.dispatch(Transaction::SetContent(content))
    }

    /// Toggle the task item on a 0-based source line.
    pub fn toggle_task(&mut self, line: usize) -> Result<bool> {
        let changed = self.editor.dispatch(Transaction::ToggleTask { line })?;
        if changed {
            debug!("Toggled task on line {}", line);
        }
        Ok(changed)
    }

    /// Save the document to its file path.
    ///
    /// Returns an error if the document has no path (use `save_as` instead).
    pub fn save(&mut self) -> Result<()> {
        let path = self.path.clone().ok_or_else(|| {
            Error::Application("No file path set. Use 'Save As' instead.".to_string())
        })?;
        self.write_to(&path)?;
        info!("Saved file: {}", path.display());
        Ok(())
    }

    /// Save the document to a new path.
    pub fn save_as(&mut self, path: PathBuf) -> Result<()> {
        self.write_to(&path)?;
        info!("Saved file as: {}", path.display());

        self.settings.add_recent_file(path.clone());
        self.settings_dirty = true;
        self.path = Some(path);
        Ok(())
    }

    fn write_to(&mut self, path: &Path) -> Result<()> {
        let content = self.editor.source().to_string();
        std::fs::write(path, &content).map_err(|e| Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.saved_content = content;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings Management
    // ─────────────────────────────────────────────────────────────────────────

    /// Update settings and mark as dirty.
    pub fn update_settings<F>(&mut self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        f(&mut self.settings);
        self.settings_dirty = true;
    }

    /// Change task list options and re-render the document.
    pub fn set_task_options(&mut self, options: TaskListOptions) -> Result<()> {
        self.editor.dispatch(Transaction::Reconfigure(options))?;
        self.update_settings(|s| s.task_list = options);
        Ok(())
    }

    pub fn settings_dirty(&self) -> bool {
        self.settings_dirty
    }

    /// Save settings to config file if modified.
    ///
    /// Returns `true` if settings were saved.
    pub fn save_settings_if_dirty(&mut self) -> bool {
        if self.settings_dirty {
            if save_config_silent(&self.settings) {
                self.settings_dirty = false;
                info!("Settings saved");
                return true;
            }
            warn!("Failed to save settings");
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Handling
    // ─────────────────────────────────────────────────────────────────────────

    /// Run `action` now, or ask for confirmation first if there are unsaved
    /// changes. Returns `true` if the action ran.
    pub fn request_action(&mut self, action: PendingAction) -> bool {
        if self.is_modified() {
            self.ui.confirm_dialog_message = match &action {
                PendingAction::Exit => "You have unsaved changes. Exit anyway?",
                PendingAction::OpenFile(_) | PendingAction::NewDocument => {
                    "You have unsaved changes. Discard them?"
                }
            }
            .to_string();
            self.ui.pending_action = Some(action);
            self.ui.show_confirm_dialog = true;
            false
        } else {
            self.run_action(action);
            true
        }
    }

    /// Handle a confirmed pending action.
    ///
    /// Returns the action that ran, so the caller can close the window on exit.
    pub fn handle_confirmed_action(&mut self) -> Option<PendingAction> {
        let action = self.ui.pending_action.take();
        if let Some(action) = &action {
            self.run_action(action.clone());
        }
        self.ui.show_confirm_dialog = false;
        self.ui.confirm_dialog_message.clear();
        action
    }

    /// Cancel the pending action.
    pub fn cancel_pending_action(&mut self) {
        self.ui.pending_action = None;
        self.ui.show_confirm_dialog = false;
        self.ui.confirm_dialog_message.clear();
    }

    fn run_action(&mut self, action: PendingAction) {
        let result = match action {
            PendingAction::Exit => {
                debug!("Exit confirmed");
                Ok(())
            }
            PendingAction::OpenFile(path) => self.open_file(path),
            PendingAction::NewDocument => self.new_document(),
        };
        if let Err(e) = result {
            self.show_error(e.to_string());
        }
    }

    /// Prepare state for application shutdown.
    pub fn shutdown(&mut self) {
        self.save_settings_if_dirty();
        info!("AppState shutdown complete");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // UI State Helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Set the status message.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui.status_message = Some(message.into());
    }

    /// Show an error in a modal dialog.
    pub fn show_error(&mut self, message: impl Into<String>) {
        self.ui.error_message = message.into();
        self.ui.show_error_modal = true;
        warn!("{}", self.ui.error_message);
    }

    /// Dismiss the error modal.
    pub fn dismiss_error(&mut self) {
        self.ui.show_error_modal = false;
        self.ui.error_message.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn state() -> AppState {
        AppState::with_settings(Settings::default()).unwrap()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Document tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_new_state_is_clean() {
        let state = state();
        assert!(!state.is_modified());
        assert!(state.path().is_none());
        assert_eq!(state.title(), "Untitled - markdeck");
    }

    #[test]
    fn test_edit_marks_modified() {
        let mut state = state();
        assert!(state.set_content("# Notes".to_string()).unwrap());
        assert!(state.is_modified());
        assert_eq!(state.title(), "Untitled* - markdeck");
    }

    #[test]
    fn test_open_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        fs::write(&path, "- [ ] walk dog\n").unwrap();

        let mut state = state();
        state.open_file(path.clone()).unwrap();

        assert_eq!(state.editor.source(), "- [ ] walk dog\n");
        assert!(!state.is_modified());
        assert_eq!(state.title(), "todo.md - markdeck");
        assert_eq!(state.settings.recent_files[0], path);
        assert!(state.settings_dirty());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut state = state();
        let result = state.open_file(dir.path().join("missing.md"));
        assert!(matches!(result, Err(Error::FileRead { .. })));
        assert!(state.path().is_none());
    }

    #[test]
    fn test_toggle_task_marks_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("todo.md");
        fs::write(&path, "# Todo\n\n- [ ] walk dog\n").unwrap();

        let mut state = state();
        state.open_file(path).unwrap();
        assert!(state.toggle_task(2).unwrap());
        assert_eq!(state.editor.source(), "# Todo\n\n- [x] walk dog\n");
        assert!(state.is_modified());
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut state = state();
        state.set_content("text".to_string()).unwrap();
        assert!(matches!(state.save(), Err(Error::Application(_))));
        assert!(state.is_modified());
    }

    #[test]
    fn test_save_as_and_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");

        let mut state = state();
        state.set_content("first".to_string()).unwrap();
        state.save_as(path.clone()).unwrap();
        assert!(!state.is_modified());
        assert_eq!(fs::read_to_string(&path).unwrap(), "first");
        assert_eq!(state.path(), Some(path.as_path()));

        state.set_content("second".to_string()).unwrap();
        state.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let mut state = state();
        let result = state.save_as(dir.path().join("nope").join("notes.md"));
        assert!(matches!(result, Err(Error::FileWrite { .. })));
        assert!(state.path().is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settings tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_set_task_options() {
        let mut state = state();
        let options = TaskListOptions {
            label: false,
            ..state.settings.task_list
        };
        state.set_task_options(options).unwrap();
        assert_eq!(state.editor.task_options(), options);
        assert_eq!(state.settings.task_list, options);
        assert!(state.settings_dirty());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Pending action tests
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_action_runs_when_clean() {
        let mut state = state();
        assert!(state.request_action(PendingAction::NewDocument));
        assert!(!state.ui.show_confirm_dialog);
    }

    #[test]
    fn test_action_waits_for_confirmation() {
        let mut state = state();
        state.set_content("unsaved".to_string()).unwrap();

        assert!(!state.request_action(PendingAction::NewDocument));
        assert!(state.ui.show_confirm_dialog);
        assert_eq!(state.editor.source(), "unsaved");

        assert_eq!(
            state.handle_confirmed_action(),
            Some(PendingAction::NewDocument)
        );
        assert_eq!(state.editor.source(), "");
        assert!(!state.ui.show_confirm_dialog);
    }

    #[test]
    fn test_cancel_pending_action() {
        let mut state = state();
        state.set_content("unsaved".to_string()).unwrap();
        state.request_action(PendingAction::Exit);
        state.cancel_pending_action();
        assert!(state.ui.pending_action.is_none());
        assert_eq!(state.handle_confirmed_action(), None);
    }

    #[test]
    fn test_failed_action_shows_error() {
        let dir = TempDir::new().unwrap();
        let mut state = state();
        state.request_action(PendingAction::OpenFile(dir.path().join("missing.md")));
        assert!(state.ui.show_error_modal);
        assert!(state.ui.error_message.contains("missing.md"));

        state.dismiss_error();
        assert!(!state.ui.show_error_modal);
    }
}
