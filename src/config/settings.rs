//! User settings and preferences for markdeck
//!
//! This module defines the `Settings` struct that holds all user-configurable
//! options, with serde support for JSON persistence.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::markdown::TaskListOptions;

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    System,
}

impl Theme {
    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::System => "System",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View Mode Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Which panes the main window shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Markdown source only
    Raw,
    /// Source and rendered preview side by side (default)
    #[default]
    Split,
    /// Rendered preview only
    Rendered,
}

impl ViewMode {
    pub fn label(&self) -> &'static str {
        match self {
            ViewMode::Raw => "Raw",
            ViewMode::Split => "Split",
            ViewMode::Rendered => "Rendered",
        }
    }

    pub fn shows_source(&self) -> bool {
        matches!(self, ViewMode::Raw | ViewMode::Split)
    }

    pub fn shows_preview(&self) -> bool {
        matches!(self, ViewMode::Split | ViewMode::Rendered)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Document Width Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Width of the rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DocumentWidth {
    /// Readable fixed width column (default)
    #[default]
    Standard,
    /// Use all available width; the TOC panel collapses to make room
    FullWidth,
}

impl DocumentWidth {
    pub fn toggle(&self) -> Self {
        match self {
            DocumentWidth::Standard => DocumentWidth::FullWidth,
            DocumentWidth::FullWidth => DocumentWidth::Standard,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentWidth::Standard => "Standard",
            DocumentWidth::FullWidth => "Full width",
        }
    }

    /// Maximum preview content width in points.
    pub fn max_content_width(&self) -> f32 {
        match self {
            DocumentWidth::Standard => 760.0,
            DocumentWidth::FullWidth => f32::INFINITY,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Window Size Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Window dimensions and position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowSize {
    /// Window width in pixels
    pub width: f32,
    /// Window height in pixels
    pub height: f32,
    /// Whether the window was maximized
    #[serde(default)]
    pub maximized: bool,
}

impl Default for WindowSize {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            maximized: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Appearance
    // ─────────────────────────────────────────────────────────────────────────
    /// Color theme (light, dark, or system)
    pub theme: Theme,

    /// Source, preview or both
    pub view_mode: ViewMode,

    /// Width of the rendered document
    pub document_width: DocumentWidth,

    /// Font size for the editor and preview (in points)
    pub font_size: f32,

    /// Fraction of the window given to the source pane in split view
    pub split_ratio: f32,

    // ─────────────────────────────────────────────────────────────────────────
    // Markdown
    // ─────────────────────────────────────────────────────────────────────────
    /// Task list rendering options
    pub task_list: TaskListOptions,

    // ─────────────────────────────────────────────────────────────────────────
    // Session & History
    // ─────────────────────────────────────────────────────────────────────────
    /// Recently opened files (most recent first)
    pub recent_files: Vec<PathBuf>,

    /// Maximum number of recent files to remember
    pub max_recent_files: usize,

    /// Window size and state
    pub window_size: WindowSize,

    // ─────────────────────────────────────────────────────────────────────────
    // Export
    // ─────────────────────────────────────────────────────────────────────────
    /// Directory of the last HTML export
    pub last_export_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // Appearance
            theme: Theme::default(),
            view_mode: ViewMode::default(),
            document_width: DocumentWidth::default(),
            font_size: 14.0,
            split_ratio: 0.5,

            // Markdown: preview checkboxes edit the source, so they need lines
            task_list: TaskListOptions {
                line_number: true,
                ..TaskListOptions::default()
            },

            // Session & History
            recent_files: Vec::new(),
            max_recent_files: 10,
            window_size: WindowSize::default(),

            // Export
            last_export_directory: None,
        }
    }
}

impl Settings {
    /// Add a file to the recent files list.
    ///
    /// If the file already exists in the list, it's moved to the front.
    /// The list is trimmed to `max_recent_files`.
    pub fn add_recent_file(&mut self, path: PathBuf) {
        self.recent_files.retain(|p| p != &path);
        self.recent_files.insert(0, path);
        self.recent_files.truncate(self.max_recent_files);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum allowed font size.
    pub const MIN_FONT_SIZE: f32 = 8.0;
    /// Maximum allowed font size.
    pub const MAX_FONT_SIZE: f32 = 72.0;
    /// Minimum window dimension.
    pub const MIN_WINDOW_SIZE: f32 = 200.0;
    /// Maximum window dimension.
    pub const MAX_WINDOW_SIZE: f32 = 10000.0;
    /// Minimum split ratio (either pane keeps some room).
    pub const MIN_SPLIT_RATIO: f32 = 0.1;
    /// Maximum split ratio.
    pub const MAX_SPLIT_RATIO: f32 = 0.9;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.font_size = self
            .font_size
            .clamp(Self::MIN_FONT_SIZE, Self::MAX_FONT_SIZE);

        self.window_size.width = self
            .window_size
            .width
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);
        self.window_size.height = self
            .window_size
            .height
            .clamp(Self::MIN_WINDOW_SIZE, Self::MAX_WINDOW_SIZE);

        self.split_ratio = self
            .split_ratio
            .clamp(Self::MIN_SPLIT_RATIO, Self::MAX_SPLIT_RATIO);

        // Ensure max_recent_files is reasonable
        if self.max_recent_files == 0 {
            self.max_recent_files = 10;
        } else if self.max_recent_files > 100 {
            self.max_recent_files = 100;
        }
        self.recent_files.truncate(self.max_recent_files);
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.view_mode, ViewMode::Split);
        assert_eq!(settings.document_width, DocumentWidth::Standard);
        assert_eq!(settings.font_size, 14.0);
        assert!(settings.recent_files.is_empty());
        assert_eq!(settings.max_recent_files, 10);
        assert_eq!(settings.window_size.width, 1200.0);
        assert!(settings.task_list.enabled);
        assert!(settings.task_list.label);
        assert!(settings.task_list.line_number);
    }

    #[test]
    fn test_add_recent_file() {
        let mut settings = Settings::default();
        settings.max_recent_files = 3;

        settings.add_recent_file(PathBuf::from("/file1.md"));
        settings.add_recent_file(PathBuf::from("/file2.md"));
        settings.add_recent_file(PathBuf::from("/file3.md"));
        assert_eq!(settings.recent_files[0], PathBuf::from("/file3.md"));

        // Add existing file - should move to front
        settings.add_recent_file(PathBuf::from("/file1.md"));
        assert_eq!(settings.recent_files[0], PathBuf::from("/file1.md"));
        assert_eq!(settings.recent_files.len(), 3);

        // Add new file - should trim oldest
        settings.add_recent_file(PathBuf::from("/file4.md"));
        assert_eq!(settings.recent_files.len(), 3);
        assert!(!settings.recent_files.contains(&PathBuf::from("/file2.md")));
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(serde_json::to_string(&ViewMode::Split).unwrap(), "\"split\"");
        assert_eq!(
            serde_json::to_string(&DocumentWidth::FullWidth).unwrap(),
            "\"full_width\""
        );
        assert_eq!(
            serde_json::from_str::<DocumentWidth>("\"standard\"").unwrap(),
            DocumentWidth::Standard
        );
    }

    #[test]
    fn test_document_width_toggle() {
        assert_eq!(DocumentWidth::Standard.toggle(), DocumentWidth::FullWidth);
        assert_eq!(DocumentWidth::FullWidth.toggle(), DocumentWidth::Standard);
        assert!(DocumentWidth::FullWidth.max_content_width().is_infinite());
    }

    #[test]
    fn test_view_mode_panes() {
        assert!(ViewMode::Raw.shows_source() && !ViewMode::Raw.shows_preview());
        assert!(ViewMode::Split.shows_source() && ViewMode::Split.shows_preview());
        assert!(!ViewMode::Rendered.shows_source());
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let original = Settings::default();
        let json = serde_json::to_string_pretty(&original).unwrap();
        let deserialized: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(original, deserialized);
    }

    #[test]
    fn test_task_list_uses_camel_case_keys() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"lineNumber\":true"));

        let settings: Settings =
            serde_json::from_str(r#"{"task_list": {"enabled": false}}"#).unwrap();
        assert!(!settings.task_list.enabled);
        // Missing keys fall back to the option defaults
        assert!(settings.task_list.label);
        assert!(!settings.task_list.line_number);
    }

    #[test]
    fn test_settings_deserialize_empty_json() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sanitization tests
    // ─────────────────────────────────────────────────────────────────────────
    #[test]
    fn test_sanitize_font_size() {
        let mut settings = Settings::default();
        settings.font_size = 4.0;
        settings.sanitize();
        assert_eq!(settings.font_size, Settings::MIN_FONT_SIZE);

        settings.font_size = 100.0;
        settings.sanitize();
        assert_eq!(settings.font_size, Settings::MAX_FONT_SIZE);
    }

    #[test]
    fn test_sanitize_recent_files() {
        let mut settings = Settings::default();
        settings.max_recent_files = 2;
        settings.recent_files = vec![
            PathBuf::from("/file1.md"),
            PathBuf::from("/file2.md"),
            PathBuf::from("/file3.md"),
        ];
        settings.sanitize();
        assert_eq!(settings.recent_files.len(), 2);
    }

    #[test]
    fn test_from_json_sanitized() {
        let json = r#"{"font_size": 4.0, "split_ratio": 2.0}"#;
        let settings = Settings::from_json_sanitized(json).unwrap();
        assert_eq!(settings.font_size, Settings::MIN_FONT_SIZE);
        assert_eq!(settings.split_ratio, Settings::MAX_SPLIT_RATIO);
    }
}
