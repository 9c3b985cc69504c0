//! Configuration module for markdeck
//!
//! User preferences and their JSON persistence in the platform config
//! directory.

mod persistence;
mod settings;

pub use persistence::{load_config, save_config_silent};
pub use settings::{DocumentWidth, Settings, Theme, ViewMode, WindowSize};
