//! Error types for the widget core

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Result type alias using the widget's [`AppError`]
pub type Result<T> = std::result::Result<T, AppError>;

/// Errors surfaced by command handlers and setup routines
#[derive(Error, Debug)]
pub enum AppError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Window, menu or tray error from the platform layer
    #[error("Platform error: {0}")]
    Tauri(#[from] tauri::Error),

    /// Global shortcut registration error
    #[error("Shortcut error: {0}")]
    Shortcut(#[from] tauri_plugin_global_shortcut::Error),

    /// Login item error
    #[error("Autostart error: {0}")]
    Autostart(#[from] tauri_plugin_autostart::Error),

    /// Native dialog error
    #[error("Dialog error: {0}")]
    Dialog(String),

    /// Invalid input from the UI
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

// Commands hand errors back to the webview as plain strings.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_display_string() {
        let err = AppError::InvalidInput("unknown page".to_string());
        let json = serde_json::to_string(&err).expect("error should serialize");
        assert_eq!(json, "\"Invalid input: unknown page\"");
    }
}
