//! Events pushed from the core to the widget UI.

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Emitter, Runtime};
use tracing::warn;

use crate::books::Book;
use crate::settings::Mode;
use crate::windows;

/// Pages the main window can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Browser,
    Book,
    Settings,
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    ChangeMode(Mode),
    VisibleChange(bool),
    RefreshBookList(Vec<Book>),
    ChangePage(Page),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChangeMode(_) => "change-mode",
            Self::VisibleChange(_) => "visible-change",
            Self::RefreshBookList(_) => "refresh-book-list",
            Self::ChangePage(_) => "change-page",
        }
    }

    /// Deliver the event to the main window. A missing window drops it.
    pub fn emit<R: Runtime>(&self, app: &AppHandle<R>) {
        let name = self.name();
        let result = match self {
            Self::ChangeMode(mode) => app.emit_to(windows::MAIN, name, mode),
            Self::VisibleChange(visible) => app.emit_to(windows::MAIN, name, visible),
            Self::RefreshBookList(books) => app.emit_to(windows::MAIN, name, books),
            Self::ChangePage(page) => app.emit_to(windows::MAIN, name, page),
        };
        if let Err(e) = result {
            warn!(event = name, error = %e, "Failed to emit UI event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_use_lowercase_names() {
        assert_eq!(serde_json::to_string(&Page::Browser).expect("page"), "\"browser\"");
        let page: Page = serde_json::from_str("\"book\"").expect("page");
        assert_eq!(page, Page::Book);
        assert!(serde_json::from_str::<Page>("\"reader\"").is_err());
    }

    #[test]
    fn event_names_match_ui_listeners() {
        assert_eq!(UiEvent::ChangeMode(Mode::Trigger).name(), "change-mode");
        assert_eq!(UiEvent::VisibleChange(true).name(), "visible-change");
        assert_eq!(UiEvent::RefreshBookList(Vec::new()).name(), "refresh-book-list");
        assert_eq!(UiEvent::ChangePage(Page::Settings).name(), "change-page");
    }
}
