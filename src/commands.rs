use std::path::{Path, PathBuf};

use serde_json::Value;
use tauri::{AppHandle, Manager, Runtime, State, WebviewWindow};
use tauri_plugin_autostart::ManagerExt;
use tauri_plugin_dialog::DialogExt;

use crate::books::{self, Book, Chapter, ResumePoint};
use crate::browser;
use crate::context::AppContext;
use crate::drag::{DragSession, WindowDrag};
use crate::error::{AppError, Result};
use crate::events::{Page, UiEvent};
use crate::mode;
use crate::settings::user_keys;
use crate::shortcuts;
use crate::windows;

const UI_TARGET: &str = "fisher::ui";

// --- Window movement ---

#[tauri::command]
pub fn window_move_start(window: WebviewWindow, state: State<'_, AppContext>) {
    match DragSession::start(WindowDrag(window)) {
        Some(session) => {
            tracing::debug!(offset = ?session.offset(), "Window drag started");
            state.begin_drag(session);
        }
        None => tracing::debug!("Drag not started, window geometry unavailable"),
    }
}

#[tauri::command]
pub fn window_move_end(window: WebviewWindow, state: State<'_, AppContext>) {
    if let Some(position) = state.end_drag() {
        if window.label() == windows::MAIN {
            state.store_position(position);
        }
    }
}

// --- Pages and settings ---

#[tauri::command]
pub fn change_page(app: AppHandle, state: State<'_, AppContext>, page: Page) {
    if let Ok(value) = serde_json::to_value(page) {
        state.user_data.set_logged(user_keys::LAST_PAGE, value);
    }
    UiEvent::ChangePage(page).emit(&app);
}

/// Open `url` in the widget. Returns the normalized address that was loaded.
#[tauri::command]
pub fn browse(app: AppHandle, state: State<'_, AppContext>, url: String) -> Result<String> {
    let url = browser::normalize_url(&url)?;
    state.user_data.set_logged(user_keys::LAST_URL, Value::String(url.to_string()));
    browser::navigate(&app, &url)?;
    Ok(url.into())
}

#[tauri::command]
pub fn update_settings(app: AppHandle) -> Result<()> {
    apply_settings(&app)
}

#[tauri::command]
pub async fn open_settings(app: AppHandle) -> Result<()> {
    windows::open_settings_window(&app)
}

#[tauri::command]
pub fn close_settings(app: AppHandle) -> Result<()> {
    windows::close_settings_window(&app)
}

/// Push the stored settings onto the running app.
///
/// Every step runs and the mode is always re-applied; the first failure is returned.
pub fn apply_settings<R: Runtime>(app: &AppHandle<R>) -> Result<()> {
    let settings = app.state::<AppContext>().settings_snapshot();
    tracing::info!(?settings, "Applying settings");

    let boss_key = shortcuts::register_boss_key(app, &settings.boss_key);
    let always_on_top = match app.get_webview_window(windows::MAIN) {
        Some(window) => window.set_always_on_top(settings.always_on_top).map_err(AppError::from),
        None => Ok(()),
    };
    let login_item = sync_login_item(app, settings.open_at_login);

    mode::handle_mode(app);
    first_failure([
        ("boss key", boss_key),
        ("always on top", always_on_top),
        ("login item", login_item),
    ])
}

fn sync_login_item<R: Runtime>(app: &AppHandle<R>, open_at_login: bool) -> Result<()> {
    let autolaunch = app.autolaunch();
    if open_at_login {
        autolaunch.enable()?;
    } else if autolaunch.is_enabled()? {
        autolaunch.disable()?;
    }
    Ok(())
}

fn first_failure<const N: usize>(steps: [(&str, Result<()>); N]) -> Result<()> {
    let mut first = None;
    for (step, result) in steps {
        if let Err(e) = result {
            tracing::warn!(step, error = %e, "Setting was not applied");
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}

// --- Key-value bridge ---

#[tauri::command]
pub fn get_store_value(state: State<'_, AppContext>, key: String, default_value: Option<Value>) -> Value {
    state.settings.get_or(&key, default_value.unwrap_or(Value::Null))
}

#[tauri::command]
pub fn set_store_value(state: State<'_, AppContext>, key: String, value: Value) -> Result<()> {
    state.settings.set(&key, value)
}

#[tauri::command]
pub fn get_user_data(state: State<'_, AppContext>, key: String, default_value: Option<Value>) -> Value {
    state.user_data.get_or(&key, default_value.unwrap_or(Value::Null))
}

#[tauri::command]
pub fn set_user_data(state: State<'_, AppContext>, key: String, value: Value) -> Result<()> {
    state.user_data.set(&key, value)
}

// --- Books ---

#[tauri::command]
pub fn get_book_list(state: State<'_, AppContext>) -> Vec<Book> {
    books::load_list(&state.user_data)
}

#[tauri::command]
pub fn set_book_list(state: State<'_, AppContext>, books: Vec<Book>) {
    books::save_list(&state.user_data, &books);
}

#[tauri::command]
pub fn get_book_content(path: String) -> String {
    books::read_content(Path::new(&path))
}

#[tauri::command]
pub fn get_book_chapters(state: State<'_, AppContext>, path: String) -> Vec<Chapter> {
    let book = stored_book(&state, &path);
    let content = books::read_content(Path::new(&path));
    books::split_chapters(&content, &book.chapter_title_reg_exp)
}

#[derive(serde::Serialize)]
pub struct OpenedBook {
    chapters: Vec<Chapter>,
    resume: ResumePoint,
}

/// Chapters of the book at `path` plus where reading left off.
#[tauri::command]
pub fn open_book(state: State<'_, AppContext>, path: String) -> OpenedBook {
    let book = stored_book(&state, &path);
    let content = books::read_content(Path::new(&path));
    let chapters = books::split_chapters(&content, &book.chapter_title_reg_exp);
    let resume = books::resume_point(&book, &chapters);
    tracing::debug!(path = %path, chapters = chapters.len(), ?resume, "Opened book");
    OpenedBook { chapters, resume }
}

fn stored_book(state: &AppContext, path: &str) -> Book {
    books::load_list(&state.user_data)
        .into_iter()
        .find(|book| book.path == path)
        .unwrap_or_else(|| Book::from_path(Path::new(path)))
}

#[tauri::command]
pub fn check_book(path: String) -> bool {
    Path::new(&path).is_file()
}

#[tauri::command]
pub async fn add_book(app: AppHandle, state: State<'_, AppContext>) -> Result<Vec<Book>> {
    let (tx, rx) = std::sync::mpsc::channel();
    app.dialog()
        .file()
        .set_title("Add books")
        .add_filter("Text", &["txt"])
        .pick_files(move |files| {
            let _ = tx.send(files);
        });
    let picked = rx.recv().map_err(|e| AppError::Dialog(e.to_string()))?;

    let mut list = books::load_list(&state.user_data);
    let Some(files) = picked else {
        return Ok(list);
    };
    let paths: Vec<PathBuf> = files.into_iter().filter_map(|f| f.into_path().ok()).collect();

    let added = books::merge_paths(&mut list, paths);
    tracing::info!(added, total = list.len(), "Imported books");
    if added > 0 {
        books::save_list(&state.user_data, &list);
    }
    UiEvent::RefreshBookList(list.clone()).emit(&app);
    Ok(list)
}

// --- Trigger mode ---

#[tauri::command]
pub fn trigger_mode_enter(app: AppHandle) {
    mode::on_trigger_enter(&app);
}

#[tauri::command]
pub fn trigger_mode_leave(app: AppHandle) {
    mode::on_trigger_leave(&app);
}

// --- UI logging ---

#[tauri::command]
pub fn log(message: String) {
    tracing::info!(target: UI_TARGET, "{message}");
}

#[tauri::command]
pub fn warn(message: String) {
    tracing::warn!(target: UI_TARGET, "{message}");
}

#[tauri::command]
pub fn error(message: String) {
    tracing::error!(target: UI_TARGET, "{message}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_steps_applied_is_ok() {
        assert!(first_failure([("boss key", Ok(())), ("login item", Ok(()))]).is_ok());
    }

    #[test]
    fn earliest_failure_wins_over_later_ones() {
        let result = first_failure([
            ("boss key", Ok(())),
            ("always on top", Err(AppError::InvalidInput("first".into()))),
            ("login item", Err(AppError::InvalidInput("second".into()))),
        ]);
        assert_eq!(result.map_err(|e| e.to_string()), Err("Invalid input: first".to_string()));
    }
}
