use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tauri::{AppHandle, Manager, Runtime};
use tracing::warn;

use crate::drag::DragSession;
use crate::settings::{user_keys, Settings};
use crate::store::KvStore;

const SETTINGS_FILE: &str = "settings.json";
const USER_DATA_FILE: &str = "user-data.json";

/// Everything the running widget shares between commands, the tray and the hotkey.
pub struct AppContext {
    pub settings: KvStore,
    pub user_data: KvStore,
    pub open_as_hidden: bool,
    drag: Mutex<Option<DragSession>>,
}

impl AppContext {
    pub fn new(config_dir: &Path, open_as_hidden: bool) -> Self {
        Self {
            settings: KvStore::open(config_dir.join(SETTINGS_FILE)),
            user_data: KvStore::open(config_dir.join(USER_DATA_FILE)),
            open_as_hidden,
            drag: Mutex::new(None),
        }
    }

    pub fn settings_snapshot(&self) -> Settings {
        Settings::load(&self.settings)
    }

    pub fn stored_position(&self) -> Option<(i32, i32)> {
        self.user_data.get_as(user_keys::WIN_POSITION, None)
    }

    pub fn stored_size(&self) -> Option<(u32, u32)> {
        self.user_data.get_as(user_keys::WIN_SIZE, None)
    }

    pub fn store_position(&self, (x, y): (i32, i32)) {
        self.user_data
            .set_logged(user_keys::WIN_POSITION, serde_json::json!([x, y]));
    }

    pub fn store_size(&self, (width, height): (u32, u32)) {
        self.user_data
            .set_logged(user_keys::WIN_SIZE, serde_json::json!([width, height]));
    }

    /// Replace the active drag session. The previous one, if any, is stopped.
    pub fn begin_drag(&self, session: DragSession) {
        let previous = self.drag_slot().replace(session);
        drop(previous);
    }

    /// End the active drag session and return where it left the window.
    pub fn end_drag(&self) -> Option<(i32, i32)> {
        let session = self.drag_slot().take()?;
        session.finish()
    }

    fn drag_slot(&self) -> MutexGuard<'_, Option<DragSession>> {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Directory holding the settings and user data files.
pub fn config_dir<R: Runtime>(app: &AppHandle<R>) -> PathBuf {
    match app.path().app_config_dir() {
        Ok(path) => path,
        Err(e) => {
            warn!(error = %e, "Failed to resolve app config dir");
            dirs::config_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("fisher")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_round_trips_through_user_data() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = AppContext::new(dir.path(), false);
        assert_eq!(ctx.stored_position(), None);

        ctx.store_position((-20, 40));
        ctx.store_size((400, 300));

        let reopened = AppContext::new(dir.path(), false);
        assert_eq!(reopened.stored_position(), Some((-20, 40)));
        assert_eq!(reopened.stored_size(), Some((400, 300)));
    }

    #[test]
    fn ending_without_a_drag_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let ctx = AppContext::new(dir.path(), false);
        assert_eq!(ctx.end_drag(), None);
    }
}
