use serde::{Deserialize, Serialize};

use crate::store::KvStore;

/// Keys of the settings store.
pub mod keys {
    pub const ALWAYS_ON_TOP: &str = "common.alwaysOnTop";
    pub const MODE: &str = "common.mode";
    pub const OPEN_AT_LOGIN: &str = "common.openAtLogin";
    pub const BOSS_KEY: &str = "shortcuts.bossKey";
    pub const TRIGGER_POSITION: &str = "triggerMode.triggerPosition";
}

/// Keys of the user data store.
pub mod user_keys {
    pub const WIN_POSITION: &str = "winPosition";
    pub const WIN_SIZE: &str = "winSize";
    pub const LAST_PAGE: &str = "lastPage";
    pub const BOOK_LIST: &str = "bookList";
    pub const LAST_URL: &str = "lastUrl";
}

pub const DEFAULT_BOSS_KEY: &str = "Alt+CommandOrControl+Z";

/// Command line flag passed by the login item.
pub const OPEN_AS_HIDDEN_ARG: &str = "--openAsHidden";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Resident,
    Trigger,
}

/// Screen corner of the trigger icon relative to the main window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerPosition {
    LeftTop,
    #[default]
    RightTop,
    LeftBottom,
    RightBottom,
}

impl TriggerPosition {
    pub fn is_right(self) -> bool {
        matches!(self, Self::RightTop | Self::RightBottom)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::LeftBottom | Self::RightBottom)
    }
}

/// Typed snapshot of the settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub always_on_top: bool,
    pub mode: Mode,
    pub open_at_login: bool,
    pub boss_key: String,
    pub trigger_position: TriggerPosition,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            always_on_top: true,
            mode: Mode::default(),
            open_at_login: false,
            boss_key: DEFAULT_BOSS_KEY.to_string(),
            trigger_position: TriggerPosition::default(),
        }
    }
}

impl Settings {
    pub fn load(store: &KvStore) -> Self {
        let defaults = Self::default();
        Self {
            always_on_top: store.get_as(keys::ALWAYS_ON_TOP, defaults.always_on_top),
            mode: store.get_as(keys::MODE, defaults.mode),
            open_at_login: store.get_as(keys::OPEN_AT_LOGIN, defaults.open_at_login),
            boss_key: store.get_as(keys::BOSS_KEY, defaults.boss_key),
            trigger_position: store.get_as(keys::TRIGGER_POSITION, defaults.trigger_position),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_store_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path().join("settings.json"));
        assert_eq!(Settings::load(&store), Settings::default());
    }

    #[test]
    fn reads_namespaced_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path().join("settings.json"));
        store.set(keys::MODE, json!("trigger")).expect("set");
        store.set(keys::TRIGGER_POSITION, json!("left-bottom")).expect("set");
        store.set(keys::ALWAYS_ON_TOP, json!(false)).expect("set");
        store.set(keys::BOSS_KEY, json!("Alt+Shift+F")).expect("set");

        let settings = Settings::load(&store);
        assert_eq!(settings.mode, Mode::Trigger);
        assert_eq!(settings.trigger_position, TriggerPosition::LeftBottom);
        assert!(!settings.always_on_top);
        assert_eq!(settings.boss_key, "Alt+Shift+F");
    }

    #[test]
    fn unknown_mode_falls_back_to_resident() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = KvStore::open(dir.path().join("settings.json"));
        store.set(keys::MODE, json!("floating")).expect("set");
        assert_eq!(Settings::load(&store).mode, Mode::Resident);
    }
}
