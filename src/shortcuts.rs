use std::str::FromStr;

use tauri::{AppHandle, Runtime};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, Shortcut, ShortcutState};
use tracing::info;

use crate::error::{AppError, Result};
use crate::mode;
use crate::settings::DEFAULT_BOSS_KEY;

const MAX_ACCELERATOR_LEN: usize = 64;

/// Parse an accelerator such as `Alt+CommandOrControl+Z`. Blank input means the default.
pub fn parse_accelerator(value: &str) -> Result<Shortcut> {
    let trimmed = value.trim();
    if trimmed.len() > MAX_ACCELERATOR_LEN {
        return Err(AppError::InvalidInput("shortcut is too long".to_string()));
    }
    let accelerator = if trimmed.is_empty() { DEFAULT_BOSS_KEY } else { trimmed };
    Shortcut::from_str(accelerator)
        .map_err(|e| AppError::InvalidInput(format!("invalid shortcut `{accelerator}`: {e}")))
}

/// Replace every registered shortcut with the boss key.
pub fn register_boss_key<R: Runtime>(app: &AppHandle<R>, accelerator: &str) -> Result<()> {
    let shortcuts = app.global_shortcut();
    shortcuts.unregister_all()?;

    let shortcut = parse_accelerator(accelerator)?;
    shortcuts.on_shortcut(shortcut, |app, _shortcut, event| {
        if event.state == ShortcutState::Pressed {
            mode::on_boss_key(app);
        }
    })?;

    info!(accelerator, "Boss key registered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tauri_plugin_global_shortcut::{Code, Modifiers};

    #[test]
    fn default_boss_key_parses() {
        let shortcut = parse_accelerator(DEFAULT_BOSS_KEY).expect("default accelerator");
        assert_eq!(shortcut.key, Code::KeyZ);
        assert!(shortcut.mods.contains(Modifiers::ALT));
        #[cfg(target_os = "macos")]
        assert!(shortcut.mods.contains(Modifiers::SUPER));
        #[cfg(not(target_os = "macos"))]
        assert!(shortcut.mods.contains(Modifiers::CONTROL));
    }

    #[test]
    fn blank_means_default() {
        let blank = parse_accelerator("   ").expect("blank accelerator");
        let default = parse_accelerator(DEFAULT_BOSS_KEY).expect("default accelerator");
        assert_eq!(blank, default);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_accelerator("Alt+NotAKey").is_err());
        assert!(parse_accelerator(&"Alt+".repeat(40)).is_err());
    }
}
