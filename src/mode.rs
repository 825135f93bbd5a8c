//! Resident/trigger mode handling for the main and icon windows.
//!
//! The transitions are written against [`WidgetWindow`] so they can run on
//! real webview windows or on test doubles. The `on_*` functions at the
//! bottom bind them to the running app.

use tauri::{AppHandle, Manager, Runtime};
use tracing::debug;

use crate::context::AppContext;
use crate::events::UiEvent;
use crate::settings::{Mode, TriggerPosition};
use crate::windows;

/// Edge length of the trigger icon window, in physical pixels.
pub const ICON_SIZE: i32 = 24;

pub trait WidgetWindow {
    fn visible(&self) -> bool;
    fn reveal(&self);
    fn conceal(&self);
    fn place(&self, x: i32, y: i32);
}

/// Top-left corner of the trigger icon for a main window at `position` with `size`.
///
/// Returns `None` when either half of the geometry is unknown or the corner falls outside `i32`.
pub fn trigger_position(
    corner: TriggerPosition,
    position: Option<(i32, i32)>,
    size: Option<(u32, u32)>,
) -> Option<(i32, i32)> {
    let (x, y) = position?;
    let (width, height) = size?;
    let width = i32::try_from(width).ok()?;
    let height = i32::try_from(height).ok()?;

    let x = if corner.is_right() {
        x.checked_add(width)?.checked_sub(ICON_SIZE)?
    } else {
        x
    };
    let y = if corner.is_bottom() {
        y.checked_add(height)?.checked_sub(ICON_SIZE)?
    } else {
        y
    };
    Some((x, y))
}

/// Bring both windows in line with `mode`. Returns whether the main window is now visible.
pub fn apply_mode<W: WidgetWindow>(
    mode: Mode,
    main: Option<&W>,
    icon: Option<&W>,
    icon_at: Option<(i32, i32)>,
) -> bool {
    match mode {
        Mode::Resident => {
            if let Some(icon) = icon {
                icon.conceal();
            }
            if let Some(main) = main {
                main.reveal();
            }
            true
        }
        Mode::Trigger => {
            if let Some(main) = main {
                main.conceal();
            }
            show_icon(icon, icon_at);
            false
        }
    }
}

/// Boss key. Returns the main window visibility to report to the UI.
pub fn toggle_visibility<W: WidgetWindow>(mode: Mode, main: Option<&W>, icon: Option<&W>) -> bool {
    let main_visible = main.is_some_and(|w| w.visible());
    let icon_visible = icon.is_some_and(|w| w.visible());

    match mode {
        Mode::Resident => match main {
            Some(main) if main_visible => {
                main.conceal();
                false
            }
            Some(main) => {
                main.reveal();
                true
            }
            None => false,
        },
        Mode::Trigger => {
            if let Some(main) = main {
                main.conceal();
            }
            if main_visible || icon_visible {
                if let Some(icon) = icon {
                    icon.conceal();
                }
            } else if let Some(icon) = icon {
                icon.reveal();
            }
            false
        }
    }
}

/// Pointer entered the icon: swap the icon for the main window.
pub fn enter_trigger<W: WidgetWindow>(main: Option<&W>, icon: Option<&W>) -> bool {
    if let Some(main) = main {
        main.reveal();
    }
    if let Some(icon) = icon {
        icon.conceal();
    }
    true
}

/// Pointer left the main window. Only acts in trigger mode.
pub fn leave_trigger<W: WidgetWindow>(
    mode: Mode,
    main: Option<&W>,
    icon: Option<&W>,
    icon_at: Option<(i32, i32)>,
) -> Option<bool> {
    if mode != Mode::Trigger {
        return None;
    }
    show_icon(icon, icon_at);
    if let Some(main) = main {
        main.conceal();
    }
    Some(false)
}

fn show_icon<W: WidgetWindow>(icon: Option<&W>, icon_at: Option<(i32, i32)>) {
    let Some(icon) = icon else {
        return;
    };
    if let Some((x, y)) = icon_at {
        icon.place(x, y);
    }
    icon.reveal();
}

// --- App bindings ---

fn icon_anchor<R: Runtime>(app: &AppHandle<R>, ctx: &AppContext, corner: TriggerPosition) -> Option<(i32, i32)> {
    let (position, size) = match app.get_webview_window(windows::MAIN) {
        Some(main) => windows::live_geometry(&main),
        None => (None, None),
    };
    let position = position.or_else(|| ctx.stored_position());
    let size = size.or_else(|| ctx.stored_size());
    trigger_position(corner, position, size)
}

/// Re-read the mode from the settings store and apply it.
pub fn handle_mode<R: Runtime>(app: &AppHandle<R>) {
    let ctx = app.state::<AppContext>();
    let settings = ctx.settings_snapshot();
    let main = app.get_webview_window(windows::MAIN);
    let icon = app.get_webview_window(windows::ICON);
    let anchor = icon_anchor(app, &ctx, settings.trigger_position);

    debug!(mode = ?settings.mode, ?anchor, "Applying mode");
    let visible = apply_mode(settings.mode, main.as_ref(), icon.as_ref(), anchor);
    UiEvent::ChangeMode(settings.mode).emit(app);
    UiEvent::VisibleChange(visible).emit(app);
}

pub fn on_boss_key<R: Runtime>(app: &AppHandle<R>) {
    let mode = app.state::<AppContext>().settings_snapshot().mode;
    let main = app.get_webview_window(windows::MAIN);
    let icon = app.get_webview_window(windows::ICON);

    let visible = toggle_visibility(mode, main.as_ref(), icon.as_ref());
    debug!(?mode, visible, "Boss key toggled visibility");
    UiEvent::VisibleChange(visible).emit(app);
}

pub fn on_trigger_enter<R: Runtime>(app: &AppHandle<R>) {
    let main = app.get_webview_window(windows::MAIN);
    let icon = app.get_webview_window(windows::ICON);
    let visible = enter_trigger(main.as_ref(), icon.as_ref());
    UiEvent::VisibleChange(visible).emit(app);
}

pub fn on_trigger_leave<R: Runtime>(app: &AppHandle<R>) {
    let ctx = app.state::<AppContext>();
    let settings = ctx.settings_snapshot();
    let main = app.get_webview_window(windows::MAIN);
    let icon = app.get_webview_window(windows::ICON);
    let anchor = icon_anchor(app, &ctx, settings.trigger_position);

    if let Some(visible) = leave_trigger(settings.mode, main.as_ref(), icon.as_ref(), anchor) {
        UiEvent::VisibleChange(visible).emit(app);
    }
}

/// Show whatever the current mode treats as the visible affordance.
pub fn reveal<R: Runtime>(app: &AppHandle<R>) {
    let ctx = app.state::<AppContext>();
    let settings = ctx.settings_snapshot();
    match settings.mode {
        Mode::Resident => {
            if let Some(main) = app.get_webview_window(windows::MAIN) {
                main.reveal();
                let _ = main.set_focus();
            }
            UiEvent::VisibleChange(true).emit(app);
        }
        Mode::Trigger => {
            let icon = app.get_webview_window(windows::ICON);
            let anchor = icon_anchor(app, &ctx, settings.trigger_position);
            show_icon(icon.as_ref(), anchor);
        }
    }
}
