use tauri::{
    AppHandle, Manager, PhysicalPosition, PhysicalSize, Position, Runtime, Size, WebviewUrl,
    WebviewWindow, WebviewWindowBuilder,
};
use tracing::{debug, info};

use crate::browser;
use crate::context::AppContext;
use crate::error::Result;
use crate::mode::{WidgetWindow, ICON_SIZE};

pub const MAIN: &str = "main";
pub const ICON: &str = "icon";
pub const SETTINGS: &str = "settings";

const DEFAULT_SIZE: (f64, f64) = (400.0, 600.0);
const MIN_SIZE: (f64, f64) = (200.0, 150.0);

impl<R: Runtime> WidgetWindow for WebviewWindow<R> {
    fn visible(&self) -> bool {
        self.is_visible().unwrap_or(false)
    }

    fn reveal(&self) {
        let _ = self.show();
    }

    fn conceal(&self) {
        let _ = self.hide();
    }

    fn place(&self, x: i32, y: i32) {
        let _ = self.set_position(Position::Physical(PhysicalPosition { x, y }));
    }
}

/// Frameless widget window, hidden until the mode is applied.
pub fn create_main_window<R: Runtime>(app: &AppHandle<R>, ctx: &AppContext) -> Result<WebviewWindow<R>> {
    let settings = ctx.settings_snapshot();
    let window = WebviewWindowBuilder::new(app, MAIN, WebviewUrl::App("index.html".into()))
        .title("Fisher")
        .inner_size(DEFAULT_SIZE.0, DEFAULT_SIZE.1)
        .min_inner_size(MIN_SIZE.0, MIN_SIZE.1)
        .decorations(false)
        .skip_taskbar(true)
        .always_on_top(settings.always_on_top)
        .visible(false)
        .initialization_script(&browser::same_window_script())
        .build()?;

    restore_geometry(&window, ctx);
    persist_size(&window, ctx);
    Ok(window)
}

/// Trigger icon shown at a corner of the main window in trigger mode.
///
/// Only the round badge in `icon.html` is painted; the rest of the square is see-through.
pub fn create_icon_window<R: Runtime>(app: &AppHandle<R>) -> Result<WebviewWindow<R>> {
    let edge = f64::from(ICON_SIZE);
    let window = WebviewWindowBuilder::new(app, ICON, WebviewUrl::App("icon.html".into()))
        .title("Fisher")
        .inner_size(edge, edge)
        .resizable(false)
        .decorations(false)
        .transparent(true)
        .shadow(false)
        .skip_taskbar(true)
        .always_on_top(true)
        .focused(false)
        .visible(false)
        .build()?;
    Ok(window)
}

/// Show the settings window, creating it on first use.
pub fn open_settings_window<R: Runtime>(app: &AppHandle<R>) -> Result<()> {
    if let Some(window) = app.get_webview_window(SETTINGS) {
        window.show()?;
        window.set_focus()?;
        return Ok(());
    }

    info!("Opening settings window");
    WebviewWindowBuilder::new(app, SETTINGS, WebviewUrl::App("settings.html".into()))
        .title("Fisher Settings")
        .inner_size(480.0, 420.0)
        .resizable(false)
        .center()
        .build()?;
    Ok(())
}

pub fn close_settings_window<R: Runtime>(app: &AppHandle<R>) -> Result<()> {
    if let Some(window) = app.get_webview_window(SETTINGS) {
        window.close()?;
    }
    Ok(())
}

/// Outer position and size of a live window, either half `None` if unreadable.
pub fn live_geometry<R: Runtime>(window: &WebviewWindow<R>) -> (Option<(i32, i32)>, Option<(u32, u32)>) {
    let position = window.outer_position().ok().map(|p| (p.x, p.y));
    let size = window.outer_size().ok().map(|s| (s.width, s.height));
    (position, size)
}

fn restore_geometry<R: Runtime>(window: &WebviewWindow<R>, ctx: &AppContext) {
    if let Some((width, height)) = ctx.stored_size().filter(|(w, h)| *w > 0 && *h > 0) {
        let _ = window.set_size(Size::Physical(PhysicalSize { width, height }));
    }
    if let Some((x, y)) = ctx.stored_position() {
        let _ = window.set_position(Position::Physical(PhysicalPosition { x, y }));
    }
    debug!(
        position = ?ctx.stored_position(),
        size = ?ctx.stored_size(),
        "Restored window geometry"
    );
}

fn persist_size<R: Runtime>(window: &WebviewWindow<R>, ctx: &AppContext) {
    if let Ok(size) = window.outer_size() {
        ctx.store_size((size.width, size.height));
    }
}

/// Store the current bounds of the main window after an OS resize.
pub fn persist_geometry<R: Runtime>(window: &tauri::Window<R>, ctx: &AppContext) {
    if let Ok(size) = window.outer_size() {
        ctx.store_size((size.width, size.height));
    }
    if let Ok(position) = window.outer_position() {
        ctx.store_position((position.x, position.y));
    }
}
