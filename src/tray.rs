use tauri::{
    image::Image,
    menu::{CheckMenuItem, CheckMenuItemBuilder, MenuBuilder, MenuItemBuilder, PredefinedMenuItem},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager, Runtime,
};
use tracing::{error, info};

use crate::context::AppContext;
use crate::mode;
use crate::settings::keys;
use crate::windows;

pub fn create_tray<R: Runtime>(app: &AppHandle<R>) -> Result<(), Box<dyn std::error::Error>> {
    let always_on_top = app.state::<AppContext>().settings_snapshot().always_on_top;

    let settings = MenuItemBuilder::with_id("settings", "Settings").build(app)?;
    let separator = PredefinedMenuItem::separator(app)?;
    let show = MenuItemBuilder::with_id("show", "Show").build(app)?;
    let on_top = CheckMenuItemBuilder::with_id("always-on-top", "Always on Top")
        .checked(always_on_top)
        .build(app)?;
    let quit = MenuItemBuilder::with_id("quit", "Quit").build(app)?;

    let menu = MenuBuilder::new(app)
        .item(&settings)
        .item(&separator)
        .item(&show)
        .item(&on_top)
        .item(&quit)
        .build()?;

    let icon = app
        .default_window_icon()
        .cloned()
        .unwrap_or_else(|| Image::new_owned(vec![0, 0, 0, 255], 1, 1));

    let _tray = TrayIconBuilder::new()
        .icon(icon)
        .menu(&menu)
        .tooltip("Fisher")
        .on_menu_event(move |app, event| {
            handle_menu_event(app, event.id().as_ref(), &on_top);
        })
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                mode::reveal(tray_icon.app_handle());
            }
        })
        .build(app)?;

    Ok(())
}

fn handle_menu_event<R: Runtime>(app: &AppHandle<R>, event_id: &str, on_top: &CheckMenuItem<R>) {
    match event_id {
        "settings" => {
            if let Err(e) = windows::open_settings_window(app) {
                error!(error = %e, "Failed to open settings window");
            }
        }
        "show" => mode::reveal(app),
        "always-on-top" => toggle_always_on_top(app, on_top),
        "quit" => {
            info!("Quit requested from tray");
            app.exit(0);
        }
        _ => {}
    }
}

fn toggle_always_on_top<R: Runtime>(app: &AppHandle<R>, on_top: &CheckMenuItem<R>) {
    let Some(window) = app.get_webview_window(windows::MAIN) else {
        return;
    };
    let new_value = !window.is_always_on_top().unwrap_or(false);
    let _ = window.set_always_on_top(new_value);
    let _ = on_top.set_checked(new_value);

    app.state::<AppContext>()
        .settings
        .set_logged(keys::ALWAYS_ON_TOP, serde_json::Value::Bool(new_value));
    info!(always_on_top = new_value, "Toggled always on top from tray");
}
