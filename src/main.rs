#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod books;
mod browser;
mod commands;
mod context;
mod drag;
mod error;
mod events;
mod logging;
mod mode;
mod settings;
mod shortcuts;
mod store;
mod tray;
mod windows;

use context::AppContext;
use settings::OPEN_AS_HIDDEN_ARG;
use tauri::Manager;
use tauri_plugin_autostart::MacosLauncher;
use tracing::{error, info, warn};

fn main() {
    let open_as_hidden = std::env::args().any(|arg| arg == OPEN_AS_HIDDEN_ARG);

    tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            mode::reveal(app);
        }))
        .plugin(tauri_plugin_process::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_autostart::init(
            MacosLauncher::LaunchAgent,
            Some(vec![OPEN_AS_HIDDEN_ARG]),
        ))
        .setup(move |app| {
            // Run as an accessory app: no dock icon, the tray is the entry point
            #[cfg(target_os = "macos")]
            {
                app.set_activation_policy(tauri::ActivationPolicy::Accessory);
            }

            match logging::init_logging(app.handle()) {
                Some(state) => {
                    app.manage(state);
                }
                None => warn!("File logging was not initialized"),
            }

            let config_dir = context::config_dir(app.handle());
            info!(path = %config_dir.display(), open_as_hidden, "Fisher starting");
            app.manage(AppContext::new(&config_dir, open_as_hidden));

            let handle = app.handle();
            let ctx = handle.state::<AppContext>();
            info!(
                settings = %ctx.settings.path().display(),
                user_data = %ctx.user_data.path().display(),
                "Stores opened"
            );
            windows::create_main_window(handle, &ctx)?;
            windows::create_icon_window(handle)?;

            let boss_key = ctx.settings_snapshot().boss_key;
            if let Err(e) = shortcuts::register_boss_key(handle, &boss_key) {
                error!(accelerator = %boss_key, error = %e, "Failed to register boss key");
            }

            if let Err(e) = tray::create_tray(handle) {
                error!(error = %e, "Failed to create tray");
            }

            if open_as_hidden {
                info!("Started hidden from login item");
            } else {
                mode::handle_mode(handle);
            }

            Ok(())
        })
        .on_window_event(|window, event| match event {
            // Widget windows hide instead of closing; the tray quits the app
            tauri::WindowEvent::CloseRequested { api, .. }
                if matches!(window.label(), windows::MAIN | windows::ICON) =>
            {
                let _ = window.hide();
                api.prevent_close();
            }
            tauri::WindowEvent::Resized(size)
                if window.label() == windows::MAIN && size.width > 0 && size.height > 0 =>
            {
                let ctx = window.state::<AppContext>();
                windows::persist_geometry(window, &ctx);
            }
            _ => {}
        })
        .invoke_handler(tauri::generate_handler![
            commands::window_move_start,
            commands::window_move_end,
            commands::change_page,
            commands::browse,
            commands::update_settings,
            commands::open_settings,
            commands::close_settings,
            commands::get_store_value,
            commands::set_store_value,
            commands::get_user_data,
            commands::set_user_data,
            commands::get_book_list,
            commands::set_book_list,
            commands::get_book_content,
            commands::get_book_chapters,
            commands::open_book,
            commands::add_book,
            commands::check_book,
            commands::trigger_mode_enter,
            commands::trigger_mode_leave,
            commands::log,
            commands::warn,
            commands::error,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
