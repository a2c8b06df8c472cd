#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod commands;
mod setup;

use std::sync::Arc;

use task_relay::ui::{WebviewUiTarget, MAIN_WINDOW_LABEL};
use task_relay::TaskRelay;
use tauri::{webview::PageLoadEvent, Manager, RunEvent, WindowEvent};

fn main() {
    let runtime = tokio::runtime::Runtime::new().expect("failed to create tokio runtime");
    tauri::async_runtime::set(runtime.handle().clone());

    let relay = match setup::initialize_app(runtime.handle().clone()) {
        Ok(relay) => relay,
        Err(e) => {
            eprintln!("应用初始化失败: {}", e);
            std::process::exit(1);
        }
    };

    let app = tauri::Builder::default()
        .manage(relay)
        .invoke_handler(tauri::generate_handler![
            commands::task_commands::start_task,
            commands::task_commands::stop_task,
            commands::task_commands::subscribe_tasks_status,
            commands::task_commands::ipc_send_sync,
            commands::log_commands::is_release_build,
            commands::log_commands::get_log_config,
            commands::log_commands::update_log_config,
        ])
        .on_page_load(|webview, payload| {
            if webview.label() != MAIN_WINDOW_LABEL {
                return;
            }
            if let PageLoadEvent::Finished = payload.event() {
                let app_handle = webview.app_handle();
                let relay = app_handle.state::<TaskRelay>();
                relay.attach_ui(Arc::new(WebviewUiTarget::new(
                    app_handle.clone(),
                    relay.channels(),
                )));
            }
        })
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW_LABEL {
                return;
            }
            if let WindowEvent::Destroyed = event {
                window.app_handle().state::<TaskRelay>().detach_ui();
            }
        })
        .build(tauri::generate_context!())
        .expect("error while building tauri application");

    app.run(|app_handle, event| {
        if let RunEvent::Exit = event {
            app_handle.state::<TaskRelay>().shutdown();
            task_relay::shutdown_logger();
        }
    });
}
