// Projetei - project and Kanban task tracker
// Entry point and application setup

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use projetei::{app, commands};
use tauri::Manager;

fn main() {
    app::init_logging();

    tracing::info!("Starting Projetei application");

    tauri::Builder::default()
        .setup(|app| {
            tracing::info!("Running app setup");
            app::setup(app)?;
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_app_info,
            // Projects
            commands::list_projects,
            commands::get_project,
            commands::create_project,
            commands::update_project,
            commands::delete_project,
            commands::lookup_project_by_code,
            commands::open_project_details,
            // Dashboard
            commands::load_dashboard,
            commands::get_visible_projects,
            commands::set_filter,
            commands::search_by_name,
            commands::submit_search,
            commands::show_my_projects,
            commands::refresh_dashboard,
            commands::is_dev_mode_enabled,
            // Bookmarks
            commands::list_bookmarks,
            commands::add_bookmark,
            commands::remove_bookmark,
            commands::bookmark_keys,
            // Board
            commands::load_board,
            commands::reload_board,
            commands::get_board,
            commands::close_board,
            commands::drag_end,
            commands::move_task,
            commands::quick_add_task,
            commands::open_task,
            commands::update_task,
            commands::delete_task,
            commands::add_checklist_item,
            commands::update_checklist_item,
            commands::toggle_checklist_item,
            commands::delete_checklist_item,
            commands::add_comment,
            commands::update_comment,
            commands::delete_comment,
        ])
        .build(tauri::generate_context!())
        .expect("error while building tauri application")
        .run(|handle, event| {
            if let tauri::RunEvent::Exit = event {
                if let Some(state) = handle.try_state::<app::AppState>() {
                    state.shutdown();
                }
            }
        });
}
