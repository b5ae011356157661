pub mod api;
pub mod appointment;
pub mod assessment;
pub mod commands;
pub mod config;
pub mod core_state;
pub mod db;
pub mod documents;
pub mod models;
pub mod prescription;
pub mod search;
pub mod session;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let core = core_state::CoreState::new().expect("Failed to open session store");

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(Arc::new(core))
        .invoke_handler(tauri::generate_handler![
            commands::health_check,
            commands::session::fetch_subdomains,
            commands::session::login_clinic,
            commands::session::logout,
            commands::session::remembered_login,
            commands::session::forget_remembered_login,
            commands::clinic::fetch_clinic_details,
            commands::appointment::fetch_appointments,
            commands::appointment::select_appointment,
            commands::patient::fetch_patient,
            commands::patient::search_patients,
            commands::patient::cancel_patient_search,
            commands::assessment::start_assessment,
            commands::assessment::record_scope_answer,
            commands::assessment::check_scope,
            commands::assessment::record_follow_up_answer,
            commands::assessment::complete_follow_up,
            commands::assessment::generate_soap_note,
            commands::prescription::update_drug_line,
            commands::prescription::add_drug_line,
            commands::prescription::edit_drug_line,
            commands::prescription::remove_drug_line,
            commands::prescription::select_catalog_drug,
            commands::prescription::search_drug_catalog,
            commands::prescription::cancel_catalog_search,
            commands::prescription::submit_prescription,
            commands::prescription::prescription_preview,
            commands::documents::render_assessment_document,
            commands::documents::render_prescription_document,
            commands::documents::save_patient_document,
        ])
        .run(tauri::generate_context!())
        .expect("error while running Bimble Clinician")
}
