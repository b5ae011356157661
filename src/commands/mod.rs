pub mod appointment;
pub mod assessment;
pub mod clinic;
pub mod documents;
pub mod patient;
pub mod prescription;
pub mod session;

/// Health check IPC command — verifies backend is running
#[tauri::command]
pub fn health_check() -> String {
    tracing::debug!("Health check called");
    "ok".to_string()
}
