//! Clinic IPC commands.

use std::sync::Arc;

use tauri::State;

use crate::core_state::CoreState;
use crate::models::Clinic;

/// Fetch (and cache) the clinic record for the active tenant. Fetched
/// once per session; later calls return the cached copy.
#[tauri::command]
pub async fn fetch_clinic_details(state: State<'_, Arc<CoreState>>) -> Result<Clinic, String> {
    if let Some(cached) = state
        .read(&state.clinic)
        .map_err(|e| e.to_string())?
        .data
        .clinic
        .clone()
    {
        return Ok(cached);
    }

    let subdomain = state.active_subdomain().map_err(|e| e.to_string())?;
    state
        .write(&state.clinic)
        .map_err(|e| e.to_string())?
        .begin();

    match state.api().fetch_clinic_details(&subdomain).await {
        Ok(clinic) => {
            let mut slice = state.write(&state.clinic).map_err(|e| e.to_string())?;
            slice.succeed(crate::core_state::ClinicData {
                clinic: Some(clinic.clone()),
            });
            Ok(clinic)
        }
        Err(e) => {
            let message = e.to_string();
            state
                .write(&state.clinic)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}
