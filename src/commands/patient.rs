//! Patient IPC commands: detail fetch (cached by demographic number) and
//! debounced type-ahead search.

use std::sync::Arc;

use tauri::State;

use crate::core_state::CoreState;
use crate::models::{Patient, PatientMatch};

/// Fetch a patient into the keyed cache. Shared by the explicit command
/// and the appointment-selection side-effect fetch.
pub(crate) async fn fetch_patient_into_cache(
    state: Arc<CoreState>,
    demographic_no: i64,
) -> Result<Patient, String> {
    state
        .write(&state.patients)
        .map_err(|e| e.to_string())?
        .begin();

    match state.api().fetch_patient(demographic_no).await {
        Ok(patient) => {
            let mut slice = state.write(&state.patients).map_err(|e| e.to_string())?;
            slice.loading = false;
            slice.error = None;
            slice.data.patients.insert(demographic_no, patient.clone());
            Ok(patient)
        }
        Err(e) => {
            let message = e.to_string();
            // Detail failures keep the existing cache; only the error
            // surfaces.
            state
                .write(&state.patients)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}

/// Patient detail by demographic number, from cache when available.
#[tauri::command]
pub async fn fetch_patient(
    demographic_no: i64,
    state: State<'_, Arc<CoreState>>,
) -> Result<Patient, String> {
    let cached = state
        .read(&state.patients)
        .map_err(|e| e.to_string())?
        .data
        .patients
        .get(&demographic_no)
        .cloned();
    if let Some(patient) = cached {
        return Ok(patient);
    }
    fetch_patient_into_cache(state.inner().clone(), demographic_no).await
}

/// Debounced patient search. Rapid keystrokes coalesce; a result that
/// arrives for a superseded query is discarded and the current matches
/// are returned unchanged.
pub(crate) async fn run_patient_search(
    state: &CoreState,
    search_key: &str,
) -> Result<Vec<PatientMatch>, String> {
    let current = |state: &CoreState| -> Result<Vec<PatientMatch>, String> {
        Ok(state
            .read(&state.patients)
            .map_err(|e| e.to_string())?
            .data
            .matches
            .clone())
    };

    let Some(ticket) = state.patient_search.debounce().await else {
        return current(state);
    };

    let results = match state.api().search_patients(search_key).await {
        Ok(results) => results,
        Err(e) => {
            // A stale failure is discarded like a stale success.
            if !state.patient_search.is_current(ticket) {
                return current(state);
            }
            let message = e.to_string();
            state
                .write(&state.patients)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            return Err(message);
        }
    };

    // Last query wins: drop this response if a newer query was issued
    // while it was in flight.
    if !state.patient_search.is_current(ticket) {
        return current(state);
    }

    let mut slice = state.write(&state.patients).map_err(|e| e.to_string())?;
    slice.error = None;
    slice.data.matches = results.clone();
    Ok(results)
}

#[tauri::command]
pub async fn search_patients(
    search_key: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<PatientMatch>, String> {
    run_patient_search(&state, &search_key).await
}

/// Teardown hook: the search screen is going away, stop any pending
/// debounced dispatch from firing afterwards.
#[tauri::command]
pub fn cancel_patient_search(state: State<'_, Arc<CoreState>>) {
    state.patient_search.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_failure_records_error_in_slice() {
        // Closed port: the request fails without any server involved.
        let state = CoreState::in_memory_with_api("http://127.0.0.1:1");
        let err = run_patient_search(&state, "ada").await.unwrap_err();

        let slice = state.read(&state.patients).unwrap();
        assert_eq!(slice.error.as_deref(), Some(err.as_str()));
        assert!(slice.data.matches.is_empty());
    }
}
