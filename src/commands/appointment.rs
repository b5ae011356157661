//! Appointment IPC commands.

use std::sync::Arc;

use tauri::State;

use crate::appointment::{auto_select, sort_appointments};
use crate::core_state::CoreState;
use crate::models::Appointment;

/// Fetch appointments in a date range (ISO `YYYY-MM-DD`), sorted newest
/// first. The head of the sorted list is auto-selected and its patient's
/// details are prefetched in the background — the list render never
/// waits on that fetch.
#[tauri::command]
pub async fn fetch_appointments(
    start_date: String,
    end_date: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<Appointment>, String> {
    state
        .write(&state.appointments)
        .map_err(|e| e.to_string())?
        .begin();

    match state.api().fetch_appointments(&start_date, &end_date).await {
        Ok(raw) => {
            let sorted = sort_appointments(raw);
            let selected = auto_select(&sorted).map(|a| (a.appointment_no, a.demographic_no));

            {
                let mut slice = state.write(&state.appointments).map_err(|e| e.to_string())?;
                slice.loading = false;
                slice.error = None;
                slice.data.appointments = sorted.clone();
                slice.data.selected = selected.map(|(no, _)| no);
            }

            if let Some((_, demographic_no)) = selected {
                let background = state.inner().clone();
                tauri::async_runtime::spawn(async move {
                    if let Err(e) =
                        super::patient::fetch_patient_into_cache(background, demographic_no).await
                    {
                        tracing::warn!("Prefetch of patient {demographic_no} failed: {e}");
                    }
                });
            }

            Ok(sorted)
        }
        Err(e) => {
            let message = e.to_string();
            // Flagged behavior: a failed refresh clears the list rather
            // than keeping stale rows.
            state
                .write(&state.appointments)
                .map_err(|e| e.to_string())?
                .fail_and_clear(message.clone());
            Err(message)
        }
    }
}

/// Select an appointment row. Records the selection and kicks off the
/// patient-detail fetch without blocking the caller.
#[tauri::command]
pub fn select_appointment(
    appointment_no: i64,
    state: State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    let demographic_no = {
        let mut slice = state.write(&state.appointments).map_err(|e| e.to_string())?;
        let appointment = slice
            .data
            .appointments
            .iter()
            .find(|a| a.appointment_no == appointment_no)
            .ok_or_else(|| format!("Unknown appointment {appointment_no}"))?;
        let demographic_no = appointment.demographic_no;
        slice.data.selected = Some(appointment_no);
        demographic_no
    };

    let background = state.inner().clone();
    tauri::async_runtime::spawn(async move {
        if let Err(e) = super::patient::fetch_patient_into_cache(background, demographic_no).await {
            tracing::warn!("Patient fetch for appointment {appointment_no} failed: {e}");
        }
    });
    Ok(())
}
