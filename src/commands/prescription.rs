//! Prescription IPC commands.
//!
//! The screen edits one in-progress line at a time plus a list of added
//! lines. Every update re-derives the SIG and the end date from canonical
//! inputs; the returned view carries the derived end date so the UI never
//! computes it.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tauri::State;
use uuid::Uuid;

use crate::core_state::CoreState;
use crate::models::{CatalogDrug, DrugLine, SubmittedBatch};
use crate::prescription::{
    build_batch, derive_end_date, gather_lines, rederive_sig, seed_from_catalog,
    PrescriptionError,
};

/// A drug line as the UI renders it: the stored fields plus the derived
/// end date.
#[derive(Debug, Clone, Serialize)]
pub struct DrugLineView {
    #[serde(flatten)]
    pub line: DrugLine,
    pub end_date: Option<NaiveDate>,
}

impl From<DrugLine> for DrugLineView {
    fn from(line: DrugLine) -> Self {
        let end_date = derive_end_date(line.start_date, line.duration_days);
        Self { line, end_date }
    }
}

/// Replace the in-progress line with updated fields, re-deriving the SIG
/// and end date.
#[tauri::command]
pub fn update_drug_line(
    mut line: DrugLine,
    state: State<'_, Arc<CoreState>>,
) -> Result<DrugLineView, String> {
    rederive_sig(&mut line);
    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    slice.data.in_progress = Some(line.clone());
    Ok(line.into())
}

/// Move the in-progress line into the added list and start a fresh one.
/// A line enters the batch only with its duration and quantity filled in,
/// so no zero-quantity line can reach submission.
pub(crate) fn add_line(state: &CoreState) -> Result<Vec<DrugLineView>, String> {
    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    let line = slice
        .data
        .in_progress
        .take()
        .ok_or("No drug line in progress")?;
    if line.drug_name.trim().is_empty() {
        slice.data.in_progress = Some(line);
        return Err("Select a drug before adding it".into());
    }
    if line.duration_days.is_none() || line.quantity.is_none() {
        let message = PrescriptionError::MissingFields {
            drug: line.drug_name.clone(),
        }
        .to_string();
        slice.data.in_progress = Some(line);
        return Err(message);
    }
    slice.data.lines.push(line);
    slice.data.in_progress = Some(DrugLine::new(""));
    Ok(slice.data.lines.iter().cloned().map(Into::into).collect())
}

#[tauri::command]
pub fn add_drug_line(state: State<'_, Arc<CoreState>>) -> Result<Vec<DrugLineView>, String> {
    add_line(&state)
}

/// Edit an already-added line in place. The SIG is re-derived, and the
/// duration/quantity requirement holds for edits too.
pub(crate) fn edit_line(state: &CoreState, mut line: DrugLine) -> Result<DrugLineView, String> {
    if line.duration_days.is_none() || line.quantity.is_none() {
        return Err(PrescriptionError::MissingFields {
            drug: line.drug_name.clone(),
        }
        .to_string());
    }
    rederive_sig(&mut line);
    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    let slot = slice
        .data
        .lines
        .iter_mut()
        .find(|l| l.id == line.id)
        .ok_or("Drug line not found")?;
    *slot = line.clone();
    Ok(line.into())
}

#[tauri::command]
pub fn edit_drug_line(
    line: DrugLine,
    state: State<'_, Arc<CoreState>>,
) -> Result<DrugLineView, String> {
    edit_line(&state, line)
}

#[tauri::command]
pub fn remove_drug_line(
    id: Uuid,
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<DrugLineView>, String> {
    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    let before = slice.data.lines.len();
    slice.data.lines.retain(|l| l.id != id);
    if slice.data.lines.len() == before {
        return Err("Drug line not found".into());
    }
    Ok(slice.data.lines.iter().cloned().map(Into::into).collect())
}

/// Seed the in-progress line from a catalog pick.
#[tauri::command]
pub fn select_catalog_drug(
    drug: CatalogDrug,
    state: State<'_, Arc<CoreState>>,
) -> Result<DrugLineView, String> {
    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    let mut line = slice
        .data
        .in_progress
        .take()
        .unwrap_or_else(|| DrugLine::new(""));
    seed_from_catalog(&mut line, &drug);
    slice.data.in_progress = Some(line.clone());
    Ok(line.into())
}

/// Debounced catalog lookup against the external drug host. Same
/// last-query-wins contract as the patient search.
pub(crate) async fn run_catalog_search(
    state: &CoreState,
    query: &str,
) -> Result<Vec<CatalogDrug>, String> {
    let current = |state: &CoreState| -> Result<Vec<CatalogDrug>, String> {
        Ok(state
            .read(&state.prescription)
            .map_err(|e| e.to_string())?
            .data
            .catalog_matches
            .clone())
    };

    let Some(ticket) = state.catalog_search.debounce().await else {
        return current(state);
    };

    let results = match state.api().search_drug_catalog(query).await {
        Ok(results) => results,
        Err(e) => {
            if !state.catalog_search.is_current(ticket) {
                return current(state);
            }
            let message = e.to_string();
            state
                .write(&state.prescription)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            return Err(message);
        }
    };

    if !state.catalog_search.is_current(ticket) {
        return current(state);
    }

    let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
    slice.error = None;
    slice.data.catalog_matches = results.clone();
    Ok(results)
}

#[tauri::command]
pub async fn search_drug_catalog(
    query: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<CatalogDrug>, String> {
    run_catalog_search(&state, &query).await
}

#[tauri::command]
pub fn cancel_catalog_search(state: State<'_, Arc<CoreState>>) {
    state.catalog_search.cancel();
}

/// Submit the composed batch. On acceptance the compose state clears and
/// the batch is kept verbatim for the preview document.
#[tauri::command]
pub async fn submit_prescription(
    demographic_no: i64,
    appointment_no: i64,
    state: State<'_, Arc<CoreState>>,
) -> Result<SubmittedBatch, String> {
    let lines = {
        let slice = state.read(&state.prescription).map_err(|e| e.to_string())?;
        gather_lines(&slice.data.lines, slice.data.in_progress.as_ref())
            .map_err(|e| e.to_string())?
    };

    state
        .write(&state.prescription)
        .map_err(|e| e.to_string())?
        .begin();

    let (payloads, mut batch) = build_batch(demographic_no, appointment_no, &lines);
    match state
        .api()
        .add_patient_drug(demographic_no, appointment_no, payloads)
        .await
    {
        Ok(batch_id) => {
            batch.batch_id = batch_id;
            tracing::info!(
                lines = batch.lines.len(),
                batch_id = batch.batch_id.as_deref().unwrap_or("-"),
                "Prescription batch accepted"
            );
            let mut slice = state.write(&state.prescription).map_err(|e| e.to_string())?;
            slice.loading = false;
            slice.error = None;
            slice.data.lines.clear();
            slice.data.in_progress = None;
            slice.data.submitted = Some(batch.clone());
            Ok(batch)
        }
        Err(e) => {
            // Rejection keeps the composed lines so nothing is retyped.
            let message = e.to_string();
            state
                .write(&state.prescription)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}

/// The last accepted batch, for the preview screen.
#[tauri::command]
pub fn prescription_preview(
    state: State<'_, Arc<CoreState>>,
) -> Result<Option<SubmittedBatch>, String> {
    Ok(state
        .read(&state.prescription)
        .map_err(|e| e.to_string())?
        .data
        .submitted
        .clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_line(name: &str) -> DrugLine {
        let mut line = DrugLine::new(name);
        line.duration_days = Some(7);
        line.quantity = Some(28);
        line
    }

    #[test]
    fn add_requires_duration_and_quantity() {
        let state = CoreState::in_memory();
        let mut partial = DrugLine::new("Cephalexin");
        partial.quantity = Some(28);
        state.write(&state.prescription).unwrap().data.in_progress = Some(partial);

        let err = add_line(&state).unwrap_err();
        assert!(err.contains("Cephalexin"));

        // The incomplete line stays in progress instead of joining the batch.
        let slice = state.read(&state.prescription).unwrap();
        assert!(slice.data.lines.is_empty());
        assert!(slice.data.in_progress.is_some());
    }

    #[test]
    fn add_moves_complete_line_into_batch() {
        let state = CoreState::in_memory();
        state.write(&state.prescription).unwrap().data.in_progress =
            Some(filled_line("Cephalexin"));

        let views = add_line(&state).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].line.drug_name, "Cephalexin");

        let slice = state.read(&state.prescription).unwrap();
        assert_eq!(slice.data.lines.len(), 1);
        // A fresh empty line replaces the added one.
        assert!(slice
            .data
            .in_progress
            .as_ref()
            .is_some_and(|l| l.drug_name.is_empty()));
    }

    #[test]
    fn edit_cannot_clear_required_fields() {
        let state = CoreState::in_memory();
        let line = filled_line("Cephalexin");
        let id = line.id;
        state.write(&state.prescription).unwrap().data.lines.push(line);

        let mut cleared = filled_line("Cephalexin");
        cleared.id = id;
        cleared.duration_days = None;
        assert!(edit_line(&state, cleared).unwrap_err().contains("Cephalexin"));

        // The stored line kept its fields.
        let slice = state.read(&state.prescription).unwrap();
        assert_eq!(slice.data.lines[0].duration_days, Some(7));
    }

    #[tokio::test]
    async fn catalog_search_failure_records_error_in_slice() {
        // Closed port: the request fails without any server involved.
        let state = CoreState::in_memory_with_api("http://127.0.0.1:1");
        let err = run_catalog_search(&state, "mupirocin").await.unwrap_err();

        let slice = state.read(&state.prescription).unwrap();
        assert_eq!(slice.error.as_deref(), Some(err.as_str()));
        assert!(slice.data.catalog_matches.is_empty());
    }
}
