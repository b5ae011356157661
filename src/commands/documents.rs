//! Document IPC commands: render the assessment and prescription HTML and
//! save the frontend-generated PDF.
//!
//! The webview owns HTML-to-PDF conversion; these commands hand it the
//! final markup and take the finished bytes back. Saving writes locally
//! first and then uploads; an upload failure is logged and does not undo
//! the local save.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tauri::State;

use crate::api::types::SaveDocumentData;
use crate::assessment::AssessmentStage;
use crate::config;
use crate::core_state::CoreState;
use crate::documents::{assessment_html, prescription_html, QaSection};
use crate::models::{Clinic, Patient};

async fn clinic_and_patient(
    demographic_no: i64,
    state: &State<'_, Arc<CoreState>>,
) -> Result<(Clinic, Patient), String> {
    let clinic = super::clinic::fetch_clinic_details(state.clone()).await?;
    let patient = super::patient::fetch_patient(demographic_no, state.clone()).await?;
    Ok((clinic, patient))
}

/// Render the completed assessment as a printable HTML document.
#[tauri::command]
pub async fn render_assessment_document(
    state: State<'_, Arc<CoreState>>,
) -> Result<String, String> {
    let (completed, demographic_no) = {
        let slice = state.read(&state.assessment).map_err(|e| e.to_string())?;
        let completed = match &slice.data.stage {
            Some(AssessmentStage::Complete(completed)) => completed.clone(),
            _ => return Err("Assessment is not complete".into()),
        };
        let demographic_no = slice
            .data
            .demographic_no
            .ok_or("No patient for assessment")?;
        (completed, demographic_no)
    };
    let (clinic, patient) = clinic_and_patient(demographic_no, &state).await?;

    let mut scope_entries: Vec<(String, String)> = completed
        .scope
        .answers
        .iter()
        .map(|(q, a)| (q.clone(), a.clone()))
        .collect();
    if !completed.scope.reason.is_empty() {
        scope_entries.push(("Decision rationale".into(), completed.scope.reason.clone()));
    }

    let mut sections = vec![
        QaSection {
            title: format!("Scope Assessment: {}", completed.scope.status.as_str()),
            entries: scope_entries,
        },
        QaSection {
            title: "Follow-up Assessment".into(),
            entries: completed
                .follow_up_answers
                .iter()
                .map(|(q, a)| (q.clone(), a.clone()))
                .collect(),
        },
    ];
    if let Some(note) = &completed.soap_note {
        sections.push(QaSection {
            title: "SOAP Note".into(),
            entries: vec![("Note".into(), note.clone())],
        });
    }

    Ok(assessment_html(&clinic, &patient, &sections))
}

/// Render the last accepted prescription batch as a printable HTML
/// document with the clinician's signature line.
#[tauri::command]
pub async fn render_prescription_document(
    signature: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<String, String> {
    let batch = state
        .read(&state.prescription)
        .map_err(|e| e.to_string())?
        .data
        .submitted
        .clone()
        .ok_or("No submitted prescription to render")?;
    let (clinic, patient) = clinic_and_patient(batch.demographic_no, &state).await?;
    Ok(prescription_html(&clinic, &patient, &batch.lines, &signature))
}

/// Persist a generated PDF: write it under the app documents directory,
/// then upload it against the patient record. The local path is returned
/// even when the upload fails.
#[tauri::command]
pub async fn save_patient_document(
    demographic_no: i64,
    appointment_no: i64,
    document_name: String,
    pdf_base64: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<String, String> {
    if document_name.trim().is_empty() {
        return Err("Document name is required".into());
    }
    let bytes = BASE64
        .decode(pdf_base64.trim())
        .map_err(|e| format!("Invalid PDF data: {e}"))?;

    let file_name = format!(
        "{}-{}-{}.pdf",
        document_name.trim().replace(['/', '\\'], "_"),
        demographic_no,
        appointment_no
    );
    let dir = config::documents_dir();
    std::fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    let path = dir.join(&file_name);
    std::fs::write(&path, &bytes).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), size = bytes.len(), "Document saved locally");

    let data = SaveDocumentData {
        demographic_no,
        appointment_no,
        document_name: document_name.trim().to_string(),
    };
    if let Err(e) = state
        .api()
        .save_patient_document(&data, &file_name, bytes)
        .await
    {
        tracing::warn!("Document upload failed, local copy kept: {e}");
    }

    Ok(path.to_string_lossy().into_owned())
}
