//! Assessment IPC commands.
//!
//! The workflow is strictly staged: `start_assessment` installs the scope
//! stage, `check_scope` completes it and — only inside its success path —
//! fetches the follow-up questions, so the dependent call can never start
//! before the scope response exists. Finalization renders and saves the
//! document via the `documents` commands.

use std::sync::Arc;

use serde::Serialize;
use tauri::State;

use crate::api::types::{FollowUpRequest, ScopeStatusRequest, SoapNoteRequest};
use crate::assessment::{AssessmentStage, CompletedAssessment, FollowUpStage, ScopeStage};
use crate::core_state::CoreState;
use crate::models::patient::normalize_gender;
use crate::models::{Answer, Question};

/// Result of the "Check Scope" action, plus the follow-up questions
/// fetched in its success continuation.
#[derive(Debug, Clone, Serialize)]
pub struct ScopeCheckResult {
    pub status: String,
    pub reason: String,
    pub follow_up_questions: Vec<Question>,
}

fn iso_date(date: Option<chrono::NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Begin a scope assessment for an appointment. Validates the patient's
/// gender client-side before any request goes out.
#[tauri::command]
pub async fn start_assessment(
    demographic_no: i64,
    appointment_no: i64,
    reason: String,
    state: State<'_, Arc<CoreState>>,
) -> Result<Vec<Question>, String> {
    let patient =
        super::patient::fetch_patient(demographic_no, state.clone()).await?;
    let gender = patient
        .gender
        .as_deref()
        .and_then(normalize_gender)
        .ok_or("Patient gender is missing or invalid")?;

    state
        .write(&state.assessment)
        .map_err(|e| e.to_string())?
        .begin();

    match state.api().generate_scope_assessment(&reason, gender).await {
        Ok(questions) => {
            let stage = ScopeStage::new(&reason, gender, patient.date_of_birth, questions.clone());
            let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
            slice.loading = false;
            slice.error = None;
            slice.data.demographic_no = Some(demographic_no);
            slice.data.appointment_no = Some(appointment_no);
            slice.data.reason = Some(reason);
            slice.data.stage = Some(AssessmentStage::Scope(stage));
            Ok(questions)
        }
        Err(e) => {
            let message = e.to_string();
            state
                .write(&state.assessment)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}

/// Record an answer on the scope questionnaire.
#[tauri::command]
pub fn record_scope_answer(
    index: usize,
    answer: Answer,
    state: State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
    match slice.data.stage.as_mut() {
        Some(AssessmentStage::Scope(stage)) => {
            stage.record_answer(index, answer).map_err(|e| e.to_string())
        }
        _ => Err("Scope assessment is not active".into()),
    }
}

/// "Check Scope": validate, submit the grouped answers, and on success
/// fetch the follow-up questions and advance the stage.
#[tauri::command]
pub async fn check_scope(
    state: State<'_, Arc<CoreState>>,
) -> Result<ScopeCheckResult, String> {
    let (stage, appointment_no) = {
        let slice = state.read(&state.assessment).map_err(|e| e.to_string())?;
        let stage = match &slice.data.stage {
            Some(AssessmentStage::Scope(stage)) => stage.clone(),
            _ => return Err("Scope assessment is not active".into()),
        };
        let appointment_no = slice
            .data
            .appointment_no
            .ok_or("No appointment selected for assessment")?;
        (stage, appointment_no)
    };

    // Client-side validation blocks before any network call.
    stage.validate().map_err(|e| e.to_string())?;
    let subdomain = state.active_subdomain().map_err(|e| e.to_string())?;

    state
        .write(&state.assessment)
        .map_err(|e| e.to_string())?
        .begin();

    let scope_request = ScopeStatusRequest {
        scope_answers: stage.grouped_answers(),
        reason: stage.reason.clone(),
        gender: stage.gender.clone(),
        dob: iso_date(stage.dob),
        appointment_no,
        subdomain,
    };

    let outcome = async {
        let (status, status_reason) = state.api().get_scope_status(&scope_request).await?;

        // Second dispatch only from inside the first's success path: the
        // follow-up fetch depends on the scope answers and status.
        let follow_up_request = FollowUpRequest {
            gender: stage.gender.clone(),
            dob: iso_date(stage.dob),
            reason: stage.reason.clone(),
            appointment_no,
            scope: status.as_str().to_string(),
            answers: stage.grouped_answers(),
        };
        let questions = state
            .api()
            .generate_follow_up_questions(&follow_up_request)
            .await?;
        Ok::<_, crate::api::ApiError>((status, status_reason, questions))
    }
    .await;

    match outcome {
        Ok((status, status_reason, questions)) => {
            let scope_outcome = stage.complete(status, status_reason.clone());
            let follow_up = FollowUpStage::new(scope_outcome, questions.clone());

            let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
            slice.loading = false;
            slice.error = None;
            slice.data.stage = Some(AssessmentStage::FollowUp(follow_up));
            Ok(ScopeCheckResult {
                status: status.as_str().to_string(),
                reason: status_reason,
                follow_up_questions: questions,
            })
        }
        Err(e) => {
            let message = e.to_string();
            state
                .write(&state.assessment)
                .map_err(|e| e.to_string())?
                .fail(message.clone());
            Err(message)
        }
    }
}

/// Record an answer on the follow-up questionnaire.
#[tauri::command]
pub fn record_follow_up_answer(
    index: usize,
    answer: Answer,
    state: State<'_, Arc<CoreState>>,
) -> Result<(), String> {
    let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
    match slice.data.stage.as_mut() {
        Some(AssessmentStage::FollowUp(stage)) => {
            stage.record_answer(index, answer).map_err(|e| e.to_string())
        }
        _ => Err("Follow-up assessment is not active".into()),
    }
}

/// Complete the follow-up stage. Validation blocks partial submission;
/// the assessment becomes ready for SOAP notes and document rendering.
#[tauri::command]
pub fn complete_follow_up(
    state: State<'_, Arc<CoreState>>,
) -> Result<CompletedAssessment, String> {
    let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
    let stage = match slice.data.stage.take() {
        Some(AssessmentStage::FollowUp(stage)) => stage,
        other => {
            slice.data.stage = other;
            return Err("Follow-up assessment is not active".into());
        }
    };
    if let Err(e) = stage.validate() {
        // Put the stage back untouched; nothing was submitted.
        slice.data.stage = Some(AssessmentStage::FollowUp(stage));
        return Err(e.to_string());
    }
    let completed = stage.complete();
    slice.data.stage = Some(AssessmentStage::Complete(completed.clone()));
    Ok(completed)
}

/// Generate a SOAP note from the completed assessment.
#[tauri::command]
pub async fn generate_soap_note(state: State<'_, Arc<CoreState>>) -> Result<String, String> {
    let (completed, demographic_no, appointment_no, reason) = {
        let slice = state.read(&state.assessment).map_err(|e| e.to_string())?;
        let completed = match &slice.data.stage {
            Some(AssessmentStage::Complete(completed)) => completed.clone(),
            _ => return Err("Assessment is not complete".into()),
        };
        (
            completed,
            slice.data.demographic_no.ok_or("No patient for assessment")?,
            slice
                .data
                .appointment_no
                .ok_or("No appointment for assessment")?,
            slice.data.reason.clone().unwrap_or_default(),
        )
    };

    let request = SoapNoteRequest {
        demographic_no,
        appointment_no,
        reason,
        scope_status: completed.scope.status.as_str().to_string(),
        scope_answers: completed.scope.answers.clone(),
        follow_up_answers: completed.follow_up_answers.clone(),
    };

    let note = state
        .api()
        .generate_soap_note(&request)
        .await
        .map_err(|e| e.to_string())?;

    let mut slice = state.write(&state.assessment).map_err(|e| e.to_string())?;
    if let Some(AssessmentStage::Complete(completed)) = slice.data.stage.as_mut() {
        completed.soap_note = Some(note.clone());
    }
    Ok(note)
}
