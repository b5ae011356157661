//! Async HTTP client for the clinic API.
//!
//! Request contract: the stored bearer token is attached when present;
//! absent-token requests go out unauthenticated and the server rejects
//! them. A 401 deletes the stored token and surfaces the failure — no
//! auto-retry, no refresh flow. Nothing here retries anything.

use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;

use super::error::{server_message, ApiError};
use super::types::{self, AddDrugRequest, DrugPayload, FollowUpRequest, LoginRequest,
    SaveDocumentData, ScopeStatusRequest, SoapNoteRequest};
use crate::models::{
    Appointment, CatalogDrug, Clinic, ClinicEntity, Patient, PatientMatch, Question, ScopeStatus,
};
use crate::session::SessionStore;

/// Explicit success marker some endpoints return instead of relying on
/// the HTTP status alone.
const SUCCESS_MARKER: &str = "Success";

/// Raw outcome of one request: status plus parsed body (204 has none).
struct ApiResponse {
    status: StatusCode,
    body: Option<Value>,
}

impl ApiResponse {
    fn body(&self) -> &Value {
        self.body.as_ref().unwrap_or(&Value::Null)
    }

    /// Success = explicit "Success" marker in the body, or 204 No Content.
    /// Both must be treated identically by callers.
    fn has_success_marker(&self) -> bool {
        if self.status == StatusCode::NO_CONTENT {
            return true;
        }
        self.body()
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case(SUCCESS_MARKER))
    }

    /// Reject a 2xx response whose body carries an explicit non-Success
    /// status. The server reports some failures (e.g. a blocked drug
    /// interaction) with a 200 + `status: "Failed"` body; those must not
    /// pass as accepted. Bodies without a status field stay success.
    fn ensure_accepted(&self) -> Result<(), ApiError> {
        if self.has_success_marker() {
            return Ok(());
        }
        if self.body().get("status").and_then(Value::as_str).is_some() {
            return Err(ApiError::Server {
                status: self.status.as_u16(),
                message: server_message(self.body.as_ref()),
            });
        }
        Ok(())
    }
}

/// Client for the clinic REST API plus the external drug catalog host.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    catalog_url: String,
    store: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(base_url: &str, catalog_url: &str, store: Arc<SessionStore>) -> Self {
        let http = reqwest::Client::builder()
            .build()
            .expect("Failed to create HTTP client");
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            catalog_url: catalog_url.to_string(),
            store,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach `Authorization: Bearer <token>` when a token is stored.
    fn apply_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.store.token() {
            Ok(Some(token)) => builder.bearer_auth(token),
            Ok(None) => builder,
            Err(e) => {
                tracing::warn!("Token read failed, sending unauthenticated: {e}");
                builder
            }
        }
    }

    /// Send a request and normalize the outcome.
    ///
    /// 401 clears the stored token so the next protected action fails
    /// fast instead of retrying with a known-bad credential.
    async fn send(&self, builder: RequestBuilder) -> Result<ApiResponse, ApiError> {
        let response = self
            .apply_auth(builder)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            if let Err(e) = self.store.clear_token() {
                tracing::warn!("Failed to clear token after 401: {e}");
            }
            tracing::info!("401 received, stored token cleared");
            return Err(ApiError::Unauthorized);
        }

        if status == StatusCode::NO_CONTENT {
            return Ok(ApiResponse { status, body: None });
        }

        let body: Option<Value> = response.json().await.ok();

        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: server_message(body.as_ref()),
            });
        }

        Ok(ApiResponse { status, body })
    }

    async fn post_json(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse, ApiError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    // ── Authentication ──────────────────────────────────────

    /// Log in to a clinic tenant. Returns the bearer token; persisting it
    /// is the caller's decision (remember-me handling lives above).
    pub async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let response = self.post_json("/authentication/loginClinic/", request).await?;
        types::parse_login_token(response.body())
            .ok_or_else(|| ApiError::Decode("login response had no access_token".into()))
    }

    /// Tenant directory for the login screen picker.
    pub async fn fetch_subdomains(&self) -> Result<Vec<ClinicEntity>, ApiError> {
        let response = self
            .send(self.http.get(self.url("/authentication/fetchAllEntitiesSubdomains/")))
            .await?;
        Ok(types::parse_subdomains(response.body()))
    }

    pub async fn fetch_clinic_details(&self, subdomain: &str) -> Result<Clinic, ApiError> {
        let request = types::ClinicDetailsRequest {
            subdomain: subdomain.to_string(),
        };
        let response = self
            .post_json("/authentication/fetchClinicDetails/", &request)
            .await?;
        types::parse_clinic(response.body())
            .ok_or_else(|| ApiError::Decode("clinic details missing".into()))
    }

    // ── Appointments & patients ─────────────────────────────

    pub async fn fetch_appointments(
        &self,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Appointment>, ApiError> {
        let request = types::AppointmentRangeRequest {
            start_date: start_date.to_string(),
            end_date: end_date.to_string(),
        };
        let response = self
            .post_json("/appointment/fetchAllPatientsAppointments/", &request)
            .await?;
        Ok(types::parse_appointments(response.body()))
    }

    pub async fn fetch_patient(&self, demographic_no: i64) -> Result<Patient, ApiError> {
        let request = types::PatientRequest { demographic_no };
        let response = self.post_json("/patient/fetchPatient/", &request).await?;
        types::parse_patient(response.body())
            .ok_or_else(|| ApiError::Decode("patient record missing".into()))
    }

    pub async fn search_patients(&self, search_key: &str) -> Result<Vec<PatientMatch>, ApiError> {
        let request = types::PatientSearchRequest {
            search_key: search_key.to_string(),
        };
        let response = self.post_json("/patient/searchPatient/", &request).await?;
        Ok(types::parse_patient_matches(response.body()))
    }

    // ── Assessments ─────────────────────────────────────────

    pub async fn generate_scope_assessment(
        &self,
        reason: &str,
        gender: &str,
    ) -> Result<Vec<Question>, ApiError> {
        let request = types::ScopeQuestionsRequest {
            reason: reason.to_string(),
            gender: gender.to_string(),
        };
        let response = self
            .post_json("/appointment/generateScopeAssessment/", &request)
            .await?;
        Ok(types::parse_questions(response.body()))
    }

    pub async fn get_scope_status(
        &self,
        request: &ScopeStatusRequest,
    ) -> Result<(ScopeStatus, String), ApiError> {
        let response = self.post_json("/appointment/getScopeStatus/", request).await?;
        types::parse_scope_status(response.body())
            .ok_or_else(|| ApiError::Decode("scope status missing".into()))
    }

    pub async fn generate_follow_up_questions(
        &self,
        request: &FollowUpRequest,
    ) -> Result<Vec<Question>, ApiError> {
        let response = self
            .post_json("/appointment/generatePharmacyFollowUpQuestions/", request)
            .await?;
        Ok(types::parse_questions(response.body()))
    }

    pub async fn generate_soap_note(&self, request: &SoapNoteRequest) -> Result<String, ApiError> {
        let response = self.post_json("/appointment/generateSoapNotes/", request).await?;
        types::parse_soap_note(response.body())
            .ok_or_else(|| ApiError::Decode("soap note missing".into()))
    }

    // ── Prescriptions & documents ───────────────────────────

    /// Submit one prescription batch. Success is the explicit "Success"
    /// marker or a 204; returns the server-issued batch id when present.
    pub async fn add_patient_drug(
        &self,
        demographic_no: i64,
        appointment_no: i64,
        drug_data: Vec<DrugPayload>,
    ) -> Result<Option<String>, ApiError> {
        let request = AddDrugRequest {
            demographic_no,
            appointment_no,
            drug_data,
        };
        let response = self.post_json("/drugs/addPatientDrug/", &request).await?;
        response.ensure_accepted()?;
        Ok(types::parse_batch_id(response.body()))
    }

    /// Upload a generated PDF against the patient record. Multipart:
    /// a JSON `data` part plus the `pdfFile` bytes.
    pub async fn save_patient_document(
        &self,
        data: &SaveDocumentData,
        file_name: &str,
        pdf_bytes: Vec<u8>,
    ) -> Result<(), ApiError> {
        let json_part = serde_json::to_string(data)
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .text("data", json_part)
            .part(
                "pdfFile",
                reqwest::multipart::Part::bytes(pdf_bytes)
                    .file_name(file_name.to_string())
                    .mime_str("application/pdf")
                    .map_err(|e| ApiError::Decode(e.to_string()))?,
            );
        let builder = self
            .http
            .post(self.url("/appointment/savePatientDocument/"))
            .multipart(form);
        let response = self.send(builder).await?;
        response.ensure_accepted()
    }

    /// External drug catalog lookup — different host than the clinic API.
    pub async fn search_drug_catalog(&self, query: &str) -> Result<Vec<CatalogDrug>, ApiError> {
        let builder = self.http.get(&self.catalog_url).query(&[("search", query)]);
        let response = self.send(builder).await?;
        Ok(types::parse_catalog(response.body()))
    }
}
