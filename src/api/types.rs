//! Request bodies (exact wire keys) and per-endpoint response parsers.
//!
//! Each endpoint gets one parser mapping the raw JSON to a fixed internal
//! type; nothing downstream touches `serde_json::Value`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use super::normalize::{
    bool_field, date_field, envelope, i64_field, list, string_field, string_or_list, time_field,
};
use crate::models::{
    Appointment, AppointmentKind, CatalogDrug, Clinic, ClinicEntity, Patient, PatientMatch,
    Question, QuestionDependency, ScopeStatus,
};

// ═══════════════════════════════════════════════════════════
// Request bodies
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    #[serde(rename = "subdomainBimble")]
    pub subdomain: String,
    pub username: String,
    pub password: String,
    pub pin: String,
}

#[derive(Debug, Serialize)]
pub struct ClinicDetailsRequest {
    #[serde(rename = "subdomainBimble")]
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct AppointmentRangeRequest {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct PatientRequest {
    #[serde(rename = "demographicNo")]
    pub demographic_no: i64,
}

#[derive(Debug, Serialize)]
pub struct PatientSearchRequest {
    #[serde(rename = "searchKey")]
    pub search_key: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeQuestionsRequest {
    pub reason: String,
    pub gender: String,
}

#[derive(Debug, Serialize)]
pub struct ScopeStatusRequest {
    #[serde(rename = "scopeAnswers")]
    pub scope_answers: BTreeMap<String, String>,
    pub reason: String,
    pub gender: String,
    pub dob: String,
    #[serde(rename = "appointmentNo")]
    pub appointment_no: i64,
    #[serde(rename = "subdomainBimble")]
    pub subdomain: String,
}

#[derive(Debug, Serialize)]
pub struct FollowUpRequest {
    pub gender: String,
    pub dob: String,
    pub reason: String,
    #[serde(rename = "appointmentNo")]
    pub appointment_no: i64,
    /// Scope status string from the completed scope stage.
    pub scope: String,
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct SoapNoteRequest {
    #[serde(rename = "demographicNo")]
    pub demographic_no: i64,
    #[serde(rename = "appointmentNo")]
    pub appointment_no: i64,
    pub reason: String,
    #[serde(rename = "scopeStatus")]
    pub scope_status: String,
    #[serde(rename = "scopeAnswers")]
    pub scope_answers: BTreeMap<String, String>,
    #[serde(rename = "followUpAnswers")]
    pub follow_up_answers: BTreeMap<String, String>,
}

/// One drug line in the server schema. Integer duration/quantity/refills,
/// ISO date strings, and fixed empty strings for fields this client does
/// not populate (the server requires their presence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrugPayload {
    #[serde(rename = "drugName")]
    pub drug_name: String,
    #[serde(rename = "dosageForm")]
    pub dosage_form: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    pub duration: u32,
    pub quantity: u32,
    pub repeats: u32,
    pub instructions: String,
    pub route: String,
    pub frequency: String,
}

#[derive(Debug, Serialize)]
pub struct AddDrugRequest {
    #[serde(rename = "demographicNo")]
    pub demographic_no: i64,
    #[serde(rename = "appointmentNo")]
    pub appointment_no: i64,
    #[serde(rename = "drugData")]
    pub drug_data: Vec<DrugPayload>,
}

/// The JSON `data` part of the multipart savePatientDocument call.
#[derive(Debug, Serialize)]
pub struct SaveDocumentData {
    #[serde(rename = "demographicNo")]
    pub demographic_no: i64,
    #[serde(rename = "appointmentNo")]
    pub appointment_no: i64,
    #[serde(rename = "documentName")]
    pub document_name: String,
}

// ═══════════════════════════════════════════════════════════
// Response parsers
// ═══════════════════════════════════════════════════════════

/// loginClinic → bearer token.
pub fn parse_login_token(body: &Value) -> Option<String> {
    string_field(body, &["access_token", "token"])
        .or_else(|| string_field(envelope(body), &["access_token", "token"]))
}

/// fetchAllEntitiesSubdomains → tenant directory.
pub fn parse_subdomains(body: &Value) -> Vec<ClinicEntity> {
    list(body)
        .iter()
        .filter_map(|item| {
            Some(ClinicEntity {
                subdomain: string_field(item, &["subdomainBimble", "subdomain"])?,
                entity_name: string_field(item, &["entityName", "name"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// fetchClinicDetails → clinic record.
pub fn parse_clinic(body: &Value) -> Option<Clinic> {
    let obj = envelope(body);
    if !obj.is_object() {
        return None;
    }
    Some(Clinic {
        subdomain: string_field(obj, &["subdomainBimble", "subdomain"]).unwrap_or_default(),
        name: string_field(obj, &["clinicName", "entityName", "name"])?,
        address: string_field(obj, &["address", "clinicAddress"]).unwrap_or_default(),
        city: string_field(obj, &["city"]).unwrap_or_default(),
        province: string_field(obj, &["province", "state"]).unwrap_or_default(),
        postal_code: string_field(obj, &["postalCode", "zip"]).unwrap_or_default(),
        phone: string_field(obj, &["phone", "phoneNumber"]).unwrap_or_default(),
        fax: string_field(obj, &["fax", "faxNumber"]).unwrap_or_default(),
        logo: string_field(obj, &["logo", "clinicLogo"]),
    })
}

/// fetchAllPatientsAppointments → appointment rows. Rows missing an
/// appointment number, patient key, or date are dropped, not guessed at.
pub fn parse_appointments(body: &Value) -> Vec<Appointment> {
    list(body)
        .iter()
        .filter_map(|item| {
            Some(Appointment {
                appointment_no: i64_field(item, &["appointmentNo", "id"])?,
                demographic_no: i64_field(item, &["demographicNo"])?,
                date: date_field(item, &["appointmentDate", "date"])?,
                start_time: time_field(item, &["startTime"])
                    .unwrap_or_else(|| chrono::NaiveTime::MIN),
                kind: AppointmentKind::from_code(
                    &string_field(item, &["status", "type"]).unwrap_or_default(),
                ),
                reason: string_field(item, &["reason"]).unwrap_or_default(),
                patient_name: string_field(item, &["patientName", "name"]).unwrap_or_default(),
            })
        })
        .collect()
}

/// fetchPatient → patient record, allergies normalized to a list.
pub fn parse_patient(body: &Value) -> Option<Patient> {
    let obj = envelope(body);
    Some(Patient {
        demographic_no: i64_field(obj, &["demographicNo"])?,
        first_name: string_field(obj, &["firstName", "first_name"]).unwrap_or_default(),
        last_name: string_field(obj, &["lastName", "last_name"]).unwrap_or_default(),
        gender: string_field(obj, &["gender", "sex"]),
        date_of_birth: date_field(obj, &["dob", "dateOfBirth"]),
        phn: string_field(obj, &["phn", "hin"]).unwrap_or_default(),
        phone: string_field(obj, &["phone", "phoneNumber"]).unwrap_or_default(),
        email: string_field(obj, &["email"]).unwrap_or_default(),
        address: string_field(obj, &["address"]).unwrap_or_default(),
        allergies: string_or_list(obj.get("allergies")),
        compliance: bool_field(obj, &["compliance", "isCompliant"]),
    })
}

/// searchPatient → match rows.
pub fn parse_patient_matches(body: &Value) -> Vec<PatientMatch> {
    list(body)
        .iter()
        .filter_map(|item| {
            Some(PatientMatch {
                demographic_no: i64_field(item, &["demographicNo"])?,
                name: string_field(item, &["name", "patientName"]).unwrap_or_else(|| {
                    let first = string_field(item, &["firstName"]).unwrap_or_default();
                    let last = string_field(item, &["lastName"]).unwrap_or_default();
                    format!("{first} {last}").trim().to_string()
                }),
                phn: string_field(item, &["phn", "hin"]).unwrap_or_default(),
                date_of_birth: date_field(item, &["dob", "dateOfBirth"]),
            })
        })
        .collect()
}

/// generateScopeAssessment / generatePharmacyFollowUpQuestions → questions.
pub fn parse_questions(body: &Value) -> Vec<Question> {
    let items = {
        let env = envelope(body);
        env.get("questions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_else(|| env.as_array().cloned().unwrap_or_default())
    };
    items
        .iter()
        .filter_map(|item| {
            if let Some(text) = item.as_str() {
                // Some endpoints return bare question strings.
                return Some(Question {
                    text: text.to_string(),
                    options: Vec::new(),
                    multi_select: false,
                    depends_on: None,
                });
            }
            let text = string_field(item, &["question", "text"])?;
            let depends_on = parse_dependency(item);
            Some(Question {
                text,
                options: string_or_list(item.get("options")),
                multi_select: bool_field(item, &["multiSelect", "multiple"]),
                depends_on,
            })
        })
        .collect()
}

fn parse_dependency(item: &Value) -> Option<QuestionDependency> {
    if let Some(dep) = item.get("dependsOn") {
        return Some(QuestionDependency {
            question: string_field(dep, &["question"])?,
            answer: string_field(dep, &["answer"])?,
        });
    }
    Some(QuestionDependency {
        question: string_field(item, &["dependentQuestion"])?,
        answer: string_field(item, &["dependentAnswer"])?,
    })
}

/// getScopeStatus → (status, reason).
pub fn parse_scope_status(body: &Value) -> Option<(ScopeStatus, String)> {
    let obj = envelope(body);
    let status = ScopeStatus::from_wire(&string_field(obj, &["scopeStatus", "status"])?)?;
    let reason = string_field(obj, &["scopeStatusReason", "reason"]).unwrap_or_default();
    Some((status, reason))
}

/// generateSoapNotes → note text.
pub fn parse_soap_note(body: &Value) -> Option<String> {
    let obj = envelope(body);
    string_field(obj, &["soapNote", "note"]).or_else(|| obj.as_str().map(str::to_string))
}

/// addPatientDrug → server-issued batch id, when present.
pub fn parse_batch_id(body: &Value) -> Option<String> {
    let obj = envelope(body);
    string_field(obj, &["batchId", "id"]).or_else(|| string_field(body, &["batchId"]))
}

/// External fetch-drug-data → catalog entries.
pub fn parse_catalog(body: &Value) -> Vec<CatalogDrug> {
    list(body)
        .iter()
        .filter_map(|item| {
            Some(CatalogDrug {
                name: string_field(item, &["name", "drugName"])?,
                dosage_form: string_field(item, &["dosageForm", "form"]).unwrap_or_default(),
                instruction_template: string_field(item, &["instruction", "sig"])
                    .unwrap_or_default(),
            })
        })
        .collect()
}
