use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One drug line on the prescription form.
///
/// The end date and the auto-appended SIG clauses are derived values —
/// see `crate::prescription` — and are recomputed from these fields,
/// never stored as independent state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrugLine {
    /// Local identity for edit/remove while composing; not sent upstream.
    pub id: Uuid,
    pub drug_name: String,
    pub dosage_form: String,
    pub start_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub quantity: Option<u32>,
    pub refills: Option<u32>,
    /// Free-text SIG, including any auto-appended clauses.
    pub instructions: String,
}

impl DrugLine {
    pub fn new(drug_name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            drug_name: drug_name.to_string(),
            dosage_form: String::new(),
            start_date: None,
            duration_days: None,
            quantity: None,
            refills: None,
            instructions: String::new(),
        }
    }
}

/// A drug from the external catalog lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogDrug {
    pub name: String,
    pub dosage_form: String,
    /// Canonical instruction template used to seed the SIG text.
    pub instruction_template: String,
}

/// A line as it was submitted, kept for the print/fax preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedLine {
    pub drug_name: String,
    pub dosage_form: String,
    pub quantity: u32,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub refills: u32,
    pub instructions: String,
}

/// A submitted prescription batch. Immutable once accepted: editing a
/// prescription produces a new submission, never a mutation of this one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmittedBatch {
    /// Server-issued id, when the response carries one.
    pub batch_id: Option<String>,
    pub demographic_no: i64,
    pub appointment_no: i64,
    pub lines: Vec<SubmittedLine>,
}
