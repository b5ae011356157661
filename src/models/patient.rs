use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Display text when a patient has no recorded allergies.
pub const NO_KNOWN_ALLERGIES: &str = "No Known Allergies";

/// A patient record, keyed by demographic number.
///
/// Allergies are normalized to a list at the wire boundary — the server
/// returns either a bare string or an array depending on the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub demographic_no: i64,
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Personal Health Number, display only.
    pub phn: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub allergies: Vec<String>,
    pub compliance: bool,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Allergy list for display. Never empty, never panics: an absent or
    /// empty field reads as "No Known Allergies".
    pub fn allergies_display(&self) -> String {
        if self.allergies.is_empty() {
            NO_KNOWN_ALLERGIES.to_string()
        } else {
            self.allergies.join(", ")
        }
    }
}

/// A row from patient search (name/PHN lookup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientMatch {
    pub demographic_no: i64,
    pub name: String,
    pub phn: String,
    pub date_of_birth: Option<NaiveDate>,
}

/// Normalize a gender value to the "Male"/"Female" forms the assessment
/// endpoints require. Returns `None` for anything unrecognised — callers
/// treat that as a client-side validation failure, not a request.
pub fn normalize_gender(raw: &str) -> Option<&'static str> {
    match raw.trim().to_lowercase().as_str() {
        "m" | "male" => Some("Male"),
        "f" | "female" => Some("Female"),
        _ => None,
    }
}
