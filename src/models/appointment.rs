use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Visit type derived from the server's status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentKind {
    New,
    FollowUp,
}

impl AppointmentKind {
    /// The wire sends short status codes; `N`/`new` is a new visit,
    /// everything else is treated as a follow-up.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_lowercase().as_str() {
            "n" | "new" => Self::New,
            _ => Self::FollowUp,
        }
    }
}

/// One appointment row as shown in the day list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_no: i64,
    pub demographic_no: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub kind: AppointmentKind,
    pub reason: String,
    pub patient_name: String,
}

impl Appointment {
    /// Ordering key: newest date first, then latest start time.
    pub fn sort_key(&self) -> (NaiveDate, NaiveTime) {
        (self.date, self.start_time)
    }
}
