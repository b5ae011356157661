pub mod appointment;
pub mod assessment;
pub mod clinic;
pub mod patient;
pub mod prescription;

pub use appointment::{Appointment, AppointmentKind};
pub use assessment::{Answer, Question, QuestionDependency, ScopeOutcome, ScopeStatus};
pub use clinic::{Clinic, ClinicEntity};
pub use patient::{Patient, PatientMatch};
pub use prescription::{CatalogDrug, DrugLine, SubmittedBatch, SubmittedLine};
