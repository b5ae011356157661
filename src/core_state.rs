//! Shared application state: one typed slice per bounded context.
//!
//! The original store nested everything under one shapeless namespace;
//! here each context — session, clinic, patient, appointment, assessment,
//! prescription — is its own `RwLock`ed cell composed at the top level.
//! Every slice carries the loading/error/data triple the screens bind to:
//! the loading flag is set before a dispatch and cleared in both the
//! success and failure paths, and errors are strings read from state,
//! never exceptions crossing the IPC boundary.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use crate::api::ApiClient;
use crate::assessment::AssessmentStage;
use crate::config;
use crate::models::{
    Appointment, CatalogDrug, Clinic, ClinicEntity, DrugLine, Patient, PatientMatch,
    SubmittedBatch,
};
use crate::search::Debouncer;
use crate::session::{SessionStore, StoreError};

/// Errors from CoreState operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Internal lock error")]
    LockPoisoned,
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Not logged in to a clinic")]
    NoSession,
}

// ═══════════════════════════════════════════════════════════
// Slice — the loading/error/data cell
// ═══════════════════════════════════════════════════════════

/// One async-fetch cell. `begin` before dispatch, then exactly one of
/// `succeed`/`fail`; both clear the loading flag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Slice<T> {
    pub loading: bool,
    pub error: Option<String>,
    pub data: T,
}

impl<T> Slice<T> {
    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn succeed(&mut self, data: T) {
        self.loading = false;
        self.error = None;
        self.data = data;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }
}

impl<T: Default> Slice<T> {
    /// Failure that also resets the data to empty. Observed behavior of
    /// the list fetches (appointments, subdomains): a failed refresh
    /// discards stale rows instead of keeping them. Flagged for product
    /// review in DESIGN.md; flipping it means calling `fail` instead.
    pub fn fail_and_clear(&mut self, message: impl Into<String>) {
        self.fail(message);
        self.data = T::default();
    }
}

// ═══════════════════════════════════════════════════════════
// Slice payloads
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionData {
    pub authenticated: bool,
    /// Tenant picked at login; reused by assessment submissions.
    pub subdomain: Option<String>,
    pub subdomains: Vec<ClinicEntity>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ClinicData {
    pub clinic: Option<Clinic>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PatientData {
    /// Cached patient details keyed by demographic number, so concurrent
    /// fetches for different patients never overwrite each other.
    pub patients: HashMap<i64, Patient>,
    pub matches: Vec<PatientMatch>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentData {
    pub appointments: Vec<Appointment>,
    /// Appointment number of the selected row.
    pub selected: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssessmentData {
    pub demographic_no: Option<i64>,
    pub appointment_no: Option<i64>,
    /// Visit reason the assessment was started for; forwarded to the
    /// scope, follow-up, and SOAP calls.
    pub reason: Option<String>,
    pub stage: Option<AssessmentStage>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PrescriptionData {
    /// Lines already added to the batch being composed.
    pub lines: Vec<DrugLine>,
    /// The line currently being filled in.
    pub in_progress: Option<DrugLine>,
    pub catalog_matches: Vec<CatalogDrug>,
    /// Last accepted submission, kept for the print/fax preview.
    pub submitted: Option<SubmittedBatch>,
}

// ═══════════════════════════════════════════════════════════
// CoreState
// ═══════════════════════════════════════════════════════════

/// Application state shared across all IPC commands via `Arc`.
pub struct CoreState {
    api: ApiClient,
    store: Arc<SessionStore>,
    pub session: RwLock<Slice<SessionData>>,
    pub clinic: RwLock<Slice<ClinicData>>,
    pub patients: RwLock<Slice<PatientData>>,
    pub appointments: RwLock<Slice<AppointmentData>>,
    pub assessment: RwLock<Slice<AssessmentData>>,
    pub prescription: RwLock<Slice<PrescriptionData>>,
    pub patient_search: Debouncer,
    pub catalog_search: Debouncer,
}

impl CoreState {
    /// Production state: on-device store, real API endpoints.
    pub fn new() -> Result<Self, CoreError> {
        let store = Arc::new(SessionStore::open(&config::store_path())?);
        Ok(Self::with_store(store))
    }

    /// State over an explicit store — used by tests with the in-memory
    /// store, same construction path otherwise.
    pub fn with_store(store: Arc<SessionStore>) -> Self {
        let api = ApiClient::new(
            config::API_BASE_URL,
            config::DRUG_CATALOG_URL,
            Arc::clone(&store),
        );
        Self::from_parts(api, store)
    }

    fn from_parts(api: ApiClient, store: Arc<SessionStore>) -> Self {
        Self {
            api,
            store,
            session: RwLock::new(Slice::default()),
            clinic: RwLock::new(Slice::default()),
            patients: RwLock::new(Slice::default()),
            appointments: RwLock::new(Slice::default()),
            assessment: RwLock::new(Slice::default()),
            prescription: RwLock::new(Slice::default()),
            patient_search: Debouncer::new(config::SEARCH_QUIET_PERIOD),
            catalog_search: Debouncer::new(config::SEARCH_QUIET_PERIOD),
        }
    }

    #[cfg(test)]
    pub fn in_memory() -> Self {
        let store = Arc::new(SessionStore::in_memory().expect("in-memory store"));
        Self::with_store(store)
    }

    /// In-memory state pointed at an arbitrary API host, so tests can
    /// exercise request-failure paths against a closed port.
    #[cfg(test)]
    pub fn in_memory_with_api(base_url: &str) -> Self {
        let store = Arc::new(SessionStore::in_memory().expect("in-memory store"));
        let api = ApiClient::new(base_url, base_url, Arc::clone(&store));
        Self::from_parts(api, store)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Tenant subdomain of the active session.
    pub fn active_subdomain(&self) -> Result<String, CoreError> {
        let guard = self.read(&self.session)?;
        guard.data.subdomain.clone().ok_or(CoreError::NoSession)
    }

    // ── Lock access ─────────────────────────────────────────

    pub fn read<'a, T>(
        &self,
        slice: &'a RwLock<Slice<T>>,
    ) -> Result<RwLockReadGuard<'a, Slice<T>>, CoreError> {
        slice.read().map_err(|_| CoreError::LockPoisoned)
    }

    pub fn write<'a, T>(
        &self,
        slice: &'a RwLock<Slice<T>>,
    ) -> Result<RwLockWriteGuard<'a, Slice<T>>, CoreError> {
        slice.write().map_err(|_| CoreError::LockPoisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_start_idle_and_empty() {
        let state = CoreState::in_memory();
        let appointments = state.read(&state.appointments).unwrap();
        assert!(!appointments.loading);
        assert!(appointments.error.is_none());
        assert!(appointments.data.appointments.is_empty());
    }

    #[test]
    fn begin_sets_loading_and_clears_error() {
        let mut slice: Slice<Vec<i32>> = Slice::default();
        slice.fail("boom");
        assert_eq!(slice.error.as_deref(), Some("boom"));

        slice.begin();
        assert!(slice.loading);
        assert!(slice.error.is_none());
    }

    #[test]
    fn succeed_and_fail_both_clear_loading() {
        let mut slice: Slice<Vec<i32>> = Slice::default();
        slice.begin();
        slice.succeed(vec![1]);
        assert!(!slice.loading);
        assert_eq!(slice.data, vec![1]);

        slice.begin();
        slice.fail("network error");
        assert!(!slice.loading);
        assert_eq!(slice.data, vec![1], "plain fail keeps previous data");
    }

    #[test]
    fn fail_and_clear_resets_data() {
        let mut slice: Slice<Vec<i32>> = Slice::default();
        slice.succeed(vec![1, 2, 3]);
        slice.fail_and_clear("network error");
        assert!(slice.data.is_empty());
        assert_eq!(slice.error.as_deref(), Some("network error"));
    }

    #[test]
    fn active_subdomain_requires_session() {
        let state = CoreState::in_memory();
        assert!(matches!(
            state.active_subdomain(),
            Err(CoreError::NoSession)
        ));

        state.write(&state.session).unwrap().data.subdomain = Some("123virtual1".into());
        assert_eq!(state.active_subdomain().unwrap(), "123virtual1");
    }

    #[test]
    fn patient_cache_keyed_by_demographic_no() {
        let state = CoreState::in_memory();
        {
            let mut patients = state.write(&state.patients).unwrap();
            patients.data.patients.insert(5, Patient { demographic_no: 5, ..Default::default() });
            patients.data.patients.insert(7, Patient { demographic_no: 7, ..Default::default() });
        }
        let patients = state.read(&state.patients).unwrap();
        assert_eq!(patients.data.patients.len(), 2);
        assert_eq!(patients.data.patients[&7].demographic_no, 7);
    }

    #[test]
    fn concurrent_reads_do_not_block() {
        use std::thread;

        let state = Arc::new(CoreState::in_memory());
        let mut handles = vec![];
        for _ in 0..10 {
            let state = Arc::clone(&state);
            handles.push(thread::spawn(move || {
                let guard = state.read(&state.session).unwrap();
                assert!(!guard.data.authenticated);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
