use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Bimble Clinician";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base URL of the clinic REST API.
pub const API_BASE_URL: &str = "https://api.bimble.pro/api/v1";

/// Prefix for clinic media served as relative paths (logos).
pub const MEDIA_BASE_URL: &str = "https://api.bimble.pro/media";

/// External drug catalog host (separate service from the clinic API).
pub const DRUG_CATALOG_URL: &str = "https://drugs.bimble.pro/fetch-drug-data";

/// Quiet period for debounced search inputs (patient and drug lookup).
pub const SEARCH_QUIET_PERIOD: Duration = Duration::from_millis(350);

/// How long "remember me" credentials stay valid.
pub const REMEMBER_ME_DAYS: i64 = 30;

/// Drug lines rendered per prescription PDF page.
pub const DRUG_LINES_PER_PAGE: usize = 5;

/// Get the application data directory
/// ~/Bimble/ on all platforms (user-visible, mirrors the mobile app's own folder)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Bimble")
}

/// Path of the on-device credential store (token + remembered login).
pub fn store_path() -> PathBuf {
    app_data_dir().join("store.db")
}

/// Directory where generated patient documents are written before opening.
pub fn documents_dir() -> PathBuf {
    app_data_dir().join("documents")
}

pub fn default_log_filter() -> &'static str {
    "info,bimble_clinician_lib=debug"
}
