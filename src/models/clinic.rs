use serde::{Deserialize, Serialize};

/// One tenant entry from the subdomain directory (login screen picker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicEntity {
    pub subdomain: String,
    pub entity_name: String,
}

/// The clinic tenant record. Read-only on the client; fetched once per
/// session and cached in the clinic slice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinic {
    pub subdomain: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub phone: String,
    pub fax: String,
    /// Absolute URL or a path relative to the media host. `None` when the
    /// clinic has no logo uploaded.
    pub logo: Option<String>,
}
