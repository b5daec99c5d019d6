//! Wire types for the duty-pharmacy directory API.

use serde::{Deserialize, Serialize};

/// Response envelope shared by every directory endpoint.
///
/// The API reports logical failure through `status` with an HTTP 200, so the
/// client has to look inside before trusting `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A pharmacy exactly as the directory returns it.
///
/// Converted into `domain::PharmacyRecord` by `directory::convert`; nothing
/// outside this module should consume these fields directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPharmacy {
    pub pharmacy_id: String,
    pub pharmacy_name: String,
    #[serde(default)]
    pub address: String,
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub directions: Option<String>,
    #[serde(default)]
    pub phone: String,
    /// Duty-window bounds as RFC 3339 strings; not always present.
    #[serde(default)]
    pub pharmacy_duty_start: Option<String>,
    #[serde(default)]
    pub pharmacy_duty_end: Option<String>,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
}

/// A city or district entry from the `/cities` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDto {
    pub name: String,
    pub slug: String,
}
