//! Pharmacy and place records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A duty pharmacy as served to callers and held in caches.
///
/// Built once from the upstream payload (see `directory::convert`) and never
/// mutated afterwards; cached copies are shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRecord {
    /// Stable identifier assigned by the upstream directory.
    pub id: String,
    pub name: String,
    pub address: String,
    /// Phone in international format (see `domain::normalize_phone`).
    pub phone: String,
    /// Display spelling of the city, diacritics intact.
    pub city: String,
    /// Display spelling of the district; may be empty for some records.
    pub district: String,
    pub directions: Option<String>,
    /// Start of the duty window, when the upstream provides a parseable one.
    pub duty_start: Option<DateTime<Utc>>,
    /// End of the duty window.
    pub duty_end: Option<DateTime<Utc>>,
    pub latitude: f64,
    pub longitude: f64,
}

impl PharmacyRecord {
    /// The comma-joined `"lat, lon"` pair used by map links.
    pub fn location(&self) -> String {
        format!("{}, {}", self.latitude, self.longitude)
    }
}

/// A canonical city or district as known to the upstream directory.
///
/// `name` is the display spelling (diacritics intact); `slug` is the
/// URL-safe identifier the directory expects in queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub slug: String,
}

impl Place {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_joins_coordinates() {
        let record = PharmacyRecord {
            id: "42".to_string(),
            name: "Merkez Eczanesi".to_string(),
            address: "Atatürk Cad. 12".to_string(),
            phone: "+902121234567".to_string(),
            city: "İstanbul".to_string(),
            district: "Kadıköy".to_string(),
            directions: None,
            duty_start: None,
            duty_end: None,
            latitude: 40.9881,
            longitude: 29.0253,
        };

        assert_eq!(record.location(), "40.9881, 29.0253");
    }
}
