//! Caching layer for directory data.
//!
//! The duty list changes at a fixed local time each day, so entries are
//! stored with TTLs computed against that boundary ([`RotationSchedule`])
//! rather than fixed lifetimes. [`CacheStore`] is the single shared mutable
//! resource in the crate; [`DiskCache`] optionally carries it across
//! restarts.

mod disk;
mod rotation;
mod store;

pub use disk::{DiskCache, SnapshotError};
pub use rotation::RotationSchedule;
pub use store::{CacheStore, CacheValue};

/// Well-known cache keys.
pub mod keys {
    /// Rolling all-pharmacies index, refreshed weekly.
    pub const PHARMACIES: &str = "pharmacies";

    /// The same list grouped down to district level.
    pub const PHARMACIES_BY_DISTRICT: &str = "pharmacies_by_district";

    /// Canonical city list.
    pub const CITIES: &str = "cities";

    /// Pharmacies-per-city counts.
    pub const CITY_COUNTS: &str = "city_counts";

    /// Daily duty list for one city.
    pub fn daily_pharmacies(city_key: &str) -> String {
        format!("daily_pharmacies:{city_key}")
    }

    /// Daily duty list for one city/district pair.
    pub fn daily_pharmacies_in(city_key: &str, district_key: &str) -> String {
        format!("daily_pharmacies:{city_key}:{district_key}")
    }

    /// Canonical district list of a city.
    pub fn districts(city_key: &str) -> String {
        format!("districts:{city_key}")
    }

    /// Pharmacies-per-district counts of a city.
    pub fn district_counts(city_key: &str) -> String {
        format!("district_counts:{city_key}")
    }
}
