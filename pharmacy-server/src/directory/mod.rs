//! Duty-pharmacy directory client.
//!
//! The remote directory is the single source of pharmacy data. It speaks a
//! JSON envelope (`{status, message, data}`) and identifies places by slug.
//! The resolver consumes it through the [`DutyDirectory`] trait so tests can
//! substitute [`MockDirectory`] for the HTTP client.

use std::future::Future;

use crate::domain::Place;

mod client;
mod convert;
mod error;
mod mock;
mod types;

pub use client::{DirectoryClient, DirectoryConfig};
pub use convert::{to_record, to_records};
pub use error::DirectoryError;
pub use mock::{MockDirectory, MockDirectoryBuilder};
pub use types::{Envelope, PlaceDto, RawPharmacy};

/// The upstream directory as the resolver sees it.
///
/// Implementations must be cheap to clone (a handle, not the data): cache
/// misses fetch on a spawned task so that population survives caller
/// cancellation, and the task takes its own clone.
pub trait DutyDirectory: Clone + Send + Sync + 'static {
    /// Fetch today's full duty list across all cities.
    fn fetch_all_pharmacies(
        &self,
    ) -> impl Future<Output = Result<Vec<RawPharmacy>, DirectoryError>> + Send;

    /// Fetch the duty list for one city, optionally narrowed to a district.
    fn fetch_pharmacies_by_city(
        &self,
        city_slug: &str,
        district_slug: Option<&str>,
    ) -> impl Future<Output = Result<Vec<RawPharmacy>, DirectoryError>> + Send;

    /// Fetch the canonical city list.
    fn fetch_cities(&self) -> impl Future<Output = Result<Vec<Place>, DirectoryError>> + Send;

    /// Fetch the canonical districts of a city.
    fn fetch_districts(
        &self,
        city_slug: &str,
    ) -> impl Future<Output = Result<Vec<Place>, DirectoryError>> + Send;

    /// Fetch a single pharmacy by its directory identifier.
    fn fetch_pharmacy_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<RawPharmacy, DirectoryError>> + Send;
}
