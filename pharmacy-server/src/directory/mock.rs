//! In-memory directory for tests and offline development.
//!
//! Serves fixture data through the same interface as the real client, counts
//! upstream pharmacy fetches (so tests can assert cache hits), and can be
//! switched into an unavailable state to exercise failure paths.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::{Place, fold, same_place};

use super::DutyDirectory;
use super::error::DirectoryError;
use super::types::RawPharmacy;

/// Mock directory serving fixture data.
#[derive(Clone, Default)]
pub struct MockDirectory {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    cities: Vec<Place>,
    /// Districts keyed by folded city slug.
    districts: HashMap<String, Vec<Place>>,
    pharmacies: Vec<RawPharmacy>,
    unavailable: AtomicBool,
    pharmacy_fetches: AtomicUsize,
}

impl Inner {
    fn guard(&self) -> Result<(), DirectoryError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DirectoryError::Api {
                status: 503,
                message: "mock directory offline".to_string(),
            });
        }
        Ok(())
    }
}

impl MockDirectory {
    pub fn builder() -> MockDirectoryBuilder {
        MockDirectoryBuilder::default()
    }

    /// Number of upstream pharmacy-list fetches served so far.
    pub fn pharmacy_fetches(&self) -> usize {
        self.inner.pharmacy_fetches.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail (and back).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }
}

impl DutyDirectory for MockDirectory {
    async fn fetch_all_pharmacies(&self) -> Result<Vec<RawPharmacy>, DirectoryError> {
        self.inner.guard()?;
        self.inner.pharmacy_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.inner.pharmacies.clone())
    }

    async fn fetch_pharmacies_by_city(
        &self,
        city_slug: &str,
        district_slug: Option<&str>,
    ) -> Result<Vec<RawPharmacy>, DirectoryError> {
        self.inner.guard()?;
        self.inner.pharmacy_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .inner
            .pharmacies
            .iter()
            .filter(|p| same_place(&p.city, city_slug))
            .filter(|p| district_slug.is_none_or(|d| same_place(&p.district, d)))
            .cloned()
            .collect())
    }

    async fn fetch_cities(&self) -> Result<Vec<Place>, DirectoryError> {
        self.inner.guard()?;
        Ok(self.inner.cities.clone())
    }

    async fn fetch_districts(&self, city_slug: &str) -> Result<Vec<Place>, DirectoryError> {
        self.inner.guard()?;
        Ok(self
            .inner
            .districts
            .get(&fold(city_slug))
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_pharmacy_by_id(&self, id: &str) -> Result<RawPharmacy, DirectoryError> {
        self.inner.guard()?;
        self.inner
            .pharmacies
            .iter()
            .find(|p| p.pharmacy_id == id)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }
}

/// Builder for [`MockDirectory`] fixtures.
#[derive(Default)]
pub struct MockDirectoryBuilder {
    cities: Vec<Place>,
    districts: HashMap<String, Vec<Place>>,
    pharmacies: Vec<RawPharmacy>,
}

impl MockDirectoryBuilder {
    pub fn city(mut self, name: &str, slug: &str) -> Self {
        self.cities.push(Place::new(name, slug));
        self
    }

    pub fn district(mut self, city_slug: &str, name: &str, slug: &str) -> Self {
        self.districts
            .entry(fold(city_slug))
            .or_default()
            .push(Place::new(name, slug));
        self
    }

    pub fn pharmacy(mut self, pharmacy: RawPharmacy) -> Self {
        self.pharmacies.push(pharmacy);
        self
    }

    pub fn build(self) -> MockDirectory {
        MockDirectory {
            inner: Arc::new(Inner {
                cities: self.cities,
                districts: self.districts,
                pharmacies: self.pharmacies,
                unavailable: AtomicBool::new(false),
                pharmacy_fetches: AtomicUsize::new(0),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pharmacy(id: &str, city: &str, district: &str) -> RawPharmacy {
        RawPharmacy {
            pharmacy_id: id.to_string(),
            pharmacy_name: format!("Eczane {id}"),
            address: String::new(),
            city: city.to_string(),
            district: district.to_string(),
            directions: None,
            phone: "5321234567".to_string(),
            pharmacy_duty_start: None,
            pharmacy_duty_end: None,
            latitude: 0.0,
            longitude: 0.0,
        }
    }

    fn directory() -> MockDirectory {
        MockDirectory::builder()
            .city("İstanbul", "istanbul")
            .city("Ankara", "ankara")
            .district("istanbul", "Kadıköy", "kadikoy")
            .district("istanbul", "Beşiktaş", "besiktas")
            .pharmacy(sample_pharmacy("1", "İstanbul", "Kadıköy"))
            .pharmacy(sample_pharmacy("2", "İstanbul", "Beşiktaş"))
            .pharmacy(sample_pharmacy("3", "Ankara", "Çankaya"))
            .build()
    }

    #[tokio::test]
    async fn filters_by_city_slug() {
        let dir = directory();
        let hits = dir.fetch_pharmacies_by_city("istanbul", None).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(dir.pharmacy_fetches(), 1);
    }

    #[tokio::test]
    async fn filters_by_district_slug() {
        let dir = directory();
        let hits = dir
            .fetch_pharmacies_by_city("istanbul", Some("kadikoy"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].pharmacy_id, "1");
    }

    #[tokio::test]
    async fn districts_keyed_by_folded_slug() {
        let dir = directory();
        let districts = dir.fetch_districts("İSTANBUL").await.unwrap();
        assert_eq!(districts.len(), 2);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let dir = directory();
        let err = dir.fetch_pharmacy_by_id("99").await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn unavailable_switch_fails_every_call() {
        let dir = directory();
        dir.set_unavailable(true);
        assert!(dir.fetch_cities().await.is_err());
        assert!(dir.fetch_all_pharmacies().await.is_err());

        dir.set_unavailable(false);
        assert!(dir.fetch_cities().await.is_ok());
    }
}
