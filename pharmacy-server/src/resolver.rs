//! Place resolution and cache-or-fetch orchestration.
//!
//! The resolver is the composition root: it matches user-supplied place
//! names against the canonical directory lists (through `domain::fold`, so
//! casing and diacritics never matter), serves duty lists from the cache
//! store, and fetches-converts-indexes-stores on a miss.
//!
//! A miss-triggered fetch runs on a spawned task: if the caller abandons
//! the request mid-flight, the cache still gets populated for the next
//! caller.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;

use tracing::debug;

use crate::cache::{CacheStore, CacheValue, RotationSchedule, keys};
use crate::directory::{DirectoryError, DutyDirectory, to_record, to_records};
use crate::domain::{PharmacyRecord, Place, fold};
use crate::index::{
    CityDistrictIndex, CityIndex, build_city_district_index, build_city_index, build_id_index,
};

/// What was looked up when a resolution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceKind {
    City,
    District,
    Pharmacy,
}

impl fmt::Display for PlaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceKind::City => f.write_str("city"),
            PlaceKind::District => f.write_str("district"),
            PlaceKind::Pharmacy => f.write_str("pharmacy"),
        }
    }
}

/// Errors from place resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No canonical match after normalization; never retried.
    #[error("no such {kind}: {value}")]
    NotFound { kind: PlaceKind, value: String },

    /// The directory failed; retries and user messaging are the caller's
    /// business.
    #[error("duty directory unavailable")]
    DataUnavailable(#[source] DirectoryError),
}

impl From<DirectoryError> for ResolveError {
    fn from(err: DirectoryError) -> Self {
        ResolveError::DataUnavailable(err)
    }
}

/// A successfully resolved request.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The canonical city entry, display spelling intact.
    pub city: Place,
    /// The canonical district, when one was requested.
    pub district: Option<Place>,
    /// The duty list, in directory order.
    pub pharmacies: Vec<PharmacyRecord>,
}

/// Configuration for the resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Folded name prefix of a region the site does not serve. Matching
    /// cities are dropped where city lists enter the system, so they never
    /// appear in indices, counts or results.
    pub excluded_city_prefix: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            excluded_city_prefix: Some("kktc".to_string()),
        }
    }
}

/// Resolves place names to canonical entries and duty lists.
///
/// Holds its collaborators by handle; there is no process-wide cache
/// state. Cloning is cheap and clones share the cache.
#[derive(Clone)]
pub struct Resolver<D: DutyDirectory> {
    directory: D,
    cache: CacheStore,
    schedule: RotationSchedule,
    excluded_city_prefix: Option<String>,
}

impl<D: DutyDirectory> Resolver<D> {
    pub fn new(directory: D, cache: CacheStore, schedule: RotationSchedule) -> Self {
        Self::with_config(directory, cache, schedule, ResolverConfig::default())
    }

    pub fn with_config(
        directory: D,
        cache: CacheStore,
        schedule: RotationSchedule,
        config: ResolverConfig,
    ) -> Self {
        Self {
            directory,
            cache,
            schedule,
            excluded_city_prefix: config.excluded_city_prefix.as_deref().map(fold),
        }
    }

    /// Direct cache handle, for maintenance layers that need raw
    /// get/set/delete access.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Resolve a possibly mis-cased or alternately spelled city (and
    /// optional district) to canonical places and their duty list.
    pub async fn resolve(
        &self,
        city_input: &str,
        district_input: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let cities = self.cities().await?;
        let city = match_place(&cities, city_input)
            .ok_or_else(|| ResolveError::NotFound {
                kind: PlaceKind::City,
                value: city_input.to_string(),
            })?
            .clone();

        let district = match district_input {
            Some(input) if !fold(input).is_empty() => {
                let districts = self.districts(&city).await?;
                let district =
                    match_place(&districts, input).ok_or_else(|| ResolveError::NotFound {
                        kind: PlaceKind::District,
                        value: input.to_string(),
                    })?;
                Some(district.clone())
            }
            _ => None,
        };

        let city_key = fold(&city.name);
        let key = match &district {
            Some(d) => keys::daily_pharmacies_in(&city_key, &fold(&d.name)),
            None => keys::daily_pharmacies(&city_key),
        };

        if let Some(value) = self.cache.get(&key).await
            && let CacheValue::PharmacyList(list) = value.as_ref()
        {
            debug!(%key, "duty list served from cache");
            return Ok(Resolution {
                city,
                district,
                pharmacies: list.clone(),
            });
        }

        let directory = self.directory.clone();
        let cache = self.cache.clone();
        let ttl = self.schedule.daily();
        let city_slug = city.slug.clone();
        let district_slug = district.as_ref().map(|d| d.slug.clone());
        let task_key = key.clone();
        let pharmacies = self
            .populate(async move {
                let raw = directory
                    .fetch_pharmacies_by_city(&city_slug, district_slug.as_deref())
                    .await?;
                let records = to_records(&raw);
                debug!(key = %task_key, count = records.len(), "duty list fetched");
                cache
                    .set(task_key, CacheValue::PharmacyList(records.clone()), ttl)
                    .await;
                Ok(records)
            })
            .await?;

        Ok(Resolution {
            city,
            district,
            pharmacies,
        })
    }

    /// Canonical cities served by the site, cached weekly.
    pub async fn cities(&self) -> Result<Vec<Place>, ResolveError> {
        if let Some(value) = self.cache.get(keys::CITIES).await
            && let CacheValue::Places(places) = value.as_ref()
        {
            return Ok(places.clone());
        }

        let directory = self.directory.clone();
        let cache = self.cache.clone();
        let ttl = self.schedule.weekly();
        let excluded = self.excluded_city_prefix.clone();
        self.populate(async move {
            let mut cities = directory.fetch_cities().await?;
            if let Some(prefix) = &excluded {
                cities.retain(|city| !place_has_prefix(city, prefix));
            }
            debug!(count = cities.len(), "canonical city list refreshed");
            cache
                .set(keys::CITIES, CacheValue::Places(cities.clone()), ttl)
                .await;
            Ok(cities)
        })
        .await
    }

    /// Canonical districts of a resolved city, cached weekly.
    pub async fn districts(&self, city: &Place) -> Result<Vec<Place>, ResolveError> {
        let key = keys::districts(&fold(&city.name));
        if let Some(value) = self.cache.get(&key).await
            && let CacheValue::Places(places) = value.as_ref()
        {
            return Ok(places.clone());
        }

        let directory = self.directory.clone();
        let cache = self.cache.clone();
        let ttl = self.schedule.weekly();
        let city_slug = city.slug.clone();
        self.populate(async move {
            let districts = directory.fetch_districts(&city_slug).await?;
            cache
                .set(key, CacheValue::Places(districts.clone()), ttl)
                .await;
            Ok(districts)
        })
        .await
    }

    /// The full duty list grouped by city, cached under the rolling weekly
    /// key.
    pub async fn all_pharmacies_by_city(&self) -> Result<CityIndex, ResolveError> {
        if let Some(value) = self.cache.get(keys::PHARMACIES).await
            && let CacheValue::CityMap(index) = value.as_ref()
        {
            return Ok(index.clone());
        }

        let directory = self.directory.clone();
        let cache = self.cache.clone();
        let ttl = self.schedule.weekly();
        let excluded = self.excluded_city_prefix.clone();
        self.populate(async move {
            let raw = directory.fetch_all_pharmacies().await?;
            let mut records = to_records(&raw);
            if let Some(prefix) = &excluded {
                records.retain(|record| !fold(&record.city).starts_with(prefix.as_str()));
            }
            let index = build_city_index(&records);
            debug!(
                cities = index.len(),
                records = index.total_records(),
                "full duty list indexed"
            );
            cache
                .set(keys::PHARMACIES, CacheValue::CityMap(index.clone()), ttl)
                .await;
            Ok(index)
        })
        .await
    }

    /// The full duty list grouped by city then district, derived from the
    /// rolling index and cached alongside it.
    pub async fn all_pharmacies_by_district(&self) -> Result<CityDistrictIndex, ResolveError> {
        if let Some(value) = self.cache.get(keys::PHARMACIES_BY_DISTRICT).await
            && let CacheValue::CityDistrictMap(index) = value.as_ref()
        {
            return Ok(index.clone());
        }

        let city_index = self.all_pharmacies_by_city().await?;
        let records: Vec<PharmacyRecord> = city_index.records().cloned().collect();
        let index = build_city_district_index(&records);
        self.cache
            .set(
                keys::PHARMACIES_BY_DISTRICT,
                CacheValue::CityDistrictMap(index.clone()),
                self.schedule.weekly(),
            )
            .await;
        Ok(index)
    }

    /// Pharmacies-per-city counts keyed by folded city name.
    ///
    /// A cached map is reused while its key set still matches the canonical
    /// city count; anything else means the city list rolled over, and the
    /// counts are recomputed from the full index.
    pub async fn pharmacy_counts(&self) -> Result<BTreeMap<String, usize>, ResolveError> {
        let cities = self.cities().await?;

        if let Some(value) = self.cache.get(keys::CITY_COUNTS).await
            && let CacheValue::CountMap(counts) = value.as_ref()
            && counts.len() == cities.len()
        {
            return Ok(counts.clone());
        }

        let index = self.all_pharmacies_by_city().await?;
        let counts: BTreeMap<String, usize> = cities
            .iter()
            .map(|city| {
                let key = fold(&city.name);
                let count = index.get(&key).map_or(0, <[PharmacyRecord]>::len);
                (key, count)
            })
            .collect();

        self.cache
            .set(
                keys::CITY_COUNTS,
                CacheValue::CountMap(counts.clone()),
                self.schedule.daily(),
            )
            .await;
        Ok(counts)
    }

    /// Pharmacies-per-district counts for one city, with the same
    /// key-set staleness rule as [`pharmacy_counts`](Self::pharmacy_counts).
    pub async fn district_counts(
        &self,
        city: &Place,
    ) -> Result<BTreeMap<String, usize>, ResolveError> {
        let districts = self.districts(city).await?;
        let key = keys::district_counts(&fold(&city.name));

        if let Some(value) = self.cache.get(&key).await
            && let CacheValue::CountMap(counts) = value.as_ref()
            && counts.len() == districts.len()
        {
            return Ok(counts.clone());
        }

        let resolution = self.resolve(&city.name, None).await?;
        let index = build_city_district_index(&resolution.pharmacies);
        let grouped = index.city(&city.name);
        let counts: BTreeMap<String, usize> = districts
            .iter()
            .map(|district| {
                let district_key = fold(&district.name);
                let count = grouped
                    .and_then(|g| g.get(&district_key))
                    .map_or(0, <[PharmacyRecord]>::len);
                (district_key, count)
            })
            .collect();

        self.cache
            .set(key, CacheValue::CountMap(counts.clone()), self.schedule.daily())
            .await;
        Ok(counts)
    }

    /// A single pharmacy, served from the cached full index when possible.
    pub async fn pharmacy_by_id(&self, id: &str) -> Result<PharmacyRecord, ResolveError> {
        if let Some(value) = self.cache.get(keys::PHARMACIES).await
            && let CacheValue::CityMap(index) = value.as_ref()
        {
            let records: Vec<PharmacyRecord> = index.records().cloned().collect();
            if let Some(record) = build_id_index(&records).remove(id) {
                return Ok(record);
            }
        }

        match self.directory.fetch_pharmacy_by_id(id).await {
            Ok(raw) => Ok(to_record(&raw)),
            Err(DirectoryError::NotFound(value)) => Err(ResolveError::NotFound {
                kind: PlaceKind::Pharmacy,
                value,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Run a fetch-and-populate future to completion even if the caller
    /// goes away: other waiters benefit from the filled cache.
    async fn populate<T, F>(&self, task: F) -> Result<T, ResolveError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, DirectoryError>> + Send + 'static,
    {
        match tokio::spawn(task).await {
            Ok(result) => result.map_err(ResolveError::from),
            Err(join) => Err(ResolveError::DataUnavailable(DirectoryError::Api {
                status: 0,
                message: format!("fetch task failed: {join}"),
            })),
        }
    }
}

/// Find the canonical entry whose folded name or slug matches the input.
fn match_place<'a>(places: &'a [Place], input: &str) -> Option<&'a Place> {
    let needle = fold(input);
    if needle.is_empty() {
        return None;
    }
    places
        .iter()
        .find(|place| fold(&place.name) == needle || fold(&place.slug) == needle)
}

fn place_has_prefix(place: &Place, folded_prefix: &str) -> bool {
    fold(&place.name).starts_with(folded_prefix) || fold(&place.slug).starts_with(folded_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MockDirectory, RawPharmacy};

    fn pharmacy(id: &str, city: &str, district: &str) -> RawPharmacy {
        RawPharmacy {
            pharmacy_id: id.to_string(),
            pharmacy_name: format!("Eczane {id}"),
            address: "Bağdat Cad. 1".to_string(),
            city: city.to_string(),
            district: district.to_string(),
            directions: None,
            phone: "05321234567".to_string(),
            pharmacy_duty_start: None,
            pharmacy_duty_end: None,
            latitude: 41.0,
            longitude: 29.0,
        }
    }

    fn directory() -> MockDirectory {
        MockDirectory::builder()
            .city("İstanbul", "istanbul")
            .city("Ankara", "ankara")
            .city("KKTC Lefkoşa", "kktc-lefkosa")
            .district("istanbul", "Kadıköy", "kadikoy")
            .district("istanbul", "Beşiktaş", "besiktas")
            .district("ankara", "Çankaya", "cankaya")
            .pharmacy(pharmacy("1", "İstanbul", "Kadıköy"))
            .pharmacy(pharmacy("2", "İstanbul", "Beşiktaş"))
            .pharmacy(pharmacy("3", "Ankara", "Çankaya"))
            .pharmacy(pharmacy("4", "KKTC Lefkoşa", "Lefkoşa"))
            .build()
    }

    fn resolver(directory: MockDirectory) -> Resolver<MockDirectory> {
        Resolver::new(directory, CacheStore::new(), RotationSchedule::default())
    }

    #[tokio::test]
    async fn resolves_mis_cased_city_to_canonical() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let resolution = resolver.resolve("ISTANBUL", None).await.unwrap();

        assert_eq!(resolution.city.name, "İstanbul");
        assert!(resolution.district.is_none());
        assert_eq!(resolution.pharmacies.len(), 2);
        assert_eq!(dir.pharmacy_fetches(), 1);
    }

    #[tokio::test]
    async fn second_resolution_is_a_cache_hit() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let first = resolver.resolve("istanbul", None).await.unwrap();
        let second = resolver.resolve("İSTANBUL", None).await.unwrap();

        assert_eq!(first.pharmacies, second.pharmacies);
        assert_eq!(dir.pharmacy_fetches(), 1);
    }

    #[tokio::test]
    async fn resolves_district_to_canonical() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let resolution = resolver
            .resolve("istanbul", Some("KADIKOY"))
            .await
            .unwrap();

        assert_eq!(resolution.district.unwrap().name, "Kadıköy");
        assert_eq!(resolution.pharmacies.len(), 1);
        assert_eq!(resolution.pharmacies[0].id, "1");
    }

    #[tokio::test]
    async fn city_and_district_lists_cache_separately() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        resolver.resolve("istanbul", None).await.unwrap();
        resolver.resolve("istanbul", Some("kadikoy")).await.unwrap();
        resolver.resolve("istanbul", Some("kadıköy")).await.unwrap();

        // One fetch for the city list, one for the district-scoped list.
        assert_eq!(dir.pharmacy_fetches(), 2);
    }

    #[tokio::test]
    async fn blank_district_input_is_ignored() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let resolution = resolver.resolve("istanbul", Some("  ")).await.unwrap();
        assert!(resolution.district.is_none());
    }

    #[tokio::test]
    async fn unknown_city_is_not_found() {
        let resolver = resolver(directory());

        let err = resolver.resolve("Atlantis", None).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: PlaceKind::City,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unknown_district_is_not_found() {
        let resolver = resolver(directory());

        let err = resolver
            .resolve("istanbul", Some("Narnia"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: PlaceKind::District,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn directory_failure_is_data_unavailable() {
        let dir = directory();
        let resolver = resolver(dir.clone());
        dir.set_unavailable(true);

        let err = resolver.resolve("istanbul", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::DataUnavailable(_)));
    }

    #[tokio::test]
    async fn cached_city_list_survives_directory_outage() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        resolver.resolve("istanbul", None).await.unwrap();
        dir.set_unavailable(true);

        // City list and duty list are both cached; no upstream call needed.
        let resolution = resolver.resolve("istanbul", None).await.unwrap();
        assert_eq!(resolution.pharmacies.len(), 2);
    }

    #[tokio::test]
    async fn excluded_region_never_appears() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let cities = resolver.cities().await.unwrap();
        assert!(cities.iter().all(|c| !c.name.starts_with("KKTC")));

        let err = resolver.resolve("KKTC Lefkoşa", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { .. }));

        let index = resolver.all_pharmacies_by_city().await.unwrap();
        assert!(index.get("kktc lefkosa").is_none());

        let counts = resolver.pharmacy_counts().await.unwrap();
        assert!(!counts.contains_key("kktc lefkosa"));
    }

    #[tokio::test]
    async fn district_map_derives_from_city_map_without_refetch() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        let index = resolver.all_pharmacies_by_district().await.unwrap();
        assert_eq!(index.get("istanbul", "kadikoy").unwrap().len(), 1);
        assert_eq!(dir.pharmacy_fetches(), 1);

        // Cached under its own key; a second call refetches nothing.
        resolver.all_pharmacies_by_district().await.unwrap();
        assert_eq!(dir.pharmacy_fetches(), 1);
    }

    #[tokio::test]
    async fn counts_cover_every_canonical_city() {
        let resolver = resolver(directory());

        let counts = resolver.pharmacy_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["istanbul"], 2);
        assert_eq!(counts["ankara"], 1);
    }

    #[tokio::test]
    async fn stale_count_key_set_forces_recompute() {
        let resolver = resolver(directory());

        // A cached map whose key set no longer matches the canonical city
        // count must be ignored and rebuilt.
        resolver
            .cache()
            .set(
                keys::CITY_COUNTS,
                CacheValue::CountMap(BTreeMap::from([("istanbul".to_string(), 99)])),
                std::time::Duration::from_secs(3600),
            )
            .await;

        let counts = resolver.pharmacy_counts().await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["istanbul"], 2);
    }

    #[tokio::test]
    async fn district_counts_cover_every_canonical_district() {
        let resolver = resolver(directory());
        let city = Place::new("İstanbul", "istanbul");

        let counts = resolver.district_counts(&city).await.unwrap();
        assert_eq!(counts.len(), 2);
        assert_eq!(counts["kadikoy"], 1);
        assert_eq!(counts["besiktas"], 1);
    }

    #[tokio::test]
    async fn pharmacy_by_id_prefers_cached_index() {
        let dir = directory();
        let resolver = resolver(dir.clone());

        resolver.all_pharmacies_by_city().await.unwrap();
        let fetches = dir.pharmacy_fetches();

        let record = resolver.pharmacy_by_id("3").await.unwrap();
        assert_eq!(record.city, "Ankara");
        assert_eq!(dir.pharmacy_fetches(), fetches);
    }

    #[tokio::test]
    async fn pharmacy_by_id_falls_back_to_directory() {
        let resolver = resolver(directory());

        let record = resolver.pharmacy_by_id("1").await.unwrap();
        assert_eq!(record.id, "1");
        // Phone is normalized during conversion.
        assert_eq!(record.phone, "+905321234567");
    }

    #[tokio::test]
    async fn unknown_pharmacy_id_is_not_found() {
        let resolver = resolver(directory());

        let err = resolver.pharmacy_by_id("999").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::NotFound {
                kind: PlaceKind::Pharmacy,
                ..
            }
        ));
    }
}
