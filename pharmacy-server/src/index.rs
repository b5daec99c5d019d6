//! Lookup indices over flat pharmacy lists.
//!
//! The directory hands back flat lists; callers want "pharmacies in this
//! city" and "pharmacies in this district" without rescanning. Indices group
//! by the folded place name (see `domain::fold`), preserve input order
//! within each group, and are never mutated once built; a cache miss builds
//! a fresh one.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::domain::{PharmacyRecord, fold};

/// Group key for records whose district is missing or blank. Never listed as
/// a selectable district; reachable only by asking for it explicitly.
pub const UNSPECIFIED_DISTRICT: &str = "_unspecified";

/// Pharmacies grouped by folded city name, in first-seen city order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityIndex {
    order: Vec<String>,
    groups: HashMap<String, Vec<PharmacyRecord>>,
}

impl CityIndex {
    fn push(&mut self, key: String, record: PharmacyRecord) {
        if !self.groups.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.groups.entry(key).or_default().push(record);
    }

    /// Records for a city, matched through `fold`. `None` means the city has
    /// no group; an empty group is never stored.
    pub fn get(&self, city: &str) -> Option<&[PharmacyRecord]> {
        self.groups.get(&fold(city)).map(Vec::as_slice)
    }

    /// Folded city keys in first-seen order.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Number of city groups.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total records across all groups.
    pub fn total_records(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// All records, concatenated in group insertion order.
    pub fn records(&self) -> impl Iterator<Item = &PharmacyRecord> {
        self.order.iter().flat_map(|key| self.groups[key].iter())
    }

    /// Per-city record counts, keyed by folded city name.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.groups
            .iter()
            .map(|(key, group)| (key.clone(), group.len()))
            .collect()
    }
}

/// Pharmacies grouped by folded city, then folded district.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityDistrictIndex {
    order: Vec<String>,
    cities: HashMap<String, CityDistricts>,
}

impl CityDistrictIndex {
    /// The district grouping of a city.
    pub fn city(&self, city: &str) -> Option<&CityDistricts> {
        self.cities.get(&fold(city))
    }

    /// Records for one city/district pair.
    pub fn get(&self, city: &str, district: &str) -> Option<&[PharmacyRecord]> {
        self.city(city)?.get(district)
    }

    /// Folded city keys in first-seen order.
    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// One city's pharmacies grouped by folded district name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CityDistricts {
    order: Vec<String>,
    districts: HashMap<String, Vec<PharmacyRecord>>,
}

impl CityDistricts {
    fn push(&mut self, key: String, record: PharmacyRecord) {
        if !self.districts.contains_key(&key) {
            self.order.push(key.clone());
        }
        self.districts.entry(key).or_default().push(record);
    }

    /// Records for a district, matched through `fold`.
    pub fn get(&self, district: &str) -> Option<&[PharmacyRecord]> {
        self.districts.get(&fold(district)).map(Vec::as_slice)
    }

    /// Selectable folded district keys in first-seen order. The sentinel
    /// group for district-less records is not listed.
    pub fn districts(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(|key| *key != UNSPECIFIED_DISTRICT)
    }

    /// Per-district record counts, sentinel group included.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        self.districts
            .iter()
            .map(|(key, group)| (key.clone(), group.len()))
            .collect()
    }
}

/// Group records by city. Stable: input order is preserved within each group
/// and city groups appear in first-seen order. Empty input yields an empty
/// index.
pub fn build_city_index(records: &[PharmacyRecord]) -> CityIndex {
    let mut index = CityIndex::default();
    for record in records {
        index.push(fold(&record.city), record.clone());
    }
    index
}

/// Group records by city, then district. Records with a blank district land
/// in the [`UNSPECIFIED_DISTRICT`] group of their city.
pub fn build_city_district_index(records: &[PharmacyRecord]) -> CityDistrictIndex {
    let mut index = CityDistrictIndex::default();
    for record in records {
        let city_key = fold(&record.city);
        let district_key = match fold(&record.district) {
            key if key.is_empty() => UNSPECIFIED_DISTRICT.to_string(),
            key => key,
        };

        if !index.cities.contains_key(&city_key) {
            index.order.push(city_key.clone());
        }
        index
            .cities
            .entry(city_key)
            .or_default()
            .push(district_key, record.clone());
    }
    index
}

/// Identifier-unique index. The first record with a given id wins; later
/// duplicates are dropped silently.
pub fn build_id_index(records: &[PharmacyRecord]) -> HashMap<String, PharmacyRecord> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.entry(record.id.clone()).or_insert_with(|| record.clone());
    }
    index
}
