//! Duty-pharmacy directory cache and lookup.
//!
//! The data layer of a site that shows which pharmacies are on emergency
//! duty: folds Turkish place-name spellings so lookups match regardless of
//! case or diacritics, caches directory responses until the next
//! duty-rotation boundary, and indexes flat pharmacy lists by city,
//! district and identifier.

pub mod cache;
pub mod directory;
pub mod domain;
pub mod index;
pub mod resolver;
