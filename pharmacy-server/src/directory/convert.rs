//! Conversion from directory DTOs to domain records.

use chrono::{DateTime, Utc};

use crate::domain::{PharmacyRecord, normalize_phone};

use super::types::RawPharmacy;

/// Convert a wire pharmacy into the immutable domain record.
///
/// Phone numbers are brought to international format during the mapping.
/// Duty-window bounds are kept only when they parse as RFC 3339 timestamps;
/// the upstream sometimes sends blanks or free text there.
pub fn to_record(raw: &RawPharmacy) -> PharmacyRecord {
    PharmacyRecord {
        id: raw.pharmacy_id.clone(),
        name: raw.pharmacy_name.clone(),
        address: raw.address.clone(),
        phone: normalize_phone(&raw.phone),
        city: raw.city.clone(),
        district: raw.district.clone(),
        directions: raw.directions.clone(),
        duty_start: parse_instant(raw.pharmacy_duty_start.as_deref()),
        duty_end: parse_instant(raw.pharmacy_duty_end.as_deref()),
        latitude: raw.latitude,
        longitude: raw.longitude,
    }
}

/// Convert a full payload, preserving order.
pub fn to_records(raw: &[RawPharmacy]) -> Vec<PharmacyRecord> {
    raw.iter().map(to_record).collect()
}

fn parse_instant(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
