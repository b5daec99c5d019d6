//! Domain types and text rules.
//!
//! Everything here is pure: no I/O, no clocks, no shared state. The
//! directory and cache layers build on these types.

mod normalize;
mod pharmacy;
mod phone;

pub use normalize::{fold, normalize, same_place};
pub use pharmacy::{PharmacyRecord, Place};
pub use phone::normalize_phone;
