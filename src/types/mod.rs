// src/types/mod.rs

pub mod conversions;
pub mod snapshot;

pub use snapshot::{PriceField, PriceSnapshot, ReferenceEntry};
