//! Data models for plant catalog entities.
//!
//! This module contains the data structures used to represent
//! catalog data:
//!
//! - `Plant`: a catalog entry with its grow zone and watering cadence
//! - `GrowZone`: the optional roster filter key

pub mod plant;

pub use plant::{GrowZone, Plant};
