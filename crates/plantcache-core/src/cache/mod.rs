//! Local caching module for offline data access.
//!
//! This module provides two pieces:
//!
//! - `PlantStore`: the plant roster, persisted as JSON and exposed to
//!   the rest of the app through live queries that emit a fresh
//!   snapshot after every change
//! - `FetchOnce`: the compute-once memoization cell used for the
//!   curated sort order

pub mod memo;
pub mod store;

pub use memo::FetchOnce;
pub use store::{CachedData, PlantStore, PlantsQuery};
