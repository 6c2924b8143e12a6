//! Core library for plantcache.
//!
//! The data layer for the plant catalog browser: a remote catalog
//! client, a local JSON-backed store with live queries, the memoized
//! single-flight fetch for the curated sort order, the repository that
//! coordinates the three, and the channel-based view model the
//! front-end subscribes to.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod repository;
pub mod viewmodel;

pub use api::{ApiClient, ApiError, PlantService};
pub use cache::{FetchOnce, PlantStore, PlantsQuery};
pub use config::Config;
pub use models::{GrowZone, Plant};
pub use repository::{PlantRepository, SortedPlantsQuery};
pub use viewmodel::PlantListViewModel;
