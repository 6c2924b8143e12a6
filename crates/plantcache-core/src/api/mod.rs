//! REST client module for the plant catalog service.
//!
//! This module provides the `ApiClient` for fetching plant lists and
//! the curated sort order from the catalog's published JSON documents,
//! and the `PlantService` trait that keeps the repository independent
//! of the concrete transport.
//!
//! The catalog is unauthenticated static JSON; there is no token
//! handling here.

pub mod client;
pub mod error;

pub use client::{ApiClient, PlantService};
pub use error::ApiError;
