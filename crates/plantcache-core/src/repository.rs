//! Plant data coordination between the remote catalog and the local
//! store.
//!
//! The repository memoizes the curated sort order (fetched at most
//! once per instance), layers that order over the store's live
//! queries, and refreshes the local roster from the remote catalog on
//! demand.

use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::api::PlantService;
use crate::cache::{FetchOnce, PlantStore, PlantsQuery};
use crate::models::{GrowZone, Plant};

/// Order plants by their position in the precedence list, then by
/// name. Plants whose id is absent from the list sort after every
/// plant present in it.
pub fn apply_custom_sort(mut plants: Vec<Plant>, sort_order: &[String]) -> Vec<Plant> {
    plants.sort_by_key(|plant| {
        let position = sort_order
            .iter()
            .position(|id| *id == plant.plant_id)
            .unwrap_or(usize::MAX);
        (position, plant.name.clone())
    });
    plants
}

/// [`apply_custom_sort`] off the async executor: the sort runs on the
/// blocking pool and the caller suspends until it finishes, so large
/// rosters never stall other tasks.
pub async fn apply_custom_sort_off_thread(
    plants: Vec<Plant>,
    sort_order: Vec<String>,
) -> Vec<Plant> {
    tokio::task::spawn_blocking(move || apply_custom_sort(plants, &sort_order))
        .await
        .expect("plant sort task panicked")
}

/// Coordinates the remote plant catalog with the local store.
///
/// One instance owns the memoized sort order; construct it at the
/// composition root and share it behind an `Arc`.
pub struct PlantRepository<S> {
    service: Arc<S>,
    store: Arc<PlantStore>,
    sort_order: Arc<FetchOnce<Vec<String>>>,
}

impl<S: PlantService + 'static> PlantRepository<S> {
    pub fn new(service: Arc<S>, store: Arc<PlantStore>) -> Self {
        let fetch_service = Arc::clone(&service);
        // A failed sort-order fetch falls back to the empty precedence
        // list; plants then order by name alone
        let sort_order = Arc::new(FetchOnce::new(Vec::new, move || {
            let service = Arc::clone(&fetch_service);
            async move { service.plant_sort_order().await }
        }));

        Self {
            service,
            store,
            sort_order,
        }
    }

    /// Live query of the full roster with the curated sort applied.
    pub fn plants(&self) -> SortedPlantsQuery {
        SortedPlantsQuery {
            query: self.store.plants(),
            sort_order: Arc::clone(&self.sort_order),
        }
    }

    /// Live query of one grow zone's plants with the curated sort
    /// applied.
    pub fn plants_with_grow_zone(&self, zone: GrowZone) -> SortedPlantsQuery {
        SortedPlantsQuery {
            query: self.store.plants_with_grow_zone(zone),
            sort_order: Arc::clone(&self.sort_order),
        }
    }

    /// Staleness policy for the local roster. Always refreshes today;
    /// the store's `last_refreshed` timestamp is the input for a TTL
    /// policy here.
    fn should_update_plants_cache(&self) -> bool {
        true
    }

    /// Refresh the full roster through the staleness gate.
    pub async fn try_update_recent_plants_cache(&self) -> Result<()> {
        if self.should_update_plants_cache() {
            self.fetch_recent_plants().await?;
        }
        Ok(())
    }

    /// Refresh one grow zone's plants through the staleness gate.
    pub async fn try_update_plants_for_grow_zone_cache(&self, zone: GrowZone) -> Result<()> {
        if self.should_update_plants_cache() {
            self.fetch_plants_for_grow_zone(zone).await?;
        }
        Ok(())
    }

    async fn fetch_recent_plants(&self) -> Result<()> {
        let plants = self.service.all_plants().await?;
        debug!(count = plants.len(), "Refreshed plant roster");
        self.store.upsert_all(plants)
    }

    async fn fetch_plants_for_grow_zone(&self, zone: GrowZone) -> Result<()> {
        let plants = self.service.plants_by_grow_zone(zone).await?;
        debug!(count = plants.len(), zone = zone.number(), "Refreshed grow zone roster");
        self.store.upsert_all(plants)
    }
}

/// A live store query whose snapshots have the curated sort applied.
pub struct SortedPlantsQuery {
    query: PlantsQuery,
    sort_order: Arc<FetchOnce<Vec<String>>>,
}

impl SortedPlantsQuery {
    /// Wait for the next sorted snapshot. Returns `None` once the
    /// store has been dropped.
    pub async fn next(&mut self) -> Option<Vec<Plant>> {
        let plants = self.query.next().await?;
        let sort_order = self.sort_order.get_or_fetch().await;
        Some(apply_custom_sort_off_thread(plants, sort_order).await)
    }
}

// ============================================================================
// Tests
// ============================================================================
