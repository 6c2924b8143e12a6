//! Local plant storage with live queries.
//!
//! `PlantStore` persists the plant roster as a JSON document under the
//! platform cache directory and fronts it with an in-memory snapshot
//! published through a watch channel. A live query yields the current
//! name-ordered snapshot immediately, then a fresh snapshot after
//! every store mutation. Dropping a query unsubscribes it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::debug;

use crate::models::{GrowZone, Plant};

/// Cache file name for the plant roster.
const PLANTS_FILE: &str = "plants.json";

/// On-disk envelope around cached data, stamped with the refresh time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

/// In-memory state published to live queries. `plants` is always
/// ordered by name.
#[derive(Debug, Clone, Default)]
struct Roster {
    plants: Vec<Plant>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Format an age in minutes for display, e.g. "5m ago".
/// Negative ages (clock skew) read as "just now".
fn format_age(minutes: i64) -> String {
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            // Round up: 1d 12h+ becomes 2d
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

fn sort_by_name(plants: &mut [Plant]) {
    plants.sort_by(|a, b| a.name.cmp(&b.name));
}

pub struct PlantStore {
    path: PathBuf,
    state: watch::Sender<Roster>,
}

impl PlantStore {
    /// Open the store rooted at `cache_dir`, seeding the in-memory
    /// snapshot from any existing cache file.
    pub fn open(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)?;
        let path = cache_dir.join(PLANTS_FILE);

        let mut roster = Roster::default();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read cache file: {}", path.display()))?;
            let cached: CachedData<Vec<Plant>> = serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse cache file: {}", path.display()))?;
            roster.plants = cached.data;
            roster.refreshed_at = Some(cached.cached_at);
            sort_by_name(&mut roster.plants);
            debug!(count = roster.plants.len(), "Loaded plant roster from cache");
        }

        let (state, _) = watch::channel(roster);
        Ok(Self { path, state })
    }

    /// Live query over the full roster.
    pub fn plants(&self) -> PlantsQuery {
        self.query(None)
    }

    /// Live query over the plants in one grow zone.
    pub fn plants_with_grow_zone(&self, zone: GrowZone) -> PlantsQuery {
        self.query(Some(zone))
    }

    fn query(&self, zone: Option<GrowZone>) -> PlantsQuery {
        let mut rx = self.state.subscribe();
        // A fresh registration replays the current snapshot first
        rx.mark_changed();
        PlantsQuery { rx, zone }
    }

    /// The current full roster, ordered by name.
    pub fn snapshot(&self) -> Vec<Plant> {
        self.state.borrow().plants.clone()
    }

    /// When the roster was last written, if ever.
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.borrow().refreshed_at
    }

    /// Human-readable age of the cached roster, e.g. "5m ago".
    pub fn age_display(&self) -> String {
        match self.last_refreshed() {
            Some(at) => format_age((Utc::now() - at).num_minutes()),
            None => "never".to_string(),
        }
    }

    /// Insert or replace plants by id, persist the roster, and notify
    /// every live query.
    pub fn upsert_all(&self, plants: Vec<Plant>) -> Result<()> {
        let refreshed_at = Utc::now();
        self.state.send_modify(|roster| {
            for plant in plants {
                match roster.plants.iter_mut().find(|p| p.plant_id == plant.plant_id) {
                    Some(existing) => *existing = plant,
                    None => roster.plants.push(plant),
                }
            }
            sort_by_name(&mut roster.plants);
            roster.refreshed_at = Some(refreshed_at);
        });

        let snapshot = self.state.borrow().plants.clone();
        debug!(count = snapshot.len(), "Persisting plant roster");
        self.persist(&snapshot, refreshed_at)
    }

    fn persist(&self, plants: &[Plant], cached_at: DateTime<Utc>) -> Result<()> {
        let envelope = CachedData { data: plants, cached_at };
        let contents = serde_json::to_string_pretty(&envelope)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))?;
        Ok(())
    }
}

/// A live query registration over the store.
///
/// The first [`next`](Self::next) yields the current snapshot; later
/// calls suspend until the store changes. Dropping the query cancels
/// the registration.
pub struct PlantsQuery {
    rx: watch::Receiver<Roster>,
    zone: Option<GrowZone>,
}

impl PlantsQuery {
    /// Wait for the next snapshot. Returns `None` once the store has
    /// been dropped.
    pub async fn next(&mut self) -> Option<Vec<Plant>> {
        if self.rx.changed().await.is_err() {
            return None;
        }
        let zone = self.zone;
        let roster = self.rx.borrow_and_update();
        let plants = match zone {
            Some(zone) => roster
                .plants
                .iter()
                .filter(|plant| plant.grow_zone() == zone)
                .cloned()
                .collect(),
            None => roster.plants.clone(),
        };
        Some(plants)
    }
}

// ============================================================================
// Tests
// ============================================================================
