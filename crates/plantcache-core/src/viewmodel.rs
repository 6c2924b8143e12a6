//! Presentation state for the plant list.
//!
//! `PlantListViewModel` owns what a list screen needs: the current
//! filtered, sorted roster, a loading flag, and a one-shot error
//! message, all delivered over typed watch channels. Changing the
//! grow-zone filter switches the underlying repository subscription;
//! refreshes run as spawned tasks bracketed by the loading flag, with
//! failures converted to a displayable message at this boundary.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::api::PlantService;
use crate::models::{GrowZone, Plant};
use crate::repository::PlantRepository;

pub struct PlantListViewModel<S> {
    repository: Arc<PlantRepository<S>>,
    plants_tx: watch::Sender<Vec<Plant>>,
    spinner_tx: watch::Sender<bool>,
    snack_bar_tx: watch::Sender<Option<String>>,
    grow_zone_tx: watch::Sender<Option<GrowZone>>,
    driver: JoinHandle<()>,
}

impl<S: PlantService + 'static> PlantListViewModel<S> {
    /// Create the view model, start watching the roster, and kick off
    /// an initial unfiltered refresh.
    pub fn new(repository: Arc<PlantRepository<S>>) -> Self {
        let (plants_tx, _) = watch::channel(Vec::new());
        let (spinner_tx, _) = watch::channel(false);
        let (snack_bar_tx, _) = watch::channel(None);
        let (grow_zone_tx, _) = watch::channel(None);

        let driver = tokio::spawn(drive_plants(
            Arc::clone(&repository),
            grow_zone_tx.subscribe(),
            plants_tx.clone(),
        ));

        let view_model = Self {
            repository,
            plants_tx,
            spinner_tx,
            snack_bar_tx,
            grow_zone_tx,
            driver,
        };
        view_model.refresh(None);
        view_model
    }

    /// Observable roster: the current filtered, sorted plant list.
    pub fn plants(&self) -> watch::Receiver<Vec<Plant>> {
        self.subscribe(&self.plants_tx)
    }

    /// Observable loading indicator.
    pub fn spinner(&self) -> watch::Receiver<bool> {
        self.subscribe(&self.spinner_tx)
    }

    /// Observable one-shot error message. Consumers acknowledge with
    /// [`on_snack_bar_shown`](Self::on_snack_bar_shown) after display.
    pub fn snack_bar(&self) -> watch::Receiver<Option<String>> {
        self.subscribe(&self.snack_bar_tx)
    }

    fn subscribe<T>(&self, tx: &watch::Sender<T>) -> watch::Receiver<T> {
        let mut rx = tx.subscribe();
        // Replay the current value to the new observer
        rx.mark_changed();
        rx
    }

    /// Filter the roster to one grow zone and refresh it.
    pub fn set_grow_zone(&self, num: i32) {
        let zone = GrowZone(num);
        self.grow_zone_tx.send_replace(Some(zone));
        self.refresh(Some(zone));
    }

    /// Clear the grow-zone filter and refresh the full roster.
    pub fn clear_grow_zone(&self) {
        self.grow_zone_tx.send_replace(None);
        self.refresh(None);
    }

    pub fn is_filtered(&self) -> bool {
        self.grow_zone_tx.borrow().is_some()
    }

    /// Acknowledge the displayed message, resetting the channel.
    pub fn on_snack_bar_shown(&self) {
        self.snack_bar_tx.send_replace(None);
    }

    fn refresh(&self, zone: Option<GrowZone>) {
        let repository = Arc::clone(&self.repository);
        self.launch_data_load(async move {
            match zone {
                Some(zone) => repository.try_update_plants_for_grow_zone_cache(zone).await,
                None => repository.try_update_recent_plants_cache().await,
            }
        });
    }

    /// Run `load` with the spinner held, converting any failure to a
    /// one-shot display message. The spinner is raised before the task
    /// starts so observers never miss the loading edge.
    fn launch_data_load<F>(&self, load: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let spinner = self.spinner_tx.clone();
        let snack_bar = self.snack_bar_tx.clone();
        spinner.send_replace(true);
        tokio::spawn(async move {
            if let Err(error) = load.await {
                debug!(error = %error, "Data load failed");
                snack_bar.send_replace(Some(error.to_string()));
            }
            spinner.send_replace(false);
        });
    }
}

impl<S> Drop for PlantListViewModel<S> {
    fn drop(&mut self) {
        self.driver.abort();
    }
}

/// Watch the store through the repository, switching the subscription
/// whenever the grow-zone filter changes.
async fn drive_plants<S: PlantService + 'static>(
    repository: Arc<PlantRepository<S>>,
    mut grow_zone_rx: watch::Receiver<Option<GrowZone>>,
    plants_tx: watch::Sender<Vec<Plant>>,
) {
    loop {
        let zone = *grow_zone_rx.borrow_and_update();
        let mut query = match zone {
            Some(zone) => repository.plants_with_grow_zone(zone),
            None => repository.plants(),
        };

        loop {
            tokio::select! {
                changed = grow_zone_rx.changed() => {
                    match changed {
                        // Filter changed: drop this query, subscribe anew
                        Ok(()) => break,
                        // View model dropped
                        Err(_) => return,
                    }
                }
                snapshot = query.next() => {
                    match snapshot {
                        Some(plants) => {
                            plants_tx.send_replace(plants);
                        }
                        // Store dropped
                        None => return,
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Notify;

    use crate::cache::PlantStore;

    fn plant(id: &str, name: &str, zone: i32) -> Plant {
        Plant {
            plant_id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            grow_zone_number: zone,
            watering_interval: 7,
            image_url: String::new(),
        }
    }

    struct FakeService {
        plants: Vec<Plant>,
        fail_fetch: bool,
        gate: Option<Arc<Notify>>,
    }

    impl FakeService {
        fn new(plants: Vec<Plant>) -> Self {
            Self {
                plants,
                fail_fetch: false,
                gate: None,
            }
        }
    }

    #[async_trait]
    impl PlantService for FakeService {
        async fn all_plants(&self) -> Result<Vec<Plant>> {
            if let Some(ref gate) = self.gate {
                gate.notified().await;
            }
            if self.fail_fetch {
                anyhow::bail!("catalog unreachable");
            }
            Ok(self.plants.clone())
        }

        async fn plants_by_grow_zone(&self, zone: GrowZone) -> Result<Vec<Plant>> {
            let plants = self.all_plants().await?;
            Ok(plants
                .into_iter()
                .filter(|p| p.grow_zone_number == zone.number())
                .collect())
        }

        async fn plant_sort_order(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn build(service: FakeService, dir: &tempfile::TempDir) -> PlantListViewModel<FakeService> {
        let store = Arc::new(PlantStore::open(dir.path().to_path_buf()).unwrap());
        let repository = Arc::new(PlantRepository::new(Arc::new(service), store));
        PlantListViewModel::new(repository)
    }

    /// Await a channel value matching `predicate`, with a timeout so a
    /// broken view model fails the test instead of hanging it.
    async fn wait_for<T: Clone>(
        rx: &mut watch::Receiver<T>,
        predicate: impl Fn(&T) -> bool,
    ) -> T {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                if predicate(&rx.borrow()) {
                    return rx.borrow().clone();
                }
                rx.changed().await.expect("channel closed");
            }
        })
        .await
        .expect("timed out waiting for channel value")
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_a_one_shot_message() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = FakeService::new(Vec::new());
        service.fail_fetch = true;
        let view_model = build(service, &dir);

        let mut snack_bar = view_model.snack_bar();
        let message = wait_for(&mut snack_bar, |m| m.is_some()).await;
        assert_eq!(message.unwrap(), "catalog unreachable");

        view_model.on_snack_bar_shown();
        wait_for(&mut snack_bar, |m| m.is_none()).await;

        // The spinner clears even though the load failed
        let mut spinner = view_model.spinner();
        wait_for(&mut spinner, |loading| !loading).await;
    }

    #[tokio::test]
    async fn test_spinner_tracks_the_data_load() {
        let dir = tempfile::tempdir().unwrap();
        let gate = Arc::new(Notify::new());
        let mut service = FakeService::new(vec![plant("a", "Fern", 3)]);
        service.gate = Some(Arc::clone(&gate));
        let view_model = build(service, &dir);

        let mut spinner = view_model.spinner();
        wait_for(&mut spinner, |loading| *loading).await;

        gate.notify_one();
        wait_for(&mut spinner, |loading| !loading).await;
    }

    #[tokio::test]
    async fn test_roster_arrives_after_the_initial_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(vec![plant("a", "Fern", 3), plant("b", "Cactus", 9)]);
        let view_model = build(service, &dir);

        let mut plants = view_model.plants();
        let roster = wait_for(&mut plants, |p| p.len() == 2).await;
        assert_eq!(roster[0].name, "Cactus");
        assert!(!view_model.is_filtered());
    }

    #[tokio::test]
    async fn test_setting_a_grow_zone_filters_the_roster() {
        let dir = tempfile::tempdir().unwrap();
        let service = FakeService::new(vec![plant("a", "Fern", 3), plant("b", "Cactus", 9)]);
        let view_model = build(service, &dir);

        let mut plants = view_model.plants();
        wait_for(&mut plants, |p| p.len() == 2).await;

        view_model.set_grow_zone(9);
        assert!(view_model.is_filtered());
        let roster = wait_for(&mut plants, |p| p.len() == 1).await;
        assert_eq!(roster[0].plant_id, "b");

        view_model.clear_grow_zone();
        assert!(!view_model.is_filtered());
        wait_for(&mut plants, |p| p.len() == 2).await;
    }
}
