//! Compute-once memoization for asynchronous fetches.

use std::future::Future;

use anyhow::Result;
use futures::future::BoxFuture;
use tokio::sync::OnceCell;
use tracing::warn;

type FetchFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;
type FallbackFn<T> = Box<dyn Fn() -> T + Send + Sync>;

/// An async value that is fetched at most once.
///
/// The first caller of [`get_or_fetch`](Self::get_or_fetch) runs the
/// configured fetch; concurrent callers suspend and share the single
/// in-flight fetch rather than starting their own. Once resolved, the
/// value is immutable for the lifetime of the cell.
///
/// A failed fetch resolves the cell to the configured fallback value
/// instead. The failure is logged but never retried: later callers get
/// the fallback without touching the fetch again.
pub struct FetchOnce<T> {
    cell: OnceCell<T>,
    fetch: FetchFn<T>,
    fallback: FallbackFn<T>,
}

impl<T> FetchOnce<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a cell around `fetch`, with `fallback` producing the
    /// value cached when the fetch fails.
    pub fn new<B, F, Fut>(fallback: B, fetch: F) -> Self
    where
        B: Fn() -> T + Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        Self {
            cell: OnceCell::new(),
            fetch: Box::new(move || Box::pin(fetch())),
            fallback: Box::new(fallback),
        }
    }

    /// Return the memoized value, running the fetch if this is the
    /// first call. Suspends without blocking while a fetch started by
    /// another caller is in flight.
    pub async fn get_or_fetch(&self) -> T {
        self.cell
            .get_or_init(|| async {
                match (self.fetch)().await {
                    Ok(value) => value,
                    Err(error) => {
                        warn!(error = %error, "Fetch failed; caching the fallback value");
                        (self.fallback)()
                    }
                }
            })
            .await
            .clone()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_callers_share_a_single_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let cache = Arc::new(FetchOnce::new(Vec::new, move || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // Hold the fetch open long enough for every caller to pile up
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(vec!["orchid".to_string(), "fern".to_string()])
            }
        }));

        let mut handles = Vec::new();
        for _ in 0..10 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get_or_fetch().await }));
        }

        for handle in handles {
            let value = handle.await.unwrap();
            assert_eq!(value, vec!["orchid".to_string(), "fern".to_string()]);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_caches_the_fallback_without_retrying() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let cache = FetchOnce::new(
            || vec!["fallback".to_string()],
            move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(anyhow::anyhow!("catalog unreachable"))
                }
            },
        );

        assert_eq!(cache.get_or_fetch().await, vec!["fallback".to_string()]);
        assert_eq!(cache.get_or_fetch().await, vec!["fallback".to_string()]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_value_is_immutable_once_resolved() {
        let cache = FetchOnce::new(Vec::new, || async { Ok(vec![1, 2, 3]) });

        assert_eq!(cache.get_or_fetch().await, vec![1, 2, 3]);
        assert_eq!(cache.get_or_fetch().await, vec![1, 2, 3]);
    }
}
