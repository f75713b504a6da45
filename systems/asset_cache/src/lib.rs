#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Single-flight cache for asynchronously loaded asset templates.
//!
//! The first request for a key starts exactly one load; every request that
//! arrives while the load is in flight awaits the same shared future. A
//! successful load becomes the template all later requests clone from. A
//! failed or aborted load clears its own entry, and only its own, so the next
//! request retries.

use std::{
    collections::HashMap,
    fmt,
    future::Future,
    hash::Hash,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures::{
    future::{BoxFuture, Shared},
    FutureExt,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

/// Load progress for one key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LoadState {
    /// No load has been requested, or the last one failed.
    Unrequested,
    /// A load is in flight.
    Pending,
    /// The template is available.
    Resolved,
}

/// Failure observed by every requester of a load.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssetLoadError {
    /// The loader reported an error.
    #[error("loading '{key}' failed: {message}")]
    Loader {
        /// Key whose load failed.
        key: String,
        /// Rendered loader error.
        message: String,
    },
    /// The load task panicked or its runtime shut down.
    #[error("loading '{key}' was aborted")]
    Aborted {
        /// Key whose load was aborted.
        key: String,
    },
}

type SharedLoad<T> = Shared<BoxFuture<'static, Result<Arc<T>, AssetLoadError>>>;

enum Entry<T> {
    Pending { load_id: u64, load: SharedLoad<T> },
    Resolved(Arc<T>),
}

type Entries<K, T> = Arc<Mutex<HashMap<K, Entry<T>>>>;

/// Removes the pending entry for `key` if it still belongs to `load_id`.
fn clear_pending<K: Eq + Hash, T>(entries: &mut HashMap<K, Entry<T>>, key: &K, load_id: u64) {
    if matches!(entries.get(key), Some(Entry::Pending { load_id: current, .. }) if *current == load_id)
    {
        let _ = entries.remove(key);
    }
}

/// Keyed single-flight template cache.
///
/// Cloning the cache yields another handle onto the same entries.
pub struct AssetLoadCache<K, T> {
    entries: Entries<K, T>,
    next_load: Arc<AtomicU64>,
}

impl<K, T> Clone for AssetLoadCache<K, T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            next_load: Arc::clone(&self.next_load),
        }
    }
}

impl<K, T> Default for AssetLoadCache<K, T> {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_load: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<K, T> fmt::Debug for AssetLoadCache<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetLoadCache")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl<K, T> AssetLoadCache<K, T>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    T: Send + Sync + 'static,
{
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports the load state of `key`.
    #[must_use]
    pub fn state(&self, key: &K) -> LoadState {
        match self.entries.lock().get(key) {
            None => LoadState::Unrequested,
            Some(Entry::Pending { .. }) => LoadState::Pending,
            Some(Entry::Resolved(_)) => LoadState::Resolved,
        }
    }

    /// Resolves `key` and hands the caller its own copy of the template.
    ///
    /// `loader` is invoked only when no load for `key` is pending or resolved.
    /// It runs under the cache lock and must only construct the future.
    pub async fn resolve<F, Fut, E>(&self, key: K, loader: F) -> Result<T, AssetLoadError>
    where
        T: Clone,
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let template = self.template(key, loader).await?;
        Ok(T::clone(&template))
    }

    /// Resolves `key` to the shared template without cloning it.
    pub async fn template<F, Fut, E>(&self, key: K, loader: F) -> Result<Arc<T>, AssetLoadError>
    where
        F: FnOnce(K) -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let load = {
            let mut entries = self.entries.lock();
            match entries.get(&key) {
                Some(Entry::Resolved(template)) => return Ok(Arc::clone(template)),
                Some(Entry::Pending { load, .. }) => load.clone(),
                None => {
                    let load_id = self.next_load.fetch_add(1, Ordering::Relaxed);
                    debug!(%key, load_id, "asset load started");
                    let load = self.start_load(key.clone(), load_id, loader(key.clone()));
                    let _ = entries.insert(
                        key,
                        Entry::Pending {
                            load_id,
                            load: load.clone(),
                        },
                    );
                    load
                }
            }
        };

        load.await
    }

    /// Spawns the load so it runs to completion even if every waiter goes away.
    ///
    /// The task settles its own entry, including when the loader panics.
    /// Must be called with the entry lock held so the task cannot publish its
    /// outcome before the pending entry exists.
    fn start_load<Fut, E>(&self, key: K, load_id: u64, load: Fut) -> SharedLoad<T>
    where
        Fut: Future<Output = Result<T, E>> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let task_key = key.clone();
        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(load).catch_unwind().await {
                Ok(Ok(template)) => Ok(Arc::new(template)),
                Ok(Err(error)) => Err(AssetLoadError::Loader {
                    key: task_key.to_string(),
                    message: error.to_string(),
                }),
                Err(_) => Err(AssetLoadError::Aborted {
                    key: task_key.to_string(),
                }),
            };
            let mut entries = entries.lock();
            match &outcome {
                Ok(template) => {
                    debug!(key = %task_key, load_id, "asset load finished");
                    let _ = entries.insert(task_key, Entry::Resolved(Arc::clone(template)));
                }
                Err(error) => {
                    warn!(key = %task_key, load_id, %error, "asset load failed");
                    clear_pending(&mut entries, &task_key, load_id);
                }
            }
            outcome
        });

        // A cancelled task never reaches its own cleanup.
        let entries = Arc::clone(&self.entries);
        async move {
            match task.await {
                Ok(outcome) => outcome,
                Err(_) => {
                    warn!(%key, load_id, "asset load task was cancelled");
                    clear_pending(&mut entries.lock(), &key, load_id);
                    Err(AssetLoadError::Aborted {
                        key: key.to_string(),
                    })
                }
            }
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn resolved_template_is_served_without_reloading() {
        let cache: AssetLoadCache<String, Vec<u8>> = AssetLoadCache::new();
        let calls = AtomicUsize::new(0);
        let loader = |_key: String| {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, String>(vec![1, 2, 3]) }
        };

        let first = cache.template("floor".to_owned(), loader).await;
        let second = cache.template("floor".to_owned(), loader).await;

        let (first, second) = (first.expect("loaded"), second.expect("cached"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.state(&"floor".to_owned()), LoadState::Resolved);
    }

    #[tokio::test]
    async fn keys_load_independently() {
        let cache: AssetLoadCache<&'static str, &'static str> = AssetLoadCache::new();
        let floor = cache.resolve("floor", |_| async { Ok::<_, String>("stone") }).await;
        let wall = cache.resolve("wall", |_| async { Ok::<_, String>("brick") }).await;

        assert_eq!(floor, Ok("stone"));
        assert_eq!(wall, Ok("brick"));
        assert_eq!(cache.state(&"door"), LoadState::Unrequested);
    }

    #[tokio::test]
    async fn failure_is_reported_with_key() {
        let cache: AssetLoadCache<&'static str, u32> = AssetLoadCache::new();
        let error = cache
            .resolve("slime", |_| async { Err::<u32, _>("missing file") })
            .await
            .expect_err("loader failed");

        assert_eq!(
            error,
            AssetLoadError::Loader {
                key: "slime".to_owned(),
                message: "missing file".to_owned(),
            }
        );
        assert_eq!(cache.state(&"slime"), LoadState::Unrequested);
    }
}
