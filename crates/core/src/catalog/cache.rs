use std::future::Future;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// A value fetched at most once per session.
///
/// The first successful fetch is kept until the cache is dropped. Failures
/// are not cached: the next caller runs the fetch again. Concurrent callers
/// wait on a single in-flight fetch.
#[derive(Debug)]
pub struct FetchCache<T> {
    name: &'static str,
    cell: OnceCell<Arc<T>>,
}

impl<T> FetchCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cell: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Return the cached value, running `fetch` if nothing is cached yet.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let value = self
            .cell
            .get_or_try_init(|| async move {
                tracing::debug!(cache = self.name, "Fetching catalog data");
                fetch().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(value))
    }

    /// The cached value, if a fetch has succeeded.
    pub fn get(&self) -> Option<Arc<T>> {
        self.cell.get().cloned()
    }

    pub fn is_cached(&self) -> bool {
        self.cell.initialized()
    }
}
