use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

type SharedResult<V, E> = Shared<BoxFuture<'static, Result<V, E>>>;

/// Deduplicates concurrent calls with the same key: the first caller runs
/// the work, later callers with an identical key await the same in-flight
/// future and share its result.
pub struct SingleFlight<K, V, E> {
    inflight: Mutex<HashMap<K, SharedResult<V, E>>>,
}

impl<K, V, E> SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run<F>(&self, key: K, work: F) -> Result<V, E>
    where
        F: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut inflight = self.inflight.lock().unwrap();
            match inflight.get(&key) {
                Some(existing) => existing.clone(),
                None => {
                    let shared = work.boxed().shared();
                    inflight.insert(key.clone(), shared.clone());
                    shared
                }
            }
        };

        let result = shared.await;
        self.inflight.lock().unwrap().remove(&key);
        result
    }
}

impl<K, V, E> Default for SingleFlight<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
