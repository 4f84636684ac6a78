//! A periodic whole-set reloader for slowly-changing collections, with
//! optional secondary indexes. Used to memoize directory data such as user
//! profiles and the calendar list.

mod index;

pub use index::Index;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

#[async_trait::async_trait]
pub trait Loader<T>: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<T>>;
}

/// Adapter so plain async closures can act as a [`Loader`].
pub struct LoaderFn<F>(pub F);

#[async_trait::async_trait]
impl<T, F, Fut> Loader<T> for LoaderFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Vec<T>>> + Send,
{
    async fn load(&self) -> anyhow::Result<Vec<T>> {
        (self.0)().await
    }
}

trait AnyIndex<T>: Send + Sync {
    fn rebuild(&self, values: &[T]);
}

impl<K, T> AnyIndex<T> for Index<K, T>
where
    K: Eq + std::hash::Hash + Clone + Send + Sync,
    T: Clone + Send + Sync,
{
    fn rebuild(&self, values: &[T]) {
        self.update(values);
    }
}

struct Snapshot<T> {
    values: Vec<T>,
    last_fetch: Option<Instant>,
}

pub struct Cache<T: Clone + Send + Sync + 'static> {
    name: String,
    interval: Duration,
    loader: Arc<dyn Loader<T>>,

    snapshot: Arc<RwLock<Snapshot<T>>>,
    indexes: Arc<Mutex<Vec<Arc<dyn AnyIndex<T>>>>>,

    trigger: mpsc::Sender<()>,
    trigger_rx: Mutex<Option<mpsc::Receiver<()>>>,
    started: AtomicBool,
}

impl<T: Clone + Send + Sync + 'static> Cache<T> {
    pub fn new(name: impl Into<String>, interval: Duration, loader: impl Loader<T> + 'static) -> Self {
        let (trigger, trigger_rx) = mpsc::channel(1);

        Self {
            name: name.into(),
            interval,
            loader: Arc::new(loader),
            snapshot: Arc::new(RwLock::new(Snapshot {
                values: Vec::new(),
                last_fetch: None,
            })),
            indexes: Arc::new(Mutex::new(Vec::new())),
            trigger,
            trigger_rx: Mutex::new(Some(trigger_rx)),
            started: AtomicBool::new(false),
        }
    }

    /// A copy of the current snapshot and whether it is older than one
    /// reload interval.
    pub fn get(&self) -> (Vec<T>, bool) {
        let snapshot = self.snapshot.read().unwrap();
        let is_stale = match snapshot.last_fetch {
            Some(at) => at.elapsed() > self.interval,
            None => true,
        };

        (snapshot.values.clone(), is_stale)
    }

    /// Asks the background loop for an immediate reload. Blocks until the
    /// loop accepts the request, so this is only meant for rare admin paths.
    pub async fn trigger_sync(&self) {
        let _ = self.trigger.send(()).await;
    }

    /// Registers a secondary index and eagerly populates it with the current
    /// snapshot. Returns the index for lookups.
    pub fn create_index<K>(&self, extractor: impl Fn(&T) -> Option<K> + Send + Sync + 'static) -> Arc<Index<K, T>>
    where
        K: Eq + std::hash::Hash + Clone + Send + Sync + 'static,
    {
        let index = Arc::new(Index::new(extractor));
        self.indexes.lock().unwrap().push(index.clone());

        let (values, _) = self.get();
        index.update(&values);

        index
    }

    /// Starts the background reload loop. Idempotent.
    pub fn start(&self, shutdown: CancellationToken) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut trigger_rx = self
            .trigger_rx
            .lock()
            .unwrap()
            .take()
            .expect("receiver present on first start");

        let name = self.name.clone();
        let interval = self.interval;
        let loader = self.loader.clone();
        let snapshot = self.snapshot.clone();
        let indexes = self.indexes.clone();

        tokio::spawn(async move {
            loop {
                match tokio::time::timeout(interval, loader.load()).await {
                    Ok(Ok(values)) => {
                        debug!(cache = %name, count = values.len(), "updated cache values");

                        for index in indexes.lock().unwrap().iter() {
                            index.rebuild(&values);
                        }

                        let mut snap = snapshot.write().unwrap();
                        snap.values = values;
                        snap.last_fetch = Some(Instant::now());
                    }
                    Ok(Err(err)) => {
                        error!(cache = %name, error = %err, "failed to update cache values");
                    }
                    Err(_) => {
                        error!(cache = %name, "cache loader timed out");
                    }
                }

                tokio::select! {
                    _ = shutdown.cancelled() => return,
                    _ = tokio::time::sleep(interval) => {}
                    _ = trigger_rx.recv() => {}
                }
            }
        });
    }
}
