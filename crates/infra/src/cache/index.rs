use std::collections::HashMap;
use std::hash::Hash;
use std::sync::RwLock;

/// A secondary index over a cached collection, built from a key extractor.
/// Entries for which the extractor returns `None` are omitted. Updates
/// replace the whole map atomically.
pub struct Index<K, T> {
    values: RwLock<HashMap<K, T>>,
    extractor: Box<dyn Fn(&T) -> Option<K> + Send + Sync>,
}

impl<K, T> Index<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new(extractor: impl Fn(&T) -> Option<K> + Send + Sync + 'static) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            extractor: Box::new(extractor),
        }
    }

    pub fn get(&self, key: &K) -> Option<T> {
        self.values.read().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<K> {
        self.values.read().unwrap().keys().cloned().collect()
    }

    pub fn update(&self, values: &[T]) {
        let mut m = HashMap::new();
        for v in values {
            if let Some(k) = (self.extractor)(v) {
                m.insert(k, v.clone());
            }
        }

        *self.values.write().unwrap() = m;
    }
}
