/*
 * cache.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Per-key lazily created shared values.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};

/// Values created once per key and shared afterwards.
///
/// Concurrent callers asking for the same missing key wait on a single
/// creation; callers for different keys do not block each other. A failed
/// creation leaves the key empty so the next caller retries.
#[derive(Debug)]
pub struct SessionFactoryCache<K, V: ?Sized> {
    cells: Mutex<HashMap<K, Arc<OnceCell<Arc<V>>>>>,
}

impl<K, V: ?Sized> Default for SessionFactoryCache<K, V> {
    fn default() -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone, V: ?Sized> SessionFactoryCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The value for `key`, created with `create` when missing.
    pub async fn get_or_try_create<E, F, Fut>(&self, key: K, create: F) -> Result<Arc<V>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<V>, E>>,
    {
        let cell = {
            let mut cells = self.cells.lock().await;
            Arc::clone(cells.entry(key).or_default())
        };
        cell.get_or_try_init(create).await.map(Arc::clone)
    }

    pub async fn contains(&self, key: &K) -> bool {
        let cells = self.cells.lock().await;
        cells.get(key).is_some_and(|cell| cell.initialized())
    }
}
