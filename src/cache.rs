//! Process-wide read-through cache for listing endpoints.

use std::{future::Future, sync::Arc, time::Duration};

use tokio::{sync::RwLock, time::Instant};

use crate::error::AppResult;

struct Entry<T> {
    loaded_at: Instant,
    items: Arc<Vec<T>>,
}

struct Slot<T> {
    entry: Option<Entry<T>>,
    /// Bumped by every invalidation so a load that raced with a write
    /// never repopulates the slot with what it read before the write.
    generation: u64,
}

#[derive(Clone)]
pub struct ListingCache<T> {
    slot: Arc<RwLock<Slot<T>>>,
    ttl: Duration,
    enabled: bool,
}

impl<T> ListingCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slot: Arc::new(RwLock::new(Slot {
                entry: None,
                generation: 0,
            })),
            ttl,
            enabled: true,
        }
    }

    /// A cache that always loads from the source.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Duration::ZERO)
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn get_or_load<F, Fut>(&self, load: F) -> AppResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Vec<T>>>,
    {
        if !self.enabled {
            return Ok(Arc::new(load().await?));
        }

        let generation = {
            let slot = self.slot.read().await;
            if let Some(entry) = slot.entry.as_ref() {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(Arc::clone(&entry.items));
                }
            }
            slot.generation
        };

        let items = Arc::new(load().await?);

        let mut slot = self.slot.write().await;
        if slot.generation == generation {
            slot.entry = Some(Entry {
                loaded_at: Instant::now(),
                items: Arc::clone(&items),
            });
            tracing::debug!(count = items.len(), "listing cache filled");
        }
        Ok(items)
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
    }
}
