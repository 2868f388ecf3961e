//! In-memory item source shared by the unit tests.

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use crate::error::SourceError;
use crate::hn_client::ItemSource;
use crate::models::{Item, ItemId};

#[derive(Default)]
pub struct FakeSource {
    ranking: Mutex<Vec<ItemId>>,
    items: HashMap<ItemId, Item>,
    failing: HashSet<ItemId>,
    hanging: HashSet<ItemId>,
    max_latency: Option<Duration>,
    fail_listing: AtomicBool,
    held_listing: Mutex<Option<Arc<Notify>>>,
    pub list_calls: AtomicUsize,
    pub fetch_calls: AtomicUsize,
}

pub fn story(id: ItemId) -> Item {
    Item {
        id,
        item_type: "story".to_string(),
        title: format!("Story {}", id),
        url: format!("https://www.example.com/{}", id),
        ..Default::default()
    }
}

pub fn job(id: ItemId) -> Item {
    Item {
        id,
        item_type: "job".to_string(),
        title: format!("Job {}", id),
        url: format!("https://jobs.example.com/{}", id),
        ..Default::default()
    }
}

impl FakeSource {
    /// Ranks the given items in order.
    pub fn with_items(items: Vec<Item>) -> Self {
        let ranking = items.iter().map(|item| item.id).collect();
        Self {
            ranking: Mutex::new(ranking),
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            ..Default::default()
        }
    }

    pub fn ranking(self, ranking: Vec<ItemId>) -> Self {
        *self.ranking.lock().unwrap() = ranking;
        self
    }

    pub fn failing(mut self, ids: &[ItemId]) -> Self {
        self.failing.extend(ids);
        self
    }

    pub fn hanging(mut self, ids: &[ItemId]) -> Self {
        self.hanging.extend(ids);
        self
    }

    pub fn random_latency(mut self, max: Duration) -> Self {
        self.max_latency = Some(max);
        self
    }

    pub fn set_listing_fails(&self, fails: bool) {
        self.fail_listing.store(fails, Ordering::SeqCst);
    }

    /// Serves `item` under `id`, whatever id the item itself carries.
    pub fn serving(mut self, id: ItemId, item: Item) -> Self {
        self.items.insert(id, item);
        self
    }

    /// The next ranking call takes its snapshot, then waits until the returned
    /// handle is notified before answering.
    pub fn hold_next_listing(&self) -> Arc<Notify> {
        let release = Arc::new(Notify::new());
        *self.held_listing.lock().unwrap() = Some(Arc::clone(&release));
        release
    }

    pub fn set_ranking(&self, ranking: Vec<ItemId>) {
        *self.ranking.lock().unwrap() = ranking;
    }
}

#[async_trait]
impl ItemSource for FakeSource {
    async fn list_top_ids(&self) -> Result<Vec<ItemId>, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing.load(Ordering::SeqCst) {
            return Err(SourceError::Status {
                url: "fake://topstories.json".to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        let ranking = self.ranking.lock().unwrap().clone();
        let held = self.held_listing.lock().unwrap().take();
        if let Some(release) = held {
            release.notified().await;
        }
        Ok(ranking)
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Item, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.max_latency {
            let micros = rand::thread_rng().gen_range(0..=max.as_micros() as u64);
            if micros % 3 == 0 {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(Duration::from_micros(micros)).await;
            }
        }
        if self.hanging.contains(&id) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(&id) {
            return Err(SourceError::MissingItem(id));
        }
        self.items.get(&id).cloned().ok_or(SourceError::MissingItem(id))
    }
}
