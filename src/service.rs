use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::aggregator::build_top;
use crate::cache::StoriesCache;
use crate::error::{ServiceError, SourceError};
use crate::hn_client::ItemSource;
use crate::models::TopList;

/// Parameters of a top stories build, fixed for the lifetime of the service.
#[derive(Debug, Clone, Copy)]
pub struct Settings {
    pub num_stories: usize,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
}

/// Serves the top stories from the cache, building them on a cold cache.
///
/// Shared between the request handlers and the background refresher.
pub struct TopStories {
    source: Arc<dyn ItemSource>,
    cache: StoriesCache,
    settings: Settings,
    // Held while building on a cache miss, so concurrent misses wait for one build
    cold_build: Mutex<()>,
}

impl TopStories {
    pub fn new(source: Arc<dyn ItemSource>, settings: Settings) -> Self {
        Self {
            source,
            cache: StoriesCache::new(),
            settings,
            cold_build: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &StoriesCache {
        &self.cache
    }

    pub async fn top_stories(&self) -> Result<Arc<TopList>, ServiceError> {
        if let Some(list) = self.cache.get() {
            return Ok(list);
        }

        let _building = self.cold_build.lock().await;
        // Someone else may have filled the cache while we waited
        if let Some(list) = self.cache.get() {
            return Ok(list);
        }

        debug!("cache miss, building top stories on the request path");
        match self.build().await {
            // The refresher may have published a newer list while we were building
            Ok(list) => Ok(self.cache.set_if_cold(Arc::new(list), self.settings.cache_ttl)),
            Err(err) => {
                warn!(error = %err, "could not build top stories for request");
                Err(ServiceError::Upstream(err))
            }
        }
    }

    /// Builds a fresh list and publishes it. A failed build leaves the cache alone.
    pub async fn refresh(&self) -> Result<Arc<TopList>, SourceError> {
        let list = Arc::new(self.build().await?);
        self.cache.set(Arc::clone(&list), self.settings.cache_ttl);
        Ok(list)
    }

    async fn build(&self) -> Result<TopList, SourceError> {
        let started = Instant::now();
        let stories = build_top(
            Arc::clone(&self.source),
            self.settings.num_stories,
            self.settings.fetch_timeout,
        )
        .await?;

        Ok(TopList {
            stories,
            built_at: Utc::now(),
            build_ms: started.elapsed().as_millis() as u64,
        })
    }
}
