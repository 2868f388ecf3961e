use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::error::SourceError;
use crate::models::{Item, ItemId};

pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0/";

/// Anything that can rank items and look them up one by one.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Identifiers of the current top items, best first.
    async fn list_top_ids(&self) -> Result<Vec<ItemId>, SourceError>;

    async fn fetch_item(&self, id: ItemId) -> Result<Item, SourceError>;
}

pub struct HackerNewsClient {
    client: Client,
    base_url: Url,
}

impl HackerNewsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Url::join drops the last segment unless the base ends with a slash
        let base_url = if base_url.ends_with('/') {
            Url::parse(base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = self.base_url.join(path)?;
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ItemSource for HackerNewsClient {
    async fn list_top_ids(&self) -> Result<Vec<ItemId>, SourceError> {
        self.get_json("topstories.json").await
    }

    async fn fetch_item(&self, id: ItemId) -> Result<Item, SourceError> {
        // The API answers `null` for ids it doesn't know
        let item: Option<Item> = self.get_json(&format!("item/{}.json", id)).await?;
        item.ok_or(SourceError::MissingItem(id))
    }
}
