use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Identifier of an item in the Hacker News ranking.
pub type ItemId = u64;

/// An item as returned by the Hacker News API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Item {
    pub id: ItemId,
    #[serde(rename = "type")]
    pub item_type: String,
    pub by: String,
    pub time: i64,
    pub title: String,
    pub url: String,
    pub score: i32,
    pub descendants: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub dead: bool,
    pub deleted: bool,
}

/// A link story ready to be served: the item plus fields derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    #[serde(flatten)]
    pub item: Item,
    pub host: String,
    pub posted_at: Option<DateTime<Utc>>,
}

/// One published build of the top stories.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopList {
    pub stories: Vec<Story>,
    pub built_at: DateTime<Utc>,
    /// How long the build took, ranking call included.
    pub build_ms: u64,
}

/// Only stories that link somewhere are shown.
pub fn is_eligible(item: &Item) -> bool {
    item.item_type == "story" && !item.url.is_empty()
}

impl Story {
    pub fn id(&self) -> ItemId {
        self.item.id
    }
}

impl From<Item> for Story {
    fn from(item: Item) -> Self {
        let host = host_of(&item.url);
        let posted_at = DateTime::from_timestamp(item.time, 0).filter(|_| item.time > 0);
        Self {
            item,
            host,
            posted_at,
        }
    }
}

// A URL that doesn't parse (or has no host) just leaves the host blank
fn host_of(raw: &str) -> String {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .map(|host| match host.strip_prefix("www.") {
            Some(stripped) => stripped.to_string(),
            None => host,
        })
        .unwrap_or_default()
}
