use anyhow::{bail, Result};
use clap::Parser;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::hn_client::DEFAULT_API_BASE;
use crate::service::Settings;

/// Serve the current top Hacker News link stories.
#[derive(Parser, Debug, Clone)]
#[command(name = "hn_top_stories", version, about)]
pub struct Config {
    /// Port to start the web server on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Number of top stories to serve
    #[arg(
        long,
        env = "HN_NUM_STORIES",
        default_value_t = 30,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub num_stories: u16,

    /// Seconds a built list of stories stays valid
    #[arg(
        long,
        env = "HN_CACHE_TTL",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub cache_ttl: u64,

    /// Seconds between background rebuilds of the list
    #[arg(
        long,
        env = "HN_REFRESH_INTERVAL",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub refresh_interval: u64,

    /// Seconds to wait for a single item before skipping it
    #[arg(
        long,
        env = "HN_FETCH_TIMEOUT",
        default_value_t = 5,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub fetch_timeout: u64,

    /// Base URL of the Hacker News API
    #[arg(long, env = "HN_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        match Url::parse(&self.api_base) {
            Ok(url) if url.has_host() && matches!(url.scheme(), "http" | "https") => {}
            _ => bail!("--api-base must be an absolute http(s) URL, got {:?}", self.api_base),
        }

        if self.refresh_interval >= self.cache_ttl {
            warn!(
                refresh_interval = self.refresh_interval,
                cache_ttl = self.cache_ttl,
                "refresh interval is not shorter than the cache TTL; requests may hit an expired cache"
            );
        }
        Ok(())
    }

    pub fn settings(&self) -> Settings {
        Settings {
            num_stories: usize::from(self.num_stories),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            fetch_timeout: Duration::from_secs(self.fetch_timeout),
        }
    }

    pub fn refresh_every(&self) -> Duration {
        Duration::from_secs(self.refresh_interval)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout)
    }
}
