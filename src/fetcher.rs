use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::parser;
use futures_util::future::join_all;
use reqwest::Client;
use tracing::{info, warn};

use crate::config::FeedConfig;
use crate::error::{ApiError, FetchError};
use crate::news::{merge_round_robin, NewsItem, DEFAULT_SOURCE};

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    items_per_feed: usize,
}

impl Fetcher {
    pub fn new(timeout: Duration, items_per_feed: usize) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("VMSSite/1.0 (News Aggregator)")
            .build()?;

        Ok(Self {
            client,
            items_per_feed,
        })
    }

    /// Fetch every feed concurrently and merge whatever came back.
    ///
    /// A failing feed is logged and left out. Only a task that could not
    /// run to completion fails the whole aggregation.
    pub async fn aggregate(&self, feeds: &[FeedConfig]) -> Result<Vec<NewsItem>, ApiError> {
        let handles: Vec<_> = feeds
            .iter()
            .cloned()
            .map(|feed| {
                let client = self.client.clone();
                let limit = self.items_per_feed;
                tokio::spawn(async move { fetch_feed(&client, &feed, limit).await })
            })
            .collect();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (feed, joined) in feeds.iter().zip(join_all(handles).await) {
            let outcome = joined?;
            if let Err(e) = &outcome {
                warn!(feed = %feed.url, error = %e, "dropping feed from news");
            }
            outcomes.push(outcome);
        }

        let merged = merge_round_robin(outcomes);
        info!("Aggregated {} news items from {} feeds", merged.len(), feeds.len());
        Ok(merged)
    }
}

pub async fn fetch_feed(
    client: &Client,
    feed: &FeedConfig,
    limit: usize,
) -> Result<Vec<NewsItem>, FetchError> {
    let response = client.get(&feed.url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let parsed = parser::parse(&bytes[..])?;

    let source = source_label(
        parsed.title.as_ref().map(|t| t.content.as_str()),
        feed.name.as_deref(),
    );

    let items = parsed
        .entries
        .into_iter()
        .filter_map(|entry| {
            let title = entry
                .title
                .as_ref()
                .map(|t| t.content.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| "Untitled".to_string());

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            if link.is_empty() {
                warn!("Skipping entry with no link: {}", title);
                return None;
            }

            let pub_date: Option<DateTime<Utc>> = entry.published.or(entry.updated);

            Some(NewsItem {
                title,
                link,
                pub_date,
                source: source.clone(),
            })
        })
        .take(limit)
        .collect();

    Ok(items)
}

/// The feed's own title, else the configured name, else [`DEFAULT_SOURCE`].
pub fn source_label(feed_title: Option<&str>, configured: Option<&str>) -> String {
    feed_title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| configured.map(str::trim).filter(|n| !n.is_empty()))
        .unwrap_or(DEFAULT_SOURCE)
        .to_string()
}
