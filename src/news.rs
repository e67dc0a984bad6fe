use chrono::{DateTime, Utc};
use serde::Serialize;

/// Label used when neither the feed nor its configuration names the source.
pub const DEFAULT_SOURCE: &str = "Industry News";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: Option<DateTime<Utc>>,
    pub source: String,
}

/// Interleave the surviving feeds one item per feed per pass.
///
/// Failed outcomes are dropped. Feeds keep their input order within each
/// pass and an exhausted feed simply stops contributing, so a long feed
/// cannot crowd the front of the list.
pub fn merge_round_robin<T, E>(outcomes: Vec<Result<Vec<T>, E>>) -> Vec<T> {
    let mut sources: Vec<std::vec::IntoIter<T>> = outcomes
        .into_iter()
        .filter_map(Result::ok)
        .map(Vec::into_iter)
        .collect();

    let total: usize = sources.iter().map(|s| s.len()).sum();
    let mut merged = Vec::with_capacity(total);

    while merged.len() < total {
        for source in sources.iter_mut() {
            if let Some(item) = source.next() {
                merged.push(item);
            }
        }
    }

    merged
}
