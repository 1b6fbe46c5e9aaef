use std::time::Duration;

use chrono::{DateTime, Utc};
use rss::Channel;

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone)]
pub struct RssItem {
    pub url: String,
    pub title: String,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
    pub tickers: Vec<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RssFetchResult {
    pub items: Vec<RssItem>,
    pub junk_filtered: usize,
}

/// Minimum content length an RSS item's description must have to count as
/// real content rather than a teaser; shorter items fall through to the
/// extractor in the RSS Ingest job.
const MIN_DESCRIPTION_LEN: usize = 200;

/// Titles containing these are almost always sponsored or aggregator noise,
/// not market news.
const JUNK_TITLE_MARKERS: &[&str] = &["sponsored", "[ad]", "paid partnership"];

#[derive(Clone)]
pub struct RssClient {
    client: reqwest::Client,
}

impl RssClient {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("failed to build RSS HTTP client");
        Self::with_client(client)
    }

    pub async fn fetch(&self, feed_url: &str) -> ClientResult<RssFetchResult> {
        let resp = self.client.get(feed_url).send().await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        let bytes = resp.bytes().await?;
        let channel = Channel::read_from(&bytes[..])
            .map_err(|e| ClientError::InvalidResponse(format!("feed parse error: {e}")))?;

        let mut items = Vec::new();
        let mut junk_filtered = 0usize;

        for entry in channel.items() {
            let title = entry.title().unwrap_or_default().to_string();
            if is_junk(&title) {
                junk_filtered += 1;
                continue;
            }
            let Some(url) = entry.link().map(str::to_string) else {
                junk_filtered += 1;
                continue;
            };
            let content = entry.description().unwrap_or_default().to_string();
            let published_at = entry
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|d| d.with_timezone(&Utc));

            items.push(RssItem {
                url,
                title,
                content,
                published_at,
                tickers: Vec::new(),
                source: channel.title().to_string().into(),
            });
        }

        Ok(RssFetchResult { items, junk_filtered })
    }

    pub async fn health(&self) -> bool {
        true
    }
}

fn is_junk(title: &str) -> bool {
    let lower = title.to_lowercase();
    JUNK_TITLE_MARKERS.iter().any(|m| lower.contains(m))
}

impl RssItem {
    pub fn needs_extraction(&self) -> bool {
        self.content.trim().chars().count() < MIN_DESCRIPTION_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_sponsored_titles_as_junk() {
        assert!(is_junk("Sponsored: 5 stocks to watch"));
        assert!(!is_junk("Fed holds rates steady"));
    }

    #[test]
    fn short_description_needs_extraction() {
        let item = RssItem {
            url: "https://example.com".into(),
            title: "x".into(),
            content: "short".into(),
            published_at: None,
            tickers: vec![],
            source: None,
        };
        assert!(item.needs_extraction());
    }
}
