use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, ClientResult};

/// Fixed whitelist of stock-related subreddits polled for cashtag chatter.
pub const SUBREDDIT_WHITELIST: &[&str] = &["wallstreetbets", "stocks", "investing", "StockMarket", "options"];

/// Minimum gap enforced between requests, regardless of caller concurrency.
pub const RATE_LIMIT: Duration = Duration::from_secs(2);

/// Early-terminate the whole multi-subreddit scan for one ticker once this
/// many ticker-validated posts have been collected across all subreddits.
pub const ENOUGH_POSTS: usize = 10;

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";

#[derive(Debug, Clone)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub score: i64,
    pub created_utc: f64,
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    title: String,
    #[serde(default)]
    selftext: String,
    score: i64,
    created_utc: f64,
}

/// Public JSON-endpoint Reddit client: no auth, no anti-bot proxy — just the
/// `.json` suffix Reddit serves for any listing.
#[derive(Clone)]
pub struct RedditClient {
    client: reqwest::Client,
    base_url: String,
}

impl RedditClient {
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Used for testing with wiremock.
    pub fn with_base_url(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("intel-worker/0.1 (social sentiment collector)")
            .build()
            .expect("failed to build reddit HTTP client");
        Self::with_client(client)
    }

    /// Searches `subreddit` for `ticker`'s cashtag over the last week,
    /// sorted by relevance — the targeted endpoint, not the generic `/new`
    /// firehose, since a plain listing buries the handful of posts actually
    /// about the ticker under everything else posted that day.
    pub async fn fetch_new(&self, subreddit: &str, ticker: &str) -> ClientResult<Vec<RedditPost>> {
        let cashtag = format!("${}", ticker.to_uppercase());
        let url = format!("{}/r/{subreddit}/search.json", self.base_url);
        let resp = self
            .client
            .get(url)
            .query(&[
                ("q", cashtag.as_str()),
                ("sort", "relevance"),
                ("t", "week"),
                ("limit", "25"),
                ("restrict_sr", "1"),
            ])
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ClientError::ServiceUnavailable(format!("status {}", resp.status())));
        }
        let body: ListingResponse = resp.json().await?;

        Ok(body
            .data
            .children
            .into_iter()
            .map(|c| RedditPost {
                id: c.data.id,
                title: c.data.title,
                selftext: c.data.selftext,
                score: c.data.score,
                created_utc: c.data.created_utc,
            })
            .collect())
    }

    pub async fn health(&self) -> bool {
        self.client
            .get(format!("{}/r/stocks/new.json?limit=1", self.base_url))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// A post mentions `ticker` only if the cashtag (`$TICKER`) or the bare
/// ticker appears as a whole word — a loose substring match would false
/// positive on tickers that are also common words.
pub fn mentions_ticker(text: &str, ticker: &str) -> bool {
    let cashtag = format!("${}", ticker.to_uppercase());
    if text.to_uppercase().contains(&cashtag) {
        return true;
    }
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|word| word.eq_ignore_ascii_case(ticker))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn matches_cashtag() {
        assert!(mentions_ticker("loading up on $MSFT calls", "MSFT"));
    }

    #[test]
    fn matches_bare_word_boundary() {
        assert!(mentions_ticker("MSFT is up today", "MSFT"));
        assert!(!mentions_ticker("this is a mistfit idea", "MSFT"));
    }

    #[tokio::test]
    async fn fetch_new_searches_the_subreddit_for_the_cashtag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/stocks/search.json"))
            .and(query_param("q", "$MSFT"))
            .and(query_param("restrict_sr", "1"))
            .and(query_param("sort", "relevance"))
            .and(query_param("t", "week"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": {
                    "children": [{
                        "data": {
                            "id": "abc123",
                            "title": "MSFT earnings beat",
                            "selftext": "",
                            "score": 42,
                            "created_utc": 1_700_000_000.0
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let client = RedditClient::with_base_url(reqwest::Client::new(), server.uri());
        let posts = client.fetch_new("stocks", "MSFT").await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].id, "abc123");
    }

    #[tokio::test]
    async fn fetch_new_propagates_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/r/stocks/search.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = RedditClient::with_base_url(reqwest::Client::new(), server.uri());
        assert!(client.fetch_new("stocks", "MSFT").await.is_err());
    }
}
