pub mod antibot;
pub mod archive;
pub mod error;
pub mod extractor;
pub mod financial;
pub mod llm;
pub mod reddit;
pub mod rss;
pub mod search;

pub use antibot::AntiBotClient;
pub use archive::ArchiveClient;
pub use error::{ClientError, ClientResult, ExtractionError};
pub use extractor::{ExtractedArticle, Extractor};
pub use financial::{DisclosureRecord, FinancialRestClient};
pub use llm::{extract_first_json_object, LlmClient, MarketRelevance, RawRelationship, SummaryResult};
pub use reddit::{mentions_ticker, RedditClient, RedditPost, ENOUGH_POSTS, RATE_LIMIT, SUBREDDIT_WHITELIST};
pub use rss::{RssClient, RssFetchResult, RssItem};
pub use search::{SearchClient, SearchResult};

use std::time::Duration;

/// Base URLs and credentials for every external service `ExternalClients`
/// wraps. Populated from environment variables by the binary's config layer.
#[derive(Debug, Clone)]
pub struct ClientsConfig {
    pub llm_url: String,
    pub llm_model: String,
    pub search_urls: Vec<String>,
    pub archive_url: String,
    pub antibot_proxy_url: Option<String>,
    pub financial_api_url: String,
    pub financial_api_key: String,
    pub default_timeout: Duration,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            llm_url: std::env::var("LLM_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9001".to_string()),
            llm_model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            search_urls: std::env::var("SEARCH_SERVICE_URLS")
                .unwrap_or_else(|_| "http://localhost:9002".to_string())
                .split(',')
                .map(str::to_string)
                .collect(),
            archive_url: std::env::var("ARCHIVE_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:9003".to_string()),
            antibot_proxy_url: std::env::var("ANTIBOT_PROXY_URL").ok(),
            financial_api_url: std::env::var("FINANCIAL_API_URL")
                .unwrap_or_else(|_| "https://financialmodelingprep.com/api/v4".to_string()),
            financial_api_key: std::env::var("FINANCIAL_API_KEY").unwrap_or_default(),
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// Every external-service client, each sharing one connection pool per the
/// teacher's `MLClient` pattern, split across two pools — a 30s pool for
/// search/LLM/financial/RSS and a 70s pool for the anti-bot proxy, which
/// does its own waiting out of challenge pages.
#[derive(Clone)]
pub struct ExternalClients {
    pub llm: LlmClient,
    pub search: SearchClient,
    pub archive: ArchiveClient,
    pub extractor: Extractor,
    pub antibot: AntiBotClient,
    pub rss: RssClient,
    pub financial: FinancialRestClient,
    pub reddit: RedditClient,
}

impl ExternalClients {
    pub fn new(config: ClientsConfig) -> Self {
        let shared_client = reqwest::Client::builder()
            .timeout(config.default_timeout)
            .pool_max_idle_per_host(20)
            .build()
            .expect("failed to create shared external-services HTTP client");

        let antibot_client = reqwest::Client::builder()
            .timeout(antibot::PROXY_TIMEOUT)
            .build()
            .expect("failed to create anti-bot HTTP client");

        Self {
            llm: LlmClient::with_client(shared_client.clone(), config.llm_url, config.llm_model),
            search: SearchClient::with_client(shared_client.clone(), config.search_urls),
            archive: ArchiveClient::with_client(shared_client.clone(), config.archive_url),
            extractor: Extractor::with_client(shared_client.clone()),
            antibot: AntiBotClient::with_client(antibot_client, config.antibot_proxy_url),
            rss: RssClient::with_client(shared_client.clone()),
            financial: FinancialRestClient::with_client(
                shared_client.clone(),
                config.financial_api_url,
                config.financial_api_key,
            ),
            reddit: RedditClient::new(config.default_timeout),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ClientsConfig::default())
    }

    /// Aggregate health snapshot; a job doesn't refuse to run on a partial
    /// outage, but the scheduler logs this at startup.
    pub async fn health_snapshot(&self) -> ClientsHealth {
        let (llm, search, archive, extractor, antibot, financial, reddit) = tokio::join!(
            self.llm.health(),
            self.search.health(),
            self.archive.health(),
            self.extractor.health(),
            self.antibot.health(),
            self.financial.health(),
            self.reddit.health(),
        );
        ClientsHealth {
            llm,
            search,
            archive,
            extractor,
            antibot,
            financial,
            reddit,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ClientsHealth {
    pub llm: bool,
    pub search: bool,
    pub archive: bool,
    pub extractor: bool,
    pub antibot: bool,
    pub financial: bool,
    pub reddit: bool,
}
