pub mod archive_retry;
pub mod congress_analysis;
pub mod congress_scrape;
pub mod congress_sessions_rescore;
pub mod congress_trades_fetch;
pub mod deps;
pub mod market_news;
pub mod process_research_reports;
pub mod rss_ingest;
pub mod social_post_extraction;
pub mod social_retention;
pub mod social_sentiment_analysis;
pub mod social_sentiment_collect;
pub mod social_sessioning;
pub mod ticker_research;

pub use archive_retry::ArchiveRetryJob;
pub use congress_analysis::CongressAnalysisJob;
pub use congress_scrape::{CongressScrapeJob, CongressScrapeParams};
pub use congress_sessions_rescore::CongressSessionsRescoreJob;
pub use congress_trades_fetch::CongressTradesFetchJob;
pub use deps::JobDeps;
pub use market_news::MarketNewsJob;
pub use process_research_reports::ProcessResearchReportsJob;
pub use rss_ingest::RssIngestJob;
pub use social_post_extraction::SocialPostExtractionJob;
pub use social_retention::SocialRetentionJob;
pub use social_sentiment_analysis::SocialSentimentAnalysisJob;
pub use social_sentiment_collect::SocialSentimentCollectJob;
pub use social_sessioning::SocialSessioningJob;
pub use ticker_research::TickerResearchJob;
