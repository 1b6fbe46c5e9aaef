pub mod crowd;
pub mod low_risk;
pub mod prefetch;
pub mod prompting;
pub mod rescore;
pub mod session;
pub mod single_trade;

pub use crowd::{analyze_crowd_sentiment, CrowdSentiment, CrowdVerdict};
pub use low_risk::{classify as classify_low_risk, LowRiskInput, LowRiskVerdict};
pub use prefetch::BatchPrefetch;
pub use prompting::{complete_json, complete_json_value, json_only_system_prompt, PromptError};
pub use rescore::{next_page, RescoreCursor, RescorePage};
pub use session::{analyze_session, classify_session, SessionActivityRow, SessionVerdict};
pub use single_trade::{analyze_single_trade, SingleTradeInput, TradeVerdict};
