pub mod amount;
pub mod jurisdiction;
pub mod relevance;

pub use amount::parse_amount_midpoint;
pub use jurisdiction::{effective_committees, has_regulatory_link, leadership_pseudo_committee, ALL_SECTORS};
pub use relevance::{relevance_score, OwnedTicker};
