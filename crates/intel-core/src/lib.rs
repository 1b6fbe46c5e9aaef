pub mod dates;
pub mod error;
pub mod outcome;
pub mod ticker;
pub mod types;

pub use dates::parse_flexible_date;
pub use error::{IntelError, IntelResult};
pub use outcome::{FailureKind, Outcome, OutcomeCounters};
pub use ticker::{is_valid_ticker, normalize_tickers};
pub use types::*;
