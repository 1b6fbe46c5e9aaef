pub mod error;
pub mod meta_store;
pub mod pool;
pub mod research_store;

pub use error::{is_ipv6_unreachable, StoreError, StoreResult};
pub use meta_store::MetaStore;
pub use research_store::ResearchStore;
