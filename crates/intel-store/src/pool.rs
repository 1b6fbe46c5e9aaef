use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::error::{is_ipv6_unreachable, StoreError, StoreResult};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens a Postgres pool, classifying connection failures so startup code
/// can tell a network-reachability problem from a bad credential or a typo
/// in the connection string.
pub async fn connect(pool_name: &'static str, database_url: &str, max_connections: u32) -> StoreResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(CONNECT_TIMEOUT)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::Connectivity {
            pool: pool_name,
            ipv6_unreachable: is_ipv6_unreachable(&e),
            cause: e.to_string(),
        })
}

/// Logs pool saturation so operators notice before requests start queueing
/// for the full acquire timeout.
pub fn warn_if_saturated(pool_name: &str, pool: &PgPool) {
    let size = pool.size();
    let idle = pool.num_idle() as u32;
    if idle == 0 && size > 0 {
        tracing::warn!(pool = pool_name, size, idle, "connection pool has no idle connections");
    }
}
