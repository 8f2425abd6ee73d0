//! Connection pool for catalog searches.
//!
//! Every search holds exactly one connection from catalog lookup to the last
//! row, so `max_connections` is the number of searches that can run at once
//! and `acquire_timeout` is how long a search queues before failing.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use mediacat_core::defaults;
use mediacat_core::{Error, Result};

/// Sizing and lifetime of the search connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Concurrent searches.
    pub max_connections: u32,
    /// Connections kept open while the server is quiet.
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    /// Close connections unused for this long (down to `min_connections`).
    pub idle_timeout: Duration,
    /// Recycle connections after this age; `None` keeps them forever.
    pub max_lifetime: Option<Duration>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: defaults::DB_MAX_CONNECTIONS,
            min_connections: defaults::DB_MIN_CONNECTIONS,
            acquire_timeout: Duration::from_secs(defaults::DB_CONNECT_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(defaults::DB_IDLE_TIMEOUT_SECS),
            max_lifetime: Some(Duration::from_secs(defaults::DB_MAX_LIFETIME_SECS)),
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.max_lifetime = lifetime;
        self
    }

    /// Reject sizings sqlx would accept but that can never serve a search.
    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 {
            return Err(Error::Config(
                "pool needs at least one connection".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(Error::Config(format!(
                "pool min_connections ({}) exceeds max_connections ({})",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    fn options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Open a pool with [`PoolConfig::default`].
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Open a pool and wait for its first connection.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    config.validate()?;
    let start = Instant::now();

    let pool = config
        .options()
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        subsystem = "db",
        component = "pool",
        op = "connect",
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        acquire_timeout_secs = config.acquire_timeout.as_secs(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Search pool ready"
    );
    Ok(pool)
}

/// How close the pool is to making searches queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolPressure {
    /// A connection is free.
    Available,
    /// None free, but the pool may still open more.
    Growing,
    /// Every connection is held by a search; new searches wait.
    Saturated,
}

impl PoolPressure {
    pub fn from_counts(size: u32, idle: usize, max_connections: u32) -> Self {
        if idle > 0 {
            PoolPressure::Available
        } else if size < max_connections {
            PoolPressure::Growing
        } else {
            PoolPressure::Saturated
        }
    }
}

/// Report pool pressure after a slow search. Returns what was observed.
pub fn log_pool_pressure(pool: &PgPool) -> PoolPressure {
    let size = pool.size();
    let idle = pool.num_idle();
    let max = pool.options().get_max_connections();
    let pressure = PoolPressure::from_counts(size, idle, max);

    if pressure == PoolPressure::Saturated {
        warn!(
            subsystem = "db",
            component = "pool",
            op = "pressure",
            pool_size = size,
            max_connections = max,
            "Every pooled connection is busy, searches are queueing"
        );
    } else {
        debug!(
            subsystem = "db",
            component = "pool",
            op = "pressure",
            pool_size = size,
            pool_idle = idle,
            ?pressure,
            "Pool not saturated"
        );
    }
    pressure
}
