//! Configuration for the subscription query layer
//!
//! ```rust
//! use rvoip_subscription_core::SubscriptionConfig;
//! use std::time::Duration;
//!
//! let config = SubscriptionConfig::default()
//!     .with_query_timeout(Duration::from_secs(2))
//!     .with_scan_concurrency(8);
//!
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{SubscriptionError, SubscriptionResult};

/// Settings for queries against dialog owners
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Bound on each round trip to a dialog owner
    pub query_timeout: Duration,

    /// Mailbox capacity of agents spawned by the in-process registry
    pub owner_queue_depth: usize,

    /// Maximum per-dialog queries in flight while enumerating; 1 is sequential
    pub scan_concurrency: usize,
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            query_timeout: Duration::from_secs(5),
            owner_queue_depth: 64,
            scan_concurrency: 16,
        }
    }
}

impl SubscriptionConfig {
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn with_owner_queue_depth(mut self, depth: usize) -> Self {
        self.owner_queue_depth = depth;
        self
    }

    pub fn with_scan_concurrency(mut self, concurrency: usize) -> Self {
        self.scan_concurrency = concurrency;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> SubscriptionResult<()> {
        if self.query_timeout.is_zero() {
            return Err(SubscriptionError::configuration("query_timeout must be greater than 0"));
        }
        if self.owner_queue_depth == 0 {
            return Err(SubscriptionError::configuration("owner_queue_depth must be greater than 0"));
        }
        if self.scan_concurrency == 0 {
            return Err(SubscriptionError::configuration("scan_concurrency must be greater than 0"));
        }
        Ok(())
    }
}
