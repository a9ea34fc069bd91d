//! Subscription data model
//!
//! [`SubscriptionRecord`] is the live entry kept in a dialog by its owning
//! agent. [`SubscriptionSnapshot`] is the immutable copy handed to callers.

pub mod snapshot;
pub mod status;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::identity::EventToken;

pub use snapshot::SubscriptionSnapshot;
pub use status::{SubscriptionClass, SubscriptionStatus, TerminationReason};

/// A subscription as tracked inside its dialog
///
/// Written only by the dialog's owning agent. This crate reads it from
/// inside the agent and never keeps a reference past one query.
#[derive(Debug, Clone)]
pub struct SubscriptionRecord {
    /// Event header the subscription was created for
    pub event: EventToken,
    /// Whether we sent the SUBSCRIBE or received it
    pub class: SubscriptionClass,
    /// Current subscription state
    pub status: SubscriptionStatus,
    /// When the first NOTIFY was exchanged, if it has been
    pub answered: Option<DateTime<Utc>>,
    /// Absolute expiry of the current subscription period
    pub expires_at: Instant,
}

impl SubscriptionRecord {
    /// Create a neutral subscription expiring at `expires_at`
    pub fn new(event: EventToken, class: SubscriptionClass, expires_at: Instant) -> Self {
        Self {
            event,
            class,
            status: SubscriptionStatus::Neutral,
            answered: None,
            expires_at,
        }
    }

    pub fn with_status(mut self, status: SubscriptionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_answered(mut self, answered: DateTime<Utc>) -> Self {
        self.answered = Some(answered);
        self
    }
}
