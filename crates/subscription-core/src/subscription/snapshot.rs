//! Point-in-time copy of one subscription

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use super::{SubscriptionClass, SubscriptionRecord, SubscriptionStatus};
use crate::errors::SubscriptionResult;
use crate::identity::{encode, AppId, DialogId, EventToken, SubscriptionId};

/// Immutable copy of a subscription, captured inside the dialog's owner
///
/// `captured_at` is the single clock sample taken for the capture. Anything
/// time-dependent (see [`SubscriptionSnapshot::expires_in`]) is computed
/// against it, never against a clock read at a later point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "SnapshotExport")]
pub struct SubscriptionSnapshot {
    pub id: SubscriptionId,
    pub app_id: AppId,
    pub status: SubscriptionStatus,
    pub event: EventToken,
    pub class: SubscriptionClass,
    pub answered: Option<DateTime<Utc>>,
    pub expires_at: Instant,
    pub captured_at: Instant,
}

impl SubscriptionSnapshot {
    /// Capture `record`, living in `dialog_id`, at `now`
    pub fn capture(
        app_id: &AppId,
        dialog_id: &DialogId,
        record: &SubscriptionRecord,
        now: Instant,
    ) -> SubscriptionResult<Self> {
        Ok(Self {
            id: encode(&record.event, dialog_id)?,
            app_id: app_id.clone(),
            status: record.status.clone(),
            event: record.event.clone(),
            class: record.class,
            answered: record.answered,
            expires_at: record.expires_at,
            captured_at: now,
        })
    }

    /// Time left in the subscription period at capture, zero once past expiry
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(self.captured_at)
    }

    /// Seconds left at capture, rounded to the nearest second
    pub fn expires_in(&self) -> u64 {
        let millis = self.remaining().as_millis();
        ((millis + 500) / 1000) as u64
    }
}

/// Serialised form: instants are replaced by the derived seconds
#[derive(Serialize)]
struct SnapshotExport {
    id: SubscriptionId,
    app_id: AppId,
    status: SubscriptionStatus,
    event: String,
    parsed_event: EventToken,
    class: SubscriptionClass,
    answered: Option<DateTime<Utc>>,
    expires: u64,
}

impl From<SubscriptionSnapshot> for SnapshotExport {
    fn from(snapshot: SubscriptionSnapshot) -> Self {
        let expires = snapshot.expires_in();
        Self {
            event: snapshot.event.to_string(),
            id: snapshot.id,
            app_id: snapshot.app_id,
            status: snapshot.status,
            parsed_event: snapshot.event,
            class: snapshot.class,
            answered: snapshot.answered,
            expires,
        }
    }
}
