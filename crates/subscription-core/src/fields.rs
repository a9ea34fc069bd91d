//! Field projection over subscription snapshots
//!
//! Callers name fields with the textual names used across the stack
//! (`id`, `appId`, `status`, `event`, `parsedEvent`, `class`, `answered`,
//! `expires`). Names are parsed once into [`SubscriptionField`]; the mapping
//! from field to value is an exhaustive match.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{SubscriptionError, SubscriptionResult};
use crate::identity::{AppId, EventToken, SubscriptionId};
use crate::subscription::{SubscriptionClass, SubscriptionSnapshot, SubscriptionStatus};

/// A readable subscription field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionField {
    Id,
    AppId,
    Status,
    /// Event header value, formatted
    Event,
    /// Event header value, structured
    ParsedEvent,
    Class,
    /// Time of the first NOTIFY
    Answered,
    /// Seconds remaining
    Expires,
}

impl SubscriptionField {
    pub const ALL: [SubscriptionField; 8] = [
        Self::Id,
        Self::AppId,
        Self::Status,
        Self::Event,
        Self::ParsedEvent,
        Self::Class,
        Self::Answered,
        Self::Expires,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::AppId => "appId",
            Self::Status => "status",
            Self::Event => "event",
            Self::ParsedEvent => "parsedEvent",
            Self::Class => "class",
            Self::Answered => "answered",
            Self::Expires => "expires",
        }
    }
}

impl fmt::Display for SubscriptionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SubscriptionField {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.name() == s)
            .ok_or_else(|| SubscriptionError::invalid_field(s))
    }
}

/// Value of one projected field
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Id(SubscriptionId),
    AppId(AppId),
    Status(SubscriptionStatus),
    Event(String),
    ParsedEvent(EventToken),
    Class(SubscriptionClass),
    Answered(Option<DateTime<Utc>>),
    Expires(u64),
}

/// Project one field out of a snapshot
pub fn project(snapshot: &SubscriptionSnapshot, field: SubscriptionField) -> FieldValue {
    match field {
        SubscriptionField::Id => FieldValue::Id(snapshot.id.clone()),
        SubscriptionField::AppId => FieldValue::AppId(snapshot.app_id.clone()),
        SubscriptionField::Status => FieldValue::Status(snapshot.status.clone()),
        SubscriptionField::Event => FieldValue::Event(snapshot.event.to_string()),
        SubscriptionField::ParsedEvent => FieldValue::ParsedEvent(snapshot.event.clone()),
        SubscriptionField::Class => FieldValue::Class(snapshot.class),
        SubscriptionField::Answered => FieldValue::Answered(snapshot.answered),
        SubscriptionField::Expires => FieldValue::Expires(snapshot.expires_in()),
    }
}

/// Project a field by name; unknown names yield `InvalidField`
pub fn project_named(snapshot: &SubscriptionSnapshot, name: &str) -> SubscriptionResult<FieldValue> {
    let field: SubscriptionField = name.parse()?;
    Ok(project(snapshot, field))
}

/// Project several fields, keeping the caller's order.
///
/// Each entry carries its own result, so one unknown name does not fail
/// the others.
pub fn project_many<S: AsRef<str>>(
    snapshot: &SubscriptionSnapshot,
    names: &[S],
) -> Vec<(String, SubscriptionResult<FieldValue>)> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            (name.to_string(), project_named(snapshot, name))
        })
        .collect()
}
