//! Subscription and dialog identity
//!
//! This module owns the textual identity scheme shared by the signaling stack:
//!
//! - [`DialogId`]: `D_<dialog-discriminator>_<call-id>`
//! - [`SubscriptionId`]: `U_<event-type>_<event-id>_<dialog-discriminator>_<call-id>`
//! - [`EventToken`]: the Event header value a subscription was created for
//! - [`SubscriptionRef`]: what a caller may hand us to name a subscription
//!
//! ## Separator constraint
//!
//! Components are joined with [`SEPARATOR`] and no escaping exists. Decoding
//! takes the trailing two segments as (discriminator, call-id), which is only
//! unambiguous if no component carries the separator itself. Every
//! constructor in this module enforces that and reports
//! [`SubscriptionError::InvalidIdentifier`] instead of producing an id that
//! would later misparse.

pub mod codec;
pub mod resolve;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{SubscriptionError, SubscriptionResult};

pub use codec::{decode_dialog_id, encode};
pub use resolve::{remote_id, resolve};

/// Reserved separator between identifier components
pub const SEPARATOR: char = '_';

/// Prefix of every subscription identifier
pub const SUBSCRIPTION_PREFIX: &str = "U_";

/// Prefix of every dialog identifier
pub const DIALOG_PREFIX: &str = "D_";

/// Identifier of the application (user agent) owning a dialog
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppId(pub String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Correlation id of a single SIP message (request or response)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Reject a component that is empty (when required) or embeds the separator
fn check_component(id: &str, name: &str, value: &str, allow_empty: bool) -> SubscriptionResult<()> {
    if !allow_empty && value.is_empty() {
        return Err(SubscriptionError::invalid_identifier(id, format!("empty {}", name)));
    }
    if value.contains(SEPARATOR) {
        return Err(SubscriptionError::invalid_identifier(
            id,
            format!("{} '{}' contains reserved separator '{}'", name, value, SEPARATOR),
        ));
    }
    Ok(())
}

/// Dialog identifier, `D_<dialog-discriminator>_<call-id>`
///
/// The discriminator is the local tag of the dialog as seen by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DialogId {
    discriminator: String,
    call_id: String,
}

impl DialogId {
    /// Build a dialog id from its discriminator and Call-ID
    pub fn new(discriminator: impl Into<String>, call_id: impl Into<String>) -> SubscriptionResult<Self> {
        let discriminator = discriminator.into();
        let call_id = call_id.into();
        let text = format!("{}{}{}{}", DIALOG_PREFIX, discriminator, SEPARATOR, call_id);
        check_component(&text, "dialog discriminator", &discriminator, false)?;
        check_component(&text, "call-id", &call_id, false)?;
        Ok(Self { discriminator, call_id })
    }

    pub fn discriminator(&self) -> &str {
        &self.discriminator
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}{}", DIALOG_PREFIX, self.discriminator, SEPARATOR, self.call_id)
    }
}

impl FromStr for DialogId {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(DIALOG_PREFIX)
            .ok_or_else(|| SubscriptionError::invalid_identifier(s, "missing D_ prefix"))?;
        match rest.split(SEPARATOR).collect::<Vec<_>>().as_slice() {
            [discriminator, call_id] => Self::new(*discriminator, *call_id),
            _ => Err(SubscriptionError::invalid_identifier(
                s,
                "expected D_<discriminator>_<call-id>",
            )),
        }
    }
}

impl TryFrom<String> for DialogId {
    type Error = SubscriptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DialogId> for String {
    fn from(id: DialogId) -> Self {
        id.to_string()
    }
}

/// Subscription identifier,
/// `U_<event-type>_<event-id>_<dialog-discriminator>_<call-id>`
///
/// The event id is empty when the Event header carried no `id` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SubscriptionId {
    event_type: String,
    event_id: String,
    dialog_id: DialogId,
}

impl SubscriptionId {
    /// Build a subscription id from its components
    pub fn new(
        event_type: impl Into<String>,
        event_id: impl Into<String>,
        dialog_id: DialogId,
    ) -> SubscriptionResult<Self> {
        let event_type = event_type.into();
        let event_id = event_id.into();
        let text = format!(
            "{}{}{sep}{}{sep}{}{sep}{}",
            SUBSCRIPTION_PREFIX,
            event_type,
            event_id,
            dialog_id.discriminator(),
            dialog_id.call_id(),
            sep = SEPARATOR
        );
        check_component(&text, "event type", &event_type, false)?;
        check_component(&text, "event id", &event_id, true)?;
        Ok(Self {
            event_type,
            event_id,
            dialog_id,
        })
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// The dialog this subscription lives in
    pub fn dialog_id(&self) -> &DialogId {
        &self.dialog_id
    }

    /// Same event type and id, re-homed onto another discriminator
    pub fn with_discriminator(&self, discriminator: impl Into<String>) -> SubscriptionResult<Self> {
        let dialog_id = DialogId::new(discriminator, self.dialog_id.call_id())?;
        Ok(Self {
            event_type: self.event_type.clone(),
            event_id: self.event_id.clone(),
            dialog_id,
        })
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{sep}{}{sep}{}{sep}{}",
            SUBSCRIPTION_PREFIX,
            self.event_type,
            self.event_id,
            self.dialog_id.discriminator(),
            self.dialog_id.call_id(),
            sep = SEPARATOR
        )
    }
}

impl FromStr for SubscriptionId {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix(SUBSCRIPTION_PREFIX)
            .ok_or_else(|| SubscriptionError::invalid_identifier(s, "missing U_ prefix"))?;
        // Exactly four segments; more would make the split point ambiguous.
        match rest.split(SEPARATOR).collect::<Vec<_>>().as_slice() {
            [event_type, event_id, discriminator, call_id] => {
                let dialog_id = DialogId::new(*discriminator, *call_id)
                    .map_err(|_| SubscriptionError::invalid_identifier(s, "invalid dialog component"))?;
                Self::new(*event_type, *event_id, dialog_id)
            }
            segments if segments.len() < 4 => Err(SubscriptionError::invalid_identifier(
                s,
                "expected U_<event-type>_<event-id>_<discriminator>_<call-id>",
            )),
            _ => Err(SubscriptionError::invalid_identifier(
                s,
                "ambiguous: a component contains the reserved separator",
            )),
        }
    }
}

impl TryFrom<String> for SubscriptionId {
    type Error = SubscriptionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SubscriptionId> for String {
    fn from(id: SubscriptionId) -> Self {
        id.to_string()
    }
}

/// Event header value identifying a subscription's event package (RFC 6665)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventToken {
    event_type: String,
    params: Vec<(String, Option<String>)>,
}

impl EventToken {
    /// Create a token for an event package with no parameters
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            params: Vec::new(),
        }
    }

    /// Set the `id` parameter
    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_param("id", Some(id.into()))
    }

    /// Add a generic parameter, replacing any previous value of the same name
    pub fn with_param(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        let name = name.into();
        self.params.retain(|(existing, _)| !existing.eq_ignore_ascii_case(&name));
        self.params.push((name, value));
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The `id` parameter, if present
    pub fn id(&self) -> Option<&str> {
        self.params
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("id"))
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn params(&self) -> &[(String, Option<String>)] {
        &self.params
    }
}

impl fmt::Display for EventToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.event_type)?;
        for (name, value) in &self.params {
            match value {
                Some(value) => write!(f, ";{}={}", name, value)?,
                None => write!(f, ";{}", name)?,
            }
        }
        Ok(())
    }
}

/// How a caller names a subscription
///
/// A caller either already has a subscription id, or only holds the
/// correlation id of a message (SUBSCRIBE, NOTIFY or a response to one) and
/// wants the subscription that message belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionRef {
    /// Subscription id text, taken verbatim
    Subscription(String),
    /// Message correlation id, resolved through the registry
    Message(MessageId),
}

impl From<SubscriptionId> for SubscriptionRef {
    fn from(id: SubscriptionId) -> Self {
        Self::Subscription(id.to_string())
    }
}

impl From<&SubscriptionId> for SubscriptionRef {
    fn from(id: &SubscriptionId) -> Self {
        Self::Subscription(id.to_string())
    }
}

impl From<MessageId> for SubscriptionRef {
    fn from(id: MessageId) -> Self {
        Self::Message(id)
    }
}

impl fmt::Display for SubscriptionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscription(id) => f.write_str(id),
            Self::Message(id) => write!(f, "message {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_id_display_and_parse() {
        let id = DialogId::new("tag77", "call42").unwrap();
        assert_eq!(id.to_string(), "D_tag77_call42");
        assert_eq!("D_tag77_call42".parse::<DialogId>().unwrap(), id);
    }

    #[test]
    fn test_dialog_id_rejects_separator_in_components() {
        assert!(DialogId::new("tag_77", "call42").is_err());
        assert!(DialogId::new("tag77", "call_42").is_err());
        assert!(DialogId::new("", "call42").is_err());
        assert!("D_a_b_c".parse::<DialogId>().is_err());
        assert!("X_a_b".parse::<DialogId>().is_err());
    }

    #[test]
    fn test_subscription_id_parse_shapes() {
        let id: SubscriptionId = "U_presence__tag1_call1".parse().unwrap();
        assert_eq!(id.event_type(), "presence");
        assert_eq!(id.event_id(), "");
        assert_eq!(id.dialog_id().to_string(), "D_tag1_call1");

        assert!("U_presence_tag1_call1".parse::<SubscriptionId>().is_err());
        assert!("U_my_event_x_tag1_call1".parse::<SubscriptionId>().is_err());
        assert!("presence_x_tag1_call1".parse::<SubscriptionId>().is_err());
        assert!("U__x_tag1_call1".parse::<SubscriptionId>().is_err());
    }

    #[test]
    fn test_with_discriminator_keeps_event_and_call() {
        let id: SubscriptionId = "U_dialog_abc123_tag77_call42".parse().unwrap();
        let remote = id.with_discriminator("peer9").unwrap();
        assert_eq!(remote.to_string(), "U_dialog_abc123_peer9_call42");
    }

    #[test]
    fn test_event_token_display() {
        let token = EventToken::new("dialog").with_id("abc123");
        assert_eq!(token.to_string(), "dialog;id=abc123");
        assert_eq!(token.id(), Some("abc123"));

        let token = EventToken::new("presence").with_param("sla", None);
        assert_eq!(token.to_string(), "presence;sla");
        assert_eq!(token.id(), None);
    }

    #[test]
    fn test_ids_serialize_as_text() {
        let id: SubscriptionId = "U_dialog_abc123_tag77_call42".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"U_dialog_abc123_tag77_call42\"");
        let back: SubscriptionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
        assert!(serde_json::from_str::<DialogId>("\"nonsense\"").is_err());
    }
}
