//! Dialog structure as held by its owning agent

use tracing::warn;

use crate::identity::{encode, AppId, DialogId, SubscriptionId};
use crate::subscription::SubscriptionRecord;

/// The subscription-relevant part of one dialog
#[derive(Debug, Clone)]
pub struct DialogRecord {
    /// Application owning the dialog
    pub app_id: AppId,
    /// Dialog id; its discriminator is the local tag
    pub id: DialogId,
    /// Tag chosen by the peer, once known
    pub remote_tag: Option<String>,
    /// Subscriptions nested in this dialog, in creation order
    pub subscriptions: Vec<SubscriptionRecord>,
}

/// Named field of a dialog structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogField {
    SubscriptionIds,
    LocalTag,
    RemoteTag,
    CallId,
}

/// Value of a [`DialogField`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogFieldValue {
    SubscriptionIds(Vec<SubscriptionId>),
    Tag(Option<String>),
    CallId(String),
}

impl DialogRecord {
    pub fn new(app_id: AppId, id: DialogId) -> Self {
        Self {
            app_id,
            id,
            remote_tag: None,
            subscriptions: Vec::new(),
        }
    }

    pub fn with_remote_tag(mut self, tag: impl Into<String>) -> Self {
        self.remote_tag = Some(tag.into());
        self
    }

    pub fn with_subscription(mut self, subscription: SubscriptionRecord) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn local_tag(&self) -> &str {
        self.id.discriminator()
    }

    pub fn call_id(&self) -> &str {
        self.id.call_id()
    }

    /// Ids of every subscription in this dialog.
    ///
    /// Subscriptions whose event token cannot be encoded are skipped.
    pub fn subscription_ids(&self) -> Vec<SubscriptionId> {
        self.subscriptions
            .iter()
            .filter_map(|subscription| match encode(&subscription.event, &self.id) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Skipping unaddressable subscription in dialog {}: {}", self.id, e);
                    None
                }
            })
            .collect()
    }

    /// Find the subscription named by `id`
    pub fn find_subscription(&self, id: &SubscriptionId) -> Option<&SubscriptionRecord> {
        if id.dialog_id() != &self.id {
            return None;
        }
        self.subscriptions.iter().find(|subscription| {
            subscription.event.event_type() == id.event_type()
                && subscription.event.id().unwrap_or_default() == id.event_id()
        })
    }

    /// Read a named field
    pub fn field(&self, field: DialogField) -> DialogFieldValue {
        match field {
            DialogField::SubscriptionIds => DialogFieldValue::SubscriptionIds(self.subscription_ids()),
            DialogField::LocalTag => DialogFieldValue::Tag(Some(self.local_tag().to_string())),
            DialogField::RemoteTag => DialogFieldValue::Tag(self.remote_tag.clone()),
            DialogField::CallId => DialogFieldValue::CallId(self.call_id().to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::EventToken;
    use crate::subscription::SubscriptionClass;
    use tokio::time::Instant;

    fn dialog() -> DialogRecord {
        let expires_at = Instant::now();
        DialogRecord::new(AppId::new("app1"), DialogId::new("tag77", "call42").unwrap())
            .with_remote_tag("peer9")
            .with_subscription(SubscriptionRecord::new(
                EventToken::new("dialog").with_id("abc123"),
                SubscriptionClass::Initiator,
                expires_at,
            ))
            .with_subscription(SubscriptionRecord::new(
                EventToken::new("presence"),
                SubscriptionClass::Receiver,
                expires_at,
            ))
            .with_subscription(SubscriptionRecord::new(
                EventToken::new("bad_event"),
                SubscriptionClass::Receiver,
                expires_at,
            ))
    }

    #[test]
    fn test_subscription_ids_skip_unencodable() {
        let ids: Vec<String> = dialog().subscription_ids().iter().map(|id| id.to_string()).collect();
        assert_eq!(ids, vec!["U_dialog_abc123_tag77_call42", "U_presence__tag77_call42"]);
    }

    #[test]
    fn test_find_subscription() {
        let dialog = dialog();
        let id: SubscriptionId = "U_presence__tag77_call42".parse().unwrap();
        assert_eq!(dialog.find_subscription(&id).unwrap().class, SubscriptionClass::Receiver);

        let other_dialog: SubscriptionId = "U_presence__tag78_call42".parse().unwrap();
        assert!(dialog.find_subscription(&other_dialog).is_none());

        let missing: SubscriptionId = "U_dialog_zzz_tag77_call42".parse().unwrap();
        assert!(dialog.find_subscription(&missing).is_none());
    }

    #[test]
    fn test_named_fields() {
        let dialog = dialog();
        assert_eq!(dialog.field(DialogField::RemoteTag), DialogFieldValue::Tag(Some("peer9".to_string())));
        assert_eq!(dialog.field(DialogField::LocalTag), DialogFieldValue::Tag(Some("tag77".to_string())));
        assert_eq!(dialog.field(DialogField::CallId), DialogFieldValue::CallId("call42".to_string()));
        match dialog.field(DialogField::SubscriptionIds) {
            DialogFieldValue::SubscriptionIds(ids) => assert_eq!(ids.len(), 2),
            other => panic!("Expected subscription ids, got {:?}", other),
        }
    }
}
