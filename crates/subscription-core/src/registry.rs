//! Dialog registry contract and the in-process registry
//!
//! The registry is what knows which agent owns which dialog. The
//! subscription layer depends only on the [`DialogRegistry`] trait; the
//! signaling stack provides the implementation. [`LocalDialogRegistry`] is a
//! complete in-process implementation that spawns one [`DialogAgent`] per
//! registered dialog.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use crate::config::SubscriptionConfig;
use crate::dialog::{DialogAgent, DialogOwner, DialogRecord};
use crate::identity::{AppId, DialogId, EventToken, MessageId};

/// What the registry knows about one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageContext {
    /// Event header of the message's transaction
    pub event: EventToken,
    /// Dialog the message belongs to
    pub dialog_id: DialogId,
}

/// Registry of live dialogs and their owning agents
#[async_trait]
pub trait DialogRegistry: Send + Sync {
    /// Address of the live owner of `dialog_id`, if any
    async fn owner(&self, app: &AppId, dialog_id: &DialogId) -> Option<DialogOwner>;

    /// Event and dialog of the transaction a message belongs to
    async fn resolve_message(&self, app: &AppId, message_id: &MessageId) -> Option<MessageContext>;

    /// Every currently tracked (app, dialog) pair
    async fn tracked_dialogs(&self) -> Vec<(AppId, DialogId)>;

    /// Dialogs of `app` sharing `call_id`
    async fn dialogs_for_call(&self, app: &AppId, call_id: &str) -> Vec<DialogId>;
}

/// In-process registry: one spawned agent per dialog
#[derive(Debug)]
pub struct LocalDialogRegistry {
    dialogs: DashMap<(AppId, DialogId), DialogOwner>,
    messages: DashMap<(AppId, MessageId), MessageContext>,
    owner_queue_depth: usize,
}

impl LocalDialogRegistry {
    /// Create an empty registry using the mailbox depth from `config`
    pub fn new(config: &SubscriptionConfig) -> Self {
        Self {
            dialogs: DashMap::new(),
            messages: DashMap::new(),
            owner_queue_depth: config.owner_queue_depth,
        }
    }

    /// Spawn an agent for `record` and make it addressable.
    ///
    /// A dialog registered twice is handed to the new agent; the old one is
    /// asked to stop without waiting on its mailbox.
    pub async fn register_dialog(&self, record: DialogRecord) -> DialogOwner {
        let key = (record.app_id.clone(), record.id.clone());
        let owner = DialogAgent::spawn(record, self.owner_queue_depth);

        if let Some(previous) = self.dialogs.insert(key.clone(), owner.clone()) {
            debug!("Replacing owner of dialog {} ({})", key.1, key.0);
            if !previous.try_stop() {
                warn!("Mailbox of replaced owner of {} is full, dropping its handle", key.1);
            }
        }
        info!("Registered dialog {} for {}", key.1, key.0);
        owner
    }

    /// Stop the owner of a dialog and forget it, along with the messages
    /// that resolve to it
    pub async fn remove_dialog(&self, app: &AppId, dialog_id: &DialogId) -> bool {
        let removed = match self.dialogs.remove(&(app.clone(), dialog_id.clone())) {
            Some((_, owner)) => {
                if !owner.try_stop() {
                    warn!("Mailbox of removed owner of {} is full, dropping its handle", dialog_id);
                }
                info!("Removed dialog {} for {}", dialog_id, app);
                true
            }
            None => false,
        };

        self.messages
            .retain(|(msg_app, _), context| !(msg_app == app && &context.dialog_id == dialog_id));
        removed
    }

    /// Record which transaction context a message belongs to
    pub fn register_message(&self, app: &AppId, message_id: MessageId, context: MessageContext) {
        self.messages.insert((app.clone(), message_id), context);
    }

    pub fn forget_message(&self, app: &AppId, message_id: &MessageId) {
        self.messages.remove(&(app.clone(), message_id.clone()));
    }

    pub fn dialog_count(&self) -> usize {
        self.dialogs.len()
    }
}

impl Default for LocalDialogRegistry {
    fn default() -> Self {
        Self::new(&SubscriptionConfig::default())
    }
}

#[async_trait]
impl DialogRegistry for LocalDialogRegistry {
    async fn owner(&self, app: &AppId, dialog_id: &DialogId) -> Option<DialogOwner> {
        let key = (app.clone(), dialog_id.clone());
        let owner = self.dialogs.get(&key).map(|entry| entry.value().clone())?;

        if owner.is_closed() {
            debug!("Dropping stale owner of dialog {} ({})", dialog_id, app);
            self.dialogs.remove_if(&key, |_, current| current.is_closed());
            return None;
        }
        Some(owner)
    }

    async fn resolve_message(&self, app: &AppId, message_id: &MessageId) -> Option<MessageContext> {
        self.messages
            .get(&(app.clone(), message_id.clone()))
            .map(|entry| entry.value().clone())
    }

    async fn tracked_dialogs(&self) -> Vec<(AppId, DialogId)> {
        let mut dialogs: Vec<(AppId, DialogId)> = self.dialogs.iter().map(|entry| entry.key().clone()).collect();
        dialogs.sort();
        dialogs
    }

    async fn dialogs_for_call(&self, app: &AppId, call_id: &str) -> Vec<DialogId> {
        let mut dialogs: Vec<DialogId> = self
            .dialogs
            .iter()
            .filter(|entry| &entry.key().0 == app && entry.key().1.call_id() == call_id)
            .map(|entry| entry.key().1.clone())
            .collect();
        dialogs.sort();
        dialogs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn dialog(app: &str, tag: &str, call: &str) -> DialogRecord {
        DialogRecord::new(AppId::new(app), DialogId::new(tag, call).unwrap())
    }

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = LocalDialogRegistry::default();
        registry.register_dialog(dialog("app1", "t1", "c1")).await;

        let app = AppId::new("app1");
        let id = DialogId::new("t1", "c1").unwrap();
        assert!(registry.owner(&app, &id).await.is_some());
        assert!(registry.owner(&AppId::new("app2"), &id).await.is_none());
        assert_eq!(registry.dialog_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_dialog() {
        let registry = LocalDialogRegistry::default();
        registry.register_dialog(dialog("app1", "t1", "c1")).await;

        let app = AppId::new("app1");
        let id = DialogId::new("t1", "c1").unwrap();
        assert!(registry.remove_dialog(&app, &id).await);
        assert!(!registry.remove_dialog(&app, &id).await);
        assert!(registry.owner(&app, &id).await.is_none());
    }

    #[tokio::test]
    async fn test_remove_dialog_forgets_its_messages() {
        let registry = LocalDialogRegistry::default();
        registry.register_dialog(dialog("app1", "t1", "c1")).await;

        let app = AppId::new("app1");
        let id = DialogId::new("t1", "c1").unwrap();
        let context = |dialog_id: &DialogId| MessageContext {
            event: EventToken::new("presence"),
            dialog_id: dialog_id.clone(),
        };
        let other = DialogId::new("t2", "c1").unwrap();
        registry.register_message(&app, MessageId::new("msg-1"), context(&id));
        registry.register_message(&app, MessageId::new("msg-2"), context(&other));
        registry.register_message(&AppId::new("app2"), MessageId::new("msg-3"), context(&id));

        assert!(registry.remove_dialog(&app, &id).await);
        assert_eq!(registry.resolve_message(&app, &MessageId::new("msg-1")).await, None);
        assert_eq!(
            registry.resolve_message(&app, &MessageId::new("msg-2")).await,
            Some(context(&other))
        );
        assert_eq!(
            registry.resolve_message(&AppId::new("app2"), &MessageId::new("msg-3")).await,
            Some(context(&id))
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_reregister_with_busy_owner_does_not_block() {
        let registry = LocalDialogRegistry::new(&SubscriptionConfig::default().with_owner_queue_depth(1));
        let app = AppId::new("app1");
        let id = DialogId::new("t1", "c1").unwrap();
        let first = registry.register_dialog(dialog("app1", "t1", "c1")).await;

        // Park the first agent inside a job, then fill its one-slot mailbox
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        first
            .update(move |_| {
                let _ = release_rx.recv();
            })
            .await
            .unwrap();
        first.update(|_| {}).await.unwrap();

        let replaced = tokio::time::timeout(
            Duration::from_secs(1),
            registry.register_dialog(dialog("app1", "t1", "c1").with_remote_tag("fresh")),
        )
        .await;
        tokio_test::assert_ok!(&replaced);

        let owner = registry.owner(&app, &id).await.unwrap();
        let tag = owner
            .inspect(|dialog| dialog.remote_tag.clone(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(tag.as_deref(), Some("fresh"));

        let removed = tokio::time::timeout(Duration::from_secs(1), registry.remove_dialog(&app, &id)).await;
        assert!(matches!(removed, Ok(true)));
        let _ = release_tx.send(());
    }

    #[tokio::test]
    async fn test_dialogs_for_call_filters_app_and_call() {
        let registry = LocalDialogRegistry::default();
        registry.register_dialog(dialog("app1", "t1", "c1")).await;
        registry.register_dialog(dialog("app1", "t2", "c1")).await;
        registry.register_dialog(dialog("app1", "t3", "c2")).await;
        registry.register_dialog(dialog("app2", "t4", "c1")).await;

        let dialogs = registry.dialogs_for_call(&AppId::new("app1"), "c1").await;
        let names: Vec<String> = dialogs.iter().map(|id| id.to_string()).collect();
        assert_eq!(names, vec!["D_t1_c1", "D_t2_c1"]);
        assert_eq!(registry.tracked_dialogs().await.len(), 4);
    }

    #[tokio::test]
    async fn test_message_resolution() {
        let registry = LocalDialogRegistry::default();
        let app = AppId::new("app1");
        let context = MessageContext {
            event: EventToken::new("presence"),
            dialog_id: DialogId::new("t1", "c1").unwrap(),
        };
        registry.register_message(&app, MessageId::new("msg-1"), context.clone());

        assert_eq!(registry.resolve_message(&app, &MessageId::new("msg-1")).await, Some(context));
        registry.forget_message(&app, &MessageId::new("msg-1"));
        assert_eq!(registry.resolve_message(&app, &MessageId::new("msg-1")).await, None);
    }
}
