//! Enumeration of subscriptions across tracked dialogs
//!
//! Each dialog is read atomically through its owner; the enumeration as a
//! whole is not. Dialogs created or removed while a scan runs may or may not
//! show up, and a dialog that vanishes between listing and querying simply
//! contributes nothing.

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::dialog::{DialogField, DialogFieldValue};
use crate::errors::SubscriptionError;
use crate::identity::{AppId, DialogId, SubscriptionId};
use crate::query::DialogQueryClient;

/// Flattens per-dialog subscription lists
#[derive(Debug, Clone)]
pub struct RegistryScanner {
    client: DialogQueryClient,
    concurrency: usize,
}

impl RegistryScanner {
    /// `concurrency` bounds the per-dialog queries in flight
    pub fn new(client: DialogQueryClient, concurrency: usize) -> Self {
        Self {
            client,
            concurrency: concurrency.max(1),
        }
    }

    /// Every subscription of every tracked dialog, with its application
    pub async fn get_all(&self) -> Vec<(AppId, SubscriptionId)> {
        let dialogs = self.client.registry().tracked_dialogs().await;
        let dialog_count = dialogs.len();

        let lists: Vec<Vec<(AppId, SubscriptionId)>> = stream::iter(dialogs)
            .map(|(app, dialog_id)| async move {
                self.dialog_subscriptions(&app, &dialog_id)
                    .await
                    .into_iter()
                    .map(|id| (app.clone(), id))
                    .collect::<Vec<_>>()
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let all: Vec<_> = lists.into_iter().flatten().collect();
        debug!("Scanned {} dialogs, found {} subscriptions", dialog_count, all.len());
        all
    }

    /// Subscriptions of the dialogs of `app` belonging to `call_id`
    pub async fn get_all_for_call(&self, app: &AppId, call_id: &str) -> Vec<SubscriptionId> {
        let dialogs = self.client.registry().dialogs_for_call(app, call_id).await;

        let lists: Vec<Vec<SubscriptionId>> = stream::iter(dialogs)
            .map(|dialog_id| async move { self.dialog_subscriptions(app, &dialog_id).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        lists.into_iter().flatten().collect()
    }

    async fn dialog_subscriptions(&self, app: &AppId, dialog_id: &DialogId) -> Vec<SubscriptionId> {
        match self.client.dialog_field(app, dialog_id, DialogField::SubscriptionIds).await {
            Ok(DialogFieldValue::SubscriptionIds(ids)) => ids,
            Ok(other) => {
                warn!("Unexpected subscription list from dialog {}: {:?}", dialog_id, other);
                Vec::new()
            }
            Err(SubscriptionError::NotFound { .. }) => {
                debug!("Dialog {} ({}) went away during scan", dialog_id, app);
                Vec::new()
            }
            Err(e) => {
                warn!("Skipping dialog {} ({}) during scan: {}", dialog_id, app, e);
                Vec::new()
            }
        }
    }
}
