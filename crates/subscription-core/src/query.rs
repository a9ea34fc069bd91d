//! Read-only queries executed by a dialog's owning agent
//!
//! [`DialogQueryClient::query`] is the only way this crate reads dialog
//! state. The projector runs inside the owner, between two of the owner's own
//! mutations, so whatever it returns is a consistent view of that dialog.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::dialog::{DialogField, DialogFieldValue, DialogRecord};
use crate::errors::{SubscriptionError, SubscriptionResult};
use crate::identity::{AppId, DialogId};
use crate::registry::DialogRegistry;

/// Client running projectors against dialog owners
#[derive(Clone)]
pub struct DialogQueryClient {
    registry: Arc<dyn DialogRegistry>,
    timeout: Duration,
}

impl std::fmt::Debug for DialogQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogQueryClient")
            .field("registry", &"Arc<dyn DialogRegistry>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl DialogQueryClient {
    pub fn new(registry: Arc<dyn DialogRegistry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn registry(&self) -> &Arc<dyn DialogRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run `projector` inside the owner of `dialog_id`.
    ///
    /// Returns `NotFound` when no live owner exists and `Timeout` when the
    /// owner does not answer within the configured bound.
    pub async fn query<F, R>(&self, app: &AppId, dialog_id: &DialogId, projector: F) -> SubscriptionResult<R>
    where
        F: FnOnce(&DialogRecord) -> R + Send + 'static,
        R: Send + 'static,
    {
        let Some(owner) = self.registry.owner(app, dialog_id).await else {
            debug!("No owner for dialog {} ({})", dialog_id, app);
            return Err(SubscriptionError::not_found(format!("dialog {}", dialog_id)));
        };

        owner.inspect(projector, self.timeout).await.map_err(|e| {
            match &e {
                SubscriptionError::Timeout { .. } => {
                    warn!("Owner of dialog {} ({}) did not answer within {:?}", dialog_id, app, self.timeout)
                }
                _ => debug!("Query on dialog {} ({}) failed: {}", dialog_id, app, e),
            }
            e
        })
    }

    /// Read one named field of a dialog
    pub async fn dialog_field(
        &self,
        app: &AppId,
        dialog_id: &DialogId,
        field: DialogField,
    ) -> SubscriptionResult<DialogFieldValue> {
        self.query(app, dialog_id, move |dialog| dialog.field(field)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::DialogOwner;
    use crate::registry::LocalDialogRegistry;

    #[tokio::test]
    async fn test_query_reads_remote_tag() {
        let registry = Arc::new(LocalDialogRegistry::default());
        let dialog_id = DialogId::new("tag1", "call1").unwrap();
        registry
            .register_dialog(DialogRecord::new(AppId::new("app1"), dialog_id.clone()).with_remote_tag("peer1"))
            .await;

        let client = DialogQueryClient::new(registry, Duration::from_secs(1));
        let value = client
            .dialog_field(&AppId::new("app1"), &dialog_id, DialogField::RemoteTag)
            .await
            .unwrap();
        assert_eq!(value, DialogFieldValue::Tag(Some("peer1".to_string())));
    }

    #[tokio::test]
    async fn test_query_unknown_dialog_is_not_found() {
        let client = DialogQueryClient::new(Arc::new(LocalDialogRegistry::default()), Duration::from_secs(1));
        let result = client
            .query(&AppId::new("app1"), &DialogId::new("x", "y").unwrap(), |dialog| dialog.subscriptions.len())
            .await;
        assert!(result.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_query_after_owner_exit_is_not_found() {
        let registry = Arc::new(LocalDialogRegistry::default());
        let dialog_id = DialogId::new("tag1", "call1").unwrap();
        let owner: DialogOwner = registry
            .register_dialog(DialogRecord::new(AppId::new("app1"), dialog_id.clone()))
            .await;
        owner.stop().await;
        while !owner.is_closed() {
            tokio::task::yield_now().await;
        }

        let client = DialogQueryClient::new(registry, Duration::from_secs(1));
        let result = client.query(&AppId::new("app1"), &dialog_id, |dialog| dialog.id.clone()).await;
        assert!(result.unwrap_err().is_not_found());
    }
}
