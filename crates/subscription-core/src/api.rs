//! Subscription query API
//!
//! [`SubscriptionApi`] is the surface the signaling stack calls into:
//!
//! | Operation | Method |
//! |---|---|
//! | `field(app, id, field)` | [`SubscriptionApi::field`] |
//! | `fields(app, id, fields)` | [`SubscriptionApi::fields`] |
//! | `id(app, idOrMsgId)` | [`SubscriptionApi::id`] |
//! | `getSubscription(app, id)` | [`SubscriptionApi::get_subscription`] |
//! | `getAll()` | [`SubscriptionApi::get_all`] |
//! | `getAll(app, callId)` | [`SubscriptionApi::get_all_for_call`] |
//! | `remoteId(app, id)` | [`SubscriptionApi::remote_id`] |
//!
//! Every operation is read-only and single-shot. Errors come back as plain
//! values: malformed identifiers surface as `NotFound`, unknown field names
//! as `InvalidField`, unresponsive owners as `Timeout`.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rvoip_subscription_core::{
//!     AppId, LocalDialogRegistry, SubscriptionApi, SubscriptionConfig, SubscriptionRef,
//! };
//!
//! # async fn example() -> rvoip_subscription_core::SubscriptionResult<()> {
//! let config = SubscriptionConfig::default();
//! let registry = Arc::new(LocalDialogRegistry::new(&config));
//! let api = SubscriptionApi::new(registry, config)?;
//!
//! let app = AppId::new("presence-agent");
//! let reference = SubscriptionRef::Subscription("U_dialog_abc123_tag77_call42".into());
//! let expires = api.field(&app, &reference, "expires").await?;
//! println!("expires in {:?}", expires);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;

use crate::config::SubscriptionConfig;
use crate::errors::{SubscriptionError, SubscriptionResult};
use crate::fields::{project, project_many, FieldValue, SubscriptionField};
use crate::identity::{self, AppId, SubscriptionId, SubscriptionRef};
use crate::query::DialogQueryClient;
use crate::registry::DialogRegistry;
use crate::scanner::RegistryScanner;
use crate::subscription::SubscriptionSnapshot;

/// Read-only access to subscriptions nested in dialogs
#[derive(Debug, Clone)]
pub struct SubscriptionApi {
    client: DialogQueryClient,
    scanner: RegistryScanner,
    config: SubscriptionConfig,
}

impl SubscriptionApi {
    /// Create the API over `registry`
    pub fn new(registry: Arc<dyn DialogRegistry>, config: SubscriptionConfig) -> SubscriptionResult<Self> {
        config.validate()?;
        let client = DialogQueryClient::new(registry, config.query_timeout);
        let scanner = RegistryScanner::new(client.clone(), config.scan_concurrency);
        Ok(Self {
            client,
            scanner,
            config,
        })
    }

    pub fn config(&self) -> &SubscriptionConfig {
        &self.config
    }

    /// Canonical subscription id for a subscription or message reference
    pub async fn id(&self, app: &AppId, reference: &SubscriptionRef) -> SubscriptionResult<SubscriptionId> {
        identity::resolve(self.client.registry().as_ref(), app, reference)
            .await
            .ok_or_else(|| SubscriptionError::not_found(format!("subscription {}", reference)))
    }

    /// Snapshot of the whole subscription
    pub async fn get_subscription(
        &self,
        app: &AppId,
        reference: &SubscriptionRef,
    ) -> SubscriptionResult<SubscriptionSnapshot> {
        let id = self.id(app, reference).await?;
        self.snapshot(app, id).await
    }

    /// One field of a subscription
    pub async fn field(&self, app: &AppId, reference: &SubscriptionRef, name: &str) -> SubscriptionResult<FieldValue> {
        let id = self.id(app, reference).await?;
        let field: SubscriptionField = name.parse()?;
        let snapshot = self.snapshot(app, id).await?;
        Ok(project(&snapshot, field))
    }

    /// Several fields of a subscription, in the order requested.
    ///
    /// The outer result fails only when the subscription cannot be read;
    /// unknown field names fail their own entry.
    pub async fn fields<S: AsRef<str>>(
        &self,
        app: &AppId,
        reference: &SubscriptionRef,
        names: &[S],
    ) -> SubscriptionResult<Vec<(String, SubscriptionResult<FieldValue>)>> {
        let id = self.id(app, reference).await?;
        let snapshot = self.snapshot(app, id).await?;
        Ok(project_many(&snapshot, names))
    }

    /// Every subscription in every tracked dialog
    pub async fn get_all(&self) -> Vec<(AppId, SubscriptionId)> {
        self.scanner.get_all().await
    }

    /// Every subscription in the dialogs of `app` belonging to `call_id`
    pub async fn get_all_for_call(&self, app: &AppId, call_id: &str) -> Vec<SubscriptionId> {
        self.scanner.get_all_for_call(app, call_id).await
    }

    /// Id of the same subscription as seen by the peer
    pub async fn remote_id(&self, app: &AppId, reference: &SubscriptionRef) -> SubscriptionResult<SubscriptionId> {
        identity::remote_id(&self.client, app, reference)
            .await
            .map_err(SubscriptionError::at_boundary)
    }

    /// Capture a snapshot inside the owner of the subscription's dialog
    async fn snapshot(&self, app: &AppId, id: SubscriptionId) -> SubscriptionResult<SubscriptionSnapshot> {
        let dialog_id = id.dialog_id().clone();
        let target = id.clone();

        let captured = self
            .client
            .query(app, &dialog_id, move |dialog| {
                let now = Instant::now();
                dialog
                    .find_subscription(&target)
                    .map(|record| SubscriptionSnapshot::capture(&dialog.app_id, &dialog.id, record, now))
            })
            .await
            .map_err(SubscriptionError::at_boundary)?;

        match captured {
            Some(snapshot) => snapshot.map_err(SubscriptionError::at_boundary),
            None => {
                debug!("Subscription {} not present in dialog {}", id, dialog_id);
                Err(SubscriptionError::not_found(format!("subscription {}", id)))
            }
        }
    }
}
