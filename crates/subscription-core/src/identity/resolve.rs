//! Identity resolution that needs the registry
//!
//! - [`resolve`]: canonical subscription id from a [`SubscriptionRef`]
//! - [`remote_id`]: the id the peer uses for the same subscription

use tracing::debug;

use super::{encode, AppId, SubscriptionId, SubscriptionRef};
use crate::dialog::{DialogField, DialogFieldValue};
use crate::errors::{SubscriptionError, SubscriptionResult};
use crate::query::DialogQueryClient;
use crate::registry::DialogRegistry;

/// Resolve what the caller handed us to a subscription id.
///
/// Subscription ids are taken verbatim (after shape validation). Message ids
/// cost one registry round trip for the message's event and dialog. Any
/// failure yields `None`.
pub async fn resolve(
    registry: &dyn DialogRegistry,
    app: &AppId,
    reference: &SubscriptionRef,
) -> Option<SubscriptionId> {
    match reference {
        SubscriptionRef::Subscription(text) => match text.parse::<SubscriptionId>() {
            Ok(id) => Some(id),
            Err(e) => {
                debug!("Unresolvable subscription id for {}: {}", app, e);
                None
            }
        },
        SubscriptionRef::Message(message_id) => {
            let Some(context) = registry.resolve_message(app, message_id).await else {
                debug!("Unknown message {} for {}", message_id, app);
                return None;
            };
            match encode(&context.event, &context.dialog_id) {
                Ok(id) => Some(id),
                Err(e) => {
                    debug!("Message {} does not name an addressable subscription: {}", message_id, e);
                    None
                }
            }
        }
    }
}

/// Derive the peer-side id of a subscription.
///
/// Resolves `reference` (one registry round trip for a message id), then
/// asks the owner of the resolved dialog for its remote tag. The second step
/// depends on the first and runs strictly after it.
pub async fn remote_id(
    client: &DialogQueryClient,
    app: &AppId,
    reference: &SubscriptionRef,
) -> SubscriptionResult<SubscriptionId> {
    let Some(local) = resolve(client.registry().as_ref(), app, reference).await else {
        return Err(SubscriptionError::not_found(format!("subscription {}", reference)));
    };

    let remote_tag = match client.dialog_field(app, local.dialog_id(), DialogField::RemoteTag).await? {
        DialogFieldValue::Tag(Some(tag)) => tag,
        _ => {
            return Err(SubscriptionError::not_found(format!(
                "remote tag of dialog {}",
                local.dialog_id()
            )))
        }
    };

    local.with_discriminator(remote_tag)
}
