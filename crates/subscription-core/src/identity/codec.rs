//! Pure encode/decode between event tokens, dialog ids and subscription ids

use tracing::trace;

use super::{DialogId, EventToken, SubscriptionId};
use crate::errors::SubscriptionResult;

/// Encode the subscription id for `event` inside `dialog_id`.
///
/// The event id is the token's `id` parameter, or empty when absent.
/// Fails with `InvalidIdentifier` if the event type or event id contains
/// the reserved separator.
pub fn encode(event: &EventToken, dialog_id: &DialogId) -> SubscriptionResult<SubscriptionId> {
    let id = SubscriptionId::new(
        event.event_type(),
        event.id().unwrap_or_default(),
        dialog_id.clone(),
    )?;
    trace!("Encoded subscription id {} for event {}", id, event);
    Ok(id)
}

/// Recover the dialog id embedded in a subscription id.
///
/// Strips the `U_` prefix and rebuilds `D_<discriminator>_<call-id>` from the
/// two trailing segments.
pub fn decode_dialog_id(subscription_id: &str) -> SubscriptionResult<DialogId> {
    let id: SubscriptionId = subscription_id.parse()?;
    Ok(id.dialog_id().clone())
}
