//! # RVOIP Subscription Core
//!
//! Identity scheme and read-query layer for RFC 6665 event subscriptions
//! nested inside SIP dialogs.
//!
//! ## Overview
//!
//! A subscription lives inside a dialog, and every dialog is owned by exactly
//! one agent that performs all of its reads and writes. This crate never
//! touches that state directly. It:
//!
//! - encodes and decodes subscription ids (`U_<event>_<id>_<tag>_<call-id>`)
//!   to and from their dialog ids (`D_<tag>_<call-id>`)
//! - captures consistent snapshots of a subscription by running a read-only
//!   projector inside the dialog's owner
//! - enumerates subscriptions across all tracked dialogs
//!
//! ## Architecture
//!
//! ```text
//!            SubscriptionApi
//!           /       |       \
//!   identity   DialogQueryClient   RegistryScanner
//!   (codec)          |                  |
//!                DialogRegistry ◀───────┘
//!                    |
//!              DialogOwner ──▶ DialogAgent (owns DialogRecord)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio::time::Instant;
//! use rvoip_subscription_core::{
//!     AppId, DialogId, DialogRecord, EventToken, LocalDialogRegistry, SubscriptionApi,
//!     SubscriptionClass, SubscriptionConfig, SubscriptionRecord, SubscriptionRef,
//! };
//!
//! # async fn example() -> rvoip_subscription_core::SubscriptionResult<()> {
//! let config = SubscriptionConfig::default();
//! let registry = Arc::new(LocalDialogRegistry::new(&config));
//!
//! let app = AppId::new("presence-agent");
//! let dialog = DialogRecord::new(app.clone(), DialogId::new("tag77", "call42")?)
//!     .with_remote_tag("peer9")
//!     .with_subscription(SubscriptionRecord::new(
//!         EventToken::new("dialog").with_id("abc123"),
//!         SubscriptionClass::Initiator,
//!         Instant::now() + Duration::from_secs(3600),
//!     ));
//! registry.register_dialog(dialog).await;
//!
//! let api = SubscriptionApi::new(registry, config)?;
//! for (app, id) in api.get_all().await {
//!     let remote = api.remote_id(&app, &SubscriptionRef::from(&id)).await?;
//!     println!("{}: {} (peer sees {})", app, id, remote);
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod dialog;
pub mod errors;
pub mod fields;
pub mod identity;
pub mod query;
pub mod registry;
pub mod scanner;
pub mod subscription;

pub use api::SubscriptionApi;
pub use config::SubscriptionConfig;
pub use dialog::{DialogAgent, DialogField, DialogFieldValue, DialogOwner, DialogRecord, OwnerRequest};
pub use errors::{SubscriptionError, SubscriptionResult};
pub use fields::{project, project_many, project_named, FieldValue, SubscriptionField};
pub use identity::{
    decode_dialog_id, encode, AppId, DialogId, EventToken, MessageId, SubscriptionId, SubscriptionRef, SEPARATOR,
};
pub use query::DialogQueryClient;
pub use registry::{DialogRegistry, LocalDialogRegistry, MessageContext};
pub use scanner::RegistryScanner;
pub use subscription::{
    SubscriptionClass, SubscriptionRecord, SubscriptionSnapshot, SubscriptionStatus, TerminationReason,
};
