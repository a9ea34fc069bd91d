//! Owner-side dialog structures
//!
//! - [`DialogRecord`]: the subscription-relevant state of one dialog
//! - [`DialogOwner`]: handle onto the agent owning a dialog
//! - [`DialogAgent`]: the agent task itself, for in-process registries

pub mod agent;
pub mod record;

pub use agent::{DialogAgent, DialogOwner, InspectFn, OwnerRequest, UpdateFn};
pub use record::{DialogField, DialogFieldValue, DialogRecord};
