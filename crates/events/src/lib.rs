//! Netmon alert delivery.
//!
//! [`WebhookDelivery`] implements [`netmon_core::monitoring::Notifier`] by
//! POSTing the rendered alert message to an external webhook.

pub mod delivery;

pub use delivery::webhook::{WebhookDelivery, WebhookError};
