//! `netmon-core` -- bandwidth monitoring domain logic.
//!
//! Holds everything the agent needs to decide whether the link is
//! degraded and whether an alert may be sent. Measurement and delivery
//! are reached through the [`monitoring::Sampler`] and
//! [`monitoring::Notifier`] traits so the decision logic can be tested
//! without a network.

pub mod bandwidth;
pub mod error;
pub mod monitoring;
pub mod template;
pub mod types;
