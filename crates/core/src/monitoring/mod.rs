//! Link degradation monitoring (alerting state machine).
//!
//! [`AlertState`] is the pure transition logic; [`AlertEvaluator`] wraps it
//! behind a single mutex together with the external [`Sampler`] and
//! [`Notifier`] so that overlapping checks can never race on the counter or
//! the cooldown timestamp.

pub mod config;
pub mod evaluator;
pub mod state;
pub mod traits;

pub use config::MonitorConfig;
pub use evaluator::{AlertEvaluator, CheckError, Outcome};
pub use state::{AlertState, Verdict};
pub use traits::{Notifier, NotifyError, SampleError, Sampler};
