//! HTTP handlers for the assistant service.

pub mod completion;
pub mod grounding;
pub mod health;

pub use completion::{chat, completion, root};
pub use grounding::bing_grounding;
pub use health::{health_check, metrics_endpoint, readiness_check};
