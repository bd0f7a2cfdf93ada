pub mod agent_session;
pub mod completion;
pub mod metrics;
pub mod normalizer;
pub mod providers;

pub use agent_session::AgentSession;
pub use completion::{CompletionClient, COMPLETION_FALLBACK};
pub use metrics::{get_metrics, init_metrics};
pub use normalizer::{normalize, AgentReply, NO_RESPONSE};
