pub mod pokemon;
pub mod registry;

use async_trait::async_trait;
use std::time::Duration;
use taskroute_core::{CapabilityDescriptor, Result};

pub use pokemon::PokemonInfoTool;
pub use registry::ToolRegistry;

/// Default upper bound on a single provider invocation.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// A named, self-contained responder the agent can route queries to.
///
/// Implementations fail with `Error::Execution` when the query cannot be
/// answered (unknown lookup key, upstream failure, ...).
#[async_trait]
pub trait CapabilityProvider: Send + Sync {
    fn descriptor(&self) -> CapabilityDescriptor;

    /// Upper bound applied by the dispatcher around `execute`.
    fn timeout(&self) -> Duration {
        DEFAULT_TOOL_TIMEOUT
    }

    async fn execute(&self, query: &str) -> Result<String>;
}
