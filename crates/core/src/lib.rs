pub mod capability;
pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use capability::CapabilityDescriptor;
pub use config::Config;
pub use error::{Error, Result};
pub use paths::Paths;
pub use types::{
    AgentStatus, CacheStats, ClassificationResult, Intent, PerformanceMode,
    PerformanceModeConfig, TaskResponse, ToolInfo,
};
