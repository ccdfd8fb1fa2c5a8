use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Named configuration trading classification recall for latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    Fast,
    #[default]
    Balanced,
    Quality,
}

impl PerformanceMode {
    pub const ALL: [PerformanceMode; 3] = [
        PerformanceMode::Fast,
        PerformanceMode::Balanced,
        PerformanceMode::Quality,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PerformanceMode::Fast => "fast",
            PerformanceMode::Balanced => "balanced",
            PerformanceMode::Quality => "quality",
        }
    }
}

impl fmt::Display for PerformanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fast" => Ok(PerformanceMode::Fast),
            "balanced" => Ok(PerformanceMode::Balanced),
            "quality" => Ok(PerformanceMode::Quality),
            other => Err(Error::Validation(format!(
                "Unknown performance mode '{}': expected fast, balanced or quality",
                other
            ))),
        }
    }
}

/// The configuration bound to the active performance mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceModeConfig {
    pub mode: PerformanceMode,
    pub use_vector_scoring: bool,
    pub max_response_tokens: usize,
}

/// Routing decision for an input query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Tool,
    General,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ClassificationResult {
    pub fn tool(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            intent: Intent::Tool,
            tool_name: Some(name.into()),
            confidence: Some(confidence),
        }
    }

    pub fn general() -> Self {
        Self {
            intent: Intent::General,
            tool_name: None,
            confidence: None,
        }
    }

    pub fn is_tool(&self) -> bool {
        self.intent == Intent::Tool
    }
}

/// What a caller receives from `process_task`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskResponse {
    pub result: String,
    #[serde(rename = "processing_time")]
    pub processing_time_ms: u64,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub initialized: bool,
    pub performance_mode: PerformanceMode,
    pub tools_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub keys: usize,
}

impl CacheStats {
    /// hits / (hits + misses), or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
