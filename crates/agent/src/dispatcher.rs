use taskroute_core::{ClassificationResult, Error, Intent, PerformanceModeConfig, Result};
use taskroute_tools::ToolRegistry;
use tracing::{debug, warn};

use crate::responder::GeneralResponder;

/// Turns a routing decision into a response string.
pub struct ToolDispatcher {
    tools: ToolRegistry,
    responder: GeneralResponder,
}

impl ToolDispatcher {
    pub fn new(tools: ToolRegistry) -> Self {
        let responder = GeneralResponder::new(tools.tools_info());
        Self { tools, responder }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn dispatch(
        &self,
        result: &ClassificationResult,
        query: &str,
        config: &PerformanceModeConfig,
    ) -> Result<String> {
        match result.intent {
            Intent::Tool => {
                let name = result.tool_name.as_deref().ok_or_else(|| {
                    Error::Internal("tool intent without a tool name".to_string())
                })?;
                self.run_tool(name, query).await
            }
            Intent::General => self.responder.respond(query, config.max_response_tokens),
        }
    }

    async fn run_tool(&self, name: &str, query: &str) -> Result<String> {
        let tool = self
            .tools
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("tool {} not found", name)))?;
        let timeout = tool.timeout();
        debug!(tool = %name, timeout_ms = timeout.as_millis() as u64, "Dispatching to tool");

        // Spawned so the provider future is dropped on timeout via abort.
        let owned_query = query.to_string();
        let mut handle = tokio::spawn(async move { tool.execute(&owned_query).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(e @ Error::Execution { .. }))) => Err(e),
            Ok(Ok(Err(e))) => Err(Error::execution(name, e.to_string())),
            Ok(Err(join_err)) => {
                warn!(tool = %name, error = %join_err, "Tool task failed");
                Err(Error::execution(name, format!("tool task failed: {}", join_err)))
            }
            Err(_) => {
                handle.abort();
                warn!(tool = %name, "Tool timed out");
                Err(Error::execution(
                    name,
                    format!("timed out after {}ms", timeout.as_millis()),
                ))
            }
        }
    }
}
