use std::collections::HashMap;
use std::sync::Arc;
use taskroute_core::{CapabilityDescriptor, Config, Error, Result, ToolInfo};
use tracing::{debug, info};

use crate::pokemon::PokemonInfoTool;
use crate::CapabilityProvider;

/// Ordered set of capability providers.
///
/// Registration order is significant: the classifier tests providers in this
/// order and the first match wins.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn CapabilityProvider>>,
    descriptors: Vec<CapabilityDescriptor>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers enabled in `config`.
    pub fn with_defaults(config: &Config) -> Result<Self> {
        let mut registry = Self::new();

        if config.tools.pokemon.enabled {
            registry.register(Arc::new(PokemonInfoTool::new(&config.tools.pokemon)?))?;
        }

        info!(count = registry.len(), "Built-in tools registered");
        Ok(registry)
    }

    /// Register a provider. Names must be unique.
    pub fn register(&mut self, tool: Arc<dyn CapabilityProvider>) -> Result<()> {
        let mut descriptor = tool.descriptor();
        let name = descriptor.name.trim().to_string();
        if name.is_empty() {
            return Err(Error::Validation("Tool name must not be empty".to_string()));
        }
        if self.index.contains_key(&name) {
            return Err(Error::Validation(format!("Tool '{}' is already registered", name)));
        }

        debug!(name = %name, aliases = descriptor.aliases.len(), "Registering tool");
        descriptor.name = name.clone();
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        self.descriptors.push(descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn CapabilityProvider>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> &[CapabilityDescriptor] {
        &self.descriptors
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.descriptors.iter().map(|d| d.name.clone()).collect()
    }

    pub fn tools_info(&self) -> Vec<ToolInfo> {
        self.descriptors
            .iter()
            .map(|d| ToolInfo {
                name: d.name.clone(),
                description: d.description.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
