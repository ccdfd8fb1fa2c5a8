use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::paths::Paths;
use crate::types::{PerformanceMode, PerformanceModeConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default)]
    pub default_mode: PerformanceMode,
    /// Time-to-live for cached responses.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// How often expired cache entries are swept. 0 disables the sweeper.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            default_mode: PerformanceMode::default(),
            cache_ttl_secs: default_cache_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSettings {
    pub max_response_tokens: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModesConfig {
    #[serde(default = "default_fast")]
    pub fast: ModeSettings,
    #[serde(default = "default_balanced")]
    pub balanced: ModeSettings,
    #[serde(default = "default_quality")]
    pub quality: ModeSettings,
}

fn default_fast() -> ModeSettings {
    ModeSettings { max_response_tokens: 40 }
}

fn default_balanced() -> ModeSettings {
    ModeSettings { max_response_tokens: 120 }
}

fn default_quality() -> ModeSettings {
    ModeSettings { max_response_tokens: 400 }
}

impl Default for ModesConfig {
    fn default() -> Self {
        Self {
            fast: default_fast(),
            balanced: default_balanced(),
            quality: default_quality(),
        }
    }
}

impl ModesConfig {
    /// Resolve the full config bound to a mode. Only Quality enables vector scoring.
    pub fn resolve(&self, mode: PerformanceMode) -> PerformanceModeConfig {
        let settings = match mode {
            PerformanceMode::Fast => &self.fast,
            PerformanceMode::Balanced => &self.balanced,
            PerformanceMode::Quality => &self.quality,
        };
        PerformanceModeConfig {
            mode,
            use_vector_scoring: mode == PerformanceMode::Quality,
            max_response_tokens: settings.max_response_tokens,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// Minimum cosine similarity for the Quality-mode fallback to route to a tool.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    0.3
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PokemonToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pokeapi_base")]
    pub api_base: String,
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_pokeapi_base() -> String {
    "https://pokeapi.co/api/v2".to_string()
}

fn default_tool_timeout_secs() -> u64 {
    10
}

impl Default for PokemonToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_base: default_pokeapi_base(),
            timeout_secs: default_tool_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ToolsConfig {
    #[serde(default)]
    pub pokemon: PokemonToolConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_host")]
    pub host: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

fn default_gateway_host() -> String {
    "127.0.0.1".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub modes: ModesConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.classifier.similarity_threshold) {
            return Err(Error::Config(format!(
                "classifier.similarityThreshold must be within 0.0..=1.0, got {}",
                self.classifier.similarity_threshold
            )));
        }
        for mode in PerformanceMode::ALL {
            if self.modes.resolve(mode).max_response_tokens < 10 {
                return Err(Error::Config(format!(
                    "modes.{}.maxResponseTokens must be at least 10",
                    mode
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{
  "agent": { "defaultMode": "quality" },
  "modes": { "fast": { "maxResponseTokens": 10 } }
}"#;
        let cfg: Config = serde_json::from_str(raw).unwrap();
        assert_eq!(cfg.agent.default_mode, PerformanceMode::Quality);
        assert_eq!(cfg.agent.cache_ttl_secs, 3600);
        assert_eq!(cfg.modes.fast.max_response_tokens, 10);
        assert_eq!(cfg.modes.quality.max_response_tokens, 400);
        assert_eq!(cfg.gateway.port, 3000);
        assert!(cfg.tools.pokemon.enabled);
    }

    #[test]
    fn test_resolve_only_quality_uses_vectors() {
        let modes = ModesConfig::default();
        assert!(!modes.resolve(PerformanceMode::Fast).use_vector_scoring);
        assert!(!modes.resolve(PerformanceMode::Balanced).use_vector_scoring);
        assert!(modes.resolve(PerformanceMode::Quality).use_vector_scoring);
        assert!(
            modes.resolve(PerformanceMode::Fast).max_response_tokens
                < modes.resolve(PerformanceMode::Quality).max_response_tokens
        );
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut cfg = Config::default();
        cfg.classifier.similarity_threshold = 1.5;
        assert!(matches!(cfg.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path().to_path_buf());
        let mut cfg = Config::default();
        cfg.gateway.port = 8088;
        cfg.save(&paths.config_file()).unwrap();

        let loaded = Config::load_or_default(&paths).unwrap();
        assert_eq!(loaded.gateway.port, 8088);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::with_base(dir.path().join("missing"));
        let cfg = Config::load_or_default(&paths).unwrap();
        assert_eq!(cfg.agent.default_mode, PerformanceMode::Balanced);
    }
}
