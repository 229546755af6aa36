use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::AppResult;
use crate::types::AbcParams;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "SimulationSettings::default_node_count")]
    pub node_count: usize,
    #[serde(default = "SimulationSettings::default_max_node_count")]
    pub max_node_count: usize,
    /// Artificial delay between pressing Run and the lattice appearing.
    #[serde(default = "SimulationSettings::default_latency_ms")]
    pub latency_ms: u64,
    #[serde(default)]
    pub params: AbcParams,
}

impl SimulationSettings {
    fn default_node_count() -> usize {
        800
    }
    fn default_max_node_count() -> usize {
        10_000
    }
    fn default_latency_ms() -> u64 {
        600
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            node_count: Self::default_node_count(),
            max_node_count: Self::default_max_node_count(),
            latency_ms: Self::default_latency_ms(),
            params: AbcParams::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantSettings {
    #[serde(default = "AssistantSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "AssistantSettings::default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "AssistantSettings::default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "AssistantSettings::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "AssistantSettings::default_thinking_budget")]
    pub thinking_budget: u32,
    #[serde(default = "AssistantSettings::default_web_search")]
    pub web_search: bool,
}

impl AssistantSettings {
    fn default_endpoint() -> String {
        "https://generativelanguage.googleapis.com/v1beta".to_owned()
    }
    fn default_model() -> String {
        "gemini-3-pro-preview".to_owned()
    }
    fn default_api_key_env() -> String {
        "GEMINI_API_KEY".to_owned()
    }
    fn default_timeout_secs() -> u64 {
        120
    }
    fn default_thinking_budget() -> u32 {
        32_768
    }
    fn default_web_search() -> bool {
        true
    }
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            model: Self::default_model(),
            api_key_env: Self::default_api_key_env(),
            timeout_secs: Self::default_timeout_secs(),
            thinking_budget: Self::default_thinking_budget(),
            web_search: Self::default_web_search(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "ExportSettings::default_directory")]
    pub directory: PathBuf,
}

impl ExportSettings {
    fn default_directory() -> PathBuf {
        PathBuf::from(".")
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub assistant: AssistantSettings,
    #[serde(default)]
    pub export: ExportSettings,
}

impl AppConfig {
    pub fn load(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Reads `path`, falling back to defaults on any error.
    ///
    /// A missing file is created with every default written out commented, so it
    /// documents the available keys without pinning them.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            return match Self::load(path) {
                Ok(cfg) => {
                    info!(path = %path.display(), "loaded config");
                    cfg
                }
                Err(err) => {
                    warn!(path = %path.display(), %err, "failed to load config, using defaults");
                    Self::default()
                }
            };
        }

        let default_cfg = Self::default();
        match default_cfg.commented_toml() {
            Ok(text) => {
                if let Err(err) = fs::write(path, text) {
                    warn!(path = %path.display(), %err, "failed to write default config");
                } else {
                    info!(path = %path.display(), "wrote default config");
                }
            }
            Err(err) => warn!(%err, "failed to serialize default config"),
        }
        default_cfg
    }

    fn commented_toml(&self) -> AppResult<String> {
        let text = toml::to_string_pretty(self)?;
        let mut commented = String::new();
        for line in text.lines() {
            let trimmed = line.trim();
            if !trimmed.is_empty() && !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
                commented.push_str("# ");
            }
            commented.push_str(line);
            commented.push('\n');
        }
        Ok(commented)
    }
}
