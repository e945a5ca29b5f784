//! Configuration system for Limestone.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> environment -> explicit overrides.

use crate::features::FeatureGroups;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimestoneConfig {
    /// Original-feature layout of the preprocessing pipeline.
    #[serde(default)]
    pub features: FeatureGroups,
    /// Where fitted pipelines are loaded from.
    #[serde(default)]
    pub pipelines: PipelineStoreConfig,
    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Fitted pipeline store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStoreConfig {
    /// Directory holding `full_pipeline_<name>.json` exports.
    #[serde(default = "default_pipelines_dir")]
    pub dir: PathBuf,
    /// Pipeline names to load at startup.
    #[serde(default = "default_pipeline_names")]
    pub names: Vec<String>,
}

impl Default for PipelineStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_pipelines_dir(),
            names: default_pipeline_names(),
        }
    }
}

fn default_pipelines_dir() -> PathBuf {
    PathBuf::from("assets/pipes")
}

fn default_pipeline_names() -> Vec<String> {
    ["rf", "knn", "gb", "dt"].iter().map(|s| s.to_string()).collect()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed by CORS.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    [
        "http://localhost:5173",
        "http://localhost:3000",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Load configuration with layered sources.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&LimestoneConfig>,
) -> Result<LimestoneConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(LimestoneConfig::default()));

    // User-level config
    if let Some(dirs) = directories::ProjectDirs::from("dev", "limestone", "limestone") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (LIMESTONE_SERVER__PORT, LIMESTONE_PIPELINES__DIR, etc.)
    figment = figment.merge(Env::prefixed("LIMESTONE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// `<workspace>/.limestone/config.toml`
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".limestone").join("config.toml")
}
