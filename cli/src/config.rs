//! Configuration management for the voxclone CLI.
//!
//! Configuration is stored in `~/.voxclone/{app_name}/config.yaml` and
//! holds named contexts, similar to kubectl's context management.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use voxclone_embed::EncoderConfig;
use voxclone_pipeline::{PipelineConfig, SynthesisBackend};
use voxclone_voiceprint::{CombineMethod, Thresholds};

use crate::settings::{NormalizerSettings, SynthesizerSettings};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".voxclone";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// Overrides [`Context::api_key`].
pub const ENV_API_KEY: &str = "FISH_AUDIO_API_KEY";
/// Overrides [`Context::base_url`].
pub const ENV_BASE_URL: &str = "FISH_AUDIO_API_URL";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// One named set of collaborators and credentials.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Context name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Fish Audio API key.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Fish Audio base URL (optional, uses default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Request timeout in seconds (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: i32,

    /// Maximum number of retries (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_retries: i32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backend: Option<SynthesisBackend>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoder: Option<EncoderConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalizer: Option<NormalizerSettings>,

    /// Local engine, for the `local_engine` backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesizer: Option<SynthesizerSettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thresholds: Option<Thresholds>,

    /// Combination of per-reference embeddings (default: weighted_average).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combine_method: Option<CombineMethod>,

    /// Minimum pairwise similarity between references (default: 0.6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency_threshold: Option<f32>,

    /// Keep job artifacts here instead of a temporary directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or current context if name is empty.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Lists all context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Context {
    /// Applies `FISH_AUDIO_API_KEY` / `FISH_AUDIO_API_URL` from the process
    /// environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Context::apply_env`] with a custom lookup. Empty values
    /// are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.is_empty()) {
            self.api_key = key;
        }
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
    }

    pub fn backend(&self) -> SynthesisBackend {
        self.backend.unwrap_or_default()
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds.unwrap_or_default()
    }

    /// Pipeline settings carried by this context.
    pub fn pipeline_config(&self) -> PipelineConfig {
        let mut cfg = PipelineConfig::default()
            .with_backend(self.backend())
            .with_thresholds(self.thresholds());
        if let Some(method) = &self.combine_method {
            cfg = cfg.with_combine_method(method.clone());
        }
        if let Some(threshold) = self.consistency_threshold {
            cfg = cfg.with_consistency_threshold(threshold);
        }
        if let Some(dir) = &self.artifacts_dir {
            cfg = cfg.with_artifacts_dir(dir.clone());
        }
        cfg
    }
}

/// Loads configuration for the specified app, creating an empty file on
/// first use.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Masks the API key for display.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}
