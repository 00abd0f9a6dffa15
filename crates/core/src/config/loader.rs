//! Configuration file loader for the `.sdlc-factory/` directory structure.
//!
//! This module provides functionality to load and parse all configuration
//! files from the `.sdlc-factory/` directory, including:
//! - `config.toml`: Global settings
//! - `agents/*.md`: Stage agent profiles with YAML front matter
//!
//! Environment variables are applied last:
//!
//! | Variable          | Effect                                   |
//! |-------------------|------------------------------------------|
//! | `LLM_PROVIDER`    | provider (`backend`, `ollama`, ...)      |
//! | `LLM_MODEL`       | default model                            |
//! | `LLM_BASE_URL`    | endpoint root for any provider           |
//! | `OLLAMA_BASE_URL` | endpoint root when the provider is Ollama|
//! | `OPENAI_BASE_URL` | endpoint root when the provider is OpenAI|

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::models::{AppConfig, FACTORY_DIR};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use sf_protocol::agent_models::AgentProfile;
use sf_protocol::config_models::{GlobalConfig, ProviderKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Loads all configuration from the `.sdlc-factory/` directory and the
/// process environment.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.sdlc-factory/` folder
///
/// # Returns
///
/// An `AppConfig` with every stage profile present. Missing directories or
/// files fall back to defaults rather than erroring.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML or Markdown front matter)
/// - Two agent files claim the same stage
/// - An `LLM_*` environment variable holds an unusable value
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    load_config_with_env(root, |var| std::env::var(var).ok()).await
}

/// Like [`load_config`], reading overrides through `env` instead of the
/// process environment.
pub async fn load_config_with_env<F>(root: &Path, env: F) -> ConfigResult<AppConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let factory_dir = root.join(FACTORY_DIR);
    let mut config = AppConfig::builtin(root)?;

    if factory_dir.exists() {
        config.global = load_global_config(&factory_dir)?;
        for profile in load_profiles(&factory_dir)? {
            tracing::debug!(stage = %profile.stage, "using custom agent profile");
            config.profiles.set(profile);
        }
    }

    apply_env_overrides(&mut config.global, env)?;
    tracing::debug!(
        provider = %config.global.provider,
        base_url = %config.global.effective_base_url(),
        "configuration loaded"
    );
    Ok(config)
}

/// Loads global configuration from `config.toml`.
fn load_global_config(factory_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = factory_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::FileRead {
            path: config_path.clone(),
            source,
        })?;

    toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
        path: config_path,
        source,
    })
}

/// Parse one agent profile: YAML front matter plus a Markdown body.
pub fn parse_profile(content: &str, path: &Path) -> ConfigResult<AgentProfile> {
    let matter = Matter::<YAML>::new();
    let result = matter.parse(content);

    let mut profile: AgentProfile = result
        .data
        .ok_or_else(|| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: "Missing YAML front matter".to_string(),
        })?
        .deserialize()
        .map_err(|e| ConfigError::MarkdownParse {
            path: path.to_path_buf(),
            reason: format!("Failed to deserialize front matter: {}", e),
        })?;

    let body = result.content.trim();
    if body.is_empty() {
        return Err(ConfigError::InvalidConfig {
            path: path.to_path_buf(),
            reason: "agent profile has an empty system instruction".to_string(),
        });
    }
    profile.system_prompt = body.to_string();

    Ok(profile)
}

/// Loads every agent profile from `agents/*.md`.
fn load_profiles(factory_dir: &Path) -> ConfigResult<Vec<AgentProfile>> {
    let agents_dir = factory_dir.join("agents");

    if !agents_dir.exists() {
        return Ok(Vec::new());
    }

    let mut profiles = Vec::new();
    let mut seen: HashMap<_, PathBuf> = HashMap::new();

    for entry in WalkDir::new(&agents_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: agents_dir.clone(),
            source,
        })?;

        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        let profile = parse_profile(&content, path)?;
        if let Some(previous) = seen.insert(profile.stage, path.to_path_buf()) {
            return Err(ConfigError::InvalidConfig {
                path: path.to_path_buf(),
                reason: format!(
                    "stage {} is already defined in {}",
                    profile.stage,
                    previous.display()
                ),
            });
        }
        profiles.push(profile);
    }

    Ok(profiles)
}

/// Apply `LLM_*` style overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(global: &mut GlobalConfig, env: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |var: &str| env(var).filter(|value| !value.trim().is_empty());

    if let Some(value) = get("LLM_PROVIDER") {
        global.provider =
            ProviderKind::from_name(&value).ok_or_else(|| ConfigError::InvalidEnv {
                var: "LLM_PROVIDER".to_string(),
                value: value.clone(),
            })?;
    }

    if let Some(model) = get("LLM_MODEL") {
        global.model = Some(model);
    }

    let provider_url = match global.provider {
        ProviderKind::Ollama => get("OLLAMA_BASE_URL"),
        ProviderKind::OpenAi => get("OPENAI_BASE_URL"),
        _ => None,
    };
    if let Some(url) = get("LLM_BASE_URL").or(provider_url) {
        global.base_url = Some(url);
    }

    Ok(())
}
