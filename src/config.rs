use crate::secret_string::SecretString;
use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing::info;

pub static ENDPOINT_ENV: &str = "DUPLO_EP";
pub static TENANT_ID_ENV: &str = "TENANT_ID";
pub static TOKEN_ENV: &str = "DUPLO_SSO_TOKEN";
pub static CONFIG_FILE_ENV: &str = "DUPLO_UPDATER_CONFIG";

#[derive(Debug, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    pub polling: PollingConfig,
    pub tls: TlsConfig,
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub tenant_id: String,
    /// `{DUPLO_EP}/subscriptions/{TENANT_ID}`
    pub base_url: String,
    pub token: SecretString,
}

impl EngineConfig {
    pub fn new(endpoint: &str, tenant_id: &str, token: SecretString) -> Self {
        let base_url = format!(
            "{}/subscriptions/{}",
            endpoint.trim_end_matches('/'),
            tenant_id
        );
        EngineConfig {
            tenant_id: tenant_id.to_string(),
            base_url,
            token,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PollingConfig {
    pub max_attempts: u32,
    pub interval_seconds: u64,
    pub match_policy: PodMatchPolicy,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            max_attempts: 240,
            interval_seconds: 5,
            match_policy: PodMatchPolicy::default(),
        }
    }
}

/// How the pods sharing a service name are combined into one readiness answer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PodMatchPolicy {
    /// Only the first pod whose name matches is inspected
    #[default]
    FirstMatch,
    /// Every matching pod has to be running, and there has to be at least one
    AllMatching,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TlsConfig {
    pub ca_certificate_paths: Vec<PathBuf>,
}

/// Optional YAML file overriding polling and TLS settings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    polling: PollingConfig,
    tls: TlsConfig,
}

impl Config {
    pub fn from_env() -> Result<Config> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = required_var(&lookup, ENDPOINT_ENV)?;
        let tenant_id = required_var(&lookup, TENANT_ID_ENV)?;
        let token = SecretString::new(required_var(&lookup, TOKEN_ENV)?);

        let overlay = match lookup(CONFIG_FILE_ENV) {
            Some(path) => load_overlay(&path, &lookup)?,
            None => ConfigOverlay::default(),
        };

        let config = Config {
            engine: EngineConfig::new(&endpoint, &tenant_id, token),
            polling: overlay.polling,
            tls: overlay.tls,
        };
        info!(
            "Using engine {} with token {}, polling up to {} times every {}s ({:?})",
            config.engine.base_url,
            config.engine.token,
            config.polling.max_attempts,
            config.polling.interval_seconds,
            config.polling.match_policy
        );
        Ok(config)
    }
}

fn required_var<F>(lookup: &F, name: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .filter(|value| !value.is_empty())
        .with_context(|| format!("Missing environment variable: {}", name))
}

fn load_overlay<P, F>(path: P, lookup: &F) -> Result<ConfigOverlay>
where
    P: AsRef<Path>,
    F: Fn(&str) -> Option<String>,
{
    info!("Loading config from file {}", path.as_ref().display());
    let yaml_str = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

    let expanded = expand_env_vars(&yaml_str, lookup)?;

    let overlay: ConfigOverlay = serde_yaml_ng::from_str(&expanded)
        .context("Failed to parse YAML config after environment variable expansion")?;

    if overlay.polling.max_attempts == 0 {
        anyhow::bail!(
            "Invalid config file {}: polling.maxAttempts must be at least 1",
            path.as_ref().display()
        );
    }

    Ok(overlay)
}

/// Replaces `${VAR}` placeholders with values from `lookup`.
/// Returns an error naming every variable that could not be resolved.
fn expand_env_vars<F>(input: &str, lookup: &F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let re =
        Regex::new(r"\$\{([^}]+)}").context("Invalid regex pattern for env var substitution")?;

    let mut missing = Vec::new();
    let result = re.replace_all(input, |caps: &regex::Captures| {
        let var_name = &caps[1];
        lookup(var_name).unwrap_or_else(|| {
            missing.push(var_name.to_string());
            String::new()
        })
    });

    if !missing.is_empty() {
        anyhow::bail!("Missing environment variable: {}", missing.join(", "));
    }

    Ok(result.into_owned())
}
