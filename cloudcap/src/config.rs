#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cloudcap_analyzer::EstimatePolicy;
use cloudcap_aws::{Account, DuplicatePolicy, Region};
use miette::Diagnostic;
use thiserror::Error;

pub const FILE_NAME: &str = "cloudcap.toml";

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_ACCOUNT: &str = "123456789012";
pub const DEFAULT_TIMEOUT_MS: u32 = 10_000;

#[derive(Debug, Error, Diagnostic)]
#[error("config error: {message}")]
#[diagnostic(code(cloudcap::config))]
pub struct ConfigError {
    pub message: String,
}

/// Contents of `cloudcap.toml`. Every section is optional.
#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(skip)]
    pub path: Option<PathBuf>,

    #[serde(default)]
    pub deployment: DeploymentConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub estimates: EstimatesConfig,

    #[serde(default)]
    pub solver: SolverConfig,

    /// Template parameter overrides.
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub stack_name: Option<String>,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyName {
    #[default]
    Exact,
    AtLeast,
}

impl From<PolicyName> for EstimatePolicy {
    fn from(p: PolicyName) -> Self {
        match p {
            PolicyName::Exact => EstimatePolicy::Exact,
            PolicyName::AtLeast => EstimatePolicy::AtLeast,
        }
    }
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EstimatesConfig {
    #[serde(default)]
    pub policy: PolicyName,
}

#[derive(Clone, Debug, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

fn default_timeout_ms() -> u32 {
    DEFAULT_TIMEOUT_MS
}

impl Config {
    pub fn region(&self) -> Result<Region, ConfigError> {
        let name = self.deployment.region.as_deref().unwrap_or(DEFAULT_REGION);
        name.parse::<Region>().map_err(|e| ConfigError {
            message: e.to_string(),
        })
    }

    pub fn account(&self) -> Account {
        Account::new(self.deployment.account.as_deref().unwrap_or(DEFAULT_ACCOUNT))
    }
}

/// Nearest `cloudcap.toml` at or above `start`.
pub fn find_config(start: &Path) -> Option<PathBuf> {
    let mut cur = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let candidate = cur.join(FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        match cur.parent() {
            Some(p) => cur = p.to_path_buf(),
            None => return None,
        }
    }
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|e| ConfigError {
        message: format!("failed to read {}: {e}", path.display()),
    })?;
    let mut config: Config = toml::from_str(&raw).map_err(|e| ConfigError {
        message: format!("failed to parse {}: {e}", path.display()),
    })?;
    config.path = Some(path.to_path_buf());
    tracing::info!("using configuration {}", path.display());
    Ok(config)
}

/// `explicit` if given, otherwise the nearest `cloudcap.toml` above `template`, otherwise the
/// built-in defaults.
pub fn resolve(explicit: Option<&Path>, template: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load(path);
    }
    let start = template
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    match find_config(start) {
        Some(path) => load(&path),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").expect("empty");
        assert_eq!(config.region().expect("region"), Region::us_east_1());
        assert_eq!(config.account().id(), DEFAULT_ACCOUNT);
        assert_eq!(config.registry.duplicates, DuplicatePolicy::Warn);
        assert_eq!(config.estimates.policy, PolicyName::Exact);
        assert_eq!(config.solver.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn every_section_parses() {
        let config: Config = toml::from_str(
            r#"
[deployment]
region = "eu-west-1"
account = "111122223333"
stack_name = "prod"

[registry]
duplicates = "deny"

[estimates]
policy = "at-least"

[solver]
timeout_ms = 500

[parameters]
Stage = "prod"
"#,
        )
        .expect("config");
        assert_eq!(config.region().expect("region").name(), "eu-west-1");
        assert_eq!(config.account().id(), "111122223333");
        assert_eq!(config.deployment.stack_name.as_deref(), Some("prod"));
        assert_eq!(config.registry.duplicates, DuplicatePolicy::Deny);
        assert_eq!(EstimatePolicy::from(config.estimates.policy), EstimatePolicy::AtLeast);
        assert_eq!(config.solver.timeout_ms, 500);
        assert_eq!(config.parameters["Stage"], "prod");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Config>("[solver]\ntimeout = 1\n").is_err());
    }

    #[test]
    fn invalid_region_is_a_config_error() {
        let config: Config = toml::from_str("[deployment]\nregion = \"Not A Region\"\n").expect("toml");
        assert!(config.region().is_err());
    }
}
