//! Revision defaults configuration
//!
//! Mirrors the `config-defaults` ConfigMap of the serving control plane.
//! The same keys can be supplied through environment variables:
//! `revision-timeout-seconds` becomes `KSERVING_REVISION_TIMEOUT_SECONDS`.

use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the ConfigMap holding revision defaults
pub const DEFAULTS_CONFIG_NAME: &str = "config-defaults";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "KSERVING_";

pub const DEFAULT_REVISION_TIMEOUT_SECONDS: i64 = 300;
pub const DEFAULT_MAX_REVISION_TIMEOUT_SECONDS: i64 = 600;
pub const DEFAULT_CONTAINER_CONCURRENCY: i64 = 0;
pub const DEFAULT_USER_CONTAINER_NAME: &str = "user-container";

const REVISION_TIMEOUT_KEY: &str = "revision-timeout-seconds";
const MAX_REVISION_TIMEOUT_KEY: &str = "max-revision-timeout-seconds";
const CONTAINER_CONCURRENCY_KEY: &str = "container-concurrency";
const CONTAINER_NAME_TEMPLATE_KEY: &str = "container-name-template";
const CPU_REQUEST_KEY: &str = "revision-cpu-request";
const MEMORY_REQUEST_KEY: &str = "revision-memory-request";
const CPU_LIMIT_KEY: &str = "revision-cpu-limit";
const MEMORY_LIMIT_KEY: &str = "revision-memory-limit";

const NAME_PLACEHOLDER: &str = "{{.Name}}";
const NAMESPACE_PLACEHOLDER: &str = "{{.Namespace}}";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}: expected an integer, got '{value}'")]
    InvalidInteger { key: &'static str, value: String },

    #[error("revision-timeout-seconds must be > 0, got {0}")]
    NonPositiveTimeout(i64),

    #[error("revision-timeout-seconds ({timeout}) cannot exceed max-revision-timeout-seconds ({max})")]
    TimeoutAboveMax { timeout: i64, max: i64 },

    #[error("container-concurrency must be >= 0, got {0}")]
    NegativeConcurrency(i64),

    #[error("container-name-template has an unknown placeholder: '{0}'")]
    InvalidNameTemplate(String),
}

/// Policy values applied by revision defaulting
#[derive(Debug, Clone, PartialEq)]
pub struct Defaults {
    pub revision_timeout_seconds: i64,
    pub max_revision_timeout_seconds: i64,
    pub container_concurrency: i64,

    /// Template for unnamed user containers, `{{.Name}}` and `{{.Namespace}}`
    /// expand to the parent object's metadata
    pub user_container_name_template: String,

    pub revision_cpu_request: Option<Quantity>,
    pub revision_memory_request: Option<Quantity>,
    pub revision_cpu_limit: Option<Quantity>,
    pub revision_memory_limit: Option<Quantity>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            revision_timeout_seconds: DEFAULT_REVISION_TIMEOUT_SECONDS,
            max_revision_timeout_seconds: DEFAULT_MAX_REVISION_TIMEOUT_SECONDS,
            container_concurrency: DEFAULT_CONTAINER_CONCURRENCY,
            user_container_name_template: DEFAULT_USER_CONTAINER_NAME.to_string(),
            revision_cpu_request: None,
            revision_memory_request: None,
            revision_cpu_limit: None,
            revision_memory_limit: None,
        }
    }
}

impl Defaults {
    /// Parse defaults from a `config-defaults` ConfigMap
    ///
    /// Missing keys keep their built-in values.
    pub fn from_config_map(config_map: &ConfigMap) -> Result<Self, ConfigError> {
        let empty = BTreeMap::new();
        let data = config_map.data.as_ref().unwrap_or(&empty);
        Self::from_lookup(|key| data.get(key).cloned())
    }

    /// Parse defaults from `KSERVING_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(env_var_name(key)).ok())
    }

    /// Parse defaults from any key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut defaults = Self::default();

        if let Some(v) = parse_int(&lookup, REVISION_TIMEOUT_KEY)? {
            defaults.revision_timeout_seconds = v;
        }
        if let Some(v) = parse_int(&lookup, MAX_REVISION_TIMEOUT_KEY)? {
            defaults.max_revision_timeout_seconds = v;
        }
        if let Some(v) = parse_int(&lookup, CONTAINER_CONCURRENCY_KEY)? {
            defaults.container_concurrency = v;
        }
        if let Some(template) = non_empty(&lookup, CONTAINER_NAME_TEMPLATE_KEY) {
            defaults.user_container_name_template = template;
        }

        defaults.revision_cpu_request = non_empty(&lookup, CPU_REQUEST_KEY).map(Quantity);
        defaults.revision_memory_request = non_empty(&lookup, MEMORY_REQUEST_KEY).map(Quantity);
        defaults.revision_cpu_limit = non_empty(&lookup, CPU_LIMIT_KEY).map(Quantity);
        defaults.revision_memory_limit = non_empty(&lookup, MEMORY_LIMIT_KEY).map(Quantity);

        defaults.validate()?;
        Ok(defaults)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.revision_timeout_seconds <= 0 {
            return Err(ConfigError::NonPositiveTimeout(
                self.revision_timeout_seconds,
            ));
        }
        if self.revision_timeout_seconds > self.max_revision_timeout_seconds {
            return Err(ConfigError::TimeoutAboveMax {
                timeout: self.revision_timeout_seconds,
                max: self.max_revision_timeout_seconds,
            });
        }
        if self.container_concurrency < 0 {
            return Err(ConfigError::NegativeConcurrency(self.container_concurrency));
        }

        let stripped = self
            .user_container_name_template
            .replace(NAME_PLACEHOLDER, "")
            .replace(NAMESPACE_PLACEHOLDER, "");
        if stripped.contains("{{") || stripped.contains("}}") {
            return Err(ConfigError::InvalidNameTemplate(
                self.user_container_name_template.clone(),
            ));
        }

        Ok(())
    }

    /// Render the user container name for a parent object
    ///
    /// Falls back to `user-container` when a placeholder refers to a parent
    /// field that is unset (e.g. objects created with `generateName`) or the
    /// rendered name is empty.
    pub fn user_container_name(&self, parent: Option<&ObjectMeta>) -> String {
        let template = &self.user_container_name_template;
        let name = parent.and_then(|m| m.name.as_deref()).filter(|n| !n.is_empty());
        let namespace = parent
            .and_then(|m| m.namespace.as_deref())
            .filter(|n| !n.is_empty());

        let missing_name = template.contains(NAME_PLACEHOLDER) && name.is_none();
        let missing_namespace = template.contains(NAMESPACE_PLACEHOLDER) && namespace.is_none();
        if missing_name || missing_namespace {
            return DEFAULT_USER_CONTAINER_NAME.to_string();
        }

        let rendered = template
            .replace(NAME_PLACEHOLDER, name.unwrap_or_default())
            .replace(NAMESPACE_PLACEHOLDER, namespace.unwrap_or_default());
        if rendered.is_empty() {
            DEFAULT_USER_CONTAINER_NAME.to_string()
        } else {
            rendered
        }
    }
}

/// Environment variable name for a ConfigMap key
pub fn env_var_name(key: &str) -> String {
    format!("{}{}", ENV_PREFIX, key.replace('-', "_").to_uppercase())
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_int<F>(lookup: &F, key: &'static str) -> Result<Option<i64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidInteger { key, value: raw }),
        None => Ok(None),
    }
}

#[cfg(test)]
#[path = "defaults_test.rs"]
mod tests;
