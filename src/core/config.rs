/*!
 * Handle Configuration
 *
 * Loaded from environment variables or JSON; every field has a default.
 */

use crate::core::limits::{ENV_FATAL_POLICY, ENV_MATRIX_FORMAT, ENV_PROBE_SCOPE};
use crate::core::types::{ResourceRef, Scope};
use crate::handle::MatrixFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// What a handle does when teardown hits an unrecoverable condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatalPolicy {
    /// Log and abort the process
    #[default]
    Abort,
    /// Log and unwind with a `FatalTeardown` payload
    Panic,
}

impl FromStr for FatalPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "panic" => Ok(Self::Panic),
            other => Err(format!("unknown fatal policy '{}'", other)),
        }
    }
}

/// Which mailbox the teardown probe inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeScope {
    /// This process only
    #[default]
    SelfOnly,
    /// The resource's own communication scope
    Resource,
}

impl ProbeScope {
    /// Scope to probe when releasing `resource`
    #[inline]
    pub fn resolve(self, resource: &ResourceRef) -> Scope {
        match self {
            Self::SelfOnly => Scope::SelfOnly,
            Self::Resource => resource.scope,
        }
    }
}

impl FromStr for ProbeScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "self" | "self_only" => Ok(Self::SelfOnly),
            "resource" => Ok(Self::Resource),
            other => Err(format!("unknown probe scope '{}'", other)),
        }
    }
}

/// Handle behaviour settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandleConfig {
    pub fatal_policy: FatalPolicy,
    pub probe_scope: ProbeScope,
    pub default_matrix_format: MatrixFormat,
}

impl HandleConfig {
    /// Read settings from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fatal_policy: env_or(ENV_FATAL_POLICY, defaults.fatal_policy),
            probe_scope: env_or(ENV_PROBE_SCOPE, defaults.probe_scope),
            default_matrix_format: env_or(ENV_MATRIX_FORMAT, defaults.default_matrix_format),
        }
    }

    /// Parse settings from a JSON document
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_fatal_policy(mut self, policy: FatalPolicy) -> Self {
        self.fatal_policy = policy;
        self
    }

    pub fn with_probe_scope(mut self, scope: ProbeScope) -> Self {
        self.probe_scope = scope;
        self
    }

    pub fn with_matrix_format(mut self, format: MatrixFormat) -> Self {
        self.default_matrix_format = format;
        self
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr<Err = String>,
{
    match std::env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!(key, value = %raw, error = %e, "Ignoring invalid configuration value");
            default
        }),
        Err(_) => default,
    }
}
