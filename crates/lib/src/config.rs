//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.relay/config.json`) and environment.
//! The tenant map can also be supplied inline via the `RELAY_TENANTS` env var,
//! which overrides the file's `tenants` section when set.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tenant name -> callback configuration. Built once at startup, read-only after.
pub type TenantMap = BTreeMap<String, TenantConfig>;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Callback tenants keyed by name. Each gets its own `/{name}/callback` route.
    #[serde(default)]
    pub tenants: TenantMap,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Listen port (default 4000). Overridden by the PORT env var.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0").
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_port() -> u16 {
    4000
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

/// How a tenant answers incoming text.
///
/// Unrecognized strings load as `Unknown` so dispatch stays a total match;
/// messages for such tenants are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum BehaviorType {
    /// Reply with the inbound text unchanged.
    Echo,

    /// Forward the text to the tenant's external question-answering API.
    Bypass,

    /// Reply with a fixed summary string.
    PeriodicSummary,

    /// Catch-all for unrecognized config values.
    #[default]
    Unknown,
}

impl From<String> for BehaviorType {
    fn from(s: String) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "echo" => Self::Echo,
            "bypass" => Self::Bypass,
            "periodicsummary" => Self::PeriodicSummary,
            _ => Self::Unknown,
        }
    }
}

/// Authorization header form for the external API: `raw` sends the token
/// verbatim, `bearer` sends `Bearer <token>`. Both occur in the wild.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    #[default]
    Raw,
    Bearer,
}

/// One callback tenant: secrets, delivery credential, and behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantConfig {
    /// What to do with inbound text.
    #[serde(default)]
    pub behavior_type: BehaviorType,

    /// Channel secret used to verify webhook signatures for this tenant.
    #[serde(default)]
    pub signing_secret: String,

    /// Channel access token used to send replies for this tenant.
    #[serde(default)]
    pub delivery_token: String,

    /// External question-answering endpoint. Required when behaviorType is bypass.
    #[serde(default)]
    pub api_url: Option<String>,

    /// Token for the Authorization header of the external API.
    #[serde(default)]
    pub api_auth_token: Option<String>,

    /// Header form used with `apiAuthToken`.
    #[serde(default)]
    pub api_auth_scheme: AuthScheme,

    /// Strip one leading '/' from inbound text before forwarding it to the external API.
    #[serde(default)]
    pub strip_command_prefix: bool,

    /// Upper bound in seconds for one external API round-trip (default 30).
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
}

fn default_api_timeout_secs() -> u64 {
    30
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            behavior_type: BehaviorType::default(),
            signing_secret: String::new(),
            delivery_token: String::new(),
            api_url: None,
            api_auth_token: None,
            api_auth_scheme: AuthScheme::default(),
            strip_command_prefix: false,
            api_timeout_secs: default_api_timeout_secs(),
        }
    }
}

/// Configuration failures. All of these are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("tenant configuration is missing or empty")]
    Missing,

    #[error("tenant configuration is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("tenant {tenant}: missing required field {field}")]
    MissingField { tenant: String, field: &'static str },

    #[error("tenant {tenant}: behaviorType is bypass but apiUrl is not set")]
    BypassWithoutUrl { tenant: String },
}

/// Parse and validate a tenant map from a JSON blob. Pure; called once at startup.
pub fn load_tenants(raw: &str) -> Result<TenantMap, ConfigError> {
    if raw.trim().is_empty() {
        return Err(ConfigError::Missing);
    }
    let tenants: TenantMap = serde_json::from_str(raw)?;
    validate_tenants(&tenants)?;
    Ok(tenants)
}

/// Per-record required-field checks. Unknown behavior types pass validation;
/// they are ignored at dispatch time instead.
pub fn validate_tenants(tenants: &TenantMap) -> Result<(), ConfigError> {
    for (name, tenant) in tenants {
        if name.trim().is_empty() {
            return Err(ConfigError::MissingField {
                tenant: "(unnamed)".to_string(),
                field: "name",
            });
        }
        if tenant.signing_secret.trim().is_empty() {
            return Err(ConfigError::MissingField {
                tenant: name.clone(),
                field: "signingSecret",
            });
        }
        if tenant.delivery_token.trim().is_empty() {
            return Err(ConfigError::MissingField {
                tenant: name.clone(),
                field: "deliveryToken",
            });
        }
        if tenant.behavior_type == BehaviorType::Bypass
            && tenant
                .api_url
                .as_deref()
                .map(str::trim)
                .unwrap_or("")
                .is_empty()
        {
            return Err(ConfigError::BypassWithoutUrl {
                tenant: name.clone(),
            });
        }
    }
    Ok(())
}

/// Resolve the tenant map: RELAY_TENANTS env (inline JSON blob) overrides the
/// config file's `tenants` section. No tenants anywhere is a startup error.
pub fn resolve_tenants(config: &Config) -> Result<TenantMap, ConfigError> {
    match std::env::var("RELAY_TENANTS") {
        Ok(raw) => load_tenants(&raw),
        Err(_) => {
            if config.tenants.is_empty() {
                return Err(ConfigError::Missing);
            }
            validate_tenants(&config.tenants)?;
            Ok(config.tenants.clone())
        }
    }
}

/// Resolve the listen port: PORT env overrides config.
pub fn resolve_port(config: &Config) -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(config.server.port)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".relay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or RELAY_CONFIG_PATH). Missing file => default
/// config, so a pure-env deployment (RELAY_TENANTS + PORT) needs no file at all.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 4000);
        assert_eq!(s.bind, "0.0.0.0");
    }

    #[test]
    fn load_tenants_one_record_per_key() {
        let raw = r#"{
            "alpha": {"behaviorType": "echo", "signingSecret": "s1", "deliveryToken": "t1"},
            "beta": {
                "behaviorType": "bypass",
                "signingSecret": "s2",
                "deliveryToken": "t2",
                "apiUrl": "http://127.0.0.1:9/answer",
                "apiAuthToken": "k",
                "apiAuthScheme": "bearer"
            },
            "gamma": {"behaviorType": "periodicSummary", "signingSecret": "s3", "deliveryToken": "t3"}
        }"#;
        let tenants = load_tenants(raw).expect("valid blob");
        assert_eq!(tenants.len(), 3);
        assert_eq!(tenants["alpha"].behavior_type, BehaviorType::Echo);
        assert_eq!(tenants["alpha"].api_auth_scheme, AuthScheme::Raw);
        assert_eq!(tenants["alpha"].api_timeout_secs, 30);
        assert!(!tenants["alpha"].strip_command_prefix);
        assert_eq!(tenants["beta"].behavior_type, BehaviorType::Bypass);
        assert_eq!(tenants["beta"].api_auth_scheme, AuthScheme::Bearer);
        assert_eq!(tenants["gamma"].behavior_type, BehaviorType::PeriodicSummary);
    }

    #[test]
    fn load_tenants_accepts_lowercase_periodicsummary() {
        let raw = r#"{"t": {"behaviorType": "periodicsummary", "signingSecret": "s", "deliveryToken": "t"}}"#;
        let tenants = load_tenants(raw).expect("valid blob");
        assert_eq!(tenants["t"].behavior_type, BehaviorType::PeriodicSummary);
    }

    #[test]
    fn unknown_behavior_string_loads_as_unknown() {
        let raw = r#"{"t": {"behaviorType": "fancy", "signingSecret": "s", "deliveryToken": "t"}}"#;
        let tenants = load_tenants(raw).expect("unknown behavior is not an error");
        assert_eq!(tenants["t"].behavior_type, BehaviorType::Unknown);
    }

    #[test]
    fn empty_blob_is_missing() {
        assert!(matches!(load_tenants(""), Err(ConfigError::Missing)));
        assert!(matches!(load_tenants("   \n"), Err(ConfigError::Missing)));
    }

    #[test]
    fn bad_json_is_malformed() {
        assert!(matches!(
            load_tenants("not json"),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn bypass_without_url_is_rejected() {
        let raw = r#"{"t": {"behaviorType": "bypass", "signingSecret": "s", "deliveryToken": "t"}}"#;
        assert!(matches!(
            load_tenants(raw),
            Err(ConfigError::BypassWithoutUrl { tenant }) if tenant == "t"
        ));

        let raw = r#"{"t": {"behaviorType": "bypass", "signingSecret": "s", "deliveryToken": "t", "apiUrl": "  "}}"#;
        assert!(matches!(
            load_tenants(raw),
            Err(ConfigError::BypassWithoutUrl { .. })
        ));
    }

    #[test]
    fn missing_secret_or_token_is_rejected() {
        let raw = r#"{"t": {"behaviorType": "echo", "deliveryToken": "t"}}"#;
        assert!(matches!(
            load_tenants(raw),
            Err(ConfigError::MissingField { field: "signingSecret", .. })
        ));

        let raw = r#"{"t": {"behaviorType": "echo", "signingSecret": "s"}}"#;
        assert!(matches!(
            load_tenants(raw),
            Err(ConfigError::MissingField { field: "deliveryToken", .. })
        ));
    }
}
