//! Provider configuration
//!
//! Settings come from the `provider` block of the configuration file, with
//! environment variables filling in anything left out:
//!
//! - `PINGDIRECTORY_PROVIDER_HTTPS_HOST`: base URL (e.g., `https://localhost:1443`)
//! - `PINGDIRECTORY_PROVIDER_USERNAME`
//! - `PINGDIRECTORY_PROVIDER_PASSWORD`
//! - `PINGDIRECTORY_PROVIDER_INSECURE_TRUST_ALL_TLS`: `true` or `false` (default)

use std::env;

use pdconf_client::ClientSettings;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const HTTPS_HOST_VAR: &str = "PINGDIRECTORY_PROVIDER_HTTPS_HOST";
pub const USERNAME_VAR: &str = "PINGDIRECTORY_PROVIDER_USERNAME";
pub const PASSWORD_VAR: &str = "PINGDIRECTORY_PROVIDER_PASSWORD";
pub const INSECURE_TRUST_ALL_TLS_VAR: &str = "PINGDIRECTORY_PROVIDER_INSECURE_TRUST_ALL_TLS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing provider setting '{field}' (set it in the provider block or {var})")]
    Missing { field: &'static str, var: &'static str },

    #[error("Invalid https_host '{value}': {reason}")]
    InvalidHost { value: String, reason: String },

    #[error("Invalid value '{value}' for {var}: expected true or false")]
    InvalidBool { var: &'static str, value: String },
}

/// The `provider` block as written in the configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderBlock {
    pub https_host: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub insecure_trust_all_tls: Option<bool>,
}

/// Validated provider settings
#[derive(Clone)]
pub struct ProviderConfig {
    pub https_host: Url,
    pub username: String,
    pub password: String,
    pub insecure_trust_all_tls: bool,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("https_host", &self.https_host.as_str())
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("insecure_trust_all_tls", &self.insecure_trust_all_tls)
            .finish()
    }
}

impl ProviderConfig {
    /// Resolve the provider block against the process environment
    pub fn resolve(block: &ProviderBlock) -> Result<Self, ConfigError> {
        Self::resolve_with(block, |var| env::var(var).ok())
    }

    /// Resolve using `lookup` in place of the process environment
    pub fn resolve_with(
        block: &ProviderBlock,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let setting = |value: &Option<String>, field: &'static str, var: &'static str| {
            value
                .clone()
                .or_else(|| lookup(var))
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing { field, var })
        };

        let https_host = setting(&block.https_host, "https_host", HTTPS_HOST_VAR)?;
        let username = setting(&block.username, "username", USERNAME_VAR)?;
        let password = setting(&block.password, "password", PASSWORD_VAR)?;

        let insecure_trust_all_tls = match block.insecure_trust_all_tls {
            Some(value) => value,
            None => match lookup(INSECURE_TRUST_ALL_TLS_VAR) {
                Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool {
                    var: INSECURE_TRUST_ALL_TLS_VAR,
                    value,
                })?,
                None => false,
            },
        };

        Ok(Self {
            https_host: parse_host(&https_host)?,
            username,
            password,
            insecure_trust_all_tls,
        })
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.https_host.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            accept_invalid_certs: self.insecure_trust_all_tls,
        }
    }
}

fn parse_host(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidHost {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "https" | "http") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn block_values_win_over_environment() {
        let block = ProviderBlock {
            https_host: Some("https://ds1.example.com:1443".to_string()),
            username: Some("cn=administrator".to_string()),
            password: None,
            insecure_trust_all_tls: Some(true),
        };
        let lookup = env_of(&[
            (HTTPS_HOST_VAR, "https://other:1443"),
            (PASSWORD_VAR, "from-env"),
            (INSECURE_TRUST_ALL_TLS_VAR, "false"),
        ]);

        let config = ProviderConfig::resolve_with(&block, lookup).unwrap();
        assert_eq!(config.https_host.as_str(), "https://ds1.example.com:1443/");
        assert_eq!(config.password, "from-env");
        assert!(config.insecure_trust_all_tls);
        assert!(!format!("{:?}", config).contains("from-env"));
    }

    #[test]
    fn missing_credentials_name_the_variable() {
        let block = ProviderBlock {
            https_host: Some("https://localhost:1443".to_string()),
            ..Default::default()
        };
        let err = ProviderConfig::resolve_with(&block, env_of(&[])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Missing {
                field: "username",
                var: USERNAME_VAR
            }
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let lookup = env_of(&[
            (HTTPS_HOST_VAR, "ldap://localhost:389"),
            (USERNAME_VAR, "u"),
            (PASSWORD_VAR, "p"),
        ]);
        let err = ProviderConfig::resolve_with(&ProviderBlock::default(), lookup).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidHost { .. }));
    }

    #[test]
    fn rejects_bad_boolean() {
        let lookup = env_of(&[
            (HTTPS_HOST_VAR, "https://localhost:1443"),
            (USERNAME_VAR, "u"),
            (PASSWORD_VAR, "p"),
            (INSECURE_TRUST_ALL_TLS_VAR, "maybe"),
        ]);
        let err = ProviderConfig::resolve_with(&ProviderBlock::default(), lookup).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBool {
                var: INSECURE_TRUST_ALL_TLS_VAR,
                value: "maybe".to_string()
            }
        );
    }
}
