//! Configuration management
//!
//! Non-secret settings live in `settings.json` in the app directory:
//! ```json
//! {
//!   "endpoint": "https://project.example.co",
//!   "rpcPath": "/rest/v1/rpc/query",
//!   "timeoutSecs": 30
//! }
//! ```
//!
//! The service key is never stored. It is read from the
//! `SQLRELAY_SERVICE_KEY` environment variable at invocation time.

use std::path::Path;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::domain::result::{Error, Result};

/// Environment variable overriding the configured endpoint
pub const ENDPOINT_ENV: &str = "SQLRELAY_ENDPOINT";

/// Environment variable carrying the service key
pub const SERVICE_KEY_ENV: &str = "SQLRELAY_SERVICE_KEY";

fn default_rpc_path() -> String {
    "/rest/v1/rpc/query".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Raw settings.json structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default = "default_rpc_path")]
    rpc_path: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            endpoint: None,
            rpc_path: default_rpc_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// sqlrelay configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted database, e.g. `https://project.example.co`
    pub endpoint: Option<String>,
    /// Path of the RPC execution function on the endpoint
    pub rpc_path: String,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            rpc_path: default_rpc_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load config from the app directory.
    ///
    /// A missing or unparseable settings file yields defaults. The
    /// `SQLRELAY_ENDPOINT` environment variable overrides the stored
    /// endpoint.
    pub fn load(app_dir: &Path) -> Result<Self> {
        let settings_path = app_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        let endpoint = std::env::var(ENDPOINT_ENV).ok().or(raw.endpoint);

        Ok(Self {
            endpoint,
            rpc_path: raw.rpc_path,
            timeout_secs: raw.timeout_secs,
        })
    }

    /// Save config to the app directory
    pub fn save(&self, app_dir: &Path) -> Result<()> {
        let settings_path = app_dir.join("settings.json");
        let settings = SettingsFile {
            endpoint: self.endpoint.clone(),
            rpc_path: self.rpc_path.clone(),
            timeout_secs: self.timeout_secs,
        };
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Configured endpoint, or an actionable error
    pub fn require_endpoint(&self) -> Result<&str> {
        self.endpoint.as_deref().ok_or_else(|| {
            Error::config(format!(
                "No endpoint configured. Run 'sqr setup' or set {}.",
                ENDPOINT_ENV
            ))
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Credentials for the remote endpoint
#[derive(Debug, Clone)]
pub struct Credentials {
    pub service_key: String,
}

/// Claims decoded from a JWT-shaped service key.
///
/// Hosted-Postgres service keys are usually JWTs; the payload is decoded
/// without verification, purely for pre-flight diagnostics.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyClaims {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Credentials {
    /// Read credentials from the environment.
    ///
    /// Keys are deliberately not accepted from the settings file or the
    /// command line; both end up persisted in places secrets do not belong.
    pub fn from_env() -> Result<Self> {
        match std::env::var(SERVICE_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self { service_key: key }),
            _ => Err(Error::config(format!(
                "No service key found. Export {} with the database service key.",
                SERVICE_KEY_ENV
            ))),
        }
    }

    /// Decode the unverified payload of a JWT-shaped key.
    ///
    /// Returns None when the key is not a decodable JWT.
    pub fn claims(&self) -> Option<KeyClaims> {
        let payload = self.service_key.split('.').nth(1)?;
        let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&decoded).ok()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_load_defaults_when_no_settings_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.rpc_path, "/rest/v1/rpc/query");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            endpoint: Some("https://project.example.co".to_string()),
            rpc_path: "/rpc/exec".to_string(),
            timeout_secs: 10,
        };
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.endpoint.as_deref(), Some("https://project.example.co"));
        assert_eq!(loaded.rpc_path, "/rpc/exec");
        assert_eq!(loaded.timeout_secs, 10);
    }

    #[test]
    fn test_load_tolerates_unparseable_settings() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("settings.json"), "{not json").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_require_endpoint_mentions_setup() {
        let config = Config::default();
        let err = config.require_endpoint().unwrap_err();
        assert!(err.to_string().contains("sqr setup"));
    }

    #[test]
    fn test_claims_from_jwt_shaped_key() {
        // header {"alg":"HS256"} . payload {"role":"service_role","exp":1700000000} . fake sig
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(r#"{"role":"service_role","exp":1700000000}"#);
        let key = format!("{}.{}.sig", header, payload);

        let creds = Credentials { service_key: key };
        let claims = creds.claims().unwrap();
        assert_eq!(claims.role.as_deref(), Some("service_role"));
        assert_eq!(claims.exp, Some(1700000000));
    }

    #[test]
    fn test_claims_none_for_opaque_key() {
        let creds = Credentials {
            service_key: "plain-opaque-token".to_string(),
        };
        assert!(creds.claims().is_none());
    }
}
