//! Check service - pre-flight health checks
//!
//! Validates the local configuration and credentials before anything is
//! sent to the endpoint, and optionally probes the endpoint for
//! reachability.

use std::time::Instant;

use anyhow::Result;
use chrono::{TimeZone, Utc};
use serde::Serialize;
use url::Url;

use crate::config::{Config, Credentials, SERVICE_KEY_ENV};

/// Days of key validity left below which a warning is raised
const EXPIRY_WARN_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

/// One named check with its outcome
#[derive(Debug, Clone, Serialize)]
pub struct Check {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
}

impl Check {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
        }
    }
}

/// Result of running all checks
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub checks: Vec<Check>,
}

impl CheckReport {
    pub fn ok(&self) -> bool {
        self.checks.iter().all(|c| c.status != CheckStatus::Fail)
    }
}

/// Check service for configuration and connectivity diagnostics
pub struct CheckService {
    config: Config,
    credentials: Option<Credentials>,
}

impl CheckService {
    pub fn new(config: Config, credentials: Option<Credentials>) -> Self {
        Self {
            config,
            credentials,
        }
    }

    /// Run all checks. `probe` adds a connectivity round-trip to the
    /// endpoint; everything else is local.
    pub fn run_checks(&self, probe: bool) -> Result<CheckReport> {
        let mut checks = Vec::new();

        checks.push(self.check_endpoint());
        checks.push(self.check_credentials());

        if probe {
            checks.push(self.check_connectivity());
        }

        Ok(CheckReport { checks })
    }

    fn check_endpoint(&self) -> Check {
        let endpoint = match &self.config.endpoint {
            Some(e) => e,
            None => {
                return Check::new(
                    "endpoint",
                    CheckStatus::Fail,
                    "No endpoint configured. Run 'sqr setup'.",
                )
            }
        };

        match Url::parse(endpoint) {
            Ok(url) if url.scheme() != "https" => Check::new(
                "endpoint",
                CheckStatus::Fail,
                format!("{} does not use HTTPS", endpoint),
            ),
            Ok(url) if url.host_str().is_none() => {
                Check::new("endpoint", CheckStatus::Fail, "Endpoint URL has no host")
            }
            Ok(_) => Check::new("endpoint", CheckStatus::Pass, endpoint.clone()),
            Err(e) => Check::new(
                "endpoint",
                CheckStatus::Fail,
                format!("Endpoint URL does not parse: {}", e),
            ),
        }
    }

    fn check_credentials(&self) -> Check {
        let credentials = match &self.credentials {
            Some(c) => c,
            None => {
                return Check::new(
                    "credentials",
                    CheckStatus::Fail,
                    format!("{} is not set", SERVICE_KEY_ENV),
                )
            }
        };

        let claims = match credentials.claims() {
            Some(c) => c,
            None => {
                return Check::new(
                    "credentials",
                    CheckStatus::Warn,
                    "Key present but not a decodable JWT; cannot inspect role or expiry",
                )
            }
        };

        if let Some(exp) = claims.exp {
            let now = Utc::now().timestamp();
            if exp <= now {
                let when = Utc
                    .timestamp_opt(exp, 0)
                    .single()
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| exp.to_string());
                return Check::new(
                    "credentials",
                    CheckStatus::Fail,
                    format!("Service key expired on {}", when),
                );
            }
            let days_left = (exp - now) / 86_400;
            if days_left < EXPIRY_WARN_DAYS {
                return Check::new(
                    "credentials",
                    CheckStatus::Warn,
                    format!("Service key expires in {} day(s)", days_left),
                );
            }
        }

        match claims.role.as_deref() {
            Some("service_role") => Check::new(
                "credentials",
                CheckStatus::Pass,
                "Key present (role: service_role)",
            ),
            Some(role) => Check::new(
                "credentials",
                CheckStatus::Warn,
                format!(
                    "Key role is '{}'; schema changes usually require a service role",
                    role
                ),
            ),
            None => Check::new("credentials", CheckStatus::Pass, "Key present"),
        }
    }

    fn check_connectivity(&self) -> Check {
        let (endpoint, credentials) = match (&self.config.endpoint, &self.credentials) {
            (Some(e), Some(c)) => (e, c),
            _ => {
                return Check::new(
                    "connectivity",
                    CheckStatus::Warn,
                    "Skipped; endpoint or credentials missing",
                )
            }
        };

        let client = match reqwest::blocking::Client::builder()
            .timeout(self.config.timeout())
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                return Check::new(
                    "connectivity",
                    CheckStatus::Fail,
                    format!("Failed to create HTTP client: {}", e),
                )
            }
        };

        // Any HTTP response means the endpoint is reachable; the probe does
        // not execute anything.
        let started = Instant::now();
        match client
            .get(endpoint)
            .header("apikey", &credentials.service_key)
            .send()
        {
            Ok(response) => Check::new(
                "connectivity",
                CheckStatus::Pass,
                format!(
                    "Reachable (HTTP {} in {} ms)",
                    response.status().as_u16(),
                    started.elapsed().as_millis()
                ),
            ),
            Err(e) => Check::new(
                "connectivity",
                CheckStatus::Fail,
                format!("Endpoint unreachable: {}", e),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(endpoint: Option<&str>) -> Config {
        Config {
            endpoint: endpoint.map(String::from),
            ..Config::default()
        }
    }

    fn find<'a>(report: &'a CheckReport, name: &str) -> &'a Check {
        report
            .checks
            .iter()
            .find(|c| c.name == name)
            .expect("check present")
    }

    #[test]
    fn test_missing_endpoint_fails() {
        let service = CheckService::new(config_with(None), None);
        let report = service.run_checks(false).unwrap();
        assert_eq!(find(&report, "endpoint").status, CheckStatus::Fail);
        assert!(!report.ok());
    }

    #[test]
    fn test_http_endpoint_fails() {
        let service = CheckService::new(config_with(Some("http://project.example.co")), None);
        let report = service.run_checks(false).unwrap();
        assert_eq!(find(&report, "endpoint").status, CheckStatus::Fail);
    }

    #[test]
    fn test_missing_credentials_fail() {
        let service = CheckService::new(config_with(Some("https://project.example.co")), None);
        let report = service.run_checks(false).unwrap();
        assert_eq!(find(&report, "credentials").status, CheckStatus::Fail);
    }

    #[test]
    fn test_opaque_key_warns() {
        let creds = Credentials {
            service_key: "opaque-token".to_string(),
        };
        let service = CheckService::new(
            config_with(Some("https://project.example.co")),
            Some(creds),
        );
        let report = service.run_checks(false).unwrap();
        assert_eq!(find(&report, "credentials").status, CheckStatus::Warn);
        // A warning does not fail the overall report
        assert!(report.ok());
    }

    #[test]
    fn test_probe_skipped_without_credentials() {
        let service = CheckService::new(config_with(Some("https://project.example.co")), None);
        let report = service.run_checks(true).unwrap();
        assert_eq!(find(&report, "connectivity").status, CheckStatus::Warn);
    }
}
