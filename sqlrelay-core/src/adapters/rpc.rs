//! HTTP RPC client
//!
//! Submits statements to the hosted database's RPC execution endpoint as
//! `POST {endpoint}{rpc_path}` with the service key in both the `apikey`
//! header and an `Authorization: Bearer` header, and the statement in a JSON
//! `query` field.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::json;
use url::Url;

use crate::domain::result::{Error, Result};
use crate::ports::StatementExecutor;

/// Characters of the endpoint's error body kept in failure messages
const BODY_EXCERPT_LEN: usize = 200;

/// Client for the remote RPC execution endpoint
#[derive(Debug)]
pub struct RpcClient {
    client: Client,
    rpc_url: String,
    service_key: String,
}

impl RpcClient {
    /// Create a new client.
    ///
    /// The endpoint must be an https URL with a host, and the service key
    /// must be non-empty. Requests carry `timeout`.
    pub fn new(
        endpoint: &str,
        rpc_path: &str,
        service_key: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let parsed = Url::parse(endpoint)
            .map_err(|e| Error::config(format!("Invalid endpoint URL: {}", e)))?;

        if parsed.scheme() != "https" {
            return Err(Error::config("Endpoint URL must use HTTPS"));
        }

        let host = parsed
            .host_str()
            .ok_or_else(|| Error::config("Endpoint URL must include a host"))?;

        if service_key.trim().is_empty() {
            return Err(Error::config("Service key must not be empty"));
        }

        // Normalize: scheme + host (+ port), no trailing slash or path
        let base_url = match parsed.port() {
            Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
            None => format!("{}://{}", parsed.scheme(), host),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url: format!("{}{}", base_url, rpc_path),
            service_key: service_key.to_string(),
        })
    }

    /// Map request errors to user-friendly messages
    fn map_request_error(&self, error: reqwest::Error) -> Error {
        if error.is_timeout() {
            Error::transport("Request timed out")
        } else if error.is_connect() {
            Error::transport("Unable to connect to the endpoint")
        } else {
            Error::transport(format!("Request failed: {}", error))
        }
    }

    /// Check response status and return appropriate errors
    fn check_response_status(&self, response: Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(Error::endpoint(
                status.as_u16(),
                "authentication failed; check that the service key is valid and not revoked",
            )),
            404 => Err(Error::endpoint(
                404,
                "the endpoint does not expose the RPC execution function",
            )),
            400 => {
                let body = response.text().unwrap_or_default();
                Err(Error::endpoint(
                    400,
                    format!("statement rejected: {}", excerpt(&body)),
                ))
            }
            code => Err(Error::endpoint(code, "unexpected response")),
        }
    }
}

impl StatementExecutor for RpcClient {
    fn execute(&self, sql: &str) -> Result<()> {
        // The terminator is stripped during splitting; the endpoint expects
        // complete statements, so re-append it.
        let response = self
            .client
            .post(&self.rpc_url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({ "query": format!("{};", sql) }))
            .send()
            .map_err(|e| self.map_request_error(e))?;

        self.check_response_status(response)
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty response body)".to_string();
    }
    if trimmed.chars().count() > BODY_EXCERPT_LEN {
        let cut: String = trimmed.chars().take(BODY_EXCERPT_LEN).collect();
        format!("{}...", cut)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "service-key";

    fn client(endpoint: &str) -> Result<RpcClient> {
        RpcClient::new(endpoint, "/rest/v1/rpc/query", KEY, Duration::from_secs(30))
    }

    #[test]
    fn test_accepts_https_endpoint() {
        assert!(client("https://project.example.co").is_ok());
    }

    #[test]
    fn test_rejects_http_endpoint() {
        let result = client("http://project.example.co");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("HTTPS"));
    }

    #[test]
    fn test_rejects_unparseable_endpoint() {
        let result = client("not a url");
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_service_key() {
        let result = RpcClient::new(
            "https://project.example.co",
            "/rest/v1/rpc/query",
            "  ",
            Duration::from_secs(30),
        );
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Service key"));
    }

    #[test]
    fn test_rpc_url_ignores_endpoint_path() {
        let c = client("https://project.example.co/some/path").unwrap();
        assert_eq!(c.rpc_url, "https://project.example.co/rest/v1/rpc/query");
    }

    #[test]
    fn test_rpc_url_keeps_port() {
        let c = client("https://localhost:8443").unwrap();
        assert_eq!(c.rpc_url, "https://localhost:8443/rest/v1/rpc/query");
    }

    #[test]
    fn test_excerpt_truncates_long_bodies() {
        let body = "x".repeat(500);
        let cut = excerpt(&body);
        assert!(cut.ends_with("..."));
        assert!(cut.chars().count() <= BODY_EXCERPT_LEN + 3);
    }
}
