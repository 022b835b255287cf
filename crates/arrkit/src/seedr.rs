//! Seedr credential validation.
//!
//! A live `GET /user` with basic auth confirms the credentials a user declared
//! before they are pushed into a download client.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Seedr REST API root.
pub const SEEDR_API_URL: &str = "https://www.seedr.cc/rest";

/// Timeout for Seedr calls.
pub const SEEDR_TIMEOUT: Duration = Duration::from_secs(10);

/// Account details returned by `GET /user`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SeedrAccount {
    /// Account name.
    #[serde(default)]
    pub username: Option<String>,
    /// Bytes stored.
    #[serde(default)]
    pub space_used: Option<u64>,
    /// Storage quota in bytes.
    #[serde(default)]
    pub space_max: Option<u64>,
    /// Bytes transferred this period.
    #[serde(default)]
    pub bandwidth_used: Option<u64>,
    /// Error reported in an otherwise successful response.
    #[serde(default)]
    pub error: Option<Value>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Checks cloud-download credentials against the provider.
pub trait CredentialValidator {
    /// Validate `email`/`password`, returning the account on success.
    ///
    /// # Errors
    ///
    /// `Error::Auth` when the credentials are rejected, `Error::Api` when the
    /// provider reports an error, `Error::HttpError` on connectivity failures.
    fn validate(&self, email: &str, password: &str) -> Result<SeedrAccount>;
}

/// Validator backed by the Seedr REST API.
#[derive(Debug)]
pub struct SeedrValidator {
    agent: ureq::Agent,
    api_base: String,
}

impl Default for SeedrValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedrValidator {
    /// Validator against the public Seedr API.
    #[must_use]
    pub fn new() -> Self {
        Self::with_api_base(SEEDR_API_URL)
    }

    /// Validator against another API root (tests, proxies).
    #[must_use]
    pub fn with_api_base(api_base: &str) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(SEEDR_TIMEOUT))
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

fn basic_auth(email: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{email}:{password}")))
}

impl CredentialValidator for SeedrValidator {
    fn validate(&self, email: &str, password: &str) -> Result<SeedrAccount> {
        let url = format!("{}/user", self.api_base);
        log::debug!("GET {url} as {email}");

        let mut response = self
            .agent
            .get(&url)
            .header("Authorization", &basic_auth(email, password))
            .call()
            .map_err(|e| Error::http(format!("failed to connect to Seedr API: {e}"), None))?;

        let status = response.status().as_u16();
        if status == 401 {
            return Err(Error::Auth {
                email: email.to_string(),
            });
        }
        if !(200..300).contains(&status) {
            return Err(Error::http(format!("HTTP {status}"), Some(status)));
        }

        let account: SeedrAccount = response.body_mut().read_json()?;
        if let Some(error) = &account.error {
            let message = error
                .as_str()
                .map_or_else(|| error.to_string(), str::to_string);
            return Err(Error::Api {
                email: email.to_string(),
                message,
            });
        }
        Ok(account)
    }
}
