//! Prowlarr v1 HTTP backend.

use crate::DEFAULT_TIMEOUT;
use crate::backend::IndexerBackend;
use crate::error::Result;
use crate::types::{Application, Command, SystemStatus};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Blocking client for a Prowlarr instance.
pub struct HttpProwlarr {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpProwlarr {
    /// Create a client with the default timeout.
    #[must_use]
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self::with_timeout(base_url, api_key, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    #[must_use]
    pub fn with_timeout(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        log::debug!("GET {url}");
        let value = self
            .agent
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .call()?
            .body_mut()
            .read_json()?;
        Ok(value)
    }

    fn send<B: Serialize, T: DeserializeOwned>(&self, put: bool, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        log::debug!("{} {url}", if put { "PUT" } else { "POST" });
        let request = if put {
            self.agent.put(&url)
        } else {
            self.agent.post(&url)
        };
        let value = request
            .header("X-Api-Key", &self.api_key)
            .send_json(body)?
            .body_mut()
            .read_json()?;
        Ok(value)
    }
}

impl fmt::Debug for HttpProwlarr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpProwlarr")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl IndexerBackend for HttpProwlarr {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status(&self) -> Result<SystemStatus> {
        self.get("system/status")
    }

    fn applications(&self) -> Result<Vec<Application>> {
        self.get("applications")
    }

    fn application_schemas(&self) -> Result<Vec<Application>> {
        self.get("applications/schema")
    }

    fn create_application(&self, app: &Application) -> Result<Application> {
        self.send(false, "applications", app)
    }

    fn update_application(&self, id: i64, app: &Application) -> Result<Application> {
        let body = Application {
            id: Some(id),
            ..app.clone()
        };
        self.send(true, &format!("applications/{id}"), &body)
    }

    fn command(&self, name: &str) -> Result<Command> {
        self.send(false, "command", &Command::named(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_application_schema_lookup() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/api/v1/applications/schema")
                .header("X-Api-Key", "pk");
            then.status(200).json_body(json!([
                {"implementation": "Radarr", "configContract": "RadarrSettings", "fields": []},
                {"implementation": "Sonarr", "configContract": "SonarrSettings", "fields": []}
            ]));
        });

        let client = HttpProwlarr::new(&server.base_url(), "pk");
        let schema = client.application_schema("Sonarr").unwrap();
        assert_eq!(schema.config_contract, "SonarrSettings");

        let missing = client.application_schema("Lidarr");
        assert!(matches!(missing, Err(Error::SchemaNotFound { .. })));
    }

    #[test]
    fn test_trigger_sync_posts_command() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v1/command")
                .json_body(json!({"name": "AppIndexerSync"}));
            then.status(201)
                .json_body(json!({"id": 9, "name": "AppIndexerSync", "status": "queued"}));
        });

        let client = HttpProwlarr::new(&server.base_url(), "pk");
        let command = client.trigger_app_indexer_sync().unwrap();

        mock.assert();
        assert_eq!(command.id, Some(9));
        assert_eq!(command.status.as_deref(), Some("queued"));
    }

    #[test]
    fn test_update_application_uses_put() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/api/v1/applications/4");
            then.status(202)
                .json_body(json!({"id": 4, "name": "Radarr (alice)", "implementation": "Radarr"}));
        });

        let client = HttpProwlarr::new(&server.base_url(), "pk");
        let app = Application {
            name: "Radarr (alice)".to_string(),
            ..Application::default()
        };
        let updated = client.update_application(4, &app).unwrap();

        mock.assert();
        assert_eq!(updated.id, Some(4));
    }
}
