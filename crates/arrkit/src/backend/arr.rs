//! Radarr/Sonarr v3 HTTP backend.

use crate::DEFAULT_TIMEOUT;
use crate::backend::ArrBackend;
use crate::error::Result;
use crate::types::{
    CustomFormat, DownloadClient, MediaManagementConfig, NamingConfig, QualityDefinition,
    QualityProfile, RootFolder, SystemStatus,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;

/// Blocking client for one Radarr or Sonarr instance.
///
/// Every request carries the `X-Api-Key` header and is bounded by a global
/// timeout (30 seconds unless built with [`HttpArr::with_timeout`]).
///
/// # Example
///
/// ```no_run
/// use arrkit::backend::ArrBackend;
/// use arrkit::backend::arr::HttpArr;
///
/// let radarr = HttpArr::new("http://localhost:7878", "0123456789abcdef");
/// let status = radarr.status().unwrap();
/// println!("Radarr {}", status.version.unwrap_or_default());
/// ```
pub struct HttpArr {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
}

impl HttpArr {
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
        format!("{}/api/v3/{}", self.base_url, path.trim_start_matches('/'))
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

    fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        log::debug!("POST {url}");
        let value = self
            .agent
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .send_json(body)?
            .body_mut()
            .read_json()?;
        Ok(value)
    }

    fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        log::debug!("PUT {url}");
        let value = self
            .agent
            .put(&url)
            .header("X-Api-Key", &self.api_key)
            .send_json(body)?
            .body_mut()
            .read_json()?;
        Ok(value)
    }
}

impl fmt::Debug for HttpArr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpArr")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ArrBackend for HttpArr {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status(&self) -> Result<SystemStatus> {
        self.get("system/status")
    }

    fn download_clients(&self) -> Result<Vec<DownloadClient>> {
        self.get("downloadclient")
    }

    fn create_download_client(&self, client: &DownloadClient) -> Result<DownloadClient> {
        self.post("downloadclient", client)
    }

    fn update_download_client(&self, id: i64, client: &DownloadClient) -> Result<DownloadClient> {
        let body = DownloadClient {
            id: Some(id),
            ..client.clone()
        };
        self.put(&format!("downloadclient/{id}"), &body)
    }

    fn root_folders(&self) -> Result<Vec<RootFolder>> {
        self.get("rootfolder")
    }

    fn create_root_folder(&self, path: &str) -> Result<RootFolder> {
        self.post("rootfolder", &serde_json::json!({ "path": path }))
    }

    fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        self.get("qualityprofile")
    }

    fn create_quality_profile(&self, profile: &QualityProfile) -> Result<QualityProfile> {
        self.post("qualityprofile", profile)
    }

    fn update_quality_profile(
        &self,
        id: i64,
        profile: &QualityProfile,
    ) -> Result<QualityProfile> {
        let body = QualityProfile {
            id: Some(id),
            ..profile.clone()
        };
        self.put(&format!("qualityprofile/{id}"), &body)
    }

    fn custom_formats(&self) -> Result<Vec<CustomFormat>> {
        self.get("customformat")
    }

    fn create_custom_format(&self, format: &CustomFormat) -> Result<CustomFormat> {
        self.post("customformat", format)
    }

    fn update_custom_format(&self, id: i64, format: &CustomFormat) -> Result<CustomFormat> {
        let body = CustomFormat {
            id: Some(id),
            ..format.clone()
        };
        self.put(&format!("customformat/{id}"), &body)
    }

    fn quality_definitions(&self) -> Result<Vec<QualityDefinition>> {
        self.get("qualitydefinition")
    }

    fn update_quality_definitions(
        &self,
        definitions: &[QualityDefinition],
    ) -> Result<Vec<QualityDefinition>> {
        self.put("qualitydefinition/update", definitions)
    }

    fn naming_config(&self) -> Result<NamingConfig> {
        self.get("config/naming")
    }

    fn update_naming_config(&self, config: &NamingConfig) -> Result<NamingConfig> {
        self.put("config/naming", config)
    }

    fn media_management(&self) -> Result<MediaManagementConfig> {
        self.get("config/mediamanagement")
    }

    fn update_media_management(
        &self,
        config: &MediaManagementConfig,
    ) -> Result<MediaManagementConfig> {
        self.put("config/mediamanagement", config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorCategory};
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_url_building() {
        let client = HttpArr::new("http://radarr:7878/", "key");
        assert_eq!(client.base_url(), "http://radarr:7878");
        assert_eq!(client.url("/rootfolder"), "http://radarr:7878/api/v3/rootfolder");
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = HttpArr::new("http://radarr:7878", "supersecret");
        assert!(!format!("{client:?}").contains("supersecret"));
    }

    #[test]
    fn test_get_root_folders_sends_api_key() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/api/v3/rootfolder")
                .header("X-Api-Key", "abc123");
            then.status(200)
                .json_body(json!([{"id": 1, "path": "/movies", "freeSpace": 10}]));
        });

        let client = HttpArr::new(&server.base_url(), "abc123");
        let folders = client.root_folders().unwrap();

        mock.assert();
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].path, "/movies");
        assert_eq!(folders[0].extra["freeSpace"], 10);
    }

    #[test]
    fn test_create_root_folder_posts_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/v3/rootfolder")
                .json_body(json!({"path": "/movies-4k"}));
            then.status(201).json_body(json!({"id": 5, "path": "/movies-4k"}));
        });

        let client = HttpArr::new(&server.base_url(), "k");
        let created = client.create_root_folder("/movies-4k").unwrap();

        mock.assert();
        assert_eq!(created.id, Some(5));
    }

    #[test]
    fn test_update_download_client_puts_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT)
                .path("/api/v3/downloadclient/3")
                .json_body_includes(r#"{"id": 3, "name": "Seedr"}"#);
            then.status(202).json_body(json!({"id": 3, "name": "Seedr"}));
        });

        let client = HttpArr::new(&server.base_url(), "k");
        let body = DownloadClient {
            name: "Seedr".to_string(),
            ..DownloadClient::default()
        };
        let updated = client.update_download_client(3, &body).unwrap();

        mock.assert();
        assert_eq!(updated.id, Some(3));
    }

    #[test]
    fn test_bulk_quality_definitions_endpoint() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(PUT).path("/api/v3/qualitydefinition/update");
            then.status(202).json_body(json!([{"id": 1, "minSize": 1.0}]));
        });

        let client = HttpArr::new(&server.base_url(), "k");
        let result = client
            .update_quality_definitions(&[QualityDefinition {
                id: Some(1),
                min_size: Some(1.0),
                ..QualityDefinition::default()
            }])
            .unwrap();

        mock.assert();
        assert_eq!(result[0].min_size, Some(1.0));
    }

    #[test]
    fn test_server_error_is_network_category() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/system/status");
            then.status(500);
        });

        let client = HttpArr::new(&server.base_url(), "k");
        let err = client.status().unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_invalid_json_is_format_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/api/v3/config/naming");
            then.status(200)
                .header("content-type", "application/json")
                .body("not json");
        });

        let client = HttpArr::new(&server.base_url(), "k");
        let err = client.naming_config().unwrap_err();

        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
