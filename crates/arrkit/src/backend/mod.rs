//! Backend traits and implementations for the service APIs.
//!
//! [`ArrBackend`] covers Radarr and Sonarr (their v3 APIs are the same
//! shape); [`IndexerBackend`] covers Prowlarr. The HTTP implementations live
//! in [`arr`] and [`prowlarr`].
//!
//! # Testing
//!
//! Use [`MockArr`] and [`MockIndexer`] for testing without network access.
//! Clones share state, so a test can hand one clone to the code under test
//! and inspect the other afterwards:
//!
//! ```
//! use arrkit::backend::{ArrBackend, MockArr};
//!
//! let mock = MockArr::new("http://radarr:7878");
//! mock.add_root_folder("/movies");
//!
//! let folders = mock.root_folders().unwrap();
//! assert_eq!(folders[0].path, "/movies");
//! ```

pub mod arr;
pub mod prowlarr;

use crate::error::{Error, Result};
use crate::types::{
    Application, Command, CustomFormat, DownloadClient, MediaManagementConfig, NamingConfig,
    QualityDefinition, QualityProfile, RootFolder, SystemStatus,
};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Radarr/Sonarr v3 API surface used by the reconciler.
///
/// Root folders are list/create only: the reconciler never deletes them.
pub trait ArrBackend: Send + Sync + fmt::Debug {
    /// Base URL of the instance, for display.
    fn base_url(&self) -> &str;

    /// `GET system/status`.
    fn status(&self) -> Result<SystemStatus>;

    /// `GET downloadclient`.
    fn download_clients(&self) -> Result<Vec<DownloadClient>>;

    /// `POST downloadclient`.
    fn create_download_client(&self, client: &DownloadClient) -> Result<DownloadClient>;

    /// `PUT downloadclient/{id}`.
    fn update_download_client(&self, id: i64, client: &DownloadClient) -> Result<DownloadClient>;

    /// `GET rootfolder`.
    fn root_folders(&self) -> Result<Vec<RootFolder>>;

    /// `POST rootfolder`.
    fn create_root_folder(&self, path: &str) -> Result<RootFolder>;

    /// `GET qualityprofile`.
    fn quality_profiles(&self) -> Result<Vec<QualityProfile>>;

    /// `POST qualityprofile`.
    fn create_quality_profile(&self, profile: &QualityProfile) -> Result<QualityProfile>;

    /// `PUT qualityprofile/{id}`.
    fn update_quality_profile(&self, id: i64, profile: &QualityProfile)
    -> Result<QualityProfile>;

    /// `GET customformat`.
    fn custom_formats(&self) -> Result<Vec<CustomFormat>>;

    /// `POST customformat`.
    fn create_custom_format(&self, format: &CustomFormat) -> Result<CustomFormat>;

    /// `PUT customformat/{id}`.
    fn update_custom_format(&self, id: i64, format: &CustomFormat) -> Result<CustomFormat>;

    /// `GET qualitydefinition`.
    fn quality_definitions(&self) -> Result<Vec<QualityDefinition>>;

    /// `PUT qualitydefinition/update` (bulk replace).
    fn update_quality_definitions(
        &self,
        definitions: &[QualityDefinition],
    ) -> Result<Vec<QualityDefinition>>;

    /// `GET config/naming`.
    fn naming_config(&self) -> Result<NamingConfig>;

    /// `PUT config/naming`.
    fn update_naming_config(&self, config: &NamingConfig) -> Result<NamingConfig>;

    /// `GET config/mediamanagement`.
    fn media_management(&self) -> Result<MediaManagementConfig>;

    /// `PUT config/mediamanagement`.
    fn update_media_management(
        &self,
        config: &MediaManagementConfig,
    ) -> Result<MediaManagementConfig>;
}

/// Prowlarr v1 API surface used by the reconciler.
pub trait IndexerBackend: Send + Sync + fmt::Debug {
    /// Base URL of the instance, for display and as the `prowlarrUrl` field.
    fn base_url(&self) -> &str;

    /// `GET system/status`.
    fn status(&self) -> Result<SystemStatus>;

    /// `GET applications`.
    fn applications(&self) -> Result<Vec<Application>>;

    /// `GET applications/schema`.
    fn application_schemas(&self) -> Result<Vec<Application>>;

    /// `POST applications`.
    fn create_application(&self, app: &Application) -> Result<Application>;

    /// `PUT applications/{id}`.
    fn update_application(&self, id: i64, app: &Application) -> Result<Application>;

    /// `POST command`.
    fn command(&self, name: &str) -> Result<Command>;

    /// Fetch the schema template for one implementation.
    ///
    /// # Errors
    ///
    /// Returns `Error::SchemaNotFound` if Prowlarr has no such implementation.
    fn application_schema(&self, implementation: &str) -> Result<Application> {
        self.application_schemas()?
            .into_iter()
            .find(|s| s.implementation == implementation)
            .ok_or_else(|| Error::SchemaNotFound {
                implementation: implementation.to_string(),
            })
    }

    /// Trigger Prowlarr's application indexer sync.
    fn trigger_app_indexer_sync(&self) -> Result<Command> {
        self.command("AppIndexerSync")
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// MockArr
// =============================================================================

#[derive(Debug, Default)]
struct ArrState {
    next_id: i64,
    status: SystemStatus,
    download_clients: Vec<DownloadClient>,
    root_folders: Vec<RootFolder>,
    quality_profiles: Vec<QualityProfile>,
    custom_formats: Vec<CustomFormat>,
    quality_definitions: Vec<QualityDefinition>,
    naming: NamingConfig,
    media_management: MediaManagementConfig,
    failing: HashSet<&'static str>,
    unreachable: bool,
    calls: Vec<String>,
}

impl ArrState {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&mut self, call: &'static str) -> Result<()> {
        if self.unreachable {
            return Err(Error::http("connection refused", None));
        }
        self.calls.push(call.to_string());
        if self.failing.contains(call) {
            return Err(Error::http(format!("HTTP 500 on {call}"), Some(500)));
        }
        Ok(())
    }
}

/// In-memory Radarr/Sonarr for tests.
///
/// Ids are assigned from a single counter starting at 1. Individual calls can
/// be made to fail with [`MockArr::fail_on`], or every call with
/// [`MockArr::unreachable`].
#[derive(Debug, Clone)]
pub struct MockArr {
    base_url: String,
    state: Arc<Mutex<ArrState>>,
}

impl MockArr {
    /// Create an empty mock instance.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Arc::default(),
        }
    }

    /// Create a mock whose every call fails with a connection error.
    #[must_use]
    pub fn unreachable(base_url: impl Into<String>) -> Self {
        let mock = Self::new(base_url);
        lock(&mock.state).unreachable = true;
        mock
    }

    /// Make the named call (e.g. `"create_root_folder"`) fail with HTTP 500.
    pub fn fail_on(&self, call: &'static str) {
        lock(&self.state).failing.insert(call);
    }

    /// Calls made so far, by trait method name.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    /// Set the reported version.
    pub fn set_version(&self, version: &str) {
        lock(&self.state).status.version = Some(version.to_string());
    }

    /// Seed a download client; returns its id.
    pub fn add_download_client(&self, mut client: DownloadClient) -> i64 {
        let mut state = lock(&self.state);
        let id = state.assign_id();
        client.id = Some(id);
        state.download_clients.push(client);
        id
    }

    /// Seed a root folder; returns its id.
    pub fn add_root_folder(&self, path: &str) -> i64 {
        let mut state = lock(&self.state);
        let id = state.assign_id();
        state.root_folders.push(RootFolder {
            id: Some(id),
            path: path.to_string(),
            ..RootFolder::default()
        });
        id
    }

    /// Seed a custom format; returns its id.
    pub fn add_custom_format(&self, name: &str) -> i64 {
        let mut state = lock(&self.state);
        let id = state.assign_id();
        state.custom_formats.push(CustomFormat {
            id: Some(id),
            name: name.to_string(),
            ..CustomFormat::default()
        });
        id
    }

    /// Seed a quality profile; returns its id.
    pub fn add_quality_profile(&self, mut profile: QualityProfile) -> i64 {
        let mut state = lock(&self.state);
        let id = state.assign_id();
        profile.id = Some(id);
        state.quality_profiles.push(profile);
        id
    }

    /// Replace the quality definitions.
    pub fn set_quality_definitions(&self, definitions: Vec<QualityDefinition>) {
        lock(&self.state).quality_definitions = definitions;
    }

    /// Replace the naming config.
    pub fn set_naming(&self, naming: NamingConfig) {
        lock(&self.state).naming = naming;
    }

    /// Replace the media management config.
    pub fn set_media_management(&self, config: MediaManagementConfig) {
        lock(&self.state).media_management = config;
    }

    /// Current download clients.
    #[must_use]
    pub fn download_client_list(&self) -> Vec<DownloadClient> {
        lock(&self.state).download_clients.clone()
    }

    /// Current root folder paths.
    #[must_use]
    pub fn root_folder_paths(&self) -> Vec<String> {
        lock(&self.state)
            .root_folders
            .iter()
            .map(|r| r.path.clone())
            .collect()
    }

    /// Current custom formats.
    #[must_use]
    pub fn custom_format_list(&self) -> Vec<CustomFormat> {
        lock(&self.state).custom_formats.clone()
    }

    /// Current quality profiles.
    #[must_use]
    pub fn quality_profile_list(&self) -> Vec<QualityProfile> {
        lock(&self.state).quality_profiles.clone()
    }

    /// Current quality definitions.
    #[must_use]
    pub fn quality_definition_list(&self) -> Vec<QualityDefinition> {
        lock(&self.state).quality_definitions.clone()
    }

    /// Current naming config.
    #[must_use]
    pub fn naming(&self) -> NamingConfig {
        lock(&self.state).naming.clone()
    }

    /// Current media management config.
    #[must_use]
    pub fn media(&self) -> MediaManagementConfig {
        lock(&self.state).media_management.clone()
    }
}

fn replace_by_id<T: Clone>(
    items: &mut [T],
    entity: &'static str,
    id: i64,
    value: T,
    id_of: impl Fn(&T) -> Option<i64>,
) -> Result<T> {
    let slot = items
        .iter_mut()
        .find(|item| id_of(item) == Some(id))
        .ok_or(Error::NotFound { entity, id })?;
    *slot = value;
    Ok(slot.clone())
}

impl ArrBackend for MockArr {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status(&self) -> Result<SystemStatus> {
        let mut state = lock(&self.state);
        state.check("status")?;
        Ok(state.status.clone())
    }

    fn download_clients(&self) -> Result<Vec<DownloadClient>> {
        let mut state = lock(&self.state);
        state.check("download_clients")?;
        Ok(state.download_clients.clone())
    }

    fn create_download_client(&self, client: &DownloadClient) -> Result<DownloadClient> {
        let mut state = lock(&self.state);
        state.check("create_download_client")?;
        let mut created = client.clone();
        created.id = Some(state.assign_id());
        state.download_clients.push(created.clone());
        Ok(created)
    }

    fn update_download_client(&self, id: i64, client: &DownloadClient) -> Result<DownloadClient> {
        let mut state = lock(&self.state);
        state.check("update_download_client")?;
        let mut updated = client.clone();
        updated.id = Some(id);
        replace_by_id(&mut state.download_clients, "download client", id, updated, |c| c.id)
    }

    fn root_folders(&self) -> Result<Vec<RootFolder>> {
        let mut state = lock(&self.state);
        state.check("root_folders")?;
        Ok(state.root_folders.clone())
    }

    fn create_root_folder(&self, path: &str) -> Result<RootFolder> {
        let mut state = lock(&self.state);
        state.check("create_root_folder")?;
        let folder = RootFolder {
            id: Some(state.assign_id()),
            path: path.to_string(),
            ..RootFolder::default()
        };
        state.root_folders.push(folder.clone());
        Ok(folder)
    }

    fn quality_profiles(&self) -> Result<Vec<QualityProfile>> {
        let mut state = lock(&self.state);
        state.check("quality_profiles")?;
        Ok(state.quality_profiles.clone())
    }

    fn create_quality_profile(&self, profile: &QualityProfile) -> Result<QualityProfile> {
        let mut state = lock(&self.state);
        state.check("create_quality_profile")?;
        let mut created = profile.clone();
        created.id = Some(state.assign_id());
        state.quality_profiles.push(created.clone());
        Ok(created)
    }

    fn update_quality_profile(
        &self,
        id: i64,
        profile: &QualityProfile,
    ) -> Result<QualityProfile> {
        let mut state = lock(&self.state);
        state.check("update_quality_profile")?;
        let mut updated = profile.clone();
        updated.id = Some(id);
        replace_by_id(&mut state.quality_profiles, "quality profile", id, updated, |p| p.id)
    }

    fn custom_formats(&self) -> Result<Vec<CustomFormat>> {
        let mut state = lock(&self.state);
        state.check("custom_formats")?;
        Ok(state.custom_formats.clone())
    }

    fn create_custom_format(&self, format: &CustomFormat) -> Result<CustomFormat> {
        let mut state = lock(&self.state);
        state.check("create_custom_format")?;
        let mut created = format.clone();
        created.id = Some(state.assign_id());
        state.custom_formats.push(created.clone());
        Ok(created)
    }

    fn update_custom_format(&self, id: i64, format: &CustomFormat) -> Result<CustomFormat> {
        let mut state = lock(&self.state);
        state.check("update_custom_format")?;
        let mut updated = format.clone();
        updated.id = Some(id);
        replace_by_id(&mut state.custom_formats, "custom format", id, updated, |c| c.id)
    }

    fn quality_definitions(&self) -> Result<Vec<QualityDefinition>> {
        let mut state = lock(&self.state);
        state.check("quality_definitions")?;
        Ok(state.quality_definitions.clone())
    }

    fn update_quality_definitions(
        &self,
        definitions: &[QualityDefinition],
    ) -> Result<Vec<QualityDefinition>> {
        let mut state = lock(&self.state);
        state.check("update_quality_definitions")?;
        state.quality_definitions = definitions.to_vec();
        Ok(state.quality_definitions.clone())
    }

    fn naming_config(&self) -> Result<NamingConfig> {
        let mut state = lock(&self.state);
        state.check("naming_config")?;
        Ok(state.naming.clone())
    }

    fn update_naming_config(&self, config: &NamingConfig) -> Result<NamingConfig> {
        let mut state = lock(&self.state);
        state.check("update_naming_config")?;
        state.naming = config.clone();
        Ok(state.naming.clone())
    }

    fn media_management(&self) -> Result<MediaManagementConfig> {
        let mut state = lock(&self.state);
        state.check("media_management")?;
        Ok(state.media_management.clone())
    }

    fn update_media_management(
        &self,
        config: &MediaManagementConfig,
    ) -> Result<MediaManagementConfig> {
        let mut state = lock(&self.state);
        state.check("update_media_management")?;
        state.media_management = config.clone();
        Ok(state.media_management.clone())
    }
}

// =============================================================================
// MockIndexer
// =============================================================================

#[derive(Debug, Default)]
struct IndexerState {
    next_id: i64,
    status: SystemStatus,
    applications: Vec<Application>,
    schemas: Vec<Application>,
    commands: Vec<String>,
    failing: HashSet<&'static str>,
    unreachable: bool,
}

impl IndexerState {
    fn check(&self, call: &'static str) -> Result<()> {
        if self.unreachable {
            return Err(Error::http("connection refused", None));
        }
        if self.failing.contains(call) {
            return Err(Error::http(format!("HTTP 500 on {call}"), Some(500)));
        }
        Ok(())
    }
}

/// In-memory Prowlarr for tests.
#[derive(Debug, Clone)]
pub struct MockIndexer {
    base_url: String,
    state: Arc<Mutex<IndexerState>>,
}

impl MockIndexer {
    /// Create an empty mock with no schemas.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            state: Arc::default(),
        }
    }

    /// Create a mock that knows the Radarr and Sonarr schemas.
    #[must_use]
    pub fn with_arr_schemas(base_url: impl Into<String>) -> Self {
        let mock = Self::new(base_url);
        for implementation in ["Radarr", "Sonarr"] {
            mock.add_schema(Application {
                implementation: implementation.to_string(),
                config_contract: format!("{implementation}Settings"),
                fields: ["prowlarrUrl", "baseUrl", "apiKey", "syncCategories"]
                    .into_iter()
                    .map(|name| crate::types::Field::new(name, serde_json::Value::Null))
                    .collect(),
                ..Application::default()
            });
        }
        mock
    }

    /// Create a mock whose every call fails with a connection error.
    #[must_use]
    pub fn unreachable(base_url: impl Into<String>) -> Self {
        let mock = Self::new(base_url);
        lock(&mock.state).unreachable = true;
        mock
    }

    /// Make the named call fail with HTTP 500.
    pub fn fail_on(&self, call: &'static str) {
        lock(&self.state).failing.insert(call);
    }

    /// Add a schema template.
    pub fn add_schema(&self, schema: Application) {
        lock(&self.state).schemas.push(schema);
    }

    /// Seed an application; returns its id.
    pub fn add_application(&self, mut app: Application) -> i64 {
        let mut state = lock(&self.state);
        state.next_id += 1;
        let id = state.next_id;
        app.id = Some(id);
        state.applications.push(app);
        id
    }

    /// Current applications.
    #[must_use]
    pub fn application_list(&self) -> Vec<Application> {
        lock(&self.state).applications.clone()
    }

    /// Names of commands triggered so far.
    #[must_use]
    pub fn commands(&self) -> Vec<String> {
        lock(&self.state).commands.clone()
    }
}

impl IndexerBackend for MockIndexer {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn status(&self) -> Result<SystemStatus> {
        let state = lock(&self.state);
        state.check("status")?;
        Ok(state.status.clone())
    }

    fn applications(&self) -> Result<Vec<Application>> {
        let state = lock(&self.state);
        state.check("applications")?;
        Ok(state.applications.clone())
    }

    fn application_schemas(&self) -> Result<Vec<Application>> {
        let state = lock(&self.state);
        state.check("application_schemas")?;
        Ok(state.schemas.clone())
    }

    fn create_application(&self, app: &Application) -> Result<Application> {
        let mut state = lock(&self.state);
        state.check("create_application")?;
        state.next_id += 1;
        let mut created = app.clone();
        created.id = Some(state.next_id);
        state.applications.push(created.clone());
        Ok(created)
    }

    fn update_application(&self, id: i64, app: &Application) -> Result<Application> {
        let mut state = lock(&self.state);
        state.check("update_application")?;
        let mut updated = app.clone();
        updated.id = Some(id);
        replace_by_id(&mut state.applications, "application", id, updated, |a| a.id)
    }

    fn command(&self, name: &str) -> Result<Command> {
        let mut state = lock(&self.state);
        state.check("command")?;
        state.commands.push(name.to_string());
        Ok(Command {
            status: Some("queued".to_string()),
            ..Command::named(name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_arr_assigns_ids() {
        let mock = MockArr::new("http://radarr");
        let first = mock.add_root_folder("/movies");
        let created = mock.create_root_folder("/movies-4k").unwrap();
        assert_eq!(first, 1);
        assert_eq!(created.id, Some(2));
        assert_eq!(mock.root_folder_paths(), vec!["/movies", "/movies-4k"]);
    }

    #[test]
    fn test_mock_arr_clones_share_state() {
        let mock = MockArr::new("http://radarr");
        let other = mock.clone();
        other.add_custom_format("x265");
        assert_eq!(mock.custom_formats().unwrap().len(), 1);
    }

    #[test]
    fn test_mock_arr_fail_on() {
        let mock = MockArr::new("http://radarr");
        mock.fail_on("create_root_folder");
        let err = mock.create_root_folder("/movies").unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(mock.root_folder_paths().is_empty());
    }

    #[test]
    fn test_mock_arr_unreachable() {
        let mock = MockArr::unreachable("http://radarr");
        assert!(mock.status().is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_mock_arr_update_unknown_id() {
        let mock = MockArr::new("http://radarr");
        let result = mock.update_quality_profile(42, &QualityProfile::default());
        assert!(matches!(result, Err(Error::NotFound { id: 42, .. })));
    }

    #[test]
    fn test_mock_indexer_schema_lookup() {
        let mock = MockIndexer::with_arr_schemas("http://prowlarr");
        assert_eq!(
            mock.application_schema("Sonarr").unwrap().config_contract,
            "SonarrSettings"
        );
        let missing = mock.application_schema("Lidarr");
        assert!(matches!(missing, Err(Error::SchemaNotFound { .. })));
    }

    #[test]
    fn test_mock_indexer_trigger_sync() {
        let mock = MockIndexer::new("http://prowlarr");
        let command = mock.trigger_app_indexer_sync().unwrap();
        assert_eq!(command.name, "AppIndexerSync");
        assert_eq!(mock.commands(), vec!["AppIndexerSync"]);
    }
}
