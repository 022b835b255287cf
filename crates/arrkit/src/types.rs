//! Typed payloads for the Radarr/Sonarr v3 and Prowlarr v1 APIs.
//!
//! Every payload names the fields the reconciler reads or writes and keeps
//! everything else in a flattened `extra` map, so an entity fetched from one
//! instance can be posted to another without losing fields this crate does
//! not model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Radarr torrent categories Prowlarr syncs by default.
pub const RADARR_SYNC_CATEGORIES: [i64; 10] =
    [2000, 2010, 2020, 2030, 2040, 2045, 2050, 2060, 2070, 2080];

/// Sonarr torrent categories Prowlarr syncs by default.
pub const SONARR_SYNC_CATEGORIES: [i64; 10] =
    [5000, 5010, 5020, 5030, 5040, 5045, 5050, 5060, 5070, 5080];

/// One of the two media-management service families.
///
/// Both expose the same `/api/v3` shape; they differ in naming keys and in
/// how Prowlarr registers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Movies.
    Radarr,
    /// Series.
    Sonarr,
}

impl ServiceKind {
    /// Display label, also the Prowlarr implementation name.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Radarr => "Radarr",
            Self::Sonarr => "Sonarr",
        }
    }

    /// Key used for this family in state and Recyclarr files.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Radarr => "radarr",
            Self::Sonarr => "sonarr",
        }
    }

    /// Default Prowlarr sync categories for this family.
    #[must_use]
    pub fn sync_categories(&self) -> &'static [i64] {
        match self {
            Self::Radarr => &RADARR_SYNC_CATEGORIES,
            Self::Sonarr => &SONARR_SYNC_CATEGORIES,
        }
    }

    /// Both families, in planning order.
    #[must_use]
    pub fn all() -> &'static [ServiceKind] {
        &[ServiceKind::Radarr, ServiceKind::Sonarr]
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Provider fields
// =============================================================================

/// A `{name, value}` entry of a provider's `fields` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name, e.g. "email" or "baseUrl".
    pub name: String,
    /// Field value; absent values deserialize as `null`.
    #[serde(default)]
    pub value: Value,
    /// Schema metadata (label, type, order, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Field {
    /// Create a field with just a name and value.
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            extra: Map::new(),
        }
    }
}

/// Look up a field value by name.
#[must_use]
pub fn field_value<'a>(fields: &'a [Field], name: &str) -> Option<&'a Value> {
    fields.iter().find(|f| f.name == name).map(|f| &f.value)
}

/// Look up a string field value by name.
#[must_use]
pub fn field_str<'a>(fields: &'a [Field], name: &str) -> Option<&'a str> {
    field_value(fields, name).and_then(Value::as_str)
}

// =============================================================================
// Radarr / Sonarr entities
// =============================================================================

/// `GET /api/v3/system/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    /// Application name.
    #[serde(default)]
    pub app_name: Option<String>,
    /// Version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A download client registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadClient {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Implementation type, e.g. "Seedr".
    #[serde(default)]
    pub implementation: String,
    /// Settings contract name.
    #[serde(default)]
    pub config_contract: String,
    /// Whether the client is enabled.
    #[serde(default)]
    pub enable: bool,
    /// "torrent" or "usenet".
    #[serde(default)]
    pub protocol: String,
    /// Client priority.
    #[serde(default)]
    pub priority: i64,
    /// Remove completed downloads from the client.
    #[serde(default)]
    pub remove_completed_downloads: bool,
    /// Remove failed downloads from the client.
    #[serde(default)]
    pub remove_failed_downloads: bool,
    /// Implementation-specific settings.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A root folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootFolder {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Absolute path inside the service container.
    pub path: String,
    /// Remaining fields (free space, accessibility, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A custom format. Specifications are carried opaquely in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFormat {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Name, unique per instance.
    pub name: String,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One custom-format score entry inside a quality profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatItem {
    /// Custom format id on the owning instance.
    pub format: i64,
    /// Custom format name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Score.
    #[serde(default)]
    pub score: i64,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A quality profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityProfile {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Name, unique per instance.
    pub name: String,
    /// Custom format scores; ids refer to the owning instance.
    #[serde(default)]
    pub format_items: Vec<FormatItem>,
    /// Remaining fields (items, cutoff, upgrade settings, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A quality definition (size limits for one quality).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityDefinition {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Minimum size in MB per minute.
    #[serde(default)]
    pub min_size: Option<f64>,
    /// Maximum size in MB per minute.
    #[serde(default)]
    pub max_size: Option<f64>,
    /// Preferred size in MB per minute.
    #[serde(default)]
    pub preferred_size: Option<f64>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QualityDefinition {
    /// Whether the size limits match another definition.
    #[must_use]
    pub fn same_sizes(&self, other: &Self) -> bool {
        self.min_size == other.min_size
            && self.max_size == other.max_size
            && self.preferred_size == other.preferred_size
    }
}

/// The singleton naming configuration.
///
/// Radarr only reports the movie keys and Sonarr only the episode keys; the
/// other half stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamingConfig {
    /// Singleton id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Rename movie files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_movies: Option<bool>,
    /// Movie file name format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_movie_format: Option<String>,
    /// Movie folder format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_folder_format: Option<String>,
    /// Rename episode files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_episodes: Option<bool>,
    /// Standard episode format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_episode_format: Option<String>,
    /// Season folder format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_folder_format: Option<String>,
    /// Series folder format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series_folder_format: Option<String>,
    /// Daily episode format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_episode_format: Option<String>,
    /// Anime episode format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anime_episode_format: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The singleton media management configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaManagementConfig {
    /// Singleton id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Recycle bin path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_bin: Option<String>,
    /// Days before the recycle bin is emptied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_bin_cleanup_days: Option<i64>,
    /// Delete folders left empty after imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_empty_folders: Option<bool>,
    /// Unmonitor movies whose files were deleted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_unmonitor_previously_downloaded_movies: Option<bool>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// Prowlarr entities
// =============================================================================

/// An application registration (also the shape of schema templates).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    /// Server-assigned id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Display name, e.g. "Radarr (alice)".
    #[serde(default)]
    pub name: String,
    /// Implementation, e.g. "Radarr".
    #[serde(default)]
    pub implementation: String,
    /// Settings contract name.
    #[serde(default)]
    pub config_contract: String,
    /// Sync level, e.g. "fullSync".
    #[serde(default)]
    pub sync_level: String,
    /// Implementation settings.
    #[serde(default)]
    pub fields: Vec<Field>,
    /// Tag ids.
    #[serde(default)]
    pub tags: Vec<i64>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Application {
    /// Build a registration from a schema template.
    ///
    /// Known fields (`prowlarrUrl`, `baseUrl`, `apiKey`, `syncCategories`)
    /// are filled in; every other schema field keeps its default.
    #[must_use]
    pub fn from_schema(
        schema: &Application,
        name: &str,
        prowlarr_url: &str,
        base_url: &str,
        api_key: &str,
        sync_categories: &[i64],
    ) -> Self {
        let fields = schema
            .fields
            .iter()
            .map(|field| {
                let mut field = field.clone();
                match field.name.as_str() {
                    "prowlarrUrl" => field.value = Value::from(prowlarr_url),
                    "baseUrl" => field.value = Value::from(base_url),
                    "apiKey" => field.value = Value::from(api_key),
                    "syncCategories" => field.value = Value::from(sync_categories.to_vec()),
                    _ => {}
                }
                field
            })
            .collect();

        let config_contract = if schema.config_contract.is_empty() {
            format!("{}Settings", schema.implementation)
        } else {
            schema.config_contract.clone()
        };

        Self {
            id: None,
            name: name.to_string(),
            implementation: schema.implementation.clone(),
            config_contract,
            sync_level: "fullSync".to_string(),
            fields,
            tags: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Body and response of `POST /api/v1/command`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    /// Command id (response only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Command name, e.g. "AppIndexerSync".
    pub name: String,
    /// Queue status (response only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Remaining fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Command {
    /// Create a command body by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
