//! Serde model of the declared state document (`arr-state.yml`).
//!
//! This is the document exactly as written. [`crate::state`] turns it into a
//! resolved [`crate::state::DesiredState`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root of the state document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prowlarr: Option<ProwlarrDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recyclarr: Option<RecyclarrDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flaresolverr: Option<UrlDoc>,

    /// Users in declaration order
    #[serde(default)]
    pub users: IndexMap<String, UserDoc>,

    /// Top-level blocks arr-sync does not manage
    #[serde(flatten)]
    pub unknown: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProwlarrDoc {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecyclarrDoc {
    #[serde(default)]
    pub config_path: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlDoc {
    #[serde(default)]
    pub url: String,
}

/// One declared user
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seedr: Option<SeedrDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radarr: Option<ServiceDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sonarr: Option<ServiceDoc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overseerr: Option<UrlDoc>,

    /// User whose naming and media management this user inherits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_reference: bool,
}

/// Seedr credentials as written; `email` and `password` are required.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedrDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_directory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_from_cloud: Option<bool>,
}

/// A Radarr or Sonarr block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDoc {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub root_folders: Vec<String>,
    #[serde(default, skip_serializing_if = "NamingOverrides::is_empty")]
    pub naming: NamingOverrides,
    #[serde(default, skip_serializing_if = "MediaOverrides::is_empty")]
    pub media_management: MediaOverrides,
}

/// Naming overrides.
///
/// Only the movie keys can be overridden; other keys are kept in
/// `unsupported` so they can be reported instead of silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename_movies: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_movie_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_folder_format: Option<String>,
    #[serde(flatten)]
    pub unsupported: BTreeMap<String, serde_yaml::Value>,
}

impl NamingOverrides {
    pub fn is_empty(&self) -> bool {
        self.rename_movies.is_none()
            && self.standard_movie_format.is_none()
            && self.movie_folder_format.is_none()
            && self.unsupported.is_empty()
    }
}

/// Media management overrides (recycle bin and empty-folder cleanup only).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycle_bin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_empty_folders: Option<bool>,
    #[serde(flatten)]
    pub unsupported: BTreeMap<String, serde_yaml::Value>,
}

impl MediaOverrides {
    pub fn is_empty(&self) -> bool {
        self.recycle_bin.is_none() && self.delete_empty_folders.is_none() && self.unsupported.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
prowlarr:
  url: http://prowlarr:9696
  container: prowlarr
recyclarr:
  config_path: ~/recyclarr
flaresolverr:
  url: http://flaresolverr:8191
users:
  zoe:
    is_reference: true
    radarr:
      url: http://radarr-zoe:7878
      api_key: abc
      root_folders: ["/movies"]
      naming:
        rename_movies: true
        season_folder_format: "Season {season}"
  adam:
    reference: zoe
    seedr:
      email: a@x.com
      password: p1
    sonarr:
      url: http://sonarr-adam:8989
      container: sonarr-adam
      media_management:
        recycle_bin: /recycle
"#;

    #[test]
    fn test_parse_sample() {
        let doc: StateDocument = serde_yaml::from_str(SAMPLE).unwrap();

        assert_eq!(doc.prowlarr.as_ref().unwrap().container.as_deref(), Some("prowlarr"));
        assert_eq!(doc.recyclarr.as_ref().unwrap().config_path, "~/recyclarr");

        let names: Vec<&str> = doc.users.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zoe", "adam"]);

        let zoe = &doc.users["zoe"];
        assert!(zoe.is_reference);
        let radarr = zoe.radarr.as_ref().unwrap();
        assert_eq!(radarr.naming.rename_movies, Some(true));
        assert!(radarr.naming.unsupported.contains_key("season_folder_format"));

        let adam = &doc.users["adam"];
        assert_eq!(adam.reference.as_deref(), Some("zoe"));
        assert_eq!(
            adam.sonarr.as_ref().unwrap().media_management.recycle_bin.as_deref(),
            Some("/recycle")
        );
        assert!(adam.sonarr.as_ref().unwrap().naming.is_empty());
    }

    #[test]
    fn test_unknown_top_level_blocks_are_kept_aside() {
        let doc: StateDocument =
            serde_yaml::from_str("overseerr:\n  url: x\nusers:\n  zoe: {}\n").unwrap();
        assert!(doc.unknown.contains_key("overseerr"));
        assert_eq!(doc.users.len(), 1);
        assert!(doc.prowlarr.is_none());
    }

    #[test]
    fn test_empty_document() {
        let doc: StateDocument = serde_yaml::from_str("{}").unwrap();
        assert!(doc.users.is_empty());
        assert!(doc.prowlarr.is_none());
    }

    #[test]
    fn test_serialize_skips_empty_overrides() {
        let svc = ServiceDoc {
            url: "http://radarr:7878".into(),
            ..ServiceDoc::default()
        };
        let yaml = serde_yaml::to_string(&svc).unwrap();
        assert!(!yaml.contains("naming"));
        assert!(!yaml.contains("media_management"));
    }
}
