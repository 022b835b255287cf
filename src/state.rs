//! Config resolution: turns the parsed state document into a [`DesiredState`].
//!
//! Resolution never talks to the services themselves. The only outside
//! contact is the key resolver, which may run `docker exec` when a service
//! declares a `container` instead of an `api_key`.

use arrkit::ServiceKind;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::apikey::KeyResolver;
use crate::paths;
use crate::schema::{
    MediaOverrides, NamingOverrides, ProwlarrDoc, SeedrDoc, ServiceDoc, StateDocument, UserDoc,
};

/// Default Seedr download directory
pub const DEFAULT_DOWNLOAD_DIR: &str = "/downloads";

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("User '{user}': missing required field '{field}'")]
    MissingField { user: String, field: String },

    #[error("User '{user}' references unknown user '{reference}'")]
    UnknownReference { user: String, reference: String },

    #[error(
        "User '{user}' references '{reference}', which itself has a reference; only one level of reference is supported"
    )]
    ReferenceChain { user: String, reference: String },

    #[error("Could not resolve API key for {owner} from container '{container}': {message}")]
    KeyExtraction {
        owner: String,
        container: String,
        message: String,
    },
}

pub type Result<T> = std::result::Result<T, StateError>;

// ============================================================================
// Resolved model
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    pub prowlarr: Option<ProwlarrConfig>,
    pub recyclarr: Option<RecyclarrConfig>,
    pub flaresolverr: Option<String>,
    pub users: IndexMap<String, UserState>,
}

impl DesiredState {
    pub fn user(&self, name: &str) -> Option<&UserState> {
        self.users.get(name)
    }

    /// Users in declaration order, optionally restricted to one
    pub fn users_filtered<'a>(
        &'a self,
        only: Option<&'a str>,
    ) -> impl Iterator<Item = &'a UserState> + 'a {
        self.users
            .values()
            .filter(move |u| only.is_none_or(|name| u.name == name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProwlarrConfig {
    pub url: String,
    pub api_key: String,
}

impl ProwlarrConfig {
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecyclarrConfig {
    pub config_path: PathBuf,
}

impl RecyclarrConfig {
    pub fn file(&self) -> PathBuf {
        self.config_path.join("recyclarr.yml")
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub name: String,
    pub seedr: Option<SeedrConfig>,
    pub radarr: Option<ServiceConfig>,
    pub sonarr: Option<ServiceConfig>,
    pub overseerr: Option<String>,
    pub reference: Option<String>,
    pub is_reference: bool,
}

impl UserState {
    pub fn service(&self, kind: ServiceKind) -> Option<&ServiceConfig> {
        match kind {
            ServiceKind::Radarr => self.radarr.as_ref(),
            ServiceKind::Sonarr => self.sonarr.as_ref(),
        }
    }

    fn service_mut(&mut self, kind: ServiceKind) -> Option<&mut ServiceConfig> {
        match kind {
            ServiceKind::Radarr => self.radarr.as_mut(),
            ServiceKind::Sonarr => self.sonarr.as_mut(),
        }
    }

    /// Configured services that have both a URL and an API key
    pub fn complete_services(&self) -> impl Iterator<Item = (ServiceKind, &ServiceConfig)> {
        ServiceKind::all()
            .iter()
            .copied()
            .filter_map(|kind| self.service(kind).map(|svc| (kind, svc)))
            .filter(|(_, svc)| svc.is_complete())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedrConfig {
    pub email: String,
    pub password: String,
    pub download_directory: String,
    pub delete_from_cloud: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceConfig {
    pub url: String,
    pub api_key: String,
    pub container: Option<String>,
    pub root_folders: Vec<String>,
    pub naming: NamingOverrides,
    pub media_management: MediaOverrides,
}

impl ServiceConfig {
    pub fn is_complete(&self) -> bool {
        !self.url.is_empty() && !self.api_key.is_empty()
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Read and resolve the state document at `path`
pub fn load(path: &Path, keys: &KeyResolver<'_>) -> Result<DesiredState> {
    let content = std::fs::read_to_string(path).map_err(|source| StateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = parse(&content, path)?;
    resolve(doc, &paths::parent_dir(path), keys)
}

/// Parse document text; an empty document is an empty state
pub fn parse(content: &str, path: &Path) -> Result<StateDocument> {
    if content.trim().is_empty() {
        return Ok(StateDocument::default());
    }
    serde_yaml::from_str(content).map_err(|source| StateError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve a parsed document.
///
/// Relative paths are taken against `base_dir`. Blank API keys with a
/// `container` are filled through `keys`.
pub fn resolve(doc: StateDocument, base_dir: &Path, keys: &KeyResolver<'_>) -> Result<DesiredState> {
    for key in doc.unknown.keys() {
        log::warn!("Top-level block '{key}' is not managed by arr-sync and will be ignored");
    }

    let prowlarr = doc
        .prowlarr
        .map(|p| resolve_prowlarr(p, keys))
        .transpose()?;

    let recyclarr = doc
        .recyclarr
        .filter(|r| !r.config_path.is_empty())
        .map(|r| RecyclarrConfig {
            config_path: paths::resolve(base_dir, &r.config_path),
        });

    let flaresolverr = doc.flaresolverr.map(|f| f.url).filter(|u| !u.is_empty());

    let mut users = IndexMap::with_capacity(doc.users.len());
    for (name, user_doc) in doc.users {
        let user = resolve_user(&name, user_doc, keys)?;
        users.insert(name, user);
    }

    apply_references(&mut users)?;

    log::debug!("Resolved state with {} user(s)", users.len());
    Ok(DesiredState {
        prowlarr,
        recyclarr,
        flaresolverr,
        users,
    })
}

fn resolve_prowlarr(doc: ProwlarrDoc, keys: &KeyResolver<'_>) -> Result<ProwlarrConfig> {
    let api_key = resolve_key("prowlarr", doc.api_key, doc.container.as_deref(), keys)?;
    Ok(ProwlarrConfig {
        url: doc.url,
        api_key,
    })
}

fn resolve_user(name: &str, doc: UserDoc, keys: &KeyResolver<'_>) -> Result<UserState> {
    let seedr = doc.seedr.map(|s| resolve_seedr(name, s)).transpose()?;

    let service = |kind: ServiceKind, svc: Option<ServiceDoc>| {
        svc.map(|svc| resolve_service(name, kind, svc, keys))
            .transpose()
    };
    let radarr = service(ServiceKind::Radarr, doc.radarr)?;
    let sonarr = service(ServiceKind::Sonarr, doc.sonarr)?;

    Ok(UserState {
        name: name.to_string(),
        seedr,
        radarr,
        sonarr,
        overseerr: doc.overseerr.map(|o| o.url).filter(|u| !u.is_empty()),
        reference: doc.reference.filter(|r| !r.is_empty()),
        is_reference: doc.is_reference,
    })
}

fn resolve_seedr(user: &str, doc: SeedrDoc) -> Result<SeedrConfig> {
    let required = |value: Option<String>, field: &str| {
        value.filter(|v| !v.is_empty()).ok_or_else(|| StateError::MissingField {
            user: user.to_string(),
            field: format!("seedr.{field}"),
        })
    };
    Ok(SeedrConfig {
        email: required(doc.email, "email")?,
        password: required(doc.password, "password")?,
        download_directory: doc
            .download_directory
            .unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string()),
        delete_from_cloud: doc.delete_from_cloud.unwrap_or(true),
    })
}

fn resolve_service(
    user: &str,
    kind: ServiceKind,
    doc: ServiceDoc,
    keys: &KeyResolver<'_>,
) -> Result<ServiceConfig> {
    let owner = format!("{user}/{}", kind.key());
    let api_key = resolve_key(&owner, doc.api_key, doc.container.as_deref(), keys)?;

    for key in doc.naming.unsupported.keys() {
        log::warn!("{owner}: naming override '{key}' is not supported and will be ignored");
    }
    for key in doc.media_management.unsupported.keys() {
        log::warn!("{owner}: media_management override '{key}' is not supported and will be ignored");
    }

    Ok(ServiceConfig {
        url: doc.url,
        api_key,
        container: doc.container,
        root_folders: doc.root_folders,
        naming: doc.naming,
        media_management: doc.media_management,
    })
}

fn resolve_key(
    owner: &str,
    api_key: Option<String>,
    container: Option<&str>,
    keys: &KeyResolver<'_>,
) -> Result<String> {
    match (api_key.filter(|k| !k.is_empty()), container) {
        (Some(key), _) => Ok(key),
        (None, Some(container)) if !container.is_empty() => {
            keys.resolve(container)
                .map_err(|e| StateError::KeyExtraction {
                    owner: owner.to_string(),
                    container: container.to_string(),
                    message: format!("{e:#}"),
                })
        }
        _ => Ok(String::new()),
    }
}

/// One-hop reference pass.
///
/// A user with no naming (or media management) overrides of its own takes
/// the referenced user's overrides wholesale, per service present on both.
fn apply_references(users: &mut IndexMap<String, UserState>) -> Result<()> {
    let mut inherited = Vec::new();

    for user in users.values() {
        let Some(reference) = &user.reference else {
            continue;
        };
        if reference == &user.name {
            return Err(StateError::ReferenceChain {
                user: user.name.clone(),
                reference: reference.clone(),
            });
        }
        let source = users
            .get(reference)
            .ok_or_else(|| StateError::UnknownReference {
                user: user.name.clone(),
                reference: reference.clone(),
            })?;
        if source.reference.is_some() {
            return Err(StateError::ReferenceChain {
                user: user.name.clone(),
                reference: reference.clone(),
            });
        }

        for &kind in ServiceKind::all() {
            let (Some(target), Some(src)) = (user.service(kind), source.service(kind)) else {
                continue;
            };
            let naming = (target.naming.is_empty() && !src.naming.is_empty())
                .then(|| src.naming.clone());
            let media = (target.media_management.is_empty() && !src.media_management.is_empty())
                .then(|| src.media_management.clone());
            if naming.is_some() || media.is_some() {
                inherited.push((user.name.clone(), kind, naming, media));
            }
        }
    }

    for (name, kind, naming, media) in inherited {
        let Some(svc) = users.get_mut(&name).and_then(|u| u.service_mut(kind)) else {
            continue;
        };
        if let Some(naming) = naming {
            log::debug!("{name}/{}: inheriting naming overrides", kind.key());
            svc.naming = naming;
        }
        if let Some(media) = media {
            log::debug!("{name}/{}: inheriting media management overrides", kind.key());
            svc.media_management = media;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apikey::KeyStore;
    use crate::apikey::tests::{FakeExtractor, MemoryKeyStore};

    fn resolve_str(yaml: &str) -> Result<DesiredState> {
        let store = MemoryKeyStore::default();
        let extractor = FakeExtractor::with(&[("radarr-zoe", "extracted"), ("prowlarr", "pk")]);
        let keys = KeyResolver::new(&store, &extractor);
        let doc = parse(yaml, Path::new("arr-state.yml"))?;
        resolve(doc, Path::new("/srv/arr"), &keys)
    }

    const REFERENCED: &str = r#"
users:
  zoe:
    is_reference: true
    radarr:
      url: http://radarr-zoe:7878
      api_key: zk
      naming:
        rename_movies: true
        movie_folder_format: "{Movie Title} ({Release Year})"
      media_management:
        recycle_bin: /recycle
  adam:
    reference: zoe
    radarr:
      url: http://radarr-adam:7878
      api_key: ak
  eve:
    reference: zoe
    radarr:
      url: http://radarr-eve:7878
      api_key: ek
      naming:
        standard_movie_format: "{Movie Title}"
"#;

    #[test]
    fn test_reference_copies_naming_when_target_has_none() {
        let state = resolve_str(REFERENCED).unwrap();
        let zoe = state.users["zoe"].radarr.as_ref().unwrap();
        let adam = state.users["adam"].radarr.as_ref().unwrap();

        assert_eq!(adam.naming, zoe.naming);
        assert_eq!(adam.media_management, zoe.media_management);
    }

    #[test]
    fn test_reference_does_not_merge_declared_overrides() {
        let state = resolve_str(REFERENCED).unwrap();
        let eve = state.users["eve"].radarr.as_ref().unwrap();

        assert_eq!(eve.naming.standard_movie_format.as_deref(), Some("{Movie Title}"));
        assert_eq!(eve.naming.rename_movies, None);
        assert_eq!(eve.naming.movie_folder_format, None);
        // media management was empty, so it is inherited
        assert_eq!(eve.media_management.recycle_bin.as_deref(), Some("/recycle"));
    }

    #[test]
    fn test_unmanaged_top_level_block_is_ignored() {
        let yaml = "sabnzbd:\n  url: http://sab:8080\nusers:\n  zoe: {}\n";
        let state = resolve_str(yaml).unwrap();
        assert_eq!(state.users.len(), 1);
        assert!(state.prowlarr.is_none());
    }

    #[test]
    fn test_unknown_reference() {
        let err = resolve_str("users:\n  adam:\n    reference: nobody\n").unwrap_err();
        assert!(matches!(err, StateError::UnknownReference { ref reference, .. } if reference == "nobody"));
    }

    #[test]
    fn test_reference_chain_rejected() {
        let yaml = r"
users:
  a:
    reference: b
  b:
    reference: c
  c: {}
";
        let err = resolve_str(yaml).unwrap_err();
        assert!(matches!(err, StateError::ReferenceChain { ref user, .. } if user == "a"));
    }

    #[test]
    fn test_self_reference_rejected() {
        let err = resolve_str("users:\n  a:\n    reference: a\n").unwrap_err();
        assert!(matches!(err, StateError::ReferenceChain { .. }));
    }

    #[test]
    fn test_seedr_defaults_and_required_fields() {
        let state = resolve_str("users:\n  a:\n    seedr:\n      email: a@x.com\n      password: p\n").unwrap();
        let seedr = state.users["a"].seedr.as_ref().unwrap();
        assert_eq!(seedr.download_directory, DEFAULT_DOWNLOAD_DIR);
        assert!(seedr.delete_from_cloud);

        let err = resolve_str("users:\n  a:\n    seedr:\n      email: a@x.com\n").unwrap_err();
        assert!(matches!(err, StateError::MissingField { ref field, .. } if field == "seedr.password"));
    }

    #[test]
    fn test_container_key_resolution() {
        let yaml = r"
prowlarr:
  url: http://prowlarr:9696
  container: prowlarr
users:
  zoe:
    radarr:
      url: http://radarr-zoe:7878
      container: radarr-zoe
";
        let state = resolve_str(yaml).unwrap();
        assert_eq!(state.prowlarr.as_ref().unwrap().api_key, "pk");
        let radarr = state.users["zoe"].radarr.as_ref().unwrap();
        assert_eq!(radarr.api_key, "extracted");
        assert!(radarr.is_complete());
    }

    #[test]
    fn test_key_extraction_failure_is_configuration_error() {
        let yaml = "users:\n  a:\n    sonarr:\n      url: http://s\n      container: missing\n";
        let err = resolve_str(yaml).unwrap_err();
        assert!(matches!(err, StateError::KeyExtraction { ref container, .. } if container == "missing"));
    }

    #[test]
    fn test_explicit_key_skips_extractor() {
        let store = MemoryKeyStore::default();
        let extractor = FakeExtractor::default();
        let keys = KeyResolver::new(&store, &extractor);
        let doc = parse(
            "users:\n  a:\n    radarr:\n      url: http://r\n      api_key: k\n      container: r\n",
            Path::new("x.yml"),
        )
        .unwrap();

        let state = resolve(doc, Path::new("."), &keys).unwrap();

        assert_eq!(state.users["a"].radarr.as_ref().unwrap().api_key, "k");
        assert!(extractor.calls.borrow().is_empty());
        assert_eq!(store.get("r").unwrap(), None);
    }

    #[test]
    fn test_recyclarr_path_relative_to_base() {
        let state = resolve_str("recyclarr:\n  config_path: recyclarr\n").unwrap();
        assert_eq!(
            state.recyclarr.unwrap().file(),
            PathBuf::from("/srv/arr/recyclarr/recyclarr.yml")
        );
    }

    #[test]
    fn test_users_keep_declaration_order_and_filter() {
        let state = resolve_str("users:\n  zed: {}\n  amy: {}\n  bob: {}\n").unwrap();
        let names: Vec<&str> = state.users_filtered(None).map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["zed", "amy", "bob"]);

        let only: Vec<&str> = state.users_filtered(Some("amy")).map(|u| u.name.as_str()).collect();
        assert_eq!(only, vec!["amy"]);
    }

    #[test]
    fn test_parse_error_and_empty_document() {
        assert!(matches!(
            parse("users: [", Path::new("bad.yml")),
            Err(StateError::Parse { .. })
        ));
        assert!(parse("  \n", Path::new("empty.yml")).unwrap().users.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let store = MemoryKeyStore::default();
        let extractor = FakeExtractor::default();
        let keys = KeyResolver::new(&store, &extractor);
        let err = load(Path::new("/nonexistent/arr-state.yml"), &keys).unwrap_err();
        assert!(matches!(err, StateError::Io { .. }));
    }
}
