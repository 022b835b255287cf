//! Per-entity comparisons.
//!
//! Each function takes already-fetched live snapshots plus the desired
//! values and returns actions. Nothing here talks to a service; the client
//! handles passed in are only stored in the operations.

use arrkit::types::{field_str, field_value};
use arrkit::{
    Application, ArrBackend, CustomFormat, DownloadClient, Field, IndexerBackend,
    MediaManagementConfig, NamingConfig, QualityDefinition, QualityProfile, RootFolder,
    ServiceKind,
};
use declarative::Action;
use serde_json::Value;
use indexmap::IndexSet;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::ops::{AppRequest, SyncOp};
use super::remap::IdRemap;
use super::PlanAction;
use crate::schema::{MediaOverrides, NamingOverrides};
use crate::state::{SeedrConfig, ServiceConfig};

pub const SEEDR_IMPLEMENTATION: &str = "Seedr";

const DOWNLOAD_CLIENT: &str = "Download client";
const ROOT_FOLDER: &str = "Root folder";
const CUSTOM_FORMATS: &str = "Custom formats";
const QUALITY_PROFILES: &str = "Quality profiles";
const QUALITY_DEFINITIONS: &str = "Quality definitions";
const NAMING: &str = "Naming config";
const MEDIA_MANAGEMENT: &str = "Media management";
const APP: &str = "App";

// ============================================================================
// Download client
// ============================================================================

/// Download client body for a Seedr account
pub fn seedr_payload(seedr: &SeedrConfig) -> DownloadClient {
    DownloadClient {
        id: None,
        name: SEEDR_IMPLEMENTATION.to_string(),
        implementation: SEEDR_IMPLEMENTATION.to_string(),
        config_contract: "SeedrSettings".to_string(),
        enable: true,
        protocol: "torrent".to_string(),
        priority: 1,
        remove_completed_downloads: true,
        remove_failed_downloads: true,
        fields: vec![
            Field::new("email", seedr.email.as_str()),
            Field::new("password", seedr.password.as_str()),
            Field::new("downloadDirectory", seedr.download_directory.as_str()),
            Field::new("deleteFromCloud", seedr.delete_from_cloud),
        ],
        extra: serde_json::Map::new(),
    }
}

/// Seedr fields that differ, in email, password, downloadDirectory,
/// deleteFromCloud order
pub fn seedr_changes(live: &DownloadClient, desired: &SeedrConfig) -> Vec<&'static str> {
    let fields = &live.fields;
    let mut changed = Vec::new();
    if field_str(fields, "email") != Some(desired.email.as_str()) {
        changed.push("email");
    }
    if field_str(fields, "password") != Some(desired.password.as_str()) {
        changed.push("password");
    }
    if field_str(fields, "downloadDirectory") != Some(desired.download_directory.as_str()) {
        changed.push("downloadDirectory");
    }
    if field_value(fields, "deleteFromCloud").and_then(Value::as_bool)
        != Some(desired.delete_from_cloud)
    {
        changed.push("deleteFromCloud");
    }
    changed
}

pub fn diff_download_client(
    arr: &Arc<dyn ArrBackend>,
    live: &[DownloadClient],
    desired: &SeedrConfig,
) -> PlanAction {
    let client = seedr_payload(desired);
    let Some(existing) = live.iter().find(|c| c.implementation == SEEDR_IMPLEMENTATION) else {
        return Action::create(
            DOWNLOAD_CLIENT,
            SEEDR_IMPLEMENTATION,
            "will be created",
            SyncOp::CreateDownloadClient {
                arr: Arc::clone(arr),
                client,
            },
        );
    };

    let changed = seedr_changes(existing, desired);
    match (changed.is_empty(), existing.id) {
        (true, _) => Action::noop(DOWNLOAD_CLIENT, SEEDR_IMPLEMENTATION, "up to date"),
        (false, Some(id)) => Action::update(
            DOWNLOAD_CLIENT,
            SEEDR_IMPLEMENTATION,
            format!("{} changed", changed.join(", ")),
            SyncOp::UpdateDownloadClient {
                arr: Arc::clone(arr),
                id,
                client,
            },
        ),
        (false, None) => Action::warning(
            DOWNLOAD_CLIENT,
            SEEDR_IMPLEMENTATION,
            "existing client has no id; cannot update",
        ),
    }
}

// ============================================================================
// Root folders
// ============================================================================

/// Root folder actions: CREATEs, then NOOPs, each in first-declared order,
/// then a WARNING per undeclared live folder in live order. Folders are never
/// removed.
pub fn diff_root_folders(
    arr: &Arc<dyn ArrBackend>,
    live: &[RootFolder],
    desired: &[String],
) -> Vec<PlanAction> {
    let live_paths: HashSet<&str> = live.iter().map(|rf| rf.path.as_str()).collect();
    // A path declared twice is still one folder
    let desired_paths: IndexSet<&str> = desired.iter().map(String::as_str).collect();
    let (present, missing): (Vec<&str>, Vec<&str>) = desired_paths
        .iter()
        .copied()
        .partition(|path| live_paths.contains(path));

    let creates = missing.into_iter().map(|path| {
        Action::create(
            ROOT_FOLDER,
            format!("\"{path}\""),
            "will be created",
            SyncOp::CreateRootFolder {
                arr: Arc::clone(arr),
                path: path.to_string(),
            },
        )
    });
    let noops = present
        .into_iter()
        .map(|path| Action::noop(ROOT_FOLDER, format!("\"{path}\""), "exists"));
    let warnings = live
        .iter()
        .filter(|rf| !desired_paths.contains(rf.path.as_str()))
        .map(|rf| {
            Action::warning(
                ROOT_FOLDER,
                format!("\"{}\"", rf.path),
                "exists in API but not in YAML (not removing)",
            )
        });

    creates.chain(noops).chain(warnings).collect()
}

// ============================================================================
// Reference sync
// ============================================================================

/// Custom formats missing from the target, plus the id remap of the ones
/// already there. The remap is built even when nothing is missing.
pub fn diff_custom_formats(
    target: &Arc<dyn ArrBackend>,
    reference: &[CustomFormat],
    target_live: &[CustomFormat],
    reference_user: &str,
) -> (PlanAction, IdRemap) {
    let remap = IdRemap::build(reference, target_live);
    let existing: HashSet<&str> = target_live.iter().map(|cf| cf.name.as_str()).collect();
    let missing = reference
        .iter()
        .filter(|cf| !existing.contains(cf.name.as_str()))
        .count();
    let present = reference.len() - missing;

    let action = if missing > 0 {
        Action::create(
            CUSTOM_FORMATS,
            format!("{missing} from {reference_user}"),
            format!("{missing} to create, {present} existing"),
            SyncOp::SyncCustomFormats {
                target: Arc::clone(target),
                formats: reference.to_vec(),
            },
        )
    } else {
        Action::noop(
            CUSTOM_FORMATS,
            format!("{present} synced"),
            format!("from {reference_user}"),
        )
    };

    (action, remap)
}

/// One action for all quality profiles.
///
/// Profiles are matched by name only; drift inside an existing profile is
/// not detected.
pub fn diff_quality_profiles(
    target: &Arc<dyn ArrBackend>,
    reference: &[QualityProfile],
    target_live: &[QualityProfile],
    reference_formats: &[CustomFormat],
    remap: &IdRemap,
    reference_user: &str,
) -> PlanAction {
    let existing: HashSet<&str> = target_live.iter().map(|p| p.name.as_str()).collect();
    let missing = reference
        .iter()
        .filter(|p| !existing.contains(p.name.as_str()))
        .count();

    if missing == 0 {
        return Action::noop(
            QUALITY_PROFILES,
            format!("{} synced", reference.len()),
            format!("from {reference_user}"),
        );
    }

    Action::create(
        QUALITY_PROFILES,
        format!("{missing} from {reference_user}"),
        format!("{missing} to create, {} existing", reference.len() - missing),
        SyncOp::SyncQualityProfiles {
            target: Arc::clone(target),
            reference_formats: reference_formats.to_vec(),
            profiles: reference.to_vec(),
            remap: remap.clone(),
        },
    )
}

pub fn definitions_differ(reference: &[QualityDefinition], live: &[QualityDefinition]) -> bool {
    reference.len() != live.len()
        || reference
            .iter()
            .zip(live)
            .any(|(r, l)| !r.same_sizes(l))
}

pub fn diff_quality_definitions(
    target: &Arc<dyn ArrBackend>,
    reference: &[QualityDefinition],
    target_live: &[QualityDefinition],
    reference_user: &str,
) -> PlanAction {
    let detail = format!("from {reference_user}");
    if definitions_differ(reference, target_live) {
        Action::update(
            QUALITY_DEFINITIONS,
            "bulk update",
            detail,
            SyncOp::UpdateQualityDefinitions {
                arr: Arc::clone(target),
                definitions: reference.to_vec(),
            },
        )
    } else {
        Action::noop(QUALITY_DEFINITIONS, "up to date", detail)
    }
}

/// Keys that are set in `desired` and differ from `live`
macro_rules! changed_keys {
    ($desired:expr, $live:expr, { $($field:ident => $key:literal),+ $(,)? }) => {{
        let mut keys: Vec<&'static str> = Vec::new();
        $(
            if $desired.$field.is_some() && $desired.$field != $live.$field {
                keys.push($key);
            }
        )+
        keys
    }};
}

/// Reference naming with the declared overrides applied
pub fn desired_naming(reference: &NamingConfig, overrides: &NamingOverrides) -> NamingConfig {
    let mut naming = reference.clone();
    if let Some(rename) = overrides.rename_movies {
        naming.rename_movies = Some(rename);
    }
    if let Some(format) = &overrides.standard_movie_format {
        naming.standard_movie_format = Some(format.clone());
    }
    if let Some(format) = &overrides.movie_folder_format {
        naming.movie_folder_format = Some(format.clone());
    }
    naming
}

pub fn naming_changes(desired: &NamingConfig, live: &NamingConfig) -> Vec<&'static str> {
    changed_keys!(desired, live, {
        rename_movies => "renameMovies",
        standard_movie_format => "standardMovieFormat",
        movie_folder_format => "movieFolderFormat",
        rename_episodes => "renameEpisodes",
        standard_episode_format => "standardEpisodeFormat",
        season_folder_format => "seasonFolderFormat",
        series_folder_format => "seriesFolderFormat",
        daily_episode_format => "dailyEpisodeFormat",
        anime_episode_format => "animeEpisodeFormat",
    })
}

pub fn diff_naming(
    target: &Arc<dyn ArrBackend>,
    reference_live: &NamingConfig,
    target_live: &NamingConfig,
    overrides: &NamingOverrides,
    reference_user: &str,
) -> PlanAction {
    let mut desired = desired_naming(reference_live, overrides);
    let changed = naming_changes(&desired, target_live);
    let detail = format!("from {reference_user}");
    if changed.is_empty() {
        return Action::noop(NAMING, "up to date", detail);
    }

    log::debug!("Naming differs on {}", changed.join(", "));
    desired.id = Some(target_live.id.unwrap_or(1));
    Action::update(
        NAMING,
        "will be updated",
        detail,
        SyncOp::UpdateNaming {
            arr: Arc::clone(target),
            naming: desired,
        },
    )
}

/// Reference media management with the declared overrides applied
pub fn desired_media_management(
    reference: &MediaManagementConfig,
    overrides: &MediaOverrides,
) -> MediaManagementConfig {
    let mut config = reference.clone();
    if let Some(path) = &overrides.recycle_bin {
        config.recycle_bin = Some(path.clone());
    }
    if let Some(delete) = overrides.delete_empty_folders {
        config.delete_empty_folders = Some(delete);
    }
    config
}

pub fn media_management_changes(
    desired: &MediaManagementConfig,
    live: &MediaManagementConfig,
) -> Vec<&'static str> {
    changed_keys!(desired, live, {
        recycle_bin => "recycleBin",
        recycle_bin_cleanup_days => "recycleBinCleanupDays",
        delete_empty_folders => "deleteEmptyFolders",
        auto_unmonitor_previously_downloaded_movies => "autoUnmonitorPreviouslyDownloadedMovies",
    })
}

pub fn diff_media_management(
    target: &Arc<dyn ArrBackend>,
    reference_live: &MediaManagementConfig,
    target_live: &MediaManagementConfig,
    overrides: &MediaOverrides,
    reference_user: &str,
) -> PlanAction {
    let mut desired = desired_media_management(reference_live, overrides);
    let changed = media_management_changes(&desired, target_live);
    let detail = format!("from {reference_user}");
    if changed.is_empty() {
        return Action::noop(MEDIA_MANAGEMENT, "up to date", detail);
    }

    log::debug!("Media management differs on {}", changed.join(", "));
    desired.id = Some(target_live.id.unwrap_or(1));
    Action::update(
        MEDIA_MANAGEMENT,
        "will be updated",
        detail,
        SyncOp::UpdateMediaManagement {
            arr: Arc::clone(target),
            config: desired,
        },
    )
}

// ============================================================================
// Prowlarr applications
// ============================================================================

/// Prowlarr application name for a user's service
pub fn app_name(kind: ServiceKind, user: &str) -> String {
    format!("{} ({user})", kind.label())
}

pub fn diff_application(
    prowlarr: &Arc<dyn IndexerBackend>,
    live_by_name: &HashMap<String, Application>,
    kind: ServiceKind,
    user: &str,
    svc: &ServiceConfig,
) -> PlanAction {
    let name = app_name(kind, user);
    let label = format!("\"{name}\"");
    let request = AppRequest {
        name: name.clone(),
        kind,
        prowlarr_url: prowlarr.base_url().to_string(),
        base_url: svc.url.clone(),
        api_key: svc.api_key.clone(),
    };

    let Some(existing) = live_by_name.get(&name) else {
        return Action::create(
            APP,
            label,
            "will be created",
            SyncOp::CreateApplication {
                prowlarr: Arc::clone(prowlarr),
                request,
            },
        );
    };

    let mut changed = Vec::new();
    if field_str(&existing.fields, "baseUrl") != Some(svc.url.as_str()) {
        changed.push("baseUrl");
    }
    if field_str(&existing.fields, "apiKey") != Some(svc.api_key.as_str()) {
        changed.push("apiKey");
    }

    match (changed.is_empty(), existing.id) {
        (true, _) => Action::noop(APP, label, "up to date"),
        (false, Some(id)) => Action::update(
            APP,
            label,
            format!("{} changed", changed.join(", ")),
            SyncOp::UpdateApplication {
                prowlarr: Arc::clone(prowlarr),
                id,
                request,
            },
        ),
        (false, None) => Action::warning(APP, label, "existing application has no id; cannot update"),
    }
}
