//! `import`: turn a running user's services into a state document fragment.

use anyhow::{Context as AnyhowContext, Result};
use arrkit::types::{field_str, field_value};
use arrkit::{ArrBackend, DownloadClient, MediaManagementConfig, NamingConfig, ServiceKind};
use indexmap::IndexMap;
use serde_yaml::Value;
use std::collections::BTreeMap;

use crate::Context;
use crate::engine::differ::SEEDR_IMPLEMENTATION;
use crate::engine::{Connector, HttpConnector};
use crate::schema::{MediaOverrides, NamingOverrides, SeedrDoc, ServiceDoc, StateDocument, UserDoc};
use crate::state::{ServiceConfig, UserState};

pub fn run(ctx: &Context, username: &str) -> Result<()> {
    let state = super::load_state(&ctx.config)?;
    let user = state.user(username).with_context(|| {
        format!(
            "User '{username}' not found in config. \
             Add a minimal entry with radarr/sonarr URLs and containers first."
        )
    })?;

    let doc = import_user(user, &HttpConnector::default())?;

    println!();
    println!("--- Imported config for '{username}' ---");
    println!();
    print!("{}", serde_yaml::to_string(&doc)?);
    println!();
    println!("Paste the relevant sections into your arr-state.yml");
    Ok(())
}

/// Document holding just `user`, as read from the live services
pub fn import_user(user: &UserState, connector: &dyn Connector) -> Result<StateDocument> {
    let mut imported = UserDoc::default();

    for (kind, svc) in user.complete_services() {
        println!("Importing from {} ({})...", kind.label(), svc.url);
        let arr = connector.arr(&svc.url, &svc.api_key);
        let (service, seedr) = import_service(arr.as_ref(), svc)
            .with_context(|| format!("Failed to import from {} ({})", kind.label(), svc.url))?;

        if seedr.is_some() {
            imported.seedr = seedr;
        }
        match kind {
            ServiceKind::Radarr => imported.radarr = Some(service),
            ServiceKind::Sonarr => imported.sonarr = Some(service),
        }
    }

    let mut users = IndexMap::new();
    users.insert(user.name.clone(), imported);
    Ok(StateDocument {
        users,
        ..StateDocument::default()
    })
}

fn import_service(
    arr: &dyn ArrBackend,
    svc: &ServiceConfig,
) -> arrkit::Result<(ServiceDoc, Option<SeedrDoc>)> {
    let root_folders: Vec<String> = arr.root_folders()?.into_iter().map(|rf| rf.path).collect();
    let profiles = arr.quality_profiles()?.len();
    println!(
        "  {} root folders, {profiles} quality profiles",
        root_folders.len()
    );

    let service = ServiceDoc {
        url: svc.url.clone(),
        api_key: Some(svc.api_key.clone()),
        container: svc.container.clone(),
        root_folders,
        naming: naming_overrides(&arr.naming_config()?),
        media_management: media_overrides(&arr.media_management()?),
    };

    let seedr = arr
        .download_clients()?
        .iter()
        .find(|dc| dc.implementation == SEEDR_IMPLEMENTATION)
        .map(seedr_doc);

    Ok((service, seedr))
}

fn insert<T: Into<Value>>(map: &mut BTreeMap<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), value.into());
    }
}

/// Live naming in document form; episode keys land next to the movie ones
fn naming_overrides(naming: &NamingConfig) -> NamingOverrides {
    let mut other = BTreeMap::new();
    insert(&mut other, "rename_episodes", naming.rename_episodes);
    insert(
        &mut other,
        "standard_episode_format",
        naming.standard_episode_format.clone(),
    );
    insert(
        &mut other,
        "season_folder_format",
        naming.season_folder_format.clone(),
    );
    insert(
        &mut other,
        "series_folder_format",
        naming.series_folder_format.clone(),
    );

    NamingOverrides {
        rename_movies: naming.rename_movies,
        standard_movie_format: naming.standard_movie_format.clone(),
        movie_folder_format: naming.movie_folder_format.clone(),
        unsupported: other,
    }
}

fn media_overrides(config: &MediaManagementConfig) -> MediaOverrides {
    let mut other = BTreeMap::new();
    insert(
        &mut other,
        "recycle_bin_cleanup_days",
        config.recycle_bin_cleanup_days,
    );

    MediaOverrides {
        recycle_bin: config.recycle_bin.clone(),
        delete_empty_folders: config.delete_empty_folders,
        unsupported: other,
    }
}

fn seedr_doc(client: &DownloadClient) -> SeedrDoc {
    let text = |name: &str| Some(field_str(&client.fields, name).unwrap_or_default().to_string());
    SeedrDoc {
        email: text("email"),
        password: text("password"),
        download_directory: text("downloadDirectory"),
        delete_from_cloud: Some(
            field_value(&client.fields, "deleteFromCloud")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(true),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner::tests::{MockConnector, service, user};
    use arrkit::{Field, MockArr};

    #[test]
    fn test_import_user_fragment() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        radarr.add_root_folder("/movies");
        radarr.set_naming(NamingConfig {
            id: Some(1),
            rename_movies: Some(true),
            movie_folder_format: Some("{Movie Title} ({Release Year})".to_string()),
            ..NamingConfig::default()
        });
        radarr.set_media_management(MediaManagementConfig {
            id: Some(1),
            recycle_bin: Some("/recycle".to_string()),
            recycle_bin_cleanup_days: Some(7),
            ..MediaManagementConfig::default()
        });
        radarr.add_download_client(DownloadClient {
            implementation: "Seedr".to_string(),
            fields: vec![
                Field::new("email", "z@x.com"),
                Field::new("password", "pw"),
                Field::new("downloadDirectory", "/downloads"),
                Field::new("deleteFromCloud", false),
            ],
            ..DownloadClient::default()
        });
        let mut zoe = user("zoe");
        zoe.radarr = Some(ServiceConfig {
            container: Some("radarr-zoe".to_string()),
            ..service("http://radarr-zoe:7878")
        });

        let doc = import_user(&zoe, &MockConnector::default().with_arr(&radarr)).unwrap();

        let imported = &doc.users["zoe"];
        let radarr_doc = imported.radarr.as_ref().unwrap();
        assert_eq!(radarr_doc.root_folders, vec!["/movies"]);
        assert_eq!(radarr_doc.container.as_deref(), Some("radarr-zoe"));
        assert_eq!(radarr_doc.naming.rename_movies, Some(true));
        assert_eq!(radarr_doc.media_management.recycle_bin.as_deref(), Some("/recycle"));
        assert_eq!(
            radarr_doc.media_management.unsupported["recycle_bin_cleanup_days"],
            Value::from(7)
        );
        let seedr = imported.seedr.as_ref().unwrap();
        assert_eq!(seedr.email.as_deref(), Some("z@x.com"));
        assert_eq!(seedr.delete_from_cloud, Some(false));
        assert!(imported.sonarr.is_none());

        let yaml = serde_yaml::to_string(&doc).unwrap();
        assert!(yaml.contains("rename_movies: true"));
        assert!(yaml.contains("download_directory: /downloads"));
    }

    #[test]
    fn test_import_unreachable_service_fails() {
        let mut zoe = user("zoe");
        zoe.sonarr = Some(service("http://sonarr-down:8989"));

        let err = import_user(&zoe, &MockConnector::default()).unwrap_err();
        assert!(err.to_string().contains("Sonarr"));
    }
}
