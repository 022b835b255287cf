//! Operations carried by plan actions.
//!
//! Each variant holds the client handle and the payload computed at plan
//! time. Custom format and quality profile sync re-read the target when
//! applied, since earlier actions in the same run may have changed it.

use anyhow::{Context, Result};
use arrkit::{
    Application, ArrBackend, CustomFormat, DownloadClient, IndexerBackend, MediaManagementConfig,
    NamingConfig, QualityDefinition, QualityProfile, ServiceKind,
};
use declarative::Operation;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use super::remap::IdRemap;
use crate::recyclarr::{self, Instances};

/// What a Prowlarr application should point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRequest {
    pub name: String,
    pub kind: ServiceKind,
    pub prowlarr_url: String,
    pub base_url: String,
    pub api_key: String,
}

impl AppRequest {
    /// Build the application body from Prowlarr's schema for `kind`
    fn build(&self, prowlarr: &dyn IndexerBackend) -> Result<Application> {
        let schema = prowlarr.application_schema(self.kind.label())?;
        Ok(Application::from_schema(
            &schema,
            &self.name,
            &self.prowlarr_url,
            &self.base_url,
            &self.api_key,
            self.kind.sync_categories(),
        ))
    }
}

#[derive(Debug, Clone)]
pub enum SyncOp {
    CreateDownloadClient {
        arr: Arc<dyn ArrBackend>,
        client: DownloadClient,
    },
    UpdateDownloadClient {
        arr: Arc<dyn ArrBackend>,
        id: i64,
        client: DownloadClient,
    },
    CreateRootFolder {
        arr: Arc<dyn ArrBackend>,
        path: String,
    },
    /// Create every reference format the target lacks by name
    SyncCustomFormats {
        target: Arc<dyn ArrBackend>,
        formats: Vec<CustomFormat>,
    },
    /// Create or update every reference profile on the target
    SyncQualityProfiles {
        target: Arc<dyn ArrBackend>,
        reference_formats: Vec<CustomFormat>,
        profiles: Vec<QualityProfile>,
        remap: IdRemap,
    },
    UpdateQualityDefinitions {
        arr: Arc<dyn ArrBackend>,
        definitions: Vec<QualityDefinition>,
    },
    UpdateNaming {
        arr: Arc<dyn ArrBackend>,
        naming: NamingConfig,
    },
    UpdateMediaManagement {
        arr: Arc<dyn ArrBackend>,
        config: MediaManagementConfig,
    },
    CreateApplication {
        prowlarr: Arc<dyn IndexerBackend>,
        request: AppRequest,
    },
    UpdateApplication {
        prowlarr: Arc<dyn IndexerBackend>,
        id: i64,
        request: AppRequest,
    },
    WriteRecyclarr {
        path: PathBuf,
        instances: Instances,
    },
}

impl Operation for SyncOp {
    fn apply(&self) -> Result<()> {
        match self {
            Self::CreateDownloadClient { arr, client } => {
                arr.create_download_client(client)?;
            }
            Self::UpdateDownloadClient { arr, id, client } => {
                let mut body = client.clone();
                body.id = Some(*id);
                arr.update_download_client(*id, &body)?;
            }
            Self::CreateRootFolder { arr, path } => {
                arr.create_root_folder(path)?;
            }
            Self::SyncCustomFormats { target, formats } => {
                sync_custom_formats(target.as_ref(), formats)?;
            }
            Self::SyncQualityProfiles {
                target,
                reference_formats,
                profiles,
                remap,
            } => {
                sync_quality_profiles(target.as_ref(), reference_formats, profiles, remap)?;
            }
            Self::UpdateQualityDefinitions { arr, definitions } => {
                arr.update_quality_definitions(definitions)?;
            }
            Self::UpdateNaming { arr, naming } => {
                arr.update_naming_config(naming)?;
            }
            Self::UpdateMediaManagement { arr, config } => {
                arr.update_media_management(config)?;
            }
            Self::CreateApplication { prowlarr, request } => {
                let app = request.build(prowlarr.as_ref())?;
                prowlarr.create_application(&app)?;
            }
            Self::UpdateApplication {
                prowlarr,
                id,
                request,
            } => {
                let mut app = request.build(prowlarr.as_ref())?;
                app.id = Some(*id);
                prowlarr.update_application(*id, &app)?;
            }
            Self::WriteRecyclarr { path, instances } => {
                recyclarr::write(path, instances)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Ok(())
    }
}

fn sync_custom_formats(target: &dyn ArrBackend, formats: &[CustomFormat]) -> Result<()> {
    let existing: HashSet<String> = target
        .custom_formats()?
        .into_iter()
        .map(|cf| cf.name)
        .collect();

    for format in formats.iter().filter(|cf| !existing.contains(&cf.name)) {
        let mut body = format.clone();
        body.id = None;
        let created = target
            .create_custom_format(&body)
            .with_context(|| format!("custom format '{}'", format.name))?;
        log::debug!("Created custom format '{}' as {:?}", created.name, created.id);
    }
    Ok(())
}

fn sync_quality_profiles(
    target: &dyn ArrBackend,
    reference_formats: &[CustomFormat],
    profiles: &[QualityProfile],
    planned: &IdRemap,
) -> Result<()> {
    let mut remap = planned.clone();
    remap.refresh(IdRemap::build(reference_formats, &target.custom_formats()?));

    let existing: HashMap<String, Option<i64>> = target
        .quality_profiles()?
        .into_iter()
        .map(|p| (p.name, p.id))
        .collect();

    for profile in profiles {
        let mut body = remap.profile_payload(profile);
        match existing.get(&profile.name).copied().flatten() {
            Some(id) => {
                body.id = Some(id);
                target
                    .update_quality_profile(id, &body)
                    .with_context(|| format!("quality profile '{}'", profile.name))?;
            }
            None => {
                target
                    .create_quality_profile(&body)
                    .with_context(|| format!("quality profile '{}'", profile.name))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrkit::{Field, FormatItem, MockArr, MockIndexer};

    fn cf(id: Option<i64>, name: &str) -> CustomFormat {
        CustomFormat {
            id,
            name: name.to_string(),
            ..CustomFormat::default()
        }
    }

    #[test]
    fn test_sync_custom_formats_creates_only_missing() {
        let target = MockArr::new("http://t");
        target.add_custom_format("HDR");
        let op = SyncOp::SyncCustomFormats {
            target: Arc::new(target.clone()),
            formats: vec![cf(Some(1), "HDR"), cf(Some(2), "x265")],
        };

        op.apply().unwrap();

        let names: Vec<String> = target.custom_format_list().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["HDR", "x265"]);
    }

    #[test]
    fn test_quality_profiles_use_formats_created_earlier() {
        let target = MockArr::new("http://t");
        let existing_profile = target.add_quality_profile(QualityProfile {
            name: "SD".to_string(),
            ..QualityProfile::default()
        });
        let reference_formats = vec![cf(Some(7), "x265")];
        let profiles = vec![
            QualityProfile {
                id: Some(1),
                name: "HD".to_string(),
                format_items: vec![FormatItem {
                    format: 7,
                    score: 50,
                    ..FormatItem::default()
                }],
                ..QualityProfile::default()
            },
            QualityProfile {
                id: Some(2),
                name: "SD".to_string(),
                ..QualityProfile::default()
            },
        ];
        // planned before the format existed on the target
        let remap = IdRemap::build(&reference_formats, &target.custom_format_list());
        assert!(remap.is_empty());

        SyncOp::SyncCustomFormats {
            target: Arc::new(target.clone()),
            formats: reference_formats.clone(),
        }
        .apply()
        .unwrap();
        SyncOp::SyncQualityProfiles {
            target: Arc::new(target.clone()),
            reference_formats,
            profiles,
            remap,
        }
        .apply()
        .unwrap();

        let created_format = target.custom_format_list()[0].id.unwrap();
        let list = target.quality_profile_list();
        assert_eq!(list.len(), 2);
        let hd = list.iter().find(|p| p.name == "HD").unwrap();
        assert_eq!(hd.format_items[0].format, created_format);
        let sd = list.iter().find(|p| p.name == "SD").unwrap();
        assert_eq!(sd.id, Some(existing_profile));
        assert!(target.calls().iter().any(|c| c == "update_quality_profile"));
    }

    #[test]
    fn test_create_application_fills_schema() {
        let prowlarr = MockIndexer::with_arr_schemas("http://prowlarr:9696");
        let op = SyncOp::CreateApplication {
            prowlarr: Arc::new(prowlarr.clone()),
            request: AppRequest {
                name: "Sonarr (zoe)".to_string(),
                kind: ServiceKind::Sonarr,
                prowlarr_url: "http://prowlarr:9696".to_string(),
                base_url: "http://sonarr-zoe:8989".to_string(),
                api_key: "sk".to_string(),
            },
        };

        op.apply().unwrap();

        let apps = prowlarr.application_list();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Sonarr (zoe)");
        assert_eq!(
            arrkit::types::field_str(&apps[0].fields, "baseUrl"),
            Some("http://sonarr-zoe:8989")
        );
    }

    #[test]
    fn test_missing_schema_fails_only_that_op() {
        let prowlarr = MockIndexer::new("http://prowlarr:9696");
        let op = SyncOp::CreateApplication {
            prowlarr: Arc::new(prowlarr.clone()),
            request: AppRequest {
                name: "Radarr (zoe)".to_string(),
                kind: ServiceKind::Radarr,
                prowlarr_url: String::new(),
                base_url: String::new(),
                api_key: String::new(),
            },
        };

        let err = op.apply().unwrap_err();
        assert!(err.to_string().contains("Radarr"));
        assert!(prowlarr.application_list().is_empty());
    }

    #[test]
    fn test_update_download_client_sets_id() {
        let arr = MockArr::new("http://r");
        let id = arr.add_download_client(DownloadClient {
            implementation: "Seedr".to_string(),
            fields: vec![Field::new("email", "old@x.com")],
            ..DownloadClient::default()
        });
        let op = SyncOp::UpdateDownloadClient {
            arr: Arc::new(arr.clone()),
            id,
            client: DownloadClient {
                implementation: "Seedr".to_string(),
                fields: vec![Field::new("email", "new@x.com")],
                ..DownloadClient::default()
            },
        };

        op.apply().unwrap();

        let clients = arr.download_client_list();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id, Some(id));
        assert_eq!(
            arrkit::types::field_str(&clients[0].fields, "email"),
            Some("new@x.com")
        );
    }
}
