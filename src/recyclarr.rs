//! Recyclarr instance list generation.
//!
//! `recyclarr.yml` gets one entry per user and service, named
//! `radarr-<user>` / `sonarr-<user>`, carrying `base_url` and `api_key`.
//! Writing merges into the existing file: other sections, other entries and
//! other keys inside an entry are left alone.

use anyhow::{Context, Result};
use arrkit::ServiceKind;
use declarative::{Action, ActionKind};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::Path;

use crate::engine::{PlanAction, RecyclarrPlan, SyncOp};
use crate::paths;
use crate::state::DesiredState;

pub const CATEGORY: &str = "Recyclarr config";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceEntry {
    pub base_url: String,
    pub api_key: String,
}

/// Desired entries per section, in user declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instances {
    pub radarr: IndexMap<String, InstanceEntry>,
    pub sonarr: IndexMap<String, InstanceEntry>,
}

impl Instances {
    pub fn section(&self, kind: ServiceKind) -> &IndexMap<String, InstanceEntry> {
        match kind {
            ServiceKind::Radarr => &self.radarr,
            ServiceKind::Sonarr => &self.sonarr,
        }
    }

    fn section_mut(&mut self, kind: ServiceKind) -> &mut IndexMap<String, InstanceEntry> {
        match kind {
            ServiceKind::Radarr => &mut self.radarr,
            ServiceKind::Sonarr => &mut self.sonarr,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.radarr.is_empty() && self.sonarr.is_empty()
    }
}

pub fn entry_name(kind: ServiceKind, user: &str) -> String {
    format!("{}-{user}", kind.key())
}

/// Entries for every user service with a URL and API key
pub fn generate(state: &DesiredState) -> Instances {
    let mut instances = Instances::default();
    for user in state.users.values() {
        for (kind, svc) in user.complete_services() {
            instances.section_mut(kind).insert(
                entry_name(kind, &user.name),
                InstanceEntry {
                    base_url: svc.url.clone(),
                    api_key: svc.api_key.clone(),
                },
            );
        }
    }
    instances
}

/// Existing file as a YAML mapping; a missing or empty file is empty
pub fn read_existing(path: &Path) -> Result<Mapping> {
    if !path.exists() {
        return Ok(Mapping::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?
    {
        Value::Mapping(map) => Ok(map),
        Value::Null => Ok(Mapping::new()),
        _ => anyhow::bail!("{} is not a YAML mapping", path.display()),
    }
}

fn existing_field<'a>(entry: &'a Value, key: &str) -> Option<&'a str> {
    entry.get(key).and_then(Value::as_str)
}

/// Entries to add (CREATE) or change (UPDATE), in section then entry order
pub fn changes(desired: &Instances, existing: &Mapping) -> Vec<(ActionKind, String)> {
    let mut out = Vec::new();
    for &kind in ServiceKind::all() {
        let section = existing.get(kind.key());
        for (name, entry) in desired.section(kind) {
            match section.and_then(|s| s.get(name.as_str())) {
                None => out.push((ActionKind::Create, name.clone())),
                Some(current) => {
                    let same = existing_field(current, "base_url") == Some(entry.base_url.as_str())
                        && existing_field(current, "api_key") == Some(entry.api_key.as_str());
                    if !same {
                        out.push((ActionKind::Update, name.clone()));
                    }
                }
            }
        }
    }
    out
}

/// Fold `desired` into `existing`
pub fn merge(mut existing: Mapping, desired: &Instances) -> Mapping {
    for &kind in ServiceKind::all() {
        let entries = desired.section(kind);
        if entries.is_empty() {
            continue;
        }
        let slot = existing
            .entry(Value::from(kind.key()))
            .or_insert(Value::Mapping(Mapping::new()));
        if !slot.is_mapping() {
            *slot = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(section) = slot else {
            continue;
        };

        for (name, entry) in entries {
            let current = section
                .entry(Value::from(name.as_str()))
                .or_insert(Value::Mapping(Mapping::new()));
            if !current.is_mapping() {
                *current = Value::Mapping(Mapping::new());
            }
            if let Value::Mapping(fields) = current {
                fields.insert(Value::from("base_url"), Value::from(entry.base_url.as_str()));
                fields.insert(Value::from("api_key"), Value::from(entry.api_key.as_str()));
            }
        }
    }
    existing
}

/// Merge `desired` into the file at `path`
pub fn write(path: &Path, desired: &Instances) -> Result<()> {
    let merged = merge(read_existing(path)?, desired);
    let yaml = serde_yaml::to_string(&Value::Mapping(merged))?;
    paths::write_atomic(path, yaml.as_bytes())?;
    log::info!("Updated {}", path.display());
    Ok(())
}

/// Recyclarr sub-plan; `None` when Recyclarr is not configured or up to date.
///
/// The plan is a single roll-up action that rewrites the file, with one
/// informational child per entry added or changed.
pub fn plan(state: &DesiredState) -> Result<Option<RecyclarrPlan>> {
    let Some(config) = &state.recyclarr else {
        return Ok(None);
    };
    let path = config.file();
    let desired = generate(state);
    if desired.is_empty() {
        log::debug!("No complete services to list in {}", path.display());
        return Ok(None);
    }
    let pending = changes(&desired, &read_existing(&path)?);
    if pending.is_empty() {
        log::debug!("{} is up to date", path.display());
        return Ok(None);
    }

    let creates = pending.iter().filter(|(k, _)| *k == ActionKind::Create).count();
    let updates = pending.len() - creates;
    let children: Vec<PlanAction> = pending
        .into_iter()
        .map(|(kind, name)| {
            let detail = if kind == ActionKind::Create {
                "will be added"
            } else {
                "will be updated"
            };
            Action::informational(kind, "Instance", name, detail)
        })
        .collect();

    let op = SyncOp::WriteRecyclarr {
        path: path.clone(),
        instances: desired,
    };
    let detail = format!("{creates} to add, {updates} to update");
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let action = if creates > 0 {
        Action::create(CATEGORY, file_name, detail, op)
    } else {
        Action::update(CATEGORY, file_name, detail, op)
    };

    Ok(Some(RecyclarrPlan {
        config_path: config.config_path.clone(),
        actions: vec![action.with_children(children)],
    }))
}
