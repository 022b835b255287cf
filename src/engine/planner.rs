//! Plan building: live state from every service, compared against the
//! desired state.

use arrkit::{
    Application, ArrBackend, DEFAULT_TIMEOUT, HttpArr, HttpProwlarr, IndexerBackend, ServiceKind,
};
use declarative::{Action, DiffSummary};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::PlanAction;
use super::differ;
use crate::recyclarr;
use crate::state::{DesiredState, ServiceConfig, UserState};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("User '{0}' not found in config")]
    UnknownUser(String),
}

/// Hands out service clients for a URL and API key
pub trait Connector {
    fn arr(&self, url: &str, api_key: &str) -> Arc<dyn ArrBackend>;
    fn indexer(&self, url: &str, api_key: &str) -> Arc<dyn IndexerBackend>;
}

/// Connector for the real HTTP clients
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }
}

impl Connector for HttpConnector {
    fn arr(&self, url: &str, api_key: &str) -> Arc<dyn ArrBackend> {
        Arc::new(HttpArr::with_timeout(url, api_key, self.timeout))
    }

    fn indexer(&self, url: &str, api_key: &str) -> Arc<dyn IndexerBackend> {
        Arc::new(HttpProwlarr::with_timeout(url, api_key, self.timeout))
    }
}

// ============================================================================
// Plan types
// ============================================================================

#[derive(Debug)]
pub struct ProwlarrPlan {
    pub url: String,
    pub actions: Vec<PlanAction>,
}

#[derive(Debug)]
pub struct ServicePlan {
    pub kind: ServiceKind,
    pub url: String,
    pub actions: Vec<PlanAction>,
}

#[derive(Debug)]
pub struct UserPlan {
    pub username: String,
    pub services: Vec<ServicePlan>,
}

#[derive(Debug)]
pub struct RecyclarrPlan {
    pub config_path: PathBuf,
    pub actions: Vec<PlanAction>,
}

/// Everything one run would do, in apply order: Prowlarr, then users in
/// declaration order, then Recyclarr.
#[derive(Debug, Default)]
pub struct ChangePlan {
    pub prowlarr: Option<ProwlarrPlan>,
    pub users: Vec<UserPlan>,
    pub recyclarr: Option<RecyclarrPlan>,
}

impl ChangePlan {
    pub fn all_actions(&self) -> impl Iterator<Item = &PlanAction> {
        let prowlarr = self.prowlarr.iter().flat_map(|p| &p.actions);
        let users = self
            .users
            .iter()
            .flat_map(|u| &u.services)
            .flat_map(|s| &s.actions);
        let recyclarr = self.recyclarr.iter().flat_map(|r| &r.actions);
        prowlarr.chain(users).chain(recyclarr)
    }

    pub fn summary(&self) -> DiffSummary {
        DiffSummary::from_actions(self.all_actions())
    }

    pub fn has_changes(&self) -> bool {
        self.summary().has_changes()
    }

    /// Whether the Prowlarr pass has a CREATE or UPDATE
    pub fn prowlarr_changed(&self) -> bool {
        self.prowlarr
            .as_ref()
            .is_some_and(|p| p.actions.iter().any(|a| a.kind.is_change()))
    }
}

// ============================================================================
// Building
// ============================================================================

/// WARNING standing in for a service that could not be read
fn unreachable(error: &arrkit::Error) -> PlanAction {
    let category = error.category();
    Action::warning(
        "Connection",
        "unreachable",
        format!("{category}: {error}. {}", category.advice()),
    )
}

/// Build the change plan, optionally for one user only.
///
/// A service that cannot be reached while planning gets a WARNING action
/// and planning carries on with the next one.
pub fn build_plan(
    state: &DesiredState,
    target_user: Option<&str>,
    connector: &dyn Connector,
) -> Result<ChangePlan, PlanError> {
    if let Some(name) = target_user
        && state.user(name).is_none()
    {
        return Err(PlanError::UnknownUser(name.to_string()));
    }

    let mut plan = ChangePlan {
        prowlarr: plan_prowlarr(state, target_user, connector),
        ..ChangePlan::default()
    };

    for user in state.users_filtered(target_user) {
        let services: Vec<ServicePlan> = user
            .complete_services()
            .map(|(kind, svc)| plan_service(state, user, kind, svc, connector))
            .collect();
        if !services.is_empty() {
            plan.users.push(UserPlan {
                username: user.name.clone(),
                services,
            });
        }
    }

    plan.recyclarr = match recyclarr::plan(state) {
        Ok(sub) => sub,
        Err(e) => state.recyclarr.as_ref().map(|config| RecyclarrPlan {
            config_path: config.config_path.clone(),
            actions: vec![Action::warning(
                recyclarr::CATEGORY,
                "recyclarr.yml",
                format!("{e:#}"),
            )],
        }),
    };

    let summary = plan.summary();
    log::info!(
        "Plan: {} create, {} update, {} unchanged, {} warning(s)",
        summary.creates,
        summary.updates,
        summary.noops,
        summary.warnings
    );
    Ok(plan)
}

/// Prowlarr applications for the selected users.
///
/// All live applications are fetched regardless of the filter.
fn plan_prowlarr(
    state: &DesiredState,
    target_user: Option<&str>,
    connector: &dyn Connector,
) -> Option<ProwlarrPlan> {
    let config = state.prowlarr.as_ref().filter(|p| p.is_complete())?;
    let prowlarr = connector.indexer(&config.url, &config.api_key);

    let live = match prowlarr.applications() {
        Ok(apps) => apps,
        Err(e) => {
            log::warn!("Prowlarr at {} unreachable: {e}", config.url);
            return Some(ProwlarrPlan {
                url: config.url.clone(),
                actions: vec![unreachable(&e)],
            });
        }
    };
    let by_name: HashMap<String, Application> =
        live.into_iter().map(|app| (app.name.clone(), app)).collect();

    let mut actions = Vec::new();
    for user in state.users_filtered(target_user) {
        for (kind, svc) in user.complete_services() {
            actions.push(differ::diff_application(
                &prowlarr, &by_name, kind, &user.name, svc,
            ));
        }
    }

    (!actions.is_empty()).then(|| ProwlarrPlan {
        url: config.url.clone(),
        actions,
    })
}

fn plan_service(
    state: &DesiredState,
    user: &UserState,
    kind: ServiceKind,
    svc: &ServiceConfig,
    connector: &dyn Connector,
) -> ServicePlan {
    log::debug!("Planning {} for {}", kind, user.name);
    let arr = connector.arr(&svc.url, &svc.api_key);
    let mut actions = Vec::new();

    if let Err(e) = plan_service_actions(state, user, kind, svc, &arr, connector, &mut actions) {
        log::warn!("{} for {} unreachable: {e}", kind, user.name);
        actions.push(unreachable(&e));
    }

    ServicePlan {
        kind,
        url: svc.url.clone(),
        actions,
    }
}

fn plan_service_actions(
    state: &DesiredState,
    user: &UserState,
    kind: ServiceKind,
    svc: &ServiceConfig,
    arr: &Arc<dyn ArrBackend>,
    connector: &dyn Connector,
    actions: &mut Vec<PlanAction>,
) -> arrkit::Result<()> {
    if let Some(seedr) = &user.seedr {
        let live = arr.download_clients()?;
        actions.push(differ::diff_download_client(arr, &live, seedr));
    }

    if !svc.root_folders.is_empty() {
        let live = arr.root_folders()?;
        actions.extend(differ::diff_root_folders(arr, &live, &svc.root_folders));
    }

    let Some(reference) = &user.reference else {
        return Ok(());
    };
    let Some(reference_svc) = state
        .user(reference)
        .and_then(|r| r.service(kind))
        .filter(|s| s.is_complete())
    else {
        log::debug!(
            "{} for {}: reference '{reference}' has no usable {}, skipping sync",
            kind,
            user.name,
            kind.key()
        );
        return Ok(());
    };

    let source = connector.arr(&reference_svc.url, &reference_svc.api_key);
    plan_reference_sync(&source, arr, reference, svc, actions)
}

/// Reference sync actions, in dependency order: custom formats, quality
/// profiles (which need the format remap), quality definitions, naming,
/// media management.
fn plan_reference_sync(
    source: &Arc<dyn ArrBackend>,
    target: &Arc<dyn ArrBackend>,
    reference_user: &str,
    svc: &ServiceConfig,
    actions: &mut Vec<PlanAction>,
) -> arrkit::Result<()> {
    let source_formats = source.custom_formats()?;
    let (formats, remap) = differ::diff_custom_formats(
        target,
        &source_formats,
        &target.custom_formats()?,
        reference_user,
    );
    actions.push(formats);
    if remap.is_empty() {
        log::debug!("No custom formats shared with {reference_user} yet");
    } else {
        log::debug!("Custom format remap has {} entries", remap.len());
    }

    actions.push(differ::diff_quality_profiles(
        target,
        &source.quality_profiles()?,
        &target.quality_profiles()?,
        &source_formats,
        &remap,
        reference_user,
    ));

    actions.push(differ::diff_quality_definitions(
        target,
        &source.quality_definitions()?,
        &target.quality_definitions()?,
        reference_user,
    ));

    actions.push(differ::diff_naming(
        target,
        &source.naming_config()?,
        &target.naming_config()?,
        &svc.naming,
        reference_user,
    ));

    actions.push(differ::diff_media_management(
        target,
        &source.media_management()?,
        &target.media_management()?,
        &svc.media_management,
        reference_user,
    ));

    Ok(())
}
