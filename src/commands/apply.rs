use anyhow::{Result, bail};
use arrkit::{CredentialValidator, SeedrValidator};
use declarative::{AutoConfirm, ConfirmCallback};

use crate::Context;
use crate::engine::executor;
use crate::engine::{
    ApplyReport, Connector, HttpConnector, PromptConfirm, apply_plan, print_plan,
    trigger_indexer_sync,
};
use crate::progress::ApplyProgress;
use crate::state::DesiredState;
use crate::ui;

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Show the plan only
    pub dry_run: bool,
    /// Skip the confirmation prompt
    pub yes: bool,
}

pub fn run(ctx: &Context, user: Option<&str>, opts: &ApplyOptions) -> Result<()> {
    if opts.dry_run {
        return super::plan::run(ctx, user);
    }

    let state = super::load_state(&ctx.config)?;
    super::check_user(&state, user)?;

    let mut confirm: Box<dyn ConfirmCallback> = if opts.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(PromptConfirm)
    };
    let report = reconcile(
        ctx,
        &state,
        user,
        confirm.as_mut(),
        &SeedrValidator::new(),
        &HttpConnector::default(),
    )?;

    match report {
        Some(report) if !report.is_success() => {
            bail!("{} action(s) failed", report.errors())
        }
        _ => Ok(()),
    }
}

/// Plan, confirm, apply and follow up.
///
/// Returns `None` when nothing was applied.
fn reconcile(
    ctx: &Context,
    state: &DesiredState,
    user: Option<&str>,
    confirm: &mut dyn ConfirmCallback,
    validator: &dyn CredentialValidator,
    connector: &dyn Connector,
) -> Result<Option<ApplyReport>> {
    let failed = super::check_seedr(state, user, validator);
    if let Some(name) = failed.first() {
        bail!("Seedr validation failed for {name}");
    }

    let plan = super::compute_plan(state, user, connector, ctx.quiet)?;
    println!();
    print_plan(&plan);

    if !plan.has_changes() {
        println!();
        println!("Nothing to do.");
        return Ok(None);
    }

    println!();
    let mut progress = ApplyProgress::new(ctx.quiet);
    let Some(report) = apply_plan(&plan, &mut progress, confirm)? else {
        println!("Aborted.");
        return Ok(None);
    };

    if report.should_trigger_sync() {
        match trigger_indexer_sync(state, connector) {
            Ok(_) => println!("  Triggered Prowlarr AppIndexerSync"),
            Err(e) => ui::warn(&format!("Failed to trigger Prowlarr sync: {e:#}")),
        }
    }

    executor::print_summary(&report);
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::FakeValidator;
    use crate::engine::planner::tests::{MockConnector, service, state_of, user};
    use crate::state::{ProwlarrConfig, SeedrConfig, ServiceConfig};
    use arrkit::{MockArr, MockIndexer};
    use declarative::AutoDecline;
    use std::path::PathBuf;

    fn ctx() -> Context {
        Context {
            verbose: 0,
            quiet: true,
            config: PathBuf::from("arr-state.yml"),
        }
    }

    fn zoe_with_folder() -> crate::state::UserState {
        let mut zoe = user("zoe");
        zoe.radarr = Some(ServiceConfig {
            root_folders: vec!["/movies".to_string()],
            ..service("http://radarr-zoe:7878")
        });
        zoe
    }

    #[test]
    fn test_reconcile_applies_and_triggers_sync() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        let indexer = MockIndexer::with_arr_schemas("http://prowlarr:9696");
        let mut state = state_of(vec![zoe_with_folder()]);
        state.prowlarr = Some(ProwlarrConfig {
            url: "http://prowlarr:9696".to_string(),
            api_key: "pk".to_string(),
        });
        let connector = MockConnector::default()
            .with_arr(&radarr)
            .with_indexer(&indexer);

        let report = reconcile(
            &ctx(),
            &state,
            None,
            &mut AutoConfirm,
            &FakeValidator { password: "p" },
            &connector,
        )
        .unwrap()
        .unwrap();

        assert!(report.is_success());
        assert_eq!(report.applied(), 2);
        assert_eq!(radarr.root_folder_paths(), vec!["/movies"]);
        assert_eq!(indexer.commands(), vec!["AppIndexerSync"]);
    }

    #[test]
    fn test_reconcile_nothing_to_do() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        radarr.add_root_folder("/movies");
        let state = state_of(vec![zoe_with_folder()]);
        let connector = MockConnector::default().with_arr(&radarr);

        let report = reconcile(
            &ctx(),
            &state,
            None,
            &mut AutoConfirm,
            &FakeValidator { password: "p" },
            &connector,
        )
        .unwrap();

        assert!(report.is_none());
        assert!(!radarr.calls().iter().any(|c| c == "create_root_folder"));
    }

    #[test]
    fn test_reconcile_aborts_on_seedr_failure() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        let mut zoe = zoe_with_folder();
        zoe.seedr = Some(SeedrConfig {
            email: "z@x.com".to_string(),
            password: "wrong".to_string(),
            download_directory: "/downloads".to_string(),
            delete_from_cloud: true,
        });
        let state = state_of(vec![zoe]);
        let connector = MockConnector::default().with_arr(&radarr);

        let err = reconcile(
            &ctx(),
            &state,
            None,
            &mut AutoConfirm,
            &FakeValidator { password: "p" },
            &connector,
        )
        .unwrap_err();

        assert_eq!(err.to_string(), "Seedr validation failed for zoe");
        assert!(radarr.calls().is_empty());
    }

    #[test]
    fn test_reconcile_declined() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        let state = state_of(vec![zoe_with_folder()]);
        let connector = MockConnector::default().with_arr(&radarr);

        let report = reconcile(
            &ctx(),
            &state,
            None,
            &mut AutoDecline,
            &FakeValidator { password: "p" },
            &connector,
        )
        .unwrap();

        assert!(report.is_none());
        assert!(radarr.root_folder_paths().is_empty());
    }

    #[test]
    fn test_reconcile_reports_failures() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        radarr.fail_on("create_root_folder");
        let state = state_of(vec![zoe_with_folder()]);
        let connector = MockConnector::default().with_arr(&radarr);

        let report = reconcile(
            &ctx(),
            &state,
            None,
            &mut AutoConfirm,
            &FakeValidator { password: "p" },
            &connector,
        )
        .unwrap()
        .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.summary.failures.len(), 1);
    }
}
