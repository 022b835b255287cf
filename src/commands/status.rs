use anyhow::Result;
use arrkit::{ArrBackend, CredentialValidator, SeedrValidator};
use colored::Colorize;

use crate::Context;
use crate::engine::differ::SEEDR_IMPLEMENTATION;
use crate::engine::{Connector, HttpConnector};
use crate::state::{DesiredState, SeedrConfig, ServiceConfig};
use crate::ui;

pub fn run(ctx: &Context, user: Option<&str>) -> Result<()> {
    let state = super::load_state(&ctx.config)?;
    super::check_user(&state, user)?;

    ui::header("arr-sync status");
    show(
        &state,
        user,
        &HttpConnector::default(),
        &SeedrValidator::new(),
    );
    println!();
    Ok(())
}

fn unreachable(e: &arrkit::Error) -> String {
    format!(
        "{} - {e}\n    {}",
        "UNREACHABLE".red().bold(),
        e.category().advice().dimmed()
    )
}

fn version(v: Option<String>) -> String {
    format!("v{}", v.as_deref().unwrap_or("?"))
}

fn show(
    state: &DesiredState,
    user: Option<&str>,
    connector: &dyn Connector,
    validator: &dyn CredentialValidator,
) {
    if let Some(prowlarr) = state.prowlarr.as_ref().filter(|p| !p.url.is_empty()) {
        let client = connector.indexer(&prowlarr.url, &prowlarr.api_key);
        let line = match client.status() {
            Ok(status) => version(status.version),
            Err(e) => unreachable(&e),
        };
        println!("{} ({}): {line}", "Prowlarr".bold(), prowlarr.url);
    }
    if let Some(url) = &state.flaresolverr {
        println!("{}: {url}", "FlareSolverr".bold());
    }

    for u in state.users_filtered(user) {
        if u.is_reference {
            ui::section(&format!("User: {} (reference)", u.name));
        } else {
            ui::section(&format!("User: {}", u.name));
        }
        if let Some(reference) = &u.reference {
            ui::dim(&format!("Synced from {reference}"));
        }

        for (kind, svc) in u.complete_services() {
            let arr = connector.arr(&svc.url, &svc.api_key);
            if let Err(e) = show_service(arr.as_ref(), kind.label(), svc) {
                println!("  {} ({}): {}", kind.label(), svc.url, unreachable(&e));
            }
        }

        if let Some(seedr) = &u.seedr {
            show_seedr(seedr, validator);
        }
        if let Some(url) = &u.overseerr {
            println!("  Overseerr: {url}");
        }
    }
}

fn show_service(arr: &dyn ArrBackend, label: &str, svc: &ServiceConfig) -> arrkit::Result<()> {
    let status = arr.status()?;
    println!("  {label} ({}): {}", svc.url, version(status.version));

    let has_seedr = arr
        .download_clients()?
        .iter()
        .any(|dc| dc.implementation == SEEDR_IMPLEMENTATION);
    let client = if has_seedr {
        "configured".green()
    } else {
        "NOT configured".yellow()
    };
    println!("    Seedr download client: {client}");

    for folder in arr.root_folders()? {
        println!("    Root folder: {}", folder.path);
    }

    println!("    Quality profiles: {}", arr.quality_profiles()?.len());
    Ok(())
}

fn show_seedr(seedr: &SeedrConfig, validator: &dyn CredentialValidator) {
    match validator.validate(&seedr.email, &seedr.password) {
        Ok(account) => println!(
            "  Seedr ({}): {} (space: {}, bandwidth: {})",
            seedr.email,
            "OK".green(),
            ui::format_usage(account.space_used, account.space_max),
            ui::format_usage(account.bandwidth_used, None)
        ),
        Err(e) => println!("  Seedr ({}): {}", seedr.email, e.to_string().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::tests::FakeValidator;
    use crate::engine::planner::tests::{MockConnector, service, state_of, user};
    use arrkit::MockArr;

    #[test]
    fn test_show_service_reads_everything() {
        let radarr = MockArr::new("http://radarr-zoe:7878");
        radarr.add_root_folder("/movies");

        show_service(&radarr, "Radarr", &service("http://radarr-zoe:7878")).unwrap();

        assert_eq!(
            radarr.calls(),
            vec![
                "status",
                "download_clients",
                "root_folders",
                "quality_profiles"
            ]
        );
    }

    #[test]
    fn test_unreachable_line_carries_advice() {
        colored::control::set_override(false);
        let line = unreachable(&arrkit::Error::http("HTTP 401", Some(401)));
        assert_eq!(
            line,
            "UNREACHABLE - HTTP request failed: HTTP 401\n    \
             Check the API key or credentials in your state file"
        );
    }

    #[test]
    fn test_show_survives_unreachable_services() {
        let mut zoe = user("zoe");
        zoe.radarr = Some(service("http://radarr-down:7878"));
        let state = state_of(vec![zoe]);

        show(
            &state,
            None,
            &MockConnector::default(),
            &FakeValidator { password: "p" },
        );
    }
}
