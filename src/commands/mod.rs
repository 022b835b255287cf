// Reconcile commands
pub mod apply;
pub mod plan;

// Inspection commands
pub mod import;
pub mod status;

// Key cache maintenance
pub mod forget_key;

use anyhow::{Context as AnyhowContext, Result, bail};
use arrkit::CredentialValidator;
use std::path::Path;

use crate::apikey::{self, DockerExtractor, KeyResolver};
use crate::engine::{ChangePlan, Connector, build_plan};
use crate::progress;
use crate::state::{self, DesiredState};
use crate::ui;

/// Load and resolve the state document, extracting missing keys
pub fn load_state(config: &Path) -> Result<DesiredState> {
    let store = apikey::store_for(config);
    let extractor = DockerExtractor::default();
    let keys = KeyResolver::new(&store, &extractor);
    state::load(config, &keys).context("Error loading config")
}

/// Fail when `user` is given but not declared
pub fn check_user(state: &DesiredState, user: Option<&str>) -> Result<()> {
    if let Some(name) = user
        && state.user(name).is_none()
    {
        bail!("User '{name}' not found in config");
    }
    Ok(())
}

/// Validate Seedr credentials of the selected users.
///
/// Prints one line per user and returns the names that failed.
pub fn check_seedr(
    state: &DesiredState,
    user: Option<&str>,
    validator: &dyn CredentialValidator,
) -> Vec<String> {
    let mut failed = Vec::new();
    for u in state.users_filtered(user) {
        let Some(seedr) = &u.seedr else {
            continue;
        };
        match validator.validate(&seedr.email, &seedr.password) {
            Ok(_) => println!("  Seedr credentials valid for {}", u.name),
            Err(e) => {
                ui::error(&format!("Seedr validation failed for {}: {e}", u.name));
                failed.push(u.name.clone());
            }
        }
    }
    failed
}

/// Build the plan behind a spinner
pub fn compute_plan(
    state: &DesiredState,
    user: Option<&str>,
    connector: &dyn Connector,
    quiet: bool,
) -> Result<ChangePlan> {
    let pb = (!quiet).then(|| progress::spinner("Reading live configuration..."));
    let result = build_plan(state, user, connector);
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
    Ok(result?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::engine::planner::tests::{state_of, user};
    use crate::state::SeedrConfig;
    use arrkit::SeedrAccount;

    /// Accepts one password, rejects everything else
    pub struct FakeValidator {
        pub password: &'static str,
    }

    impl CredentialValidator for FakeValidator {
        fn validate(&self, email: &str, password: &str) -> arrkit::Result<SeedrAccount> {
            if password == self.password {
                Ok(SeedrAccount {
                    username: Some(email.to_string()),
                    space_used: Some(1024),
                    ..SeedrAccount::default()
                })
            } else {
                Err(arrkit::Error::Auth {
                    email: email.to_string(),
                })
            }
        }
    }

    fn seedr(password: &str) -> Option<SeedrConfig> {
        Some(SeedrConfig {
            email: "a@x.com".to_string(),
            password: password.to_string(),
            download_directory: "/downloads".to_string(),
            delete_from_cloud: true,
        })
    }

    #[test]
    fn test_check_user() {
        let state = state_of(vec![user("zoe")]);
        assert!(check_user(&state, None).is_ok());
        assert!(check_user(&state, Some("zoe")).is_ok());
        let err = check_user(&state, Some("bob")).unwrap_err();
        assert_eq!(err.to_string(), "User 'bob' not found in config");
    }

    #[test]
    fn test_check_seedr_reports_failures_in_scope() {
        let mut zoe = user("zoe");
        zoe.seedr = seedr("good");
        let mut adam = user("adam");
        adam.seedr = seedr("bad");
        let state = state_of(vec![zoe, adam, user("eve")]);
        let validator = FakeValidator { password: "good" };

        assert_eq!(check_seedr(&state, None, &validator), vec!["adam"]);
        assert!(check_seedr(&state, Some("zoe"), &validator).is_empty());
    }

    #[test]
    fn test_load_state_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_state(&dir.path().join("arr-state.yml")).unwrap_err();
        assert!(err.to_string().starts_with("Error loading config"));
    }
}
