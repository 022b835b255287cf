//! Plan rendering

use colored::Colorize;

use super::PlanAction;
use super::planner::ChangePlan;
use crate::ui;

fn push_action(out: &mut String, action: &PlanAction, indent: usize) {
    let pad = " ".repeat(indent);
    out.push_str(&format!(
        "{pad}{} {} {}: {}\n",
        ui::marker(action.kind),
        action.category,
        action.name,
        action.detail.dimmed()
    ));
    for child in &action.children {
        push_action(out, child, indent + 4);
    }
}

/// Plan text as printed by `plan` and `apply`
pub fn render(plan: &ChangePlan) -> String {
    let mut out = String::new();

    if let Some(prowlarr) = &plan.prowlarr {
        out.push_str(&format!("{} ({}):\n", "Prowlarr".bold(), prowlarr.url));
        for action in &prowlarr.actions {
            push_action(&mut out, action, 2);
        }
        out.push('\n');
    }

    for user in &plan.users {
        out.push_str(&format!("{} {}\n", "User:".bold(), user.username.bold()));
        for service in &user.services {
            out.push_str(&format!(
                "  {} ({}):\n",
                service.kind.label(),
                service.url
            ));
            for action in &service.actions {
                push_action(&mut out, action, 4);
            }
        }
        out.push('\n');
    }

    if let Some(recyclarr) = &plan.recyclarr {
        out.push_str(&format!(
            "{} ({}):\n",
            "Recyclarr".bold(),
            recyclarr.config_path.display()
        ));
        for action in &recyclarr.actions {
            push_action(&mut out, action, 2);
        }
        out.push('\n');
    }

    let summary = plan.summary();
    out.push_str(&format!(
        "Plan: {} to create, {} to update, {} unchanged",
        summary.creates, summary.updates, summary.noops
    ));
    if summary.warnings > 0 {
        out.push_str(&format!(", {} warning(s)", summary.warnings));
    }
    out.push('\n');
    out
}

pub fn print_plan(plan: &ChangePlan) {
    print!("{}", render(plan));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::planner::{ProwlarrPlan, RecyclarrPlan, ServicePlan, UserPlan};
    use arrkit::ServiceKind;
    use declarative::{Action, ActionKind};
    use std::path::PathBuf;

    fn sample() -> ChangePlan {
        ChangePlan {
            prowlarr: Some(ProwlarrPlan {
                url: "http://prowlarr:9696".to_string(),
                actions: vec![Action::noop("App", "\"Radarr (zoe)\"", "up to date")],
            }),
            users: vec![UserPlan {
                username: "zoe".to_string(),
                services: vec![ServicePlan {
                    kind: ServiceKind::Radarr,
                    url: "http://radarr-zoe:7878".to_string(),
                    actions: vec![
                        Action::noop("Root folder", "\"/movies\"", "exists"),
                        Action::warning("Root folder", "\"/old\"", "not removing"),
                    ],
                }],
            }],
            recyclarr: Some(RecyclarrPlan {
                config_path: PathBuf::from("/config/recyclarr"),
                actions: vec![
                    Action::warning("Recyclarr config", "recyclarr.yml", "bad").with_children(
                        vec![Action::informational(
                            ActionKind::Create,
                            "Instance",
                            "radarr-zoe",
                            "will be added",
                        )],
                    ),
                ],
            }),
        }
    }

    #[test]
    fn test_render_layout() {
        colored::control::set_override(false);
        let text = render(&sample());

        let expected = "\
Prowlarr (http://prowlarr:9696):
  = App \"Radarr (zoe)\": up to date

User: zoe
  Radarr (http://radarr-zoe:7878):
    = Root folder \"/movies\": exists
    ! Root folder \"/old\": not removing

Recyclarr (/config/recyclarr):
  ! Recyclarr config recyclarr.yml: bad
      + Instance radarr-zoe: will be added

Plan: 0 to create, 0 to update, 2 unchanged, 2 warning(s)
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_empty_plan() {
        colored::control::set_override(false);
        assert_eq!(
            render(&ChangePlan::default()),
            "Plan: 0 to create, 0 to update, 0 unchanged\n"
        );
    }
}
