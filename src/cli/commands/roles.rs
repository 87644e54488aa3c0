use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_error, output_success, parse_role_set, parse_roles};
use crate::cli::OutputFormat;
use crate::roles::{can_upgrade_to, check_required_role, highest_role, Role};

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "Check whether a role set satisfies a requirement")]
    Check {
        #[arg(long, help = "Roles held, comma separated")]
        roles: String,
        #[arg(long, help = "Accepted roles, comma separated (empty allows everyone)")]
        required: Option<String>,
    },

    #[command(about = "Show the highest-ranked role in a set")]
    Highest {
        #[arg(long, help = "Roles held, comma separated")]
        roles: String,
    },

    #[command(about = "Check whether a role set may upgrade to a tier")]
    CanUpgrade {
        #[arg(long, help = "Roles held, comma separated")]
        roles: String,
        #[arg(help = "Target tier, e.g. manager_pro")]
        target: String,
    },
}

pub async fn handle(cmd: RoleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::Check { roles, required } => {
            let held = parse_role_set(&roles)?;
            let required = required.as_deref().map(parse_roles).transpose()?;
            let allowed = check_required_role(&held, required.as_deref());

            if allowed {
                output_success(&output_format, "Access granted", Some(json!({ "allowed": true })))
            } else {
                output_error(&output_format, "Access denied", Some("ACCESS_DENIED"))
            }
        }
        RoleCommands::Highest { roles } => {
            let held = parse_role_set(&roles)?;
            match highest_role(&held) {
                Some(role) => output_success(
                    &output_format,
                    &format!("Highest role: {}", role),
                    Some(json!({ "highest_role": role, "rank": role.rank() })),
                ),
                None => output_success(&output_format, "No roles held", Some(json!({ "highest_role": null }))),
            }
        }
        RoleCommands::CanUpgrade { roles, target } => {
            let held = parse_role_set(&roles)?;
            let target: Role = target.parse()?;
            let eligible = can_upgrade_to(&held, target);
            let message = if eligible {
                format!("Upgrade to {} is available", target)
            } else {
                format!("Already at or above {}", target)
            };
            output_success(&output_format, &message, Some(json!({ "can_upgrade": eligible, "target": target })))
        }
    }
}
