use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::database::models::Profile;
use crate::roles::RoleSet;
use crate::team::{direct_reports, manager_candidates, manager_chain, nested_reports};

#[derive(Subcommand)]
pub enum TeamCommands {
    #[command(about = "List a manager's direct or nested reports")]
    Reports {
        #[arg(long, help = "JSON array of profiles with roles")]
        file: PathBuf,
        #[arg(help = "Manager profile id")]
        manager_id: Uuid,
        #[arg(long, help = "Reports of sub-managers instead of direct reports")]
        nested: bool,
    },

    #[command(about = "List who may become a user's manager")]
    Candidates {
        #[arg(long, help = "JSON array of profiles with roles")]
        file: PathBuf,
        #[arg(help = "Profile id being reassigned")]
        user_id: Uuid,
    },
}

/// One entry of the profiles file.
#[derive(Debug, Deserialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub manager_id: Option<Uuid>,
    #[serde(default)]
    pub roles: RoleSet,
}

impl ProfileRecord {
    fn to_profile(&self) -> Profile {
        let now = Utc::now();
        Profile {
            id: self.id,
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            manager_id: self.manager_id,
            language: "en".to_string(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            subscription_status: None,
            created_at: now,
            updated_at: now,
        }
    }
}

fn load_records(file: &Path) -> anyhow::Result<Vec<ProfileRecord>> {
    let raw = std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of profiles", file.display()))
}

fn summarize(profiles: &[&Profile]) -> Vec<serde_json::Value> {
    profiles
        .iter()
        .map(|p| json!({ "id": p.id, "email": p.email, "manager_id": p.manager_id }))
        .collect()
}

fn print_profiles(output_format: &OutputFormat, message: &str, key: &str, profiles: &[&Profile]) -> anyhow::Result<()> {
    if let OutputFormat::Text = output_format {
        for p in profiles {
            println!("{}  {}", p.id, p.full_name.as_deref().unwrap_or(&p.email));
        }
    }
    output_success(output_format, message, Some(json!({ key: summarize(profiles) })))
}

pub async fn handle(cmd: TeamCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TeamCommands::Reports { file, manager_id, nested } => {
            let records = load_records(&file)?;
            let profiles: Vec<Profile> = records.iter().map(ProfileRecord::to_profile).collect();

            let reports = if nested {
                let managers: HashSet<Uuid> = records
                    .iter()
                    .filter(|r| r.roles.has_manager_role())
                    .map(|r| r.id)
                    .collect();
                nested_reports(manager_id, &profiles, &managers)
            } else {
                direct_reports(manager_id, &profiles)
            };

            print_profiles(
                &output_format,
                &format!("{} report(s) under {}", reports.len(), manager_id),
                "reports",
                &reports,
            )
        }
        TeamCommands::Candidates { file, user_id } => {
            let records = load_records(&file)?;
            let profiles: Vec<Profile> = records.iter().map(ProfileRecord::to_profile).collect();

            let Some(user) = profiles.iter().find(|p| p.id == user_id) else {
                return output_error(&output_format, &format!("Profile {} not in file", user_id), Some("NOT_FOUND"));
            };

            let candidates = manager_candidates(user, &profiles);
            if let OutputFormat::Text = output_format {
                let chain = manager_chain(user, &profiles);
                if !chain.is_empty() {
                    let chain: Vec<String> = chain.iter().map(Uuid::to_string).collect();
                    println!("chain: {}", chain.join(" -> "));
                }
            }

            print_profiles(
                &output_format,
                &format!("{} candidate(s) for {}", candidates.len(), user_id),
                "candidates",
                &candidates,
            )
        }
    }
}
