use anyhow::Context;
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{self, Environment};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint a bearer token for a profile id (development only)")]
    Mint {
        #[arg(help = "Profile id the token is issued for")]
        user_id: Uuid,
        #[arg(long, help = "Email claim")]
        email: Option<String>,
        #[arg(long, help = "Lifetime in hours (defaults to JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Mint { user_id, email, hours } => {
            let config = config::config();
            if matches!(config.environment, Environment::Production) {
                anyhow::bail!("Refusing to mint tokens in production");
            }

            let ttl = hours.unwrap_or(config.security.jwt_expiry_hours);
            let claims = Claims::new(user_id, email, ttl);
            let token = generate_jwt(&claims, &config.security.jwt_secret).context("failed to sign token")?;

            match output_format {
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token minted",
                    Some(json!({ "token": token, "user_id": user_id, "expires_at": claims.exp })),
                ),
            }
        }
    }
}
