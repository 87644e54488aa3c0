use clap::Subcommand;

use crate::cli::utils::output_fields;
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    #[command(about = "Show the configuration with secrets masked")]
    Show,
}

pub async fn handle(cmd: ConfigCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ConfigCommands::Show => {
            let shown = config::config().redacted();
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&shown)?);
                    Ok(())
                }
                OutputFormat::Text => output_fields(
                    &output_format,
                    &[
                        ("environment", format!("{:?}", shown.environment)),
                        ("database", shown.database.url),
                        ("port", shown.api.port.to_string()),
                        ("jwt_secret", shown.security.jwt_secret),
                        ("cors_origins", shown.security.cors_origins.join(",")),
                        ("role_cache_ttl_secs", shown.security.role_cache_ttl_secs.to_string()),
                        ("stripe_api_base", shown.billing.stripe_api_base),
                        ("stripe_secret_key", shown.billing.stripe_secret_key),
                    ],
                ),
            }
        }
    }
}
