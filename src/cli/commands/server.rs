use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::config::{load_cli_config, ping_server, save_cli_config, ServerStatus};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Point the CLI at a server")]
    Use {
        #[arg(help = "Server base URL, e.g. http://localhost:3000")]
        url: String,
    },

    #[command(about = "Show the selected server")]
    Current,

    #[command(about = "Check server health via /health")]
    Health,

    #[command(about = "Show server information from the API root endpoint")]
    Info,
}

pub async fn handle(cmd: ServerCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let mut config = load_cli_config()?;

    match cmd {
        ServerCommands::Use { url } => {
            url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid server URL '{}': {}", url, e))?;
            config.server_url = url.clone();
            config.update_ping(ping_server(&config).await);
            save_cli_config(&config)?;
            output_success(
                &output_format,
                &format!("Using server {} ({:?})", url, config.status),
                Some(json!({ "server_url": url, "status": config.status })),
            )
        }
        ServerCommands::Current => output_success(
            &output_format,
            &format!("Current server: {}", config.server_url),
            Some(json!({ "server_url": config.server_url, "status": config.status, "last_ping": config.last_ping })),
        ),
        ServerCommands::Health => {
            let status = ping_server(&config).await;
            config.update_ping(status);
            save_cli_config(&config)?;
            if status != ServerStatus::Up {
                anyhow::bail!("Server {} is down", config.server_url);
            }
            output_success(&output_format, &format!("Server {} is up", config.server_url), None)
        }
        ServerCommands::Info => {
            let body: Value = reqwest::get(config.endpoint("/")).await?.json().await?;
            output_success(&output_format, "Server information", body.get("data").cloned())
        }
    }
}
