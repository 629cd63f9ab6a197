use std::io::Read;

use clap::Subcommand;
use reqwest::Method;
use serde_json::Value;

use crate::cli::config::{load_cli_config, CliConfig};
use crate::cli::utils::{envelope_error, output_rows, output_success};
use crate::cli::OutputFormat;
use crate::resources::resource;

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List records, with query parameters as key=value pairs")]
    List {
        #[arg(help = "Resource name, e.g. requests")]
        resource: String,
        #[arg(help = "Query parameters (status=pending, search=road, sort=-id, page=2)")]
        params: Vec<String>,
    },

    #[command(about = "Show one record")]
    Get {
        #[arg(help = "Resource name")]
        resource: String,
        #[arg(help = "Record ID")]
        id: i64,
        #[arg(long, help = "Relations to load, comma separated")]
        with: Option<String>,
    },

    #[command(about = "Create record from stdin")]
    Create {
        #[arg(help = "Resource name")]
        resource: String,
    },

    #[command(about = "Update record from stdin")]
    Update {
        #[arg(help = "Resource name")]
        resource: String,
        #[arg(help = "Record ID to update")]
        id: i64,
    },

    #[command(about = "Delete record")]
    Delete {
        #[arg(help = "Resource name")]
        resource: String,
        #[arg(help = "Record ID to delete")]
        id: i64,
    },
}

pub async fn handle(cmd: DataCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = load_cli_config()?;

    match cmd {
        DataCommands::List { resource, params } => {
            let query = parse_params(&params)?;
            let body = send(&config, Method::GET, &collection_path(&resource)?, &query, None).await?;
            let rows = body.get("data").and_then(Value::as_array).cloned().unwrap_or_default();
            output_rows(&output_format, &rows, body.get("meta"))
        }
        DataCommands::Get { resource, id, with } => {
            let query: Vec<(String, String)> = with.map(|w| ("with".to_string(), w)).into_iter().collect();
            let path = format!("{}/{}", collection_path(&resource)?, id);
            let body = send(&config, Method::GET, &path, &query, None).await?;
            output_success(&output_format, &format!("{} {}", resource, id), body.get("data").cloned())
        }
        DataCommands::Create { resource } => {
            let input = read_stdin_json()?;
            let body = send(&config, Method::POST, &collection_path(&resource)?, &[], Some(input)).await?;
            output_success(&output_format, message(&body), body.get("data").cloned())
        }
        DataCommands::Update { resource, id } => {
            let input = read_stdin_json()?;
            let path = format!("{}/{}", collection_path(&resource)?, id);
            let body = send(&config, Method::PUT, &path, &[], Some(input)).await?;
            output_success(&output_format, message(&body), body.get("data").cloned())
        }
        DataCommands::Delete { resource, id } => {
            let path = format!("{}/{}", collection_path(&resource)?, id);
            let body = send(&config, Method::DELETE, &path, &[], None).await?;
            output_success(&output_format, message(&body), None)
        }
    }
}

fn collection_path(name: &str) -> anyhow::Result<String> {
    match resource(name) {
        Some(schema) if schema.exposed => Ok(format!("/api/{}", schema.name)),
        _ => anyhow::bail!("Unknown resource '{}'", name),
    }
}

fn parse_params(params: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    params
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => Ok((key.to_string(), value.to_string())),
            None => anyhow::bail!("Expected key=value, got '{}'", pair),
        })
        .collect()
}

fn read_stdin_json() -> anyhow::Result<Value> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    serde_json::from_str(&input).map_err(|e| anyhow::anyhow!("Invalid JSON on stdin: {}", e))
}

fn message(body: &Value) -> &str {
    body.get("message").and_then(Value::as_str).unwrap_or("OK")
}

async fn send(
    config: &CliConfig,
    method: Method,
    path: &str,
    query: &[(String, String)],
    body: Option<Value>,
) -> anyhow::Result<Value> {
    let client = reqwest::Client::new();
    let mut request = client
        .request(method, config.endpoint(path))
        .bearer_auth(config.bearer_token()?)
        .query(query);
    if let Some(body) = body {
        request = request.json(&body);
    }

    let response = request.send().await?;
    let status = response.status();
    let body: Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!("{} {}", status, envelope_error(&body));
    }
    Ok(body)
}
