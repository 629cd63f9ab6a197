use clap::Subcommand;
use serde_json::json;

use crate::auth::{generate_jwt, validate_jwt, Claims};
use crate::cli::config::{load_cli_config, save_cli_config};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Mint a token signed with JWT_SECRET, for development")]
    Token {
        #[arg(help = "User id (the token subject)")]
        user_id: i64,
        #[arg(long, default_value = "admin", help = "Role claim")]
        role: String,
        #[arg(long, default_value = "Portal Admin", help = "Name claim")]
        name: String,
        #[arg(long, help = "Email claim (defaults to user<ID>@localhost)")]
        email: Option<String>,
        #[arg(long, help = "Store the token in the CLI config")]
        save: bool,
    },

    #[command(about = "Show the claims of the saved token")]
    Status,

    #[command(about = "Forget the saved token")]
    Logout,
}

pub async fn handle(cmd: AuthCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let secret = &config().security.jwt_secret;

    match cmd {
        AuthCommands::Token { user_id, role, name, email, save } => {
            let email = email.unwrap_or_else(|| format!("user{}@localhost", user_id));
            let claims = Claims::new(user_id, name, email, role, config().security.jwt_expiry_hours);
            let token = generate_jwt(&claims, secret)?;

            if save {
                let mut cli_config = load_cli_config()?;
                cli_config.token = Some(token.clone());
                save_cli_config(&cli_config)?;
            }
            match output_format {
                OutputFormat::Json => output_success(&output_format, "Token generated", Some(json!({ "token": token }))),
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
            }
        }
        AuthCommands::Status => {
            let cli_config = load_cli_config()?;
            let claims = validate_jwt(&cli_config.bearer_token()?, secret)?;
            output_success(
                &output_format,
                &format!("Authenticated as {} ({})", claims.email, claims.role),
                Some(json!({ "user_id": claims.sub, "name": claims.name, "role": claims.role, "exp": claims.exp })),
            )
        }
        AuthCommands::Logout => {
            let mut cli_config = load_cli_config()?;
            cli_config.token = None;
            save_cli_config(&cli_config)?;
            output_success(&output_format, "Token removed", None)
        }
    }
}
