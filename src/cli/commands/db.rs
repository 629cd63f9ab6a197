use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use serde::Deserialize;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::{DatabaseManager, PgStore, Store};
use crate::middleware::{sync_user, AuthUser};

#[derive(Subcommand)]
pub enum DbCommands {
    #[command(about = "Apply pending migrations to DATABASE_URL")]
    Migrate,

    #[command(about = "Mirror users from a YAML file into the users table")]
    Seed {
        #[arg(help = "YAML file with a `users` list (id, name, email, role)")]
        file: PathBuf,
    },
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    users: Vec<SeedUser>,
}

#[derive(Debug, Deserialize)]
struct SeedUser {
    id: i64,
    name: String,
    email: String,
    #[serde(default = "default_role")]
    role: String,
}

fn default_role() -> String {
    "citizen".to_string()
}

pub async fn handle(cmd: DbCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = DatabaseManager::connect(&config().database).await?;

    match cmd {
        DbCommands::Migrate => {
            DatabaseManager::migrate(&pool).await?;
            output_success(&output_format, "Migrations applied", None)
        }
        DbCommands::Seed { file } => {
            let seed: SeedFile = serde_yaml::from_str(&std::fs::read_to_string(&file)?)?;
            let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

            for user in &seed.users {
                let auth_user = AuthUser {
                    id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    role: user.role.clone(),
                };
                sync_user(store.as_ref(), &auth_user).await?;
            }
            output_success(
                &output_format,
                &format!("Seeded {} users from {}", seed.users.len(), file.display()),
                Some(json!({ "users": seed.users.len() })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_files_default_the_role() {
        let seed: SeedFile = serde_yaml::from_str(
            "users:\n  - id: 1\n    name: Ada\n    email: ada@example.gov\n    role: admin\n  - id: 2\n    name: Grace\n    email: grace@example.gov\n",
        )
        .unwrap();
        assert_eq!(seed.users.len(), 2);
        assert_eq!(seed.users[0].role, "admin");
        assert_eq!(seed.users[1].role, "citizen");
    }
}
