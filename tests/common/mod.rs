#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;

use civic_portal_api::auth::{generate_jwt, Claims};
use civic_portal_api::config::AppConfig;
use civic_portal_api::database::{MemoryStore, Store};
use civic_portal_api::middleware::{sync_user, AuthUser};
use civic_portal_api::notify::MemoryMailer;
use civic_portal_api::server::{app, AppState};
use civic_portal_api::storage::LocalDiskStorage;

pub const ADMIN: i64 = 1;
pub const SUPER_ADMIN: i64 = 2;
pub const CLERK: i64 = 3;
pub const CITIZEN: i64 = 10;
pub const NEIGHBOUR: i64 = 11;
pub const NEWCOMER: i64 = 12;

/// Users mirrored before the server starts: (id, name, role)
const USERS: &[(i64, &str, &str)] = &[
    (ADMIN, "Ada Admin", "admin"),
    (SUPER_ADMIN, "Sam Super", "super_admin"),
    (CLERK, "Cleo Clerk", "staff"),
    (CITIZEN, "Grace Hopper", "citizen"),
    (NEIGHBOUR, "Alan Turing", "citizen"),
];

/// Number of users holding an admin notification role
pub const ADMIN_COUNT: usize = 2;

/// A server on its own port, backed by the in-memory store
pub struct TestServer {
    pub base_url: String,
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub mailer: Arc<MemoryMailer>,
    pub uploads: TempDir,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let uploads = tempfile::tempdir()?;
        let mut config = AppConfig::development();
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.storage.upload_dir = uploads.path().to_path_buf();

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        for (id, name, role) in USERS {
            sync_user(store.as_ref(), &auth_user(*id, name, role)).await?;
        }

        let mailer = Arc::new(MemoryMailer::new());
        let storage = Arc::new(LocalDiskStorage::new(uploads.path(), "/storage"));
        let state = AppState::new(config.clone(), store.clone(), mailer.clone(), storage);

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app(state)).await {
                eprintln!("test server stopped: {e}");
            }
        });

        let server = Self {
            base_url: format!("http://127.0.0.1:{}", port),
            config,
            store,
            mailer,
            uploads,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Token for one of the seeded users, or an unseeded id with the citizen role
    pub fn token(&self, user_id: i64) -> String {
        let (name, role) = USERS
            .iter()
            .find(|(id, _, _)| *id == user_id)
            .map(|(_, name, role)| (name.to_string(), role.to_string()))
            .unwrap_or_else(|| (format!("User {}", user_id), "citizen".to_string()));
        let claims = Claims::new(user_id, name, email(user_id), role, 1);
        generate_jwt(&claims, &self.config.security.jwt_secret).expect("sign test token")
    }

    pub async fn call(&self, method: Method, path: &str, user_id: i64, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path)).bearer_auth(self.token(user_id));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }

    pub async fn get(&self, path: &str, user_id: i64) -> Result<(StatusCode, Value)> {
        self.call(Method::GET, path, user_id, None).await
    }

    pub async fn post(&self, path: &str, user_id: i64, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::POST, path, user_id, Some(body)).await
    }

    pub async fn put(&self, path: &str, user_id: i64, body: Value) -> Result<(StatusCode, Value)> {
        self.call(Method::PUT, path, user_id, Some(body)).await
    }

    pub async fn delete(&self, path: &str, user_id: i64) -> Result<(StatusCode, Value)> {
        self.call(Method::DELETE, path, user_id, None).await
    }

    /// Creates the caller's citizen profile through the portal; returns its id
    pub async fn onboard(&self, user_id: i64, national_id: &str) -> Result<i64> {
        let (status, body) = self
            .post(
                "/portal/profile",
                user_id,
                json!({ "national_id": national_id, "first_name": "Test", "last_name": format!("Citizen {}", user_id) }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "onboarding failed: {} {}", status, body);
        id_of(&body)
    }

    /// Submits a request from the portal as `user_id`; returns its id
    pub async fn submit_request(&self, user_id: i64, subject: &str) -> Result<i64> {
        let (status, body) = self
            .post(
                "/portal/requests",
                user_id,
                json!({ "type": "pothole", "subject": subject, "description": "Deep hole on Main St" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "request failed: {} {}", status, body);
        id_of(&body)
    }

    /// Stored notifications for one user
    pub async fn notifications_of(&self, user_id: i64) -> Result<Vec<Value>> {
        let (status, body) = self.get("/portal/notifications?per_page=100", user_id).await?;
        anyhow::ensure!(status == StatusCode::OK, "notifications failed: {} {}", status, body);
        Ok(body["data"].as_array().cloned().unwrap_or_default())
    }
}

pub fn email(user_id: i64) -> String {
    format!("user{}@example.gov", user_id)
}

fn auth_user(id: i64, name: &str, role: &str) -> AuthUser {
    AuthUser { id, name: name.to_string(), email: email(id), role: role.to_string() }
}

pub fn id_of(body: &Value) -> Result<i64> {
    body["data"]["id"].as_i64().with_context(|| format!("no data.id in {}", body))
}
