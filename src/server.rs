use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::Store;
use crate::handlers::{portal, protected, public, Resource};
use crate::middleware::{jwt_auth_middleware, require_staff_middleware, validate_user_middleware};
use crate::notify::{Mailer, NotificationDispatcher};
use crate::observer::ObserverPipeline;
use crate::resources::registry::{DOCUMENTS, PAYMENTS, PERMITS, REQUESTS};
use crate::resources::{exposed, ResourceSchema};
use crate::storage::FileStorage;

/// Shared handles every handler reaches through `State`
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub pipeline: Arc<ObserverPipeline>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub storage: Arc<dyn FileStorage>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, mailer: Arc<dyn Mailer>, storage: Arc<dyn FileStorage>) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(store.clone(), mailer, config.notifications.clone()));
        let pipeline = ObserverPipeline::standard(store.clone(), dispatcher.clone(), config.security.enable_audit_logging);
        Self {
            config: Arc::new(config),
            store,
            pipeline: Arc::new(pipeline),
            dispatcher,
            storage,
        }
    }
}

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest("/api", admin_routes(&state))
        .nest("/portal", portal_routes(&state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes)),
        );

    if let Some(cors) = cors_layer(&state.config) {
        router = router.layer(cors);
    }
    router.with_state(state)
}

/// Generic CRUD for every exposed resource under /api/:name
fn admin_routes(state: &AppState) -> Router<AppState> {
    use protected::{dashboard, notifications, records, uploads, users};

    let mut router = Router::new()
        .route("/uploads", post(uploads::upload))
        .route("/dashboard", get(dashboard::show))
        .route("/notifications", get(notifications::index))
        .route("/notifications/:id/read", post(notifications::mark_read))
        .route("/users/:id/password-reset", post(users::password_reset));

    for schema in exposed() {
        let resource = Router::new()
            .route("/", get(records::index).post(records::store))
            .route(
                "/:id",
                get(records::show).put(records::update).patch(records::update).delete(records::destroy),
            )
            .layer(Extension(Resource(schema)));
        router = router.nest(&format!("/{}", schema.name), resource);
    }

    // Layers run outermost-last: token, then user mirror, then role
    router
        .layer(from_fn_with_state(state.clone(), require_staff_middleware))
        .layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn portal_routes(state: &AppState) -> Router<AppState> {
    use portal::{dashboard, documents, events, payments, profile, records};

    let payments = Router::new()
        .route("/", get(records::index))
        .route("/:id", get(records::show))
        .route("/:id/pay", post(payments::pay))
        .layer(Extension(Resource(&PAYMENTS)));
    let documents = Router::new()
        .route("/", get(records::index).post(documents::upload))
        .route("/:id", get(records::show).delete(documents::destroy))
        .layer(Extension(Resource(&DOCUMENTS)));

    Router::new()
        .route("/profile", get(profile::show).post(profile::onboard).put(profile::update))
        .nest("/requests", portal_submissions(&REQUESTS))
        .nest("/permits", portal_submissions(&PERMITS))
        .nest("/payments", payments)
        .nest("/documents", documents)
        .route("/events", get(events::index))
        .route("/dashboard", get(dashboard::show))
        .route("/notifications", get(protected::notifications::index))
        .route("/notifications/:id/read", post(protected::notifications::mark_read))
        .layer(from_fn_with_state(state.clone(), validate_user_middleware))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

/// Citizen-owned submissions: list, submit, view, edit and withdraw
fn portal_submissions(schema: &'static ResourceSchema) -> Router<AppState> {
    use portal::records;

    Router::new()
        .route("/", get(records::index).post(records::store))
        .route("/:id", get(records::show).put(records::update).delete(records::destroy))
        .layer(Extension(Resource(schema)))
}

fn cors_layer(config: &AppConfig) -> Option<CorsLayer> {
    if !config.security.enable_cors {
        return None;
    }
    if config.security.cors_origins.is_empty() || config.security.cors_origins.iter().any(|o| o == "*") {
        return Some(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    Some(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}

/// Binds the configured address and serves until the process is stopped
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Civic portal API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
