use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    middleware,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core application services and components.
pub mod auth;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;
pub mod session;
pub mod storage;
pub mod utils;
pub mod views;

// Routing segregated by audience (public API, admin API, admin pages).
pub mod routes;
use routes::{admin, public, shell};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use gate::{AccessGate, ProtectedRoutes};
pub use identity::{IdentityState, MockIdentityService, SupabaseIdentity};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler and
/// `ToSchema` model, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::content::get_home, handlers::content::get_hero_images,
        handlers::content::get_about, handlers::content::get_team,
        handlers::content::get_initiatives, handlers::content::get_events,
        handlers::content::get_event, handlers::content::get_achievements,
        handlers::content::get_news, handlers::content::get_news_article,
        handlers::auth::login, handlers::auth::logout, handlers::auth::get_session_status,
        handlers::admin::get_admin_stats,
        handlers::admin::create_hero_image, handlers::admin::update_hero_image,
        handlers::admin::delete_hero_image, handlers::admin::update_about,
        handlers::admin::create_team_member, handlers::admin::update_team_member,
        handlers::admin::delete_team_member, handlers::admin::create_initiative,
        handlers::admin::update_initiative, handlers::admin::delete_initiative,
        handlers::admin::create_event, handlers::admin::update_event,
        handlers::admin::delete_event, handlers::admin::create_achievement,
        handlers::admin::update_achievement, handlers::admin::delete_achievement,
        handlers::admin::create_news, handlers::admin::update_news,
        handlers::admin::delete_news,
    ),
    components(
        schemas(
            models::HeroImage, models::AboutContent, models::TeamMember, models::Initiative,
            models::Event, models::Achievement, models::NewsArticle, models::NewsDetail,
            models::HomePage, models::DashboardCounts, models::LoginRequest,
            models::SessionStatus,
        )
    ),
    tags(
        (name = "sangam-portal", description = "Sangam site content and admin API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of shared services. Handlers pull the pieces
/// they need through the `FromRef` impls below.
#[derive(Clone)]
pub struct AppState {
    /// Content persistence (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Image uploads (S3-compatible storage).
    pub storage: StorageState,
    /// Session resolution shared by both gates and the admin API extractor.
    pub gate: AccessGate,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services together; the gate is derived from `config`.
    pub fn new(
        repo: RepositoryState,
        storage: StorageState,
        identity: IdentityState,
        config: AppConfig,
    ) -> Self {
        let gate = AccessGate::new(
            identity,
            ProtectedRoutes::from_config(&config),
            config.identity_timeout,
        );
        Self {
            repo,
            storage,
            gate,
            config,
        }
    }
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for IdentityState {
    fn from_ref(app_state: &AppState) -> IdentityState {
        Arc::clone(&app_state.gate.identity)
    }
}

/// create_router
///
/// Assembles every route, the edge gate, and the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(public::public_routes())
        .nest("/admin", admin::admin_routes());

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .merge(shell::shell_routes(&state.config.admin_prefix))
        // The edge gate sees every request; it evaluates only protected paths and
        // passes everything else straight through.
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            gate::edge_gate,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for `TraceLayer`, correlating every log line of a request through its
/// `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
