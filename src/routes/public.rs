use crate::{
    AppState,
    handlers::{auth, content},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only content for the public site and the sign-in flow. Nested under
/// `/api`, which the edge gate never evaluates.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // GET /home
        // Landing page bundle: hero, about, and the leading rows of each section.
        .route("/home", get(content::get_home))
        .route("/hero", get(content::get_hero_images))
        .route("/about", get(content::get_about))
        .route("/team", get(content::get_team))
        // GET /initiatives?limit=
        // Rows carry `deadline_expired`.
        .route("/initiatives", get(content::get_initiatives))
        // GET /events?limit=&upcoming=
        .route("/events", get(content::get_events))
        .route("/events/{id}", get(content::get_event))
        .route("/achievements", get(content::get_achievements))
        .route("/news", get(content::get_news))
        // GET /news/{slug}
        // Article plus up to three related articles.
        .route("/news/{slug}", get(content::get_news_article))
        // Sign-in flow. Cookies are set and cleared here.
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::get_session_status))
}
