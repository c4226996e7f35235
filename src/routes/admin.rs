use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// The admin write API, nested under `/api/admin`. API paths are outside the edge
/// gate, so every handler takes the `AdminSession` extractor, which rejects a
/// request without a live session with `401`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /stats
        // Dashboard counters per collection.
        .route("/stats", get(admin::get_admin_stats))
        .route("/hero", post(admin::create_hero_image))
        .route(
            "/hero/{id}",
            put(admin::update_hero_image).delete(admin::delete_hero_image),
        )
        // PUT /about/{id}
        // The about section is a single row; it is edited, never created or deleted.
        .route("/about/{id}", put(admin::update_about))
        .route("/team", post(admin::create_team_member))
        .route(
            "/team/{id}",
            put(admin::update_team_member).delete(admin::delete_team_member),
        )
        .route("/initiatives", post(admin::create_initiative))
        .route(
            "/initiatives/{id}",
            put(admin::update_initiative).delete(admin::delete_initiative),
        )
        .route("/events", post(admin::create_event))
        .route(
            "/events/{id}",
            put(admin::update_event).delete(admin::delete_event),
        )
        .route("/achievements", post(admin::create_achievement))
        .route(
            "/achievements/{id}",
            put(admin::update_achievement).delete(admin::delete_achievement),
        )
        // POST /news
        // The slug is generated from the title; `published_at` is set to now.
        .route("/news", post(admin::create_news))
        .route(
            "/news/{id}",
            put(admin::update_news).delete(admin::delete_news),
        )
}
