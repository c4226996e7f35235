use crate::{AppState, handlers::shell};
use axum::{Router, routing::get};

/// Admin Shell Router
///
/// HTML pages under the configured admin prefix. The static login route takes
/// precedence over the `{section}` capture.
pub fn shell_routes(prefix: &str) -> Router<AppState> {
    Router::new()
        .route(&format!("{}/login", prefix), get(shell::login_page))
        .route(prefix, get(shell::admin_shell))
        .route(&format!("{}/", prefix), get(shell::admin_shell))
        .route(&format!("{}/{{section}}", prefix), get(shell::admin_shell))
}
