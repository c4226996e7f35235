use axum::{
    extract::{FromRef, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::time::Duration;

use super::route::ProtectedRoutes;
use crate::{AppState, identity::IdentityState, session::SessionClient};

/// AccessGate
///
/// Everything either gate needs to decide on a path: the shared predicate, the
/// identity service, and the per-lookup timeout.
#[derive(Clone)]
pub struct AccessGate {
    pub identity: IdentityState,
    pub routes: ProtectedRoutes,
    pub timeout: Duration,
}

impl AccessGate {
    pub fn new(identity: IdentityState, routes: ProtectedRoutes, timeout: Duration) -> Self {
        Self {
            identity,
            routes,
            timeout,
        }
    }

    /// A session client bound to one request's cookies.
    pub fn session_client(&self, jar: CookieJar) -> SessionClient {
        SessionClient::new(self.identity.clone(), jar, self.timeout)
    }
}

impl FromRef<AppState> for AccessGate {
    fn from_ref(app_state: &AppState) -> AccessGate {
        app_state.gate.clone()
    }
}

/// edge_gate
///
/// Request-interception middleware. Paths outside the protected set pass through
/// without an identity lookup. Protected paths pass only with a live session, which
/// is placed in the request extensions; otherwise the response is a `302` to the
/// login route carrying the original path as `redirectedFrom`.
///
/// Cookie changes made while resolving the session (refresh, removal) are written
/// to the outgoing response on both branches.
pub async fn edge_gate(
    State(gate): State<AccessGate>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !gate.routes.requires_session(&path) {
        return next.run(request).await;
    }

    let mut client = gate.session_client(jar);
    match client.get_current_session().await {
        Some(session) => {
            tracing::debug!(%path, user_id = %session.user.id, "edge gate: session accepted");
            request.extensions_mut().insert(session);
            let response = next.run(request).await;
            (client.into_jar(), response).into_response()
        }
        None => {
            let location = gate.routes.login_redirect(&path);
            tracing::info!(%path, %location, "edge gate: no session, redirecting");
            (
                StatusCode::FOUND,
                client.into_jar(),
                [(header::LOCATION, location)],
            )
                .into_response()
        }
    }
}
