//! Sign-in, sign-out and session status.

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use super::ApiError;
use crate::{
    gate::AccessGate,
    identity::IdentityError,
    models::{LoginRequest, SessionStatus},
};

/// LoginPayload
///
/// Accepts the credentials either as JSON (API clients) or as an urlencoded form
/// (the login page). Remembers which, so failures can answer in kind.
pub struct LoginPayload {
    pub request: LoginRequest,
    pub from_form: bool,
}

impl<S> FromRequest<S> for LoginPayload
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        if is_json {
            let Json(request) = Json::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self {
                request,
                from_form: false,
            })
        } else {
            let Form(request) = Form::<LoginRequest>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self {
                request,
                from_form: true,
            })
        }
    }
}

/// Back to the login page with an error marker, keeping the original destination.
fn login_retry(gate: &AccessGate, error: &str, redirected_from: Option<&str>) -> Redirect {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("error", error);
    if let Some(from) = redirected_from {
        query.append_pair("redirectedFrom", from);
    }
    Redirect::to(&format!("{}?{}", gate.routes.login_path(), query.finish()))
}

/// login
///
/// Exchanges credentials for a session, sets the session cookies and redirects
/// (`303`) to `redirectedFrom` when it names a protected admin path, otherwise to
/// the admin root.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 303, description = "Signed in; redirect to the admin area"),
        (status = 401, description = "Invalid credentials"),
        (status = 503, description = "Identity service unavailable")
    )
)]
pub async fn login(
    State(gate): State<AccessGate>,
    jar: CookieJar,
    payload: LoginPayload,
) -> Response {
    let LoginPayload { request, from_form } = payload;
    let mut client = gate.session_client(jar);

    match client.sign_in(&request.email, &request.password).await {
        Ok(session) => {
            let target = gate
                .routes
                .post_login_target(request.redirected_from.as_deref());
            tracing::info!(user_id = %session.user.id, %target, "admin signed in");
            (client.into_jar(), Redirect::to(&target)).into_response()
        }
        Err(IdentityError::InvalidCredentials) => {
            tracing::warn!("admin sign-in rejected: invalid credentials");
            if from_form {
                login_retry(&gate, "invalid", request.redirected_from.as_deref()).into_response()
            } else {
                ApiError::Unauthorized.into_response()
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "admin sign-in failed");
            if from_form {
                login_retry(&gate, "unavailable", request.redirected_from.as_deref())
                    .into_response()
            } else {
                ApiError::IdentityUnavailable.into_response()
            }
        }
    }
}

/// logout
///
/// Revokes the session with the identity backend, clears the cookies and sends
/// the browser to the login page.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 303, description = "Signed out; redirect to login"))
)]
pub async fn logout(State(gate): State<AccessGate>, jar: CookieJar) -> Response {
    let mut client = gate.session_client(jar);
    client.sign_out().await;
    tracing::info!("admin signed out");
    (client.into_jar(), Redirect::to(gate.routes.login_path())).into_response()
}

/// get_session_status
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses((status = 200, description = "Whether the caller holds a live session", body = SessionStatus))
)]
pub async fn get_session_status(State(gate): State<AccessGate>, jar: CookieJar) -> Response {
    let mut client = gate.session_client(jar);
    let status = match client.get_current_user().await {
        Some(user) => SessionStatus {
            authenticated: true,
            email: user.email,
        },
        None => SessionStatus::default(),
    };
    (client.into_jar(), Json(status)).into_response()
}
