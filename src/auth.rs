use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::{
    gate::AccessGate,
    identity::{Session, User},
    session::ACCESS_COOKIE,
};

/// AdminSession
///
/// The resolved session of a request to the admin API. API paths are outside the
/// edge gate's reach, so this extractor applies the same session check itself.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub session: Session,
}

impl AdminSession {
    pub fn user(&self) -> &User {
        &self.session.user
    }
}

/// AdminSession Extractor Implementation
///
/// Resolution order:
/// 1. A session already placed in the request extensions by the edge gate.
/// 2. An `Authorization: Bearer <access token>` header.
/// 3. The session cookies.
///
/// Rejection: `401 Unauthorized` whenever no live session results, including when
/// the identity backend fails or times out.
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    AccessGate: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(AdminSession {
                session: session.clone(),
            });
        }

        let gate = AccessGate::from_ref(state);

        let mut jar = CookieJar::from_headers(&parts.headers);
        let bearer = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);
        if let Some(token) = bearer {
            jar = jar.add(Cookie::new(ACCESS_COOKIE, token));
        }

        let mut client = gate.session_client(jar);
        let session = client
            .get_current_session()
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        parts.extensions.insert(session.clone());
        Ok(AdminSession { session })
    }
}
