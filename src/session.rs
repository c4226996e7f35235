//! Request-scoped session helpers.
//!
//! A `SessionClient` binds the shared identity service to one request's cookie jar.
//! Whatever the identity service decides (refreshed tokens, a dead session) is
//! written back into the jar, which the caller then returns with its response.

use crate::identity::{IdentityError, IdentityState, Session, SessionTokens, User};
use async_trait::async_trait;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;

pub const ACCESS_COOKIE: &str = "sb-access-token";
pub const REFRESH_COOKIE: &str = "sb-refresh-token";

/// Reads the token pair out of the request cookies.
pub fn tokens_from_jar(jar: &CookieJar) -> SessionTokens {
    SessionTokens {
        access_token: jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
        refresh_token: jar.get(REFRESH_COOKIE).map(|c| c.value().to_string()),
    }
}

fn session_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Something that can answer "is there a live session right now?".
///
/// Implemented by `SessionClient`; the render gate takes any probe so tests can
/// script the outcome.
#[async_trait]
pub trait SessionProbe: Send + Sync {
    async fn current_session(&mut self) -> Result<Option<Session>, IdentityError>;
}

/// SessionClient
pub struct SessionClient {
    identity: IdentityState,
    jar: CookieJar,
    timeout: Duration,
}

impl SessionClient {
    pub fn new(identity: IdentityState, jar: CookieJar, timeout: Duration) -> Self {
        Self {
            identity,
            jar,
            timeout,
        }
    }

    /// Resolves the request's session, keeping the jar in sync with the outcome.
    ///
    /// Bounded by the configured timeout; an elapsed timeout is reported as
    /// `IdentityError::Timeout`.
    pub async fn resolve(&mut self) -> Result<Option<Session>, IdentityError> {
        let tokens = tokens_from_jar(&self.jar);
        if tokens.is_empty() {
            return Ok(None);
        }

        let outcome = tokio::time::timeout(self.timeout, self.identity.get_session(&tokens))
            .await
            .map_err(|_| IdentityError::Timeout)??;

        match &outcome {
            Some(session) => {
                if tokens.access_token.as_deref() != Some(session.access_token.as_str()) {
                    tracing::debug!(user_id = %session.user.id, "session refreshed");
                    self.store(session);
                }
            }
            None => self.clear(),
        }
        Ok(outcome)
    }

    /// The current session, or `None` when there is none or it could not be
    /// determined. Never fails: lookup errors are logged and treated as absent.
    pub async fn get_current_session(&mut self) -> Option<Session> {
        match self.resolve().await {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; treating as signed out");
                None
            }
        }
    }

    pub async fn get_current_user(&mut self) -> Option<User> {
        self.get_current_session().await.map(|s| s.user)
    }

    pub async fn is_authenticated(&mut self) -> bool {
        self.get_current_session().await.is_some()
    }

    /// Password sign-in. On success both session cookies are set on the jar.
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let session = tokio::time::timeout(
            self.timeout,
            self.identity.sign_in_with_password(email, password),
        )
        .await
        .map_err(|_| IdentityError::Timeout)??;

        self.store(&session);
        Ok(session)
    }

    /// Revokes the session (best effort) and always clears the cookies.
    pub async fn sign_out(&mut self) {
        if let Some(token) = self.jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()) {
            let revoke = tokio::time::timeout(self.timeout, self.identity.sign_out(&token)).await;
            match revoke {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::warn!(error = %e, "sign-out revoke failed"),
                Err(_) => tracing::warn!("sign-out revoke timed out"),
            }
        }
        self.clear();
    }

    /// The jar as it stands, including any cookie changes so far.
    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    /// Hands back the jar, including any cookie changes, for the response.
    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    fn store(&mut self, session: &Session) {
        let mut jar = self
            .jar
            .clone()
            .add(session_cookie(ACCESS_COOKIE, session.access_token.clone()));
        if let Some(refresh) = &session.refresh_token {
            jar = jar.add(session_cookie(REFRESH_COOKIE, refresh.clone()));
        }
        self.jar = jar;
    }

    /// Expires whichever session cookies the request carried.
    fn clear(&mut self) {
        let mut jar = self.jar.clone();
        for name in [ACCESS_COOKIE, REFRESH_COOKIE] {
            if jar.get(name).is_some() {
                jar = jar.remove(removal_cookie(name));
            }
        }
        self.jar = jar;
    }
}

#[async_trait]
impl SessionProbe for SessionClient {
    async fn current_session(&mut self) -> Result<Option<Session>, IdentityError> {
        self.resolve().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{MockBehavior, MockIdentityService};
    use std::sync::Arc;

    fn jar_with(token: &str) -> CookieJar {
        CookieJar::new().add(Cookie::new(ACCESS_COOKIE, token.to_string()))
    }

    #[tokio::test]
    async fn empty_jar_skips_the_backend() {
        let identity = Arc::new(MockIdentityService::new());
        let mut client =
            SessionClient::new(identity.clone(), CookieJar::new(), Duration::from_secs(1));
        assert!(client.get_current_session().await.is_none());
        assert_eq!(identity.session_lookups(), 0);
    }

    #[tokio::test]
    async fn valid_cookie_yields_session() {
        let identity = Arc::new(MockIdentityService::new());
        let mut client = SessionClient::new(
            identity,
            jar_with(MockIdentityService::VALID_TOKEN),
            Duration::from_secs(1),
        );
        let user = client.get_current_user().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@example.org"));
    }

    #[tokio::test]
    async fn dead_cookie_is_removed() {
        let identity = Arc::new(MockIdentityService::new());
        let mut client = SessionClient::new(identity, jar_with("stale"), Duration::from_secs(1));
        assert!(!client.is_authenticated().await);
        assert!(client.into_jar().get(ACCESS_COOKIE).is_none());
    }

    #[tokio::test]
    async fn backend_failure_fails_closed() {
        let identity = Arc::new(MockIdentityService::with_behavior(MockBehavior::Unreachable));
        let mut client = SessionClient::new(
            identity,
            jar_with(MockIdentityService::VALID_TOKEN),
            Duration::from_secs(1),
        );
        assert!(client.get_current_session().await.is_none());
    }

    #[tokio::test]
    async fn hanging_backend_times_out() {
        let identity = Arc::new(MockIdentityService::with_behavior(MockBehavior::Hang));
        let mut client = SessionClient::new(
            identity,
            jar_with(MockIdentityService::VALID_TOKEN),
            Duration::from_millis(20),
        );
        assert!(matches!(client.resolve().await, Err(IdentityError::Timeout)));
    }

    #[tokio::test]
    async fn sign_in_sets_both_cookies() {
        let identity = Arc::new(MockIdentityService::new());
        let mut client = SessionClient::new(identity, CookieJar::new(), Duration::from_secs(1));
        client
            .sign_in("admin@example.org", "correct-horse")
            .await
            .unwrap();
        let jar = client.into_jar();
        assert_eq!(
            jar.get(ACCESS_COOKIE).map(|c| c.value().to_string()),
            Some(MockIdentityService::VALID_TOKEN.to_string())
        );
        assert!(jar.get(REFRESH_COOKIE).is_some());
    }

    #[tokio::test]
    async fn sign_out_revokes_and_clears() {
        let identity = Arc::new(MockIdentityService::new());
        let mut client = SessionClient::new(
            identity.clone(),
            jar_with(MockIdentityService::VALID_TOKEN),
            Duration::from_secs(1),
        );
        client.sign_out().await;
        assert_eq!(
            identity.signed_out_tokens(),
            vec![MockIdentityService::VALID_TOKEN.to_string()]
        );
        assert!(client.into_jar().get(ACCESS_COOKIE).is_none());
    }
}
