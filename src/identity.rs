//! Identity backend client.
//!
//! Talks to the Supabase GoTrue REST API. Session access tokens are HS256 JWTs
//! signed with the project's JWT secret, so a well-formed, unexpired token is
//! verified locally; only refresh, sign-in, sign-out and user lookups go over
//! the network.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, errors::ErrorKind};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// User
///
/// The identity a session belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Session
///
/// Proof of authentication carried by the client in cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: User,
}

impl Session {
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        self.expires_at <= now_unix
    }
}

/// The raw token pair read from a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTokens {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl SessionTokens {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// IdentityError
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("identity backend unreachable: {0}")]
    Unavailable(String),
    #[error("identity backend timed out")]
    Timeout,
    #[error("identity backend returned {0}")]
    Rejected(u16),
}

impl From<reqwest::Error> for IdentityError {
    fn from(e: reqwest::Error) -> Self {
        IdentityError::Unavailable(e.to_string())
    }
}

/// IdentityService
///
/// The one logical session source for the whole process. Both access gates and the
/// login/logout endpoints go through this trait; it is injected through `AppState`.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Resolves a token pair to a live session, refreshing an expired access token
    /// when a refresh token is available. `Ok(None)` is the normal "no session"
    /// outcome; `Err` means the backend could not be asked.
    async fn get_session(&self, tokens: &SessionTokens) -> Result<Option<Session>, IdentityError>;

    /// Asks the backend who owns `access_token`.
    async fn get_user(&self, access_token: &str) -> Result<Option<User>, IdentityError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Revokes the session server-side.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;
}

pub type IdentityState = Arc<dyn IdentityService>;

// --- Supabase implementation ---

/// Access token payload as issued by GoTrue.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub exp: i64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Response body of `/auth/v1/token`.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: User,
}

impl From<TokenResponse> for Session {
    fn from(t: TokenResponse) -> Self {
        let expires_at = t
            .expires_at
            .unwrap_or_else(|| Utc::now().timestamp() + t.expires_in);
        Session {
            access_token: t.access_token,
            refresh_token: Some(t.refresh_token),
            expires_at,
            user: t.user,
        }
    }
}

enum LocalCheck {
    Valid(AccessClaims),
    Expired,
    Invalid,
}

/// SupabaseIdentity
pub struct SupabaseIdentity {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    jwt_secret: String,
}

impl SupabaseIdentity {
    pub fn new(base_url: &str, anon_key: &str, jwt_secret: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            jwt_secret: jwt_secret.to_string(),
        }
    }

    fn check_locally(&self, token: &str) -> LocalCheck {
        let key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // GoTrue sets aud = "authenticated"; the signature already binds the project.
        validation.validate_aud = false;
        validation.leeway = 0;

        match decode::<AccessClaims>(token, &key, &validation) {
            Ok(data) => LocalCheck::Valid(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => LocalCheck::Expired,
                _ => LocalCheck::Invalid,
            },
        }
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<Session>, IdentityError> {
        let response = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=refresh_token",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            // Revoked or already-used refresh token.
            return Ok(None);
        }
        if !status.is_success() {
            return Err(IdentityError::Rejected(status.as_u16()));
        }
        let body = response.json::<TokenResponse>().await?;
        Ok(Some(body.into()))
    }
}

#[async_trait]
impl IdentityService for SupabaseIdentity {
    async fn get_session(&self, tokens: &SessionTokens) -> Result<Option<Session>, IdentityError> {
        let refresh = match tokens.access_token.as_deref().map(|t| self.check_locally(t)) {
            Some(LocalCheck::Valid(claims)) => {
                return Ok(Some(Session {
                    access_token: tokens.access_token.clone().unwrap_or_default(),
                    refresh_token: tokens.refresh_token.clone(),
                    expires_at: claims.exp,
                    user: User {
                        id: claims.sub,
                        email: claims.email,
                    },
                }));
            }
            // A tampered or foreign token is never exchanged for a fresh one.
            Some(LocalCheck::Invalid) => return Ok(None),
            Some(LocalCheck::Expired) | None => tokens.refresh_token.as_deref(),
        };

        match refresh {
            Some(refresh_token) => self.refresh(refresh_token).await,
            None => Ok(None),
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, IdentityError> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            s if s.is_success() => Ok(Some(response.json::<User>().await?)),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            s => Err(IdentityError::Rejected(s.as_u16())),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token?grant_type=password", self.base_url))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST || status == StatusCode::UNAUTHORIZED {
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Rejected(status.as_u16()));
        }
        Ok(response.json::<TokenResponse>().await?.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        // An already-invalid token is as signed out as it gets.
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            Err(IdentityError::Rejected(status.as_u16()))
        }
    }
}

// --- Mock implementation ---

/// How `MockIdentityService` answers session lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Accepts exactly the configured access token.
    Normal,
    /// Every lookup fails as if the backend were down.
    Unreachable,
    /// Every lookup hangs until the caller's timeout fires.
    Hang,
}

/// MockIdentityService
///
/// In-memory identity backend for tests: one known user, one valid access token,
/// and a call counter so tests can assert whether a gate consulted it at all.
pub struct MockIdentityService {
    pub email: String,
    pub password: String,
    pub valid_token: String,
    pub behavior: MockBehavior,
    user: User,
    calls: std::sync::atomic::AtomicUsize,
    signed_out: std::sync::Mutex<Vec<String>>,
}

impl MockIdentityService {
    pub const VALID_TOKEN: &'static str = "valid-access-token";

    pub fn new() -> Self {
        Self::with_behavior(MockBehavior::Normal)
    }

    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            email: "admin@example.org".to_string(),
            password: "correct-horse".to_string(),
            valid_token: Self::VALID_TOKEN.to_string(),
            behavior,
            user: User {
                id: Uuid::from_u128(7),
                email: Some("admin@example.org".to_string()),
            },
            calls: std::sync::atomic::AtomicUsize::new(0),
            signed_out: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Number of `get_session` calls received.
    pub fn session_lookups(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn signed_out_tokens(&self) -> Vec<String> {
        self.signed_out
            .lock()
            .map(|g| g.clone())
            .unwrap_or_default()
    }

    fn session(&self) -> Session {
        Session {
            access_token: self.valid_token.clone(),
            refresh_token: Some("valid-refresh-token".to_string()),
            expires_at: Utc::now().timestamp() + 3600,
            user: self.user.clone(),
        }
    }
}

impl Default for MockIdentityService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityService for MockIdentityService {
    async fn get_session(&self, tokens: &SessionTokens) -> Result<Option<Session>, IdentityError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        match self.behavior {
            MockBehavior::Unreachable => {
                Err(IdentityError::Unavailable("connection refused".into()))
            }
            MockBehavior::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
            MockBehavior::Normal => {
                let valid = tokens.access_token.as_deref() == Some(self.valid_token.as_str());
                let signed_out = self
                    .signed_out
                    .lock()
                    .map(|g| g.contains(&self.valid_token))
                    .unwrap_or(false);
                Ok((valid && !signed_out).then(|| self.session()))
            }
        }
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<User>, IdentityError> {
        let session = self
            .get_session(&SessionTokens {
                access_token: Some(access_token.to_string()),
                refresh_token: None,
            })
            .await?;
        Ok(session.map(|s| s.user))
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        if self.behavior == MockBehavior::Unreachable {
            return Err(IdentityError::Unavailable("connection refused".into()));
        }
        if email == self.email && password == self.password {
            if let Ok(mut g) = self.signed_out.lock() {
                g.retain(|t| t != &self.valid_token);
            }
            Ok(self.session())
        } else {
            Err(IdentityError::InvalidCredentials)
        }
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        if let Ok(mut g) = self.signed_out.lock() {
            g.push(access_token.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    const SECRET: &str = "test-secret-value-1234567890";

    fn token(exp_offset: i64, secret: &str) -> String {
        let claims = AccessClaims {
            sub: Uuid::from_u128(1),
            exp: Utc::now().timestamp() + exp_offset,
            email: Some("a@b.org".into()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn identity() -> SupabaseIdentity {
        // Nothing listens here; any network call would fail.
        SupabaseIdentity::new("http://127.0.0.1:9", "anon", SECRET)
    }

    #[tokio::test]
    async fn valid_token_resolves_without_network() {
        let tokens = SessionTokens {
            access_token: Some(token(600, SECRET)),
            refresh_token: None,
        };
        let session = identity().get_session(&tokens).await.unwrap().unwrap();
        assert_eq!(session.user.id, Uuid::from_u128(1));
        assert_eq!(session.user.email.as_deref(), Some("a@b.org"));
    }

    #[tokio::test]
    async fn foreign_signature_is_no_session() {
        let tokens = SessionTokens {
            access_token: Some(token(600, "some-other-secret")),
            refresh_token: Some("r".into()),
        };
        assert!(identity().get_session(&tokens).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_without_refresh_is_no_session() {
        let tokens = SessionTokens {
            access_token: Some(token(-600, SECRET)),
            refresh_token: None,
        };
        assert!(identity().get_session(&tokens).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn garbage_token_is_no_session() {
        let tokens = SessionTokens {
            access_token: Some("not-a-jwt".into()),
            refresh_token: None,
        };
        assert!(identity().get_session(&tokens).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_token_with_unreachable_refresh_is_an_error() {
        let tokens = SessionTokens {
            access_token: Some(token(-600, SECRET)),
            refresh_token: Some("r".into()),
        };
        assert!(identity().get_session(&tokens).await.is_err());
    }
}
