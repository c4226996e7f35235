use regex::Regex;
use std::sync::LazyLock;

use crate::config::AppConfig;

/// Paths whose first segment is one of these never reach a gate.
const EXCLUDED_SEGMENTS: [&str; 6] = ["api", "_next", "_static", "_vercel", "assets", "swagger-ui"];

/// A top-level public file such as `favicon.ico` or `robots.txt`.
static PUBLIC_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w-]+\.\w+").expect("static regex"));

/// ProtectedRoutes
///
/// The single protected-path predicate. Everything under `prefix` is protected
/// except the login route; framework, API and public-file paths are excluded from
/// evaluation altogether.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedRoutes {
    prefix: String,
    login_path: String,
}

impl ProtectedRoutes {
    /// `prefix` is expected in normalized form (`/admin`, no trailing slash).
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            login_path: format!("{}/login", prefix),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            prefix: config.admin_prefix.clone(),
            login_path: config.login_path(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// True for paths the gates must not look at.
    pub fn is_excluded(path: &str) -> bool {
        let first = path
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default();
        EXCLUDED_SEGMENTS.contains(&first) || PUBLIC_FILE.is_match(first)
    }

    pub fn is_login(&self, path: &str) -> bool {
        path == self.login_path
            || path
                .strip_prefix(self.login_path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn is_under_prefix(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// The predicate both gates share.
    ///
    /// Excluded paths never match because a valid prefix cannot start with an
    /// excluded segment (see `shadows_exclusions`). Should one slip through anyway,
    /// paths under it stay protected.
    pub fn requires_session(&self, path: &str) -> bool {
        self.is_under_prefix(path) && !self.is_login(path)
    }

    /// True when the prefix itself would be skipped as an API, framework or
    /// public-file path. Such a prefix is rejected at startup.
    pub fn shadows_exclusions(&self) -> bool {
        Self::is_excluded(&self.prefix)
    }

    /// `<login>?redirectedFrom=<original>` with the original path form-encoded.
    pub fn login_redirect(&self, original: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(original.as_bytes()).collect();
        format!("{}?redirectedFrom={}", self.login_path, encoded)
    }

    /// Where to send a user after sign-in. Only local protected paths are honored;
    /// anything else lands on the admin root.
    pub fn post_login_target(&self, redirected_from: Option<&str>) -> String {
        match redirected_from {
            Some(target)
                if target.starts_with('/')
                    && !target.starts_with("//")
                    && !target.contains('\\')
                    && self.requires_session(target) =>
            {
                target.to_string()
            }
            _ => self.prefix.clone(),
        }
    }
}
