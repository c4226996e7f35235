//! Askama templates for the admin shell.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Login page template
#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub action: String,
    pub redirected_from: String,
    pub error: Option<String>,
}

/// Placeholder shown while access is being confirmed or a redirect is pending.
#[derive(Template)]
#[template(path = "admin/loading.html")]
pub struct LoadingTemplate {
    pub redirect_to: Option<String>,
}

pub struct NavItem {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

pub struct StatCard {
    pub label: &'static str,
    pub count: i64,
    pub href: String,
}

/// One line of a section listing.
pub struct RowSummary {
    pub title: String,
    pub detail: String,
    pub image_url: Option<String>,
}

/// Admin layout with sidebar
#[derive(Template)]
#[template(path = "admin/shell.html")]
pub struct ShellTemplate {
    pub heading: String,
    pub nav: Vec<NavItem>,
    pub user_email: String,
    pub logout_action: String,
    pub cards: Vec<StatCard>,
    pub rows: Vec<RowSummary>,
    pub not_found: bool,
}

/// Renders a template, turning a render failure into a bare 500.
pub fn render_page<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template render failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_page_carries_refresh_only_when_redirecting() {
        let waiting = LoadingTemplate { redirect_to: None }.render().unwrap();
        assert!(waiting.contains("Authenticating..."));
        assert!(!waiting.contains("http-equiv"));

        let leaving = LoadingTemplate {
            redirect_to: Some("/admin/login?redirectedFrom=%2Fadmin".to_string()),
        }
        .render()
        .unwrap();
        assert!(leaving.contains("http-equiv=\"refresh\""));
        assert!(leaving.contains("/admin/login?redirectedFrom=%2Fadmin"));
    }

    #[test]
    fn login_form_escapes_the_redirect_target() {
        let page = LoginTemplate {
            action: "/api/auth/login".to_string(),
            redirected_from: "\"><script>".to_string(),
            error: Some("Invalid email or password.".to_string()),
        }
        .render()
        .unwrap();
        assert!(!page.contains("<script>"));
        assert!(page.contains("Invalid email or password."));
    }
}
