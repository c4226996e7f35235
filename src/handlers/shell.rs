//! Server-rendered admin shell.
//!
//! Every page goes through a `RenderGate` mounted on the request path, behind the
//! edge gate. When the gate does not authorize, the placeholder page is served,
//! with a refresh to wherever the gate navigated.

use async_trait::async_trait;
use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use std::sync::{Arc, Mutex};

use crate::{
    AppState,
    gate::{GateView, RenderGate, render::RecordingNavigator},
    identity::{IdentityError, Session},
    session::{SessionClient, SessionProbe},
    utils,
    views::{LoadingTemplate, LoginTemplate, NavItem, RowSummary, ShellTemplate, StatCard, render_page},
};

const LOGIN_ACTION: &str = "/api/auth/login";
const LOGOUT_ACTION: &str = "/api/auth/logout";

/// Section
///
/// The sidebar entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Team,
    Initiatives,
    Events,
    Achievements,
    News,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Dashboard,
        Section::Team,
        Section::Initiatives,
        Section::Events,
        Section::Achievements,
        Section::News,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Team => "team",
            Section::Initiatives => "initiatives",
            Section::Events => "events",
            Section::Achievements => "achievements",
            Section::News => "news",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Team => "Team Members",
            Section::Initiatives => "Initiatives",
            Section::Events => "Events",
            Section::Achievements => "Achievements",
            Section::News => "News",
        }
    }

    /// The admin root and `/dashboard` both show the dashboard.
    pub fn from_slug(slug: &str) -> Option<Section> {
        if slug.is_empty() {
            return Some(Section::Dashboard);
        }
        Section::ALL.into_iter().find(|s| s.slug() == slug)
    }
}

/// Cookie changes the shell's session lookup made, to be sent with the page.
type JarSlot = Arc<Mutex<Option<CookieJar>>>;

/// Session source for the shell's render gate: the session the edge gate already
/// verified for this request while it is unexpired, otherwise a fresh lookup whose
/// cookie changes are left in `updated`.
struct ShellProbe {
    verified: Option<Session>,
    client: SessionClient,
    updated: JarSlot,
}

#[async_trait]
impl SessionProbe for ShellProbe {
    async fn current_session(&mut self) -> Result<Option<Session>, IdentityError> {
        let now = Utc::now().timestamp();
        if let Some(session) = self.verified.clone().filter(|s| !s.is_expired_at(now)) {
            return Ok(Some(session));
        }
        let outcome = self.client.resolve().await;
        if let Ok(mut slot) = self.updated.lock() {
            *slot = Some(self.client.jar().clone());
        }
        outcome
    }
}

struct MountedGate {
    gate: RenderGate,
    navigator: Arc<RecordingNavigator>,
    updated: JarSlot,
}

impl MountedGate {
    /// Attaches whatever cookies the lookup refreshed or cleared.
    fn respond(&self, page: Response) -> Response {
        let jar = self.updated.lock().ok().and_then(|mut slot| slot.take());
        match jar {
            Some(jar) => (jar, page).into_response(),
            None => page,
        }
    }
}

fn mount_gate(state: &AppState, jar: CookieJar, request: &Request) -> MountedGate {
    let navigator = Arc::new(RecordingNavigator::new());
    let updated = JarSlot::default();
    let probe = ShellProbe {
        verified: request.extensions().get::<Session>().cloned(),
        client: state.gate.session_client(jar),
        updated: updated.clone(),
    };
    let gate = RenderGate::mount(
        state.gate.routes.clone(),
        state.gate.timeout,
        navigator.clone(),
        Box::new(probe),
        request.uri().path(),
    );
    MountedGate {
        gate,
        navigator,
        updated,
    }
}

fn loading_page(navigator: &RecordingNavigator) -> Response {
    render_page(
        StatusCode::OK,
        &LoadingTemplate {
            redirect_to: navigator.last_target(),
        },
    )
}

/// LoginQuery
#[derive(Debug, Deserialize, Default)]
pub struct LoginQuery {
    #[serde(default, alias = "redirectedFrom")]
    pub redirected_from: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// login_page
///
/// Never gated: the render gate authorizes the login route without a lookup.
/// A visitor who is already signed in is sent on to `redirectedFrom` (or the
/// admin root) instead of seeing the form again.
pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
    request: Request,
) -> Response {
    let mut client = state.gate.session_client(jar);
    if client.is_authenticated().await {
        let target = state
            .gate
            .routes
            .post_login_target(query.redirected_from.as_deref());
        return (client.into_jar(), Redirect::to(&target)).into_response();
    }
    let jar = client.into_jar();

    let mounted = mount_gate(&state, jar.clone(), &request);
    let page = match mounted.gate.render(|| ()) {
        GateView::Content(()) => {
            let error = query.error.as_deref().map(|code| match code {
                "invalid" => "Invalid email or password.".to_string(),
                _ => "Sign-in is temporarily unavailable. Try again shortly.".to_string(),
            });
            render_page(
                StatusCode::OK,
                &LoginTemplate {
                    action: LOGIN_ACTION.to_string(),
                    redirected_from: query.redirected_from.unwrap_or_default(),
                    error,
                },
            )
        }
        GateView::Loading => loading_page(&mounted.navigator),
    };
    (jar, page).into_response()
}

/// admin_shell
///
/// `<prefix>`, `<prefix>/dashboard` and `<prefix>/{section}`.
pub async fn admin_shell(State(state): State<AppState>, jar: CookieJar, request: Request) -> Response {
    let path = request.uri().path().to_owned();
    let email = request
        .extensions()
        .get::<Session>()
        .and_then(|s| s.user.email.clone())
        .unwrap_or_default();

    let mounted = mount_gate(&state, jar, &request);
    mounted.gate.settled().await;

    let slug = path
        .strip_prefix(state.gate.routes.prefix())
        .unwrap_or_default()
        .trim_matches('/')
        .to_string();

    let page = match mounted.gate.render(|| Section::from_slug(&slug)) {
        GateView::Content(section) => render_section(&state, section, email).await,
        GateView::Loading => loading_page(&mounted.navigator),
    };
    mounted.respond(page)
}

async fn render_section(state: &AppState, section: Option<Section>, user_email: String) -> Response {
    let prefix = state.gate.routes.prefix();
    let href = |s: Section| format!("{}/{}", prefix, s.slug());

    let nav = Section::ALL
        .into_iter()
        .map(|s| NavItem {
            label: s.label(),
            href: href(s),
            active: Some(s) == section,
        })
        .collect();

    let mut page = ShellTemplate {
        heading: section.map(Section::label).unwrap_or("Not found").to_string(),
        nav,
        user_email,
        logout_action: LOGOUT_ACTION.to_string(),
        cards: Vec::new(),
        rows: Vec::new(),
        not_found: section.is_none(),
    };

    let repo = &state.repo;
    match section {
        None => return render_page(StatusCode::NOT_FOUND, &page),
        Some(Section::Dashboard) => {
            let counts = repo.dashboard_counts().await;
            page.cards = vec![
                StatCard { label: "Hero Images", count: counts.hero_images, href: href(Section::Dashboard) },
                StatCard { label: "Team Members", count: counts.team_members, href: href(Section::Team) },
                StatCard { label: "Initiatives", count: counts.initiatives, href: href(Section::Initiatives) },
                StatCard { label: "Events", count: counts.events, href: href(Section::Events) },
                StatCard { label: "Achievements", count: counts.achievements, href: href(Section::Achievements) },
                StatCard { label: "News", count: counts.news, href: href(Section::News) },
            ];
        }
        Some(Section::Team) => {
            page.rows = repo
                .list_team(None)
                .await
                .into_iter()
                .map(|m| RowSummary {
                    title: m.name,
                    detail: m.role,
                    image_url: Some(m.image_url),
                })
                .collect();
        }
        Some(Section::Initiatives) => {
            page.rows = repo
                .list_initiatives(None)
                .await
                .into_iter()
                .map(|i| RowSummary {
                    detail: match &i.deadline {
                        Some(d) if utils::is_deadline_expired(Some(d)) => {
                            format!("Closed {}", utils::format_date(d, false))
                        }
                        Some(d) => format!("Deadline {}", utils::format_date(d, false)),
                        None => "No deadline".to_string(),
                    },
                    title: i.title,
                    image_url: Some(i.image_url),
                })
                .collect();
        }
        Some(Section::Events) => {
            page.rows = repo
                .list_events(None, false, false)
                .await
                .into_iter()
                .map(|e| {
                    let mut when = utils::format_date(&e.date, true);
                    if utils::is_upcoming(&e.date) {
                        when = format!("Upcoming · {}", when);
                    }
                    RowSummary {
                        detail: match e.location {
                            Some(location) => format!("{} · {}", when, location),
                            None => when,
                        },
                        title: e.title,
                        image_url: e.image_url,
                    }
                })
                .collect();
        }
        Some(Section::Achievements) => {
            page.rows = repo
                .list_achievements(None)
                .await
                .into_iter()
                .map(|a| RowSummary {
                    detail: utils::format_date(&a.date, false),
                    title: a.title,
                    image_url: Some(a.image_url),
                })
                .collect();
        }
        Some(Section::News) => {
            page.rows = repo
                .list_news(None)
                .await
                .into_iter()
                .map(|n| RowSummary {
                    detail: format!(
                        "{} · {}",
                        utils::format_date(&n.published_at, false),
                        utils::truncate_text(&utils::html_to_plain_text(&n.content), 120)
                    ),
                    image_url: Some(utils::content_image(&n.content, &n.image_url)),
                    title: n.title,
                })
                .collect();
        }
    }

    render_page(StatusCode::OK, &page)
}
