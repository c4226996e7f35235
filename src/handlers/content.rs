//! Read-only content API consumed by the public site.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    models::{
        AboutContent, Achievement, Event, HeroImage, HomePage, Initiative, NewsArticle,
        NewsDetail, TeamMember,
    },
    repository::RepositoryState,
    utils,
};

/// Number of other articles shown beneath a news article.
const RELATED_NEWS: i64 = 3;

/// LimitQuery
#[derive(Deserialize, utoipa::IntoParams)]
pub struct LimitQuery {
    /// Maximum number of rows to return.
    pub limit: Option<i64>,
}

/// EventsQuery
///
/// `upcoming=true` keeps only events dated now or later. `upcoming=false` returns
/// every event, latest first. Without the parameter every event is returned in
/// calendar order.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct EventsQuery {
    pub limit: Option<i64>,
    pub upcoming: Option<bool>,
}

fn flag_deadlines(mut initiatives: Vec<Initiative>) -> Vec<Initiative> {
    for initiative in &mut initiatives {
        initiative.deadline_expired = utils::is_deadline_expired(initiative.deadline.as_ref());
    }
    initiatives
}

#[utoipa::path(
    get,
    path = "/api/hero",
    responses((status = 200, description = "Hero carousel slides", body = [HeroImage]))
)]
pub async fn get_hero_images(State(repo): State<RepositoryState>) -> Json<Vec<HeroImage>> {
    Json(repo.list_hero_images().await)
}

#[utoipa::path(
    get,
    path = "/api/about",
    responses(
        (status = 200, description = "About section", body = AboutContent),
        (status = 404, description = "No about content yet")
    )
)]
pub async fn get_about(
    State(repo): State<RepositoryState>,
) -> Result<Json<AboutContent>, StatusCode> {
    repo.get_about().await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    get,
    path = "/api/team",
    params(LimitQuery),
    responses((status = 200, description = "Team members, newest first", body = [TeamMember]))
)]
pub async fn get_team(
    State(repo): State<RepositoryState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<TeamMember>> {
    Json(repo.list_team(query.limit).await)
}

/// get_initiatives
///
/// Each initiative carries `deadline_expired`, computed at request time.
#[utoipa::path(
    get,
    path = "/api/initiatives",
    params(LimitQuery),
    responses((status = 200, description = "Initiatives, newest first", body = [Initiative]))
)]
pub async fn get_initiatives(
    State(repo): State<RepositoryState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<Initiative>> {
    Json(flag_deadlines(repo.list_initiatives(query.limit).await))
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(EventsQuery),
    responses((status = 200, description = "Events", body = [Event]))
)]
pub async fn get_events(
    State(repo): State<RepositoryState>,
    Query(query): Query<EventsQuery>,
) -> Json<Vec<Event>> {
    let upcoming_only = query.upcoming == Some(true);
    let ascending = query.upcoming != Some(false);
    Json(repo.list_events(query.limit, upcoming_only, ascending).await)
}

#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses(
        (status = 200, description = "Event", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_event(
    State(repo): State<RepositoryState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Event>, StatusCode> {
    repo.get_event(id).await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

#[utoipa::path(
    get,
    path = "/api/achievements",
    params(LimitQuery),
    responses((status = 200, description = "Achievements, latest first", body = [Achievement]))
)]
pub async fn get_achievements(
    State(repo): State<RepositoryState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<Achievement>> {
    Json(repo.list_achievements(query.limit).await)
}

#[utoipa::path(
    get,
    path = "/api/news",
    params(LimitQuery),
    responses((status = 200, description = "News, latest first", body = [NewsArticle]))
)]
pub async fn get_news(
    State(repo): State<RepositoryState>,
    Query(query): Query<LimitQuery>,
) -> Json<Vec<NewsArticle>> {
    Json(repo.list_news(query.limit).await)
}

/// get_news_article
///
/// One article by slug, with up to three other recent articles.
#[utoipa::path(
    get,
    path = "/api/news/{slug}",
    params(("slug" = String, Path, description = "Article slug")),
    responses(
        (status = 200, description = "Article and related articles", body = NewsDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_news_article(
    State(repo): State<RepositoryState>,
    Path(slug): Path<String>,
) -> Result<Json<NewsDetail>, StatusCode> {
    let article = repo
        .get_news_by_slug(&slug)
        .await
        .ok_or(StatusCode::NOT_FOUND)?;
    let related = repo.related_news(article.id, RELATED_NEWS).await;
    Ok(Json(NewsDetail { article, related }))
}

/// get_home
///
/// The landing page bundle. Sections are fetched concurrently; an empty section
/// simply renders nothing.
#[utoipa::path(
    get,
    path = "/api/home",
    responses((status = 200, description = "Landing page content", body = HomePage))
)]
pub async fn get_home(State(repo): State<RepositoryState>) -> Json<HomePage> {
    let (hero_images, about, team, initiatives, upcoming_events, achievements, news) = tokio::join!(
        repo.list_hero_images(),
        repo.get_about(),
        repo.list_team(Some(8)),
        repo.list_initiatives(Some(6)),
        repo.list_events(Some(3), true, true),
        repo.list_achievements(Some(3)),
        repo.list_news(Some(3)),
    );

    Json(HomePage {
        hero_images,
        about,
        team,
        initiatives: flag_deadlines(initiatives),
        upcoming_events,
        achievements,
        news,
    })
}
