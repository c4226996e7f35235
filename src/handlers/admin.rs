//! Admin write API. Every handler requires an `AdminSession`.
//!
//! Create and update endpoints take `multipart/form-data`: text fields plus an
//! optional `image` file part. Text fields are validated before anything is
//! uploaded, so a rejected form never leaves an orphaned object in storage.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{ApiError, FilePart, UploadForm, upload_image, upload_optional_image};
use crate::{
    AppState,
    auth::AdminSession,
    models::{
        AboutContent, AboutContentInput, Achievement, AchievementInput, DashboardCounts, Event,
        EventInput, HeroImage, HeroImageInput, Initiative, InitiativeInput, NewsArticle,
        NewsInput, TeamMember, TeamMemberInput,
    },
    repository::Collection,
    utils,
};

type Created<T> = Result<(StatusCode, Json<T>), ApiError>;
type Updated<T> = Result<Json<T>, ApiError>;

/// get_admin_stats
///
/// Row counts for the dashboard cards. A collection that cannot be counted shows 0.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Dashboard counters", body = DashboardCounts),
        (status = 401, description = "No session")
    )
)]
pub async fn get_admin_stats(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Json<DashboardCounts> {
    Json(state.repo.dashboard_counts().await)
}

// --- Hero Images ---

fn hero_input(form: &UploadForm) -> HeroImageInput {
    HeroImageInput {
        caption: form.optional("caption").unwrap_or_default(),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/hero",
    request_body(content_type = "multipart/form-data", description = "caption, image"),
    responses((status = 201, description = "Created", body = HeroImage))
)]
pub async fn create_hero_image(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<HeroImage> {
    let mut form = UploadForm::read(multipart).await?;
    let input = hero_input(&form);
    let image = form.require_image()?;
    let image_url = upload_image(&state.storage, Collection::HeroImages.bucket(), image).await?;
    let hero = state.repo.create_hero_image(input, image_url).await?;
    tracing::info!(id = %hero.id, "hero image created");
    Ok((StatusCode::CREATED, Json(hero)))
}

#[utoipa::path(
    put,
    path = "/api/admin/hero/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "caption, image?"),
    responses(
        (status = 200, description = "Updated", body = HeroImage),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_hero_image(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<HeroImage> {
    let mut form = UploadForm::read(multipart).await?;
    let input = hero_input(&form);
    let image_url = replace_image(&state, Collection::HeroImages, id, form.image.take()).await?;
    state
        .repo
        .update_hero_image(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- About ---

#[utoipa::path(
    put,
    path = "/api/admin/about/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "title, description, image?"),
    responses(
        (status = 200, description = "Updated", body = AboutContent),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_about(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<AboutContent> {
    let mut form = UploadForm::read(multipart).await?;
    let input = AboutContentInput {
        title: form.required("title")?,
        description: form.required("description")?,
    };
    let image_url = replace_image(&state, Collection::About, id, form.image.take()).await?;
    state
        .repo
        .update_about(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Team ---

fn team_input(form: &UploadForm) -> Result<TeamMemberInput, ApiError> {
    Ok(TeamMemberInput {
        name: form.required("name")?,
        role: form.required("role")?,
        description: form.optional("description").unwrap_or_default(),
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/team",
    request_body(content_type = "multipart/form-data", description = "name, role, description?, image"),
    responses(
        (status = 201, description = "Created", body = TeamMember),
        (status = 400, description = "Missing field")
    )
)]
pub async fn create_team_member(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<TeamMember> {
    let mut form = UploadForm::read(multipart).await?;
    let input = team_input(&form)?;
    let image = form.require_image()?;
    let image_url = upload_image(&state.storage, Collection::Team.bucket(), image).await?;
    let member = state.repo.create_team_member(input, image_url).await?;
    tracing::info!(id = %member.id, "team member created");
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    put,
    path = "/api/admin/team/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "name, role, description?, image?"),
    responses(
        (status = 200, description = "Updated", body = TeamMember),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_team_member(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<TeamMember> {
    let mut form = UploadForm::read(multipart).await?;
    let input = team_input(&form)?;
    let image_url = replace_image(&state, Collection::Team, id, form.image.take()).await?;
    state
        .repo
        .update_team_member(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Initiatives ---

fn initiative_input(form: &UploadForm) -> Result<InitiativeInput, ApiError> {
    Ok(InitiativeInput {
        title: form.required("title")?,
        description: form.required("description")?,
        deadline: form.optional_date("deadline")?,
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/initiatives",
    request_body(content_type = "multipart/form-data", description = "title, description, deadline?, image"),
    responses((status = 201, description = "Created", body = Initiative))
)]
pub async fn create_initiative(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<Initiative> {
    let mut form = UploadForm::read(multipart).await?;
    let input = initiative_input(&form)?;
    let image = form.require_image()?;
    let image_url = upload_image(&state.storage, Collection::Initiatives.bucket(), image).await?;
    let initiative = state.repo.create_initiative(input, image_url).await?;
    tracing::info!(id = %initiative.id, "initiative created");
    Ok((StatusCode::CREATED, Json(initiative)))
}

#[utoipa::path(
    put,
    path = "/api/admin/initiatives/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "title, description, deadline?, image?"),
    responses(
        (status = 200, description = "Updated", body = Initiative),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_initiative(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<Initiative> {
    let mut form = UploadForm::read(multipart).await?;
    let input = initiative_input(&form)?;
    let image_url = replace_image(&state, Collection::Initiatives, id, form.image.take()).await?;
    state
        .repo
        .update_initiative(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Events ---

/// The event form sends a date and a separate optional time; a full timestamp in
/// `date` is accepted as-is.
fn event_date(form: &UploadForm) -> Result<DateTime<Utc>, ApiError> {
    let date = form.required("date")?;
    let stamp = if date.contains('T') {
        date
    } else {
        utils::combine_date_time(&date, form.optional("time").as_deref())
    };
    utils::parse_iso(&stamp).ok_or_else(|| ApiError::BadRequest("invalid date: date".to_string()))
}

fn event_input(form: &UploadForm) -> Result<EventInput, ApiError> {
    Ok(EventInput {
        title: form.required("title")?,
        description: form.required("description")?,
        date: event_date(form)?,
        location: form.optional("location"),
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/events",
    request_body(content_type = "multipart/form-data", description = "title, description, date, time?, location?, image?"),
    responses((status = 201, description = "Created", body = Event))
)]
pub async fn create_event(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<Event> {
    let mut form = UploadForm::read(multipart).await?;
    let input = event_input(&form)?;
    let image_url =
        upload_optional_image(&state.storage, Collection::Events.bucket(), form.image.take())
            .await?;
    let event = state.repo.create_event(input, image_url).await?;
    tracing::info!(id = %event.id, "event created");
    Ok((StatusCode::CREATED, Json(event)))
}

#[utoipa::path(
    put,
    path = "/api/admin/events/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "title, description, date, time?, location?, image?"),
    responses(
        (status = 200, description = "Updated", body = Event),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_event(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<Event> {
    let mut form = UploadForm::read(multipart).await?;
    let input = event_input(&form)?;
    let image_url = replace_image(&state, Collection::Events, id, form.image.take()).await?;
    state
        .repo
        .update_event(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Achievements ---

fn achievement_input(form: &UploadForm) -> Result<AchievementInput, ApiError> {
    Ok(AchievementInput {
        title: form.required("title")?,
        description: form.required("description")?,
        date: form.required_date("date")?,
    })
}

#[utoipa::path(
    post,
    path = "/api/admin/achievements",
    request_body(content_type = "multipart/form-data", description = "title, description, date, image"),
    responses((status = 201, description = "Created", body = Achievement))
)]
pub async fn create_achievement(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<Achievement> {
    let mut form = UploadForm::read(multipart).await?;
    let input = achievement_input(&form)?;
    let image = form.require_image()?;
    let image_url =
        upload_image(&state.storage, Collection::Achievements.bucket(), image).await?;
    let achievement = state.repo.create_achievement(input, image_url).await?;
    tracing::info!(id = %achievement.id, "achievement created");
    Ok((StatusCode::CREATED, Json(achievement)))
}

#[utoipa::path(
    put,
    path = "/api/admin/achievements/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "title, description, date, image?"),
    responses(
        (status = 200, description = "Updated", body = Achievement),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_achievement(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<Achievement> {
    let mut form = UploadForm::read(multipart).await?;
    let input = achievement_input(&form)?;
    let image_url = replace_image(&state, Collection::Achievements, id, form.image.take()).await?;
    state
        .repo
        .update_achievement(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- News ---

/// The slug is always derived from the title.
fn news_input(form: &UploadForm) -> Result<NewsInput, ApiError> {
    let title = form.required("title")?;
    let slug = utils::generate_slug(&title);
    if slug.trim_matches('-').is_empty() {
        return Err(ApiError::BadRequest(
            "title must contain letters or digits".to_string(),
        ));
    }
    Ok(NewsInput {
        title,
        content: form.required("content")?,
        slug,
    })
}

/// `base`, or `base-2`, `base-3`, ... when another article already holds it.
/// The article being edited (`own`) may keep its current slug.
async fn free_slug(state: &AppState, base: &str, own: Option<Uuid>) -> String {
    let mut candidate = base.to_string();
    let mut n = 2;
    while let Some(taken) = state.repo.get_news_by_slug(&candidate).await {
        if Some(taken.id) == own {
            break;
        }
        candidate = format!("{}-{}", base, n);
        n += 1;
    }
    candidate
}

#[utoipa::path(
    post,
    path = "/api/admin/news",
    request_body(content_type = "multipart/form-data", description = "title, content, image"),
    responses(
        (status = 201, description = "Published", body = NewsArticle),
        (status = 409, description = "Slug taken by a concurrent publish")
    )
)]
pub async fn create_news(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Created<NewsArticle> {
    let mut form = UploadForm::read(multipart).await?;
    let mut input = news_input(&form)?;
    input.slug = free_slug(&state, &input.slug, None).await;
    let image = form.require_image()?;
    let image_url = upload_image(&state.storage, Collection::News.bucket(), image).await?;
    let article = state.repo.create_news(input, image_url).await?;
    tracing::info!(id = %article.id, slug = %article.slug, "news published");
    Ok((StatusCode::CREATED, Json(article)))
}

#[utoipa::path(
    put,
    path = "/api/admin/news/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    request_body(content_type = "multipart/form-data", description = "title, content, image?"),
    responses(
        (status = 200, description = "Updated", body = NewsArticle),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_news(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Updated<NewsArticle> {
    let mut form = UploadForm::read(multipart).await?;
    let mut input = news_input(&form)?;
    input.slug = free_slug(&state, &input.slug, Some(id)).await;
    let image_url = replace_image(&state, Collection::News, id, form.image.take()).await?;
    state
        .repo
        .update_news(id, input, image_url)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// Uploads a replacement image only once the row is known to exist, so an update
/// to a missing id leaves nothing behind in storage.
async fn replace_image(
    state: &AppState,
    collection: Collection,
    id: Uuid,
    image: Option<FilePart>,
) -> Result<Option<String>, ApiError> {
    if !state.repo.exists(collection, id).await? {
        return Err(ApiError::NotFound);
    }
    upload_optional_image(&state.storage, collection.bucket(), image).await
}

// --- Deletes ---

async fn delete_row(state: &AppState, collection: Collection, id: Uuid) -> Result<StatusCode, ApiError> {
    if state.repo.delete(collection, id).await? {
        tracing::info!(table = collection.table(), %id, "row deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/hero/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_hero_image(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::HeroImages, id).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/team/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_team_member(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::Team, id).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/initiatives/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_initiative(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::Initiatives, id).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_event(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::Events, id).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/achievements/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_achievement(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::Achievements, id).await
}

#[utoipa::path(
    delete,
    path = "/api/admin/news/{id}",
    params(("id" = Uuid, Path, description = "Row ID")),
    responses((status = 204, description = "Deleted"), (status = 404, description = "Not Found"))
)]
pub async fn delete_news(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    delete_row(&state, Collection::News, id).await
}
