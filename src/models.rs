use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Content Schemas (Mapped to Database) ---

/// HeroImage
///
/// One slide of the landing page hero carousel (`public.hero_images`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct HeroImage {
    pub id: Uuid,
    // Public storage URL of the uploaded slide.
    pub image_url: String,
    pub caption: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// AboutContent
///
/// The single row backing the about section (`public.about_content`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct AboutContent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

/// TeamMember
///
/// A team profile card (`public.teams`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct TeamMember {
    pub id: Uuid,
    pub name: String,
    // Position within the organization, e.g. "Coordinator".
    pub role: String,
    pub description: String,
    pub image_url: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Initiative
///
/// An ongoing programme with an optional application deadline (`public.initiatives`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Initiative {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[ts(type = "string | null")]
    pub deadline: Option<DateTime<Utc>>,
    pub image_url: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    /// Computed when served; not a column.
    #[sqlx(skip)]
    #[serde(default)]
    pub deadline_expired: bool,
}

/// Event
///
/// A calendar entry (`public.events`). Location and image are optional.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub location: Option<String>,
    pub image_url: Option<String>,
}

/// Achievement
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Achievement {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub image_url: String,
}

/// NewsArticle
///
/// A news post (`public.news`). `content` is HTML; `slug` is derived from the title.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct NewsArticle {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub image_url: String,
    #[ts(type = "string")]
    pub published_at: DateTime<Utc>,
}

// --- Write Payloads ---
//
// These are built from multipart form fields by the admin handlers. The image
// URL is resolved separately, after the upload has succeeded.

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HeroImageInput {
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AboutContentInput {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TeamMemberInput {
    pub name: String,
    pub role: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InitiativeInput {
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventInput {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AchievementInput {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NewsInput {
    pub title: String,
    pub content: String,
    pub slug: String,
}

// --- Auth Payloads ---

/// LoginRequest
///
/// Credentials posted by the admin login page. `redirected_from` echoes the
/// `redirectedFrom` query parameter the edge gate attached to the login redirect.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default, alias = "redirectedFrom")]
    pub redirected_from: Option<String>,
}

/// SessionStatus
///
/// Output of `GET /api/auth/session`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// --- Dashboard & Page Bundles (Output) ---

/// DashboardCounts
///
/// Row counts per collection, shown on the admin dashboard cards.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct DashboardCounts {
    pub hero_images: i64,
    pub team_members: i64,
    pub initiatives: i64,
    pub events: i64,
    pub achievements: i64,
    pub news: i64,
}

/// NewsDetail
///
/// A single article plus a few other recent articles for the "read more" strip.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct NewsDetail {
    pub article: NewsArticle,
    pub related: Vec<NewsArticle>,
}

/// HomePage
///
/// Everything the landing page renders, fetched in one round trip.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct HomePage {
    pub hero_images: Vec<HeroImage>,
    pub about: Option<AboutContent>,
    pub team: Vec<TeamMember>,
    pub initiatives: Vec<Initiative>,
    pub upcoming_events: Vec<Event>,
    pub achievements: Vec<Achievement>,
    pub news: Vec<NewsArticle>,
}
