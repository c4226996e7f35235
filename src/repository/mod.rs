use crate::models::{
    AboutContent, AboutContentInput, Achievement, AchievementInput, DashboardCounts, Event,
    EventInput, HeroImage, HeroImageInput, Initiative, InitiativeInput, NewsArticle, NewsInput,
    TeamMember, TeamMemberInput,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// RepoError
///
/// Failures of write operations. Read operations never fail outward: they log and
/// degrade to an empty result, so a broken collection never takes a page down.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique column (such as a news slug) already holds the value.
    #[error("{0} already exists")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => {
                RepoError::Conflict(db.constraint().unwrap_or("row").to_string())
            }
            _ => RepoError::Database(e),
        }
    }
}

/// Collection
///
/// The content collections managed through the admin panel. Each one maps to a
/// table and to the storage bucket its images are uploaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    HeroImages,
    About,
    Team,
    Initiatives,
    Events,
    Achievements,
    News,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::HeroImages,
        Collection::About,
        Collection::Team,
        Collection::Initiatives,
        Collection::Events,
        Collection::Achievements,
        Collection::News,
    ];

    pub fn table(self) -> &'static str {
        match self {
            Collection::HeroImages => "hero_images",
            Collection::About => "about_content",
            Collection::Team => "teams",
            Collection::Initiatives => "initiatives",
            Collection::Events => "events",
            Collection::Achievements => "achievements",
            Collection::News => "news",
        }
    }

    pub fn bucket(self) -> &'static str {
        match self {
            Collection::HeroImages => "hero",
            Collection::About => "about",
            Collection::Team => "teams",
            Collection::Initiatives => "initiatives",
            Collection::Events => "events",
            Collection::Achievements => "achievements",
            Collection::News => "news",
        }
    }
}

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers never know whether
/// they talk to Postgres or to the in-memory store used by tests.
///
/// List operations take an optional `limit` and return rows in the collection's
/// natural order (newest first, unless documented otherwise).
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Hero Images ---
    async fn list_hero_images(&self) -> Vec<HeroImage>;
    async fn create_hero_image(
        &self,
        input: HeroImageInput,
        image_url: String,
    ) -> Result<HeroImage, RepoError>;
    async fn update_hero_image(
        &self,
        id: Uuid,
        input: HeroImageInput,
        image_url: Option<String>,
    ) -> Result<Option<HeroImage>, RepoError>;

    // --- About ---
    async fn get_about(&self) -> Option<AboutContent>;
    async fn update_about(
        &self,
        id: Uuid,
        input: AboutContentInput,
        image_url: Option<String>,
    ) -> Result<Option<AboutContent>, RepoError>;

    // --- Team ---
    async fn list_team(&self, limit: Option<i64>) -> Vec<TeamMember>;
    async fn create_team_member(
        &self,
        input: TeamMemberInput,
        image_url: String,
    ) -> Result<TeamMember, RepoError>;
    async fn update_team_member(
        &self,
        id: Uuid,
        input: TeamMemberInput,
        image_url: Option<String>,
    ) -> Result<Option<TeamMember>, RepoError>;

    // --- Initiatives ---
    async fn list_initiatives(&self, limit: Option<i64>) -> Vec<Initiative>;
    async fn create_initiative(
        &self,
        input: InitiativeInput,
        image_url: String,
    ) -> Result<Initiative, RepoError>;
    async fn update_initiative(
        &self,
        id: Uuid,
        input: InitiativeInput,
        image_url: Option<String>,
    ) -> Result<Option<Initiative>, RepoError>;

    // --- Events ---
    /// `upcoming_only` keeps events dated now or later. Ordering is ascending by
    /// date unless `ascending` is false.
    async fn list_events(
        &self,
        limit: Option<i64>,
        upcoming_only: bool,
        ascending: bool,
    ) -> Vec<Event>;
    async fn get_event(&self, id: Uuid) -> Option<Event>;
    async fn create_event(
        &self,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Event, RepoError>;
    async fn update_event(
        &self,
        id: Uuid,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Option<Event>, RepoError>;

    // --- Achievements ---
    async fn list_achievements(&self, limit: Option<i64>) -> Vec<Achievement>;
    async fn create_achievement(
        &self,
        input: AchievementInput,
        image_url: String,
    ) -> Result<Achievement, RepoError>;
    async fn update_achievement(
        &self,
        id: Uuid,
        input: AchievementInput,
        image_url: Option<String>,
    ) -> Result<Option<Achievement>, RepoError>;

    // --- News ---
    async fn list_news(&self, limit: Option<i64>) -> Vec<NewsArticle>;
    async fn get_news_by_slug(&self, slug: &str) -> Option<NewsArticle>;
    /// Most recent articles other than `exclude_id`.
    async fn related_news(&self, exclude_id: Uuid, limit: i64) -> Vec<NewsArticle>;
    async fn create_news(
        &self,
        input: NewsInput,
        image_url: String,
    ) -> Result<NewsArticle, RepoError>;
    async fn update_news(
        &self,
        id: Uuid,
        input: NewsInput,
        image_url: Option<String>,
    ) -> Result<Option<NewsArticle>, RepoError>;

    // --- Shared ---
    /// Deletes one row by primary key. Returns false when nothing matched.
    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError>;
    /// Whether a row with this primary key exists.
    async fn exists(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError>;
    /// Count-only query. Degrades to 0 on error.
    async fn count(&self, collection: Collection) -> i64;

    /// Compiles the admin dashboard counters.
    async fn dashboard_counts(&self) -> DashboardCounts {
        DashboardCounts {
            hero_images: self.count(Collection::HeroImages).await,
            team_members: self.count(Collection::Team).await,
            initiatives: self.count(Collection::Initiatives).await,
            events: self.count(Collection::Events).await,
            achievements: self.count(Collection::Achievements).await,
            news: self.count(Collection::News).await,
        }
    }
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
