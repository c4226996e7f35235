use super::{Collection, RepoError, Repository};
use crate::models::{
    AboutContent, AboutContentInput, Achievement, AchievementInput, Event, EventInput, HeroImage,
    HeroImageInput, Initiative, InitiativeInput, NewsArticle, NewsInput, TeamMember,
    TeamMemberInput,
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
/// All queries are parameterized; `LIMIT $n` is bound as `Option<i64>` so `NULL`
/// means "no limit".
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const HERO_COLUMNS: &str = "id, image_url, caption, created_at";
const ABOUT_COLUMNS: &str = "id, title, description, image_url";
const TEAM_COLUMNS: &str = "id, name, role, description, image_url, created_at";
const INITIATIVE_COLUMNS: &str = "id, title, description, deadline, image_url, created_at";
const EVENT_COLUMNS: &str = "id, title, description, date, location, image_url";
const ACHIEVEMENT_COLUMNS: &str = "id, title, description, date, image_url";
const NEWS_COLUMNS: &str = "id, title, content, slug, image_url, published_at";

#[async_trait]
impl Repository for PostgresRepository {
    // --- HERO IMAGES ---

    async fn list_hero_images(&self) -> Vec<HeroImage> {
        let query = format!(
            "SELECT {HERO_COLUMNS} FROM hero_images ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, HeroImage>(&query)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_hero_images error: {:?}", e);
                vec![]
            })
    }

    async fn create_hero_image(
        &self,
        input: HeroImageInput,
        image_url: String,
    ) -> Result<HeroImage, RepoError> {
        let query = format!(
            "INSERT INTO hero_images (id, image_url, caption, created_at) VALUES ($1, $2, $3, NOW()) RETURNING {HERO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, HeroImage>(&query)
            .bind(Uuid::new_v4())
            .bind(image_url)
            .bind(input.caption)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Uses `COALESCE` so the stored image is kept when no new upload was provided.
    async fn update_hero_image(
        &self,
        id: Uuid,
        input: HeroImageInput,
        image_url: Option<String>,
    ) -> Result<Option<HeroImage>, RepoError> {
        let query = format!(
            "UPDATE hero_images SET caption = $2, image_url = COALESCE($3, image_url) WHERE id = $1 RETURNING {HERO_COLUMNS}"
        );
        let row = sqlx::query_as::<_, HeroImage>(&query)
            .bind(id)
            .bind(input.caption)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- ABOUT ---

    async fn get_about(&self) -> Option<AboutContent> {
        let query = format!("SELECT {ABOUT_COLUMNS} FROM about_content LIMIT 1");
        sqlx::query_as::<_, AboutContent>(&query)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_about error: {:?}", e);
                None
            })
    }

    async fn update_about(
        &self,
        id: Uuid,
        input: AboutContentInput,
        image_url: Option<String>,
    ) -> Result<Option<AboutContent>, RepoError> {
        let query = format!(
            "UPDATE about_content SET title = $2, description = $3, image_url = COALESCE($4, image_url) WHERE id = $1 RETURNING {ABOUT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AboutContent>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.description)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- TEAM ---

    async fn list_team(&self, limit: Option<i64>) -> Vec<TeamMember> {
        let query =
            format!("SELECT {TEAM_COLUMNS} FROM teams ORDER BY created_at DESC LIMIT $1");
        sqlx::query_as::<_, TeamMember>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_team error: {:?}", e);
                vec![]
            })
    }

    async fn create_team_member(
        &self,
        input: TeamMemberInput,
        image_url: String,
    ) -> Result<TeamMember, RepoError> {
        let query = format!(
            "INSERT INTO teams (id, name, role, description, image_url, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {TEAM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TeamMember>(&query)
            .bind(Uuid::new_v4())
            .bind(input.name)
            .bind(input.role)
            .bind(input.description)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_team_member(
        &self,
        id: Uuid,
        input: TeamMemberInput,
        image_url: Option<String>,
    ) -> Result<Option<TeamMember>, RepoError> {
        let query = format!(
            "UPDATE teams SET name = $2, role = $3, description = $4, image_url = COALESCE($5, image_url) WHERE id = $1 RETURNING {TEAM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TeamMember>(&query)
            .bind(id)
            .bind(input.name)
            .bind(input.role)
            .bind(input.description)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- INITIATIVES ---

    async fn list_initiatives(&self, limit: Option<i64>) -> Vec<Initiative> {
        let query = format!(
            "SELECT {INITIATIVE_COLUMNS} FROM initiatives ORDER BY created_at DESC LIMIT $1"
        );
        sqlx::query_as::<_, Initiative>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_initiatives error: {:?}", e);
                vec![]
            })
    }

    async fn create_initiative(
        &self,
        input: InitiativeInput,
        image_url: String,
    ) -> Result<Initiative, RepoError> {
        let query = format!(
            "INSERT INTO initiatives (id, title, description, deadline, image_url, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {INITIATIVE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Initiative>(&query)
            .bind(Uuid::new_v4())
            .bind(input.title)
            .bind(input.description)
            .bind(input.deadline)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_initiative(
        &self,
        id: Uuid,
        input: InitiativeInput,
        image_url: Option<String>,
    ) -> Result<Option<Initiative>, RepoError> {
        let query = format!(
            "UPDATE initiatives SET title = $2, description = $3, deadline = $4, image_url = COALESCE($5, image_url) WHERE id = $1 RETURNING {INITIATIVE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Initiative>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.description)
            .bind(input.deadline)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- EVENTS ---

    async fn list_events(
        &self,
        limit: Option<i64>,
        upcoming_only: bool,
        ascending: bool,
    ) -> Vec<Event> {
        let direction = if ascending { "ASC" } else { "DESC" };
        let query = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE ($1 = false OR date >= $2) ORDER BY date {direction} LIMIT $3"
        );
        sqlx::query_as::<_, Event>(&query)
            .bind(upcoming_only)
            .bind(Utc::now())
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_events error: {:?}", e);
                vec![]
            })
    }

    async fn get_event(&self, id: Uuid) -> Option<Event> {
        let query = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");
        sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(%id, "get_event error: {:?}", e);
                None
            })
    }

    async fn create_event(
        &self,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Event, RepoError> {
        let query = format!(
            "INSERT INTO events (id, title, description, date, location, image_url) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Event>(&query)
            .bind(Uuid::new_v4())
            .bind(input.title)
            .bind(input.description)
            .bind(input.date)
            .bind(input.location)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_event(
        &self,
        id: Uuid,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Option<Event>, RepoError> {
        let query = format!(
            "UPDATE events SET title = $2, description = $3, date = $4, location = $5, image_url = COALESCE($6, image_url) WHERE id = $1 RETURNING {EVENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Event>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.description)
            .bind(input.date)
            .bind(input.location)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- ACHIEVEMENTS ---

    async fn list_achievements(&self, limit: Option<i64>) -> Vec<Achievement> {
        let query = format!(
            "SELECT {ACHIEVEMENT_COLUMNS} FROM achievements ORDER BY date DESC LIMIT $1"
        );
        sqlx::query_as::<_, Achievement>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_achievements error: {:?}", e);
                vec![]
            })
    }

    async fn create_achievement(
        &self,
        input: AchievementInput,
        image_url: String,
    ) -> Result<Achievement, RepoError> {
        let query = format!(
            "INSERT INTO achievements (id, title, description, date, image_url) VALUES ($1, $2, $3, $4, $5) RETURNING {ACHIEVEMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Achievement>(&query)
            .bind(Uuid::new_v4())
            .bind(input.title)
            .bind(input.description)
            .bind(input.date)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_achievement(
        &self,
        id: Uuid,
        input: AchievementInput,
        image_url: Option<String>,
    ) -> Result<Option<Achievement>, RepoError> {
        let query = format!(
            "UPDATE achievements SET title = $2, description = $3, date = $4, image_url = COALESCE($5, image_url) WHERE id = $1 RETURNING {ACHIEVEMENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Achievement>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.description)
            .bind(input.date)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- NEWS ---

    async fn list_news(&self, limit: Option<i64>) -> Vec<NewsArticle> {
        let query =
            format!("SELECT {NEWS_COLUMNS} FROM news ORDER BY published_at DESC LIMIT $1");
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("list_news error: {:?}", e);
                vec![]
            })
    }

    async fn get_news_by_slug(&self, slug: &str) -> Option<NewsArticle> {
        let query = format!("SELECT {NEWS_COLUMNS} FROM news WHERE slug = $1 LIMIT 1");
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(slug, "get_news_by_slug error: {:?}", e);
                None
            })
    }

    async fn related_news(&self, exclude_id: Uuid, limit: i64) -> Vec<NewsArticle> {
        let query = format!(
            "SELECT {NEWS_COLUMNS} FROM news WHERE id <> $1 ORDER BY published_at DESC LIMIT $2"
        );
        sqlx::query_as::<_, NewsArticle>(&query)
            .bind(exclude_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("related_news error: {:?}", e);
                vec![]
            })
    }

    /// `published_at` is stamped at creation and never changed by later edits.
    async fn create_news(
        &self,
        input: NewsInput,
        image_url: String,
    ) -> Result<NewsArticle, RepoError> {
        let query = format!(
            "INSERT INTO news (id, title, content, slug, image_url, published_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsArticle>(&query)
            .bind(Uuid::new_v4())
            .bind(input.title)
            .bind(input.content)
            .bind(input.slug)
            .bind(image_url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update_news(
        &self,
        id: Uuid,
        input: NewsInput,
        image_url: Option<String>,
    ) -> Result<Option<NewsArticle>, RepoError> {
        let query = format!(
            "UPDATE news SET title = $2, content = $3, slug = $4, image_url = COALESCE($5, image_url) WHERE id = $1 RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsArticle>(&query)
            .bind(id)
            .bind(input.title)
            .bind(input.content)
            .bind(input.slug)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    // --- SHARED ---

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError> {
        // Table names come from a closed enum, never from the request.
        let query = format!("DELETE FROM {} WHERE id = $1", collection.table());
        let res = sqlx::query(&query).bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }

    async fn exists(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", collection.table());
        Ok(sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn count(&self, collection: Collection) -> i64 {
        let query = format!("SELECT COUNT(*) FROM {}", collection.table());
        sqlx::query_scalar::<_, i64>(&query)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!(table = collection.table(), "count error: {:?}", e);
                0
            })
    }
}
