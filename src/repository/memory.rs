use super::{Collection, RepoError, Repository};
use crate::models::{
    AboutContent, AboutContentInput, Achievement, AchievementInput, Event, EventInput, HeroImage,
    HeroImageInput, Initiative, InitiativeInput, NewsArticle, NewsInput, TeamMember,
    TeamMemberInput,
};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    hero_images: Vec<HeroImage>,
    about: Vec<AboutContent>,
    team: Vec<TeamMember>,
    initiatives: Vec<Initiative>,
    events: Vec<Event>,
    achievements: Vec<Achievement>,
    news: Vec<NewsArticle>,
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. Used by the test suites and
/// for running the site without a database. Ordering and limit semantics mirror
/// the Postgres queries.
#[derive(Default)]
pub struct InMemoryRepository {
    store: RwLock<Store>,
}

fn take<T>(rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    match limit {
        Some(n) => rows.into_iter().take(n.max(0) as usize).collect(),
        None => rows,
    }
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the single about row (the admin panel can only edit it, never create it).
    pub fn with_about(mut self, about: AboutContent) -> Self {
        self.store.get_mut().about = vec![about];
        self
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn list_hero_images(&self) -> Vec<HeroImage> {
        let mut rows = self.store.read().await.hero_images.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    async fn create_hero_image(
        &self,
        input: HeroImageInput,
        image_url: String,
    ) -> Result<HeroImage, RepoError> {
        let row = HeroImage {
            id: Uuid::new_v4(),
            image_url,
            caption: input.caption,
            created_at: Utc::now(),
        };
        self.store.write().await.hero_images.push(row.clone());
        Ok(row)
    }

    async fn update_hero_image(
        &self,
        id: Uuid,
        input: HeroImageInput,
        image_url: Option<String>,
    ) -> Result<Option<HeroImage>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.hero_images.iter_mut().find(|r| r.id == id).map(|row| {
            row.caption = input.caption;
            if let Some(url) = image_url {
                row.image_url = url;
            }
            row.clone()
        }))
    }

    async fn get_about(&self) -> Option<AboutContent> {
        self.store.read().await.about.first().cloned()
    }

    async fn update_about(
        &self,
        id: Uuid,
        input: AboutContentInput,
        image_url: Option<String>,
    ) -> Result<Option<AboutContent>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.about.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title;
            row.description = input.description;
            if image_url.is_some() {
                row.image_url = image_url;
            }
            row.clone()
        }))
    }

    async fn list_team(&self, limit: Option<i64>) -> Vec<TeamMember> {
        let mut rows = self.store.read().await.team.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        take(rows, limit)
    }

    async fn create_team_member(
        &self,
        input: TeamMemberInput,
        image_url: String,
    ) -> Result<TeamMember, RepoError> {
        let row = TeamMember {
            id: Uuid::new_v4(),
            name: input.name,
            role: input.role,
            description: input.description,
            image_url,
            created_at: Utc::now(),
        };
        self.store.write().await.team.push(row.clone());
        Ok(row)
    }

    async fn update_team_member(
        &self,
        id: Uuid,
        input: TeamMemberInput,
        image_url: Option<String>,
    ) -> Result<Option<TeamMember>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.team.iter_mut().find(|r| r.id == id).map(|row| {
            row.name = input.name;
            row.role = input.role;
            row.description = input.description;
            if let Some(url) = image_url {
                row.image_url = url;
            }
            row.clone()
        }))
    }

    async fn list_initiatives(&self, limit: Option<i64>) -> Vec<Initiative> {
        let mut rows = self.store.read().await.initiatives.clone();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        take(rows, limit)
    }

    async fn create_initiative(
        &self,
        input: InitiativeInput,
        image_url: String,
    ) -> Result<Initiative, RepoError> {
        let row = Initiative {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            deadline: input.deadline,
            image_url,
            created_at: Utc::now(),
            deadline_expired: false,
        };
        self.store.write().await.initiatives.push(row.clone());
        Ok(row)
    }

    async fn update_initiative(
        &self,
        id: Uuid,
        input: InitiativeInput,
        image_url: Option<String>,
    ) -> Result<Option<Initiative>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.initiatives.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title;
            row.description = input.description;
            row.deadline = input.deadline;
            if let Some(url) = image_url {
                row.image_url = url;
            }
            row.clone()
        }))
    }

    async fn list_events(
        &self,
        limit: Option<i64>,
        upcoming_only: bool,
        ascending: bool,
    ) -> Vec<Event> {
        let now = Utc::now();
        let mut rows: Vec<Event> = self
            .store
            .read()
            .await
            .events
            .iter()
            .filter(|e| !upcoming_only || e.date >= now)
            .cloned()
            .collect();
        if ascending {
            rows.sort_by(|a, b| a.date.cmp(&b.date));
        } else {
            rows.sort_by(|a, b| b.date.cmp(&a.date));
        }
        take(rows, limit)
    }

    async fn get_event(&self, id: Uuid) -> Option<Event> {
        self.store
            .read()
            .await
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
    }

    async fn create_event(
        &self,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Event, RepoError> {
        let row = Event {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            date: input.date,
            location: input.location,
            image_url,
        };
        self.store.write().await.events.push(row.clone());
        Ok(row)
    }

    async fn update_event(
        &self,
        id: Uuid,
        input: EventInput,
        image_url: Option<String>,
    ) -> Result<Option<Event>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.events.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title;
            row.description = input.description;
            row.date = input.date;
            row.location = input.location;
            if image_url.is_some() {
                row.image_url = image_url;
            }
            row.clone()
        }))
    }

    async fn list_achievements(&self, limit: Option<i64>) -> Vec<Achievement> {
        let mut rows = self.store.read().await.achievements.clone();
        rows.sort_by(|a, b| b.date.cmp(&a.date));
        take(rows, limit)
    }

    async fn create_achievement(
        &self,
        input: AchievementInput,
        image_url: String,
    ) -> Result<Achievement, RepoError> {
        let row = Achievement {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            date: input.date,
            image_url,
        };
        self.store.write().await.achievements.push(row.clone());
        Ok(row)
    }

    async fn update_achievement(
        &self,
        id: Uuid,
        input: AchievementInput,
        image_url: Option<String>,
    ) -> Result<Option<Achievement>, RepoError> {
        let mut store = self.store.write().await;
        Ok(store.achievements.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title;
            row.description = input.description;
            row.date = input.date;
            if let Some(url) = image_url {
                row.image_url = url;
            }
            row.clone()
        }))
    }

    async fn list_news(&self, limit: Option<i64>) -> Vec<NewsArticle> {
        let mut rows = self.store.read().await.news.clone();
        rows.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        take(rows, limit)
    }

    async fn get_news_by_slug(&self, slug: &str) -> Option<NewsArticle> {
        self.store
            .read()
            .await
            .news
            .iter()
            .find(|n| n.slug == slug)
            .cloned()
    }

    async fn related_news(&self, exclude_id: Uuid, limit: i64) -> Vec<NewsArticle> {
        let rows: Vec<NewsArticle> = self
            .list_news(None)
            .await
            .into_iter()
            .filter(|n| n.id != exclude_id)
            .collect();
        take(rows, Some(limit))
    }

    async fn create_news(
        &self,
        input: NewsInput,
        image_url: String,
    ) -> Result<NewsArticle, RepoError> {
        let mut store = self.store.write().await;
        if store.news.iter().any(|n| n.slug == input.slug) {
            return Err(RepoError::Conflict(format!("news slug {}", input.slug)));
        }
        let row = NewsArticle {
            id: Uuid::new_v4(),
            title: input.title,
            content: input.content,
            slug: input.slug,
            image_url,
            published_at: Utc::now(),
        };
        store.news.push(row.clone());
        Ok(row)
    }

    async fn update_news(
        &self,
        id: Uuid,
        input: NewsInput,
        image_url: Option<String>,
    ) -> Result<Option<NewsArticle>, RepoError> {
        let mut store = self.store.write().await;
        if store.news.iter().any(|n| n.slug == input.slug && n.id != id) {
            return Err(RepoError::Conflict(format!("news slug {}", input.slug)));
        }
        Ok(store.news.iter_mut().find(|r| r.id == id).map(|row| {
            row.title = input.title;
            row.content = input.content;
            row.slug = input.slug;
            if let Some(url) = image_url {
                row.image_url = url;
            }
            row.clone()
        }))
    }

    async fn delete(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError> {
        let mut store = self.store.write().await;
        fn remove<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> bool {
            let before = rows.len();
            rows.retain(|r| !matches(r));
            rows.len() != before
        }
        Ok(match collection {
            Collection::HeroImages => remove(&mut store.hero_images, |r| r.id == id),
            Collection::About => remove(&mut store.about, |r| r.id == id),
            Collection::Team => remove(&mut store.team, |r| r.id == id),
            Collection::Initiatives => remove(&mut store.initiatives, |r| r.id == id),
            Collection::Events => remove(&mut store.events, |r| r.id == id),
            Collection::Achievements => remove(&mut store.achievements, |r| r.id == id),
            Collection::News => remove(&mut store.news, |r| r.id == id),
        })
    }

    async fn exists(&self, collection: Collection, id: Uuid) -> Result<bool, RepoError> {
        let store = self.store.read().await;
        Ok(match collection {
            Collection::HeroImages => store.hero_images.iter().any(|r| r.id == id),
            Collection::About => store.about.iter().any(|r| r.id == id),
            Collection::Team => store.team.iter().any(|r| r.id == id),
            Collection::Initiatives => store.initiatives.iter().any(|r| r.id == id),
            Collection::Events => store.events.iter().any(|r| r.id == id),
            Collection::Achievements => store.achievements.iter().any(|r| r.id == id),
            Collection::News => store.news.iter().any(|r| r.id == id),
        })
    }

    async fn count(&self, collection: Collection) -> i64 {
        let store = self.store.read().await;
        let n = match collection {
            Collection::HeroImages => store.hero_images.len(),
            Collection::About => store.about.len(),
            Collection::Team => store.team.len(),
            Collection::Initiatives => store.initiatives.len(),
            Collection::Events => store.events.len(),
            Collection::Achievements => store.achievements.len(),
            Collection::News => store.news.len(),
        };
        n as i64
    }
}
