//! Postgres repository tests. They need a reachable `DATABASE_URL` and are
//! skipped by default: `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sangam_portal::{
    models::{EventInput, NewsInput, TeamMemberInput},
    repository::{Collection, PostgresRepository, Repository},
};
use sqlx::PgPool;
use uuid::Uuid;

// --- Test Context and Setup ---

struct DbTestContext {
    pool: PgPool,
}

impl DbTestContext {
    async fn setup() -> Self {
        dotenv::dotenv().ok();

        let db_url = std::env::var("DATABASE_URL")
            .expect("DATABASE_URL must be set to run integration tests");

        let pool = PgPool::connect(&db_url)
            .await
            .expect("Failed to connect to database for integration tests.");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run database migrations.");

        DbTestContext { pool }
    }

    fn repository(&self) -> PostgresRepository {
        PostgresRepository::new(self.pool.clone())
    }
}

fn unique(label: &str) -> String {
    format!("{}-{}", label, Uuid::new_v4().simple())
}

// --- Tests ---

#[tokio::test]
#[ignore = "requires Postgres"]
async fn team_member_update_keeps_image_without_new_upload() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let member = repo
        .create_team_member(
            TeamMemberInput {
                name: unique("member"),
                role: "Volunteer".to_string(),
                description: String::new(),
            },
            "http://img/original.png".to_string(),
        )
        .await
        .expect("insert team member");

    let updated = repo
        .update_team_member(
            member.id,
            TeamMemberInput {
                name: member.name.clone(),
                role: "Coordinator".to_string(),
                description: String::new(),
            },
            None,
        )
        .await
        .expect("update team member")
        .expect("row exists");

    assert_eq!(updated.role, "Coordinator");
    assert_eq!(updated.image_url, "http://img/original.png");

    assert!(repo.delete(Collection::Team, member.id).await.unwrap());
    assert!(!repo.delete(Collection::Team, member.id).await.unwrap());
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn upcoming_events_exclude_the_past() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let past = repo
        .create_event(
            EventInput {
                title: unique("past"),
                description: "d".to_string(),
                date: Utc::now() - Duration::days(30),
                location: None,
            },
            None,
        )
        .await
        .unwrap();
    let future = repo
        .create_event(
            EventInput {
                title: unique("future"),
                description: "d".to_string(),
                date: Utc::now() + Duration::days(30),
                location: Some("Hall".to_string()),
            },
            None,
        )
        .await
        .unwrap();

    let upcoming = repo.list_events(None, true, true).await;
    assert!(upcoming.iter().any(|e| e.id == future.id));
    assert!(upcoming.iter().all(|e| e.id != past.id));
    assert!(upcoming.windows(2).all(|w| w[0].date <= w[1].date));

    repo.delete(Collection::Events, past.id).await.unwrap();
    repo.delete(Collection::Events, future.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Postgres"]
async fn news_lookup_by_slug_and_related() {
    let ctx = DbTestContext::setup().await;
    let repo = ctx.repository();

    let slug = unique("story");
    let article = repo
        .create_news(
            NewsInput {
                title: "Story".to_string(),
                content: "<p>x</p>".to_string(),
                slug: slug.clone(),
            },
            "http://img/story.png".to_string(),
        )
        .await
        .unwrap();

    let found = repo.get_news_by_slug(&slug).await.expect("article by slug");
    assert_eq!(found.id, article.id);

    let related = repo.related_news(article.id, 3).await;
    assert!(related.len() <= 3);
    assert!(related.iter().all(|n| n.id != article.id));

    let before = repo.count(Collection::News).await;
    repo.delete(Collection::News, article.id).await.unwrap();
    assert_eq!(repo.count(Collection::News).await, before - 1);
}
