mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{body_json, body_string, spawn_app, spawn_with};
use sangam_portal::{
    InMemoryRepository, MockIdentityService, MockStorageService,
    models::{
        AboutContent, Event, EventInput, HomePage, Initiative, InitiativeInput, NewsDetail,
        NewsInput, TeamMemberInput,
    },
    repository::Repository,
};
use uuid::Uuid;

fn event(title: &str, offset_days: i64) -> EventInput {
    EventInput {
        title: title.to_string(),
        description: "d".to_string(),
        date: Utc::now() + Duration::days(offset_days),
        location: None,
    }
}

#[tokio::test]
async fn health_check() {
    let app = spawn_app();
    let response = app.get("/api/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn events_filter_and_order() {
    let app = spawn_app();
    for (title, offset) in [("past", -10), ("soon", 2), ("later", 20)] {
        app.repo.create_event(event(title, offset), None).await.unwrap();
    }

    let upcoming: Vec<Event> = body_json(app.get("/api/events?upcoming=true").await).await;
    let titles: Vec<_> = upcoming.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["soon", "later"]);

    let archive: Vec<Event> = body_json(app.get("/api/events?upcoming=false").await).await;
    let titles: Vec<_> = archive.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["later", "soon", "past"]);

    let all: Vec<Event> = body_json(app.get("/api/events?limit=2").await).await;
    let titles: Vec<_> = all.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["past", "soon"]);
}

#[tokio::test]
async fn single_event_or_404() {
    let app = spawn_app();
    let created = app.repo.create_event(event("one", 1), None).await.unwrap();

    let found: Event = body_json(app.get(&format!("/api/events/{}", created.id)).await).await;
    assert_eq!(found.id, created.id);

    let missing = app.get(&format!("/api/events/{}", Uuid::new_v4())).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn initiatives_report_expired_deadlines() {
    let app = spawn_app();
    for (title, deadline) in [
        ("closed", Some(Utc::now() - Duration::days(1))),
        ("open", Some(Utc::now() + Duration::days(1))),
        ("rolling", None),
    ] {
        app.repo
            .create_initiative(
                InitiativeInput {
                    title: title.to_string(),
                    description: "d".to_string(),
                    deadline,
                },
                "http://img".to_string(),
            )
            .await
            .unwrap();
    }

    let initiatives: Vec<Initiative> = body_json(app.get("/api/initiatives").await).await;
    let expired = |title: &str| {
        initiatives
            .iter()
            .find(|i| i.title == title)
            .map(|i| i.deadline_expired)
    };
    assert_eq!(expired("closed"), Some(true));
    assert_eq!(expired("open"), Some(false));
    assert_eq!(expired("rolling"), Some(false));
}

#[tokio::test]
async fn news_article_comes_with_related() {
    let app = spawn_app();
    for n in 0..5 {
        app.repo
            .create_news(
                NewsInput {
                    title: format!("Story {}", n),
                    content: "<p>body</p>".to_string(),
                    slug: format!("story-{}", n),
                },
                "http://img".to_string(),
            )
            .await
            .unwrap();
    }

    let detail: NewsDetail = body_json(app.get("/api/news/story-2").await).await;
    assert_eq!(detail.article.slug, "story-2");
    assert_eq!(detail.related.len(), 3);
    assert!(detail.related.iter().all(|n| n.slug != "story-2"));

    let missing = app.get("/api/news/no-such-story").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn about_is_404_until_seeded() {
    let app = spawn_app();
    assert_eq!(app.get("/api/about").await.status(), StatusCode::NOT_FOUND);

    let seeded = spawn_with(
        InMemoryRepository::new().with_about(AboutContent {
            id: Uuid::new_v4(),
            title: "About us".to_string(),
            description: "We plant trees.".to_string(),
            image_url: None,
        }),
        MockIdentityService::new(),
        MockStorageService::new(),
    );
    let about: AboutContent = body_json(seeded.get("/api/about").await).await;
    assert_eq!(about.title, "About us");
}

#[tokio::test]
async fn home_bundle_caps_each_section() {
    let app = spawn_app();
    for n in 0..10 {
        app.repo
            .create_team_member(
                TeamMemberInput {
                    name: format!("Member {}", n),
                    role: "Volunteer".to_string(),
                    description: String::new(),
                },
                "http://img".to_string(),
            )
            .await
            .unwrap();
    }
    for (n, offset) in [-3, 1, 2, 3, 4].into_iter().enumerate() {
        app.repo
            .create_event(event(&format!("e{}", n), offset), None)
            .await
            .unwrap();
    }

    let home: HomePage = body_json(app.get("/api/home").await).await;
    assert_eq!(home.team.len(), 8);
    assert_eq!(home.upcoming_events.len(), 3);
    assert!(home.upcoming_events.iter().all(|e| e.date >= Utc::now()));
    assert!(home.about.is_none());
}
