mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

use social_feed::{
    core::UserId,
    error::{AppError, AppResult},
    infrastructure::PostSource,
    models::Post,
};

use common::{error_code, error_msg, spawn_app, spawn_app_with_posts, TestApp};

fn post(id: &str, author: &str, minute: u32) -> Post {
    Post {
        id: id.to_string(),
        user_id: UserId::new(author),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, minute, 0).unwrap(),
        description: Some(format!("{} by {}", id, author)),
        pictures_urls: vec![format!("{}.png", id)],
    }
}

fn post_ids(body: &Value) -> Vec<&str> {
    body["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["id"].as_str().unwrap())
        .collect()
}

async fn three_users_one_post_each(app: &TestApp) {
    for (i, id) in ["u1", "u2", "u3"].into_iter().enumerate() {
        app.add_user(id).await;
        app.add_post(&post(&format!("p{}", i + 1), id, i as u32)).await;
    }
}

/// Fails every fetch for one author.
struct FailingAuthor {
    inner: Arc<dyn PostSource>,
    author: UserId,
}

#[async_trait]
impl PostSource for FailingAuthor {
    async fn posts_by_user(&self, author: &UserId) -> AppResult<Vec<Post>> {
        if *author == self.author {
            return Err(AppError::Database("post store unavailable".to_string()));
        }
        self.inner.posts_by_user(author).await
    }
}

/// Never answers for one author.
struct StallingAuthor {
    inner: Arc<dyn PostSource>,
    author: UserId,
}

#[async_trait]
impl PostSource for StallingAuthor {
    async fn posts_by_user(&self, author: &UserId) -> AppResult<Vec<Post>> {
        if *author == self.author {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        self.inner.posts_by_user(author).await
    }
}

#[tokio::test]
async fn test_pending_followee_ranks_ahead_of_strangers() {
    let app = spawn_app().await;
    three_users_one_post_each(&app).await;
    app.send(Method::POST, "/follow", Some("u1"), Some(json!({ "follows": "u2" })))
        .await;

    let (status, body) = app.send(Method::GET, "/feed", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post_ids(&body), vec!["p1", "p2", "p3"]);

    let first = &body["content"][0];
    assert_eq!(first["userId"], "u1");
    assert_eq!(first["picturesURLs"], json!(["users/u1/pictures/p1.png"]));
}

#[tokio::test]
async fn test_priority_beats_age() {
    let app = spawn_app().await;
    three_users_one_post_each(&app).await;
    app.send(Method::POST, "/follow", Some("u3"), Some(json!({ "follows": "u1" })))
        .await;

    // u3's priority set is {u3, u1}; u2's older post comes after both
    let (status, body) = app.send(Method::GET, "/feed", Some("u3"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post_ids(&body), vec!["p1", "p3", "p2"]);
}

#[tokio::test]
async fn test_empty_population_gives_empty_feed() {
    let app = spawn_app().await;
    let (status, body) = app.send(Method::GET, "/feed", Some("nobody"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!([]));
}

#[tokio::test]
async fn test_failing_author_is_left_out() {
    let app = spawn_app_with_posts(|inner| {
        Arc::new(FailingAuthor {
            inner,
            author: UserId::new("u2"),
        })
    })
    .await;
    three_users_one_post_each(&app).await;

    let (status, body) = app.send(Method::GET, "/feed", Some("u1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post_ids(&body), vec!["p1", "p3"]);
}

#[tokio::test]
async fn test_stalled_author_does_not_block_feed() {
    let app = spawn_app_with_posts(|inner| {
        Arc::new(StallingAuthor {
            inner,
            author: UserId::new("u3"),
        })
    })
    .await;
    three_users_one_post_each(&app).await;

    let (status, body) = tokio::time::timeout(
        Duration::from_secs(10),
        app.send(Method::GET, "/feed", Some("u1"), None),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post_ids(&body), vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_follow_graph_failure_is_internal_error() {
    let app = spawn_app().await;
    three_users_one_post_each(&app).await;
    sqlx::query("DROP TABLE followers")
        .execute(app.state.database.pool())
        .await
        .unwrap();

    let (status, body) = app.send(Method::GET, "/feed", Some("u1"), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(&body), 1);
    assert_eq!(error_msg(&body), "Please try again!");
    assert!(body.get("content").is_none());
}

#[tokio::test]
async fn test_media_is_served_under_prefix() {
    let app = spawn_app().await;
    let dir = app.dir.path().join("media/users/u1/pictures");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("p1.png"), b"not really a png").unwrap();

    let request = axum::http::Request::builder()
        .uri("/users/u1/pictures/p1.png")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app.router.clone(), request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"not really a png");
}
