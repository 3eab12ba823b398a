// Sample data for local runs and tests.
// Writes into the user and post collaborators' tables; the follow graph is
// seeded through FollowEdgeStore so its invariants still apply.

use chrono::{Duration, Utc};
use sqlx::sqlite::SqlitePool;

use crate::{
    core::UserId,
    error::{AppError, AppResult},
    models::Post,
    services::FollowEdgeStore,
};

pub async fn insert_user(pool: &SqlitePool, id: &UserId, email: &str) -> AppResult<()> {
    sqlx::query("INSERT INTO users (id, email, created_at) VALUES (?, ?, ?)")
        .bind(id.as_str())
        .bind(email)
        .bind(Utc::now())
        .execute(pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to insert user {}: {}", id, e)))?;
    Ok(())
}

pub async fn insert_post(pool: &SqlitePool, post: &Post) -> AppResult<()> {
    let pictures = serde_json::to_string(&post.pictures_urls)
        .map_err(|e| AppError::Other(format!("Failed to encode pictures of {}: {}", post.id, e)))?;

    sqlx::query(
        "INSERT INTO posts (id, user_id, created_at, description, pictures_urls) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&post.id)
    .bind(post.user_id.as_str())
    .bind(post.created_at)
    .bind(&post.description)
    .bind(pictures)
    .execute(pool)
    .await
    .map_err(|e| AppError::Database(format!("Failed to insert post {}: {}", post.id, e)))?;
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: Vec<UserId>,
    pub posts: usize,
    pub follows: usize,
}

/// Create `user_count` users with `posts_per_user` posts each, and have every
/// user request to follow the next one. Even-numbered requests get accepted.
pub async fn seed_sample_data(
    pool: &SqlitePool,
    follows: &FollowEdgeStore,
    user_count: usize,
    posts_per_user: usize,
) -> AppResult<SeedSummary> {
    let mut summary = SeedSummary::default();
    let start = Utc::now() - Duration::days(1);

    for i in 0..user_count {
        let id = UserId::generate();
        insert_user(pool, &id, &format!("user{}@example.com", i)).await?;
        summary.users.push(id);
    }

    for (i, author) in summary.users.iter().enumerate() {
        for j in 0..posts_per_user {
            let post = Post {
                id: uuid::Uuid::new_v4().to_string(),
                user_id: author.clone(),
                created_at: start + Duration::minutes((i * posts_per_user + j) as i64),
                description: Some(format!("Post {} by user {}", j, i)),
                pictures_urls: vec![format!("{}.jpg", uuid::Uuid::new_v4())],
            };
            insert_post(pool, &post).await?;
            summary.posts += 1;
        }
    }

    if summary.users.len() > 1 {
        for (i, initiator) in summary.users.iter().enumerate() {
            let target = &summary.users[(i + 1) % summary.users.len()];
            follows.request(initiator, target).await?;
            if i % 2 == 0 {
                follows.accept(target, initiator).await?;
            }
            summary.follows += 1;
        }
    }

    tracing::info!(
        users = summary.users.len(),
        posts = summary.posts,
        follows = summary.follows,
        "seeded sample data"
    );
    Ok(summary)
}
