#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use social_feed::{
    app_state::AppState,
    config::Config,
    core::UserId,
    data_seeder::{insert_post, insert_user},
    http_interface::create_router,
    infrastructure::{PostSource, SqlPostSource, SqlUserDirectory, SqliteDatabase, UserDirectory},
    models::Post,
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir) -> Config {
    let mut config = Config::in_memory();
    config.database.url = format!("sqlite:{}", dir.path().join("feed.db").display());
    config.media.root = dir.path().join("media");
    config.feed.source_timeout_ms = 300;
    config
}

pub async fn spawn_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let state = AppState::new(test_config(&dir)).await.unwrap();
    TestApp {
        router: create_router(state.clone()),
        state,
        dir,
    }
}

/// Build an app whose post source is produced by `wrap` from the SQL one.
pub async fn spawn_app_with_posts<F>(wrap: F) -> TestApp
where
    F: FnOnce(Arc<dyn PostSource>) -> Arc<dyn PostSource>,
{
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let database = SqliteDatabase::connect(&config.database.url).await.unwrap();
    let directory: Arc<dyn UserDirectory> =
        Arc::new(SqlUserDirectory::new(database.pool().clone(), 16));
    let posts = wrap(Arc::new(SqlPostSource::new(database.pool().clone())));

    let state = AppState::with_collaborators(database, directory, posts, config);
    TestApp {
        router: create_router(state.clone()),
        state,
        dir,
    }
}

impl TestApp {
    pub async fn add_user(&self, id: &str) -> UserId {
        let user = UserId::new(id);
        insert_user(self.state.database.pool(), &user, &format!("{}@example.com", id))
            .await
            .unwrap();
        user
    }

    pub async fn add_post(&self, post: &Post) {
        insert_post(self.state.database.pool(), post).await.unwrap();
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        viewer: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(viewer) = viewer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", viewer));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}

pub fn error_code(body: &Value) -> u64 {
    body["error"]["errorCode"].as_u64().unwrap()
}

pub fn error_msg(body: &Value) -> &str {
    body["error"]["errorMsg"].as_str().unwrap()
}
