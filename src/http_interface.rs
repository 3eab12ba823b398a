// HTTP surface for the follow graph and the feed
//
// Every response uses the `{ error, content }` envelope from `crate::error`.

use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{
    app_state::AppState,
    core::UserId,
    error::{ApiError, AppError, Envelope},
    infrastructure::middleware::{viewer_context_middleware, Vc},
    models::{FollowEdge, FollowLookup, Post},
};

// HTTP Request types

#[derive(Debug, Deserialize)]
pub struct FollowRequestBody {
    pub follows: Option<UserId>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptFollowBody {
    /// The initiator of the request being accepted.
    pub follows: Option<UserId>,
    pub accepted: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct FollowQueryParams {
    pub follows: Option<UserId>,
    #[serde(rename = "followedBy")]
    pub followed_by: Option<UserId>,
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| {
            tracing::debug!(error = %rejection, "rejected request body");
            AppError::InvalidOperation("Malformed request body!".to_string()).into()
        })
}

fn required_user(id: Option<UserId>) -> Result<UserId, AppError> {
    id.filter(UserId::is_valid)
        .ok_or_else(|| AppError::InvalidOperation("User id cannot be null!".to_string()))
}

// HTTP Handlers

pub async fn request_follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    payload: Result<Json<FollowRequestBody>, JsonRejection>,
) -> Result<Json<Envelope<FollowEdge>>, ApiError> {
    // every client-side failure of this route is reported as 404
    let result = async {
        let body = json_body(payload)?;
        let target = required_user(body.follows)?;
        Ok::<_, ApiError>(state.follows.request(&vc.user_id, &target).await?)
    }
    .await;

    result
        .map(|edge| Json(Envelope::content(edge)))
        .map_err(|e| e.wrap_client_errors(StatusCode::NOT_FOUND))
}

pub async fn accept_follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    payload: Result<Json<AcceptFollowBody>, JsonRejection>,
) -> Result<Json<Envelope<FollowEdge>>, ApiError> {
    let body = json_body(payload)?;
    let initiator = required_user(body.follows)?;
    if body.accepted == Some(false) {
        return Err(AppError::InvalidOperation(
            "A follow request can only be accepted; the initiator removes it instead!".to_string(),
        )
        .into());
    }

    let edge = state.follows.accept(&vc.user_id, &initiator).await?;
    Ok(Json(Envelope::content(edge)))
}

pub async fn remove_follow_handler(
    State(state): State<AppState>,
    vc: Vc,
    AxumPath(user_id): AxumPath<String>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let target = required_user(Some(UserId::from(user_id)))?;
    state.follows.remove(&vc.user_id, &target).await?;
    Ok(Json(Envelope::empty()))
}

pub async fn get_follows_handler(
    State(state): State<AppState>,
    _vc: Vc,
    Query(params): Query<FollowQueryParams>,
) -> Result<Json<Envelope<FollowLookup>>, ApiError> {
    let follows = params.follows.filter(UserId::is_valid);
    let followed_by = params.followed_by.filter(UserId::is_valid);

    let lookup = state
        .follows
        .query(follows.as_ref(), followed_by.as_ref())
        .await?;
    Ok(Json(Envelope::content(lookup)))
}

pub async fn get_feed_handler(
    State(state): State<AppState>,
    vc: Vc,
) -> Result<Json<Envelope<Vec<Post>>>, ApiError> {
    let feed = state.feed.assemble(&vc).await?;
    let posts: Vec<Post> = feed.into_iter().map(|entry| entry.post).collect();
    Ok(Json(Envelope::content(posts)))
}

pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<Envelope<&'static str>>, ApiError> {
    state.database.health_check().await?;
    Ok(Json(Envelope::content("ok")))
}

/// Build the application router. Media paths produced by the feed are served
/// from `{media.root}/{media.url_prefix}`.
pub fn create_router(state: AppState) -> Router {
    let media = state.config.media.clone();

    let mut router = Router::new()
        // Follow graph
        .route(
            "/follow",
            post(request_follow_handler)
                .patch(accept_follow_handler)
                .get(get_follows_handler),
        )
        .route("/follow/{user_id}", delete(remove_follow_handler))
        // Feed
        .route("/feed", get(get_feed_handler))
        .route("/health", get(health_handler));

    let prefix = media.url_prefix.trim_matches('/');
    if !prefix.is_empty() {
        router = router.nest_service(
            &format!("/{}", prefix),
            ServeDir::new(media.root.join(prefix)),
        );
    }

    router
        .layer(axum::middleware::from_fn(viewer_context_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
