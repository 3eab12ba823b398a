// ViewerContext Middleware - turns the identity asserted by the upstream
// session layer into a request-scoped ViewerContext

use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{core::UserId, infrastructure::viewer::ViewerContext};

/// Header carrying a request id assigned by an upstream proxy, if any.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Inserts an `Arc<ViewerContext>` into request extensions when the request
/// carries `Authorization: Bearer <user-id>`. Requests without one stay
/// anonymous and are rejected by the `Vc` extractor on protected routes.
pub async fn viewer_context_middleware(mut request: Request, next: Next) -> Response {
    if let Some(viewer) = extract_viewer_from_headers(request.headers()) {
        request.extensions_mut().insert(Arc::new(viewer));
    }
    next.run(request).await
}

/// Extract the viewer identity from request headers
fn extract_viewer_from_headers(headers: &HeaderMap) -> Option<ViewerContext> {
    let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let user_id = UserId::new(auth_str.strip_prefix("Bearer ")?.trim());
    if !user_id.is_valid() {
        return None;
    }

    let viewer = match headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(request_id) => ViewerContext::with_request_id(user_id, request_id),
        None => ViewerContext::new(user_id),
    };
    Some(viewer)
}
