// ViewerContext Extractor - handlers take `vc: Vc` and never see anonymous requests

use axum::{extract::FromRequestParts, http::request::Parts};
use std::sync::Arc;

use crate::{
    error::{ApiError, AppError},
    infrastructure::viewer::ViewerContext,
};

/// Cheap-to-clone handle on the authenticated viewer.
///
/// Extraction fails with `NotLoggedIn` before the handler body runs when the
/// middleware found no identity on the request.
#[derive(Debug, Clone)]
pub struct Vc(Arc<ViewerContext>);

impl Vc {
    pub fn new(vc: Arc<ViewerContext>) -> Self {
        Self(vc)
    }

    pub fn arc(self) -> Arc<ViewerContext> {
        self.0
    }
}

impl std::ops::Deref for Vc {
    type Target = ViewerContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<ViewerContext> for Vc {
    fn as_ref(&self) -> &ViewerContext {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Vc
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let vc = parts
            .extensions
            .get::<Arc<ViewerContext>>()
            .map(|vc| Vc(vc.clone()))
            .ok_or_else(|| ApiError::from(AppError::NotLoggedIn("Please log in first!".to_string())));

        async move { vc }
    }
}
