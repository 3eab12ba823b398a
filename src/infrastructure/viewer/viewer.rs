use crate::core::UserId;

/// The authenticated viewer of a request. Produced once by the middleware and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerContext {
    pub user_id: UserId,
    pub request_id: String,
}

impl ViewerContext {
    pub fn new(user_id: UserId) -> Self {
        let request_id = format!("req-{}", uuid::Uuid::new_v4());
        ViewerContext { user_id, request_id }
    }

    pub fn with_request_id(user_id: UserId, request_id: impl Into<String>) -> Self {
        ViewerContext {
            user_id,
            request_id: request_id.into(),
        }
    }
}
