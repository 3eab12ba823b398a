use crate::core::UserId;
use crate::error::AppResult;
use crate::models::Post;
use async_trait::async_trait;

/// Read-only view of the user population, owned by the user collaborator.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Every known user identity.
    async fn all_users(&self) -> AppResult<Vec<UserId>>;
    async fn user_exists(&self, id: &UserId) -> AppResult<bool>;
}

/// Read-only access to posts, owned by the post collaborator.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Every post authored by `author`, in no particular order.
    async fn posts_by_user(&self, author: &UserId) -> AppResult<Vec<Post>>;
}
