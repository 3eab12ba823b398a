// FeedAssembler - builds a viewer's feed from every author's posts
//
// Directory and follow-edge lookups are fatal when they fail. Per-author post
// fetches are isolated: a failed or timed-out author only shrinks the feed.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;

use crate::{
    config::FeedConfig,
    core::UserId,
    error::{AppError, AppResult},
    infrastructure::{
        traits::{PostSource, UserDirectory},
        viewer::ViewerContext,
    },
    models::{FeedEntry, Post},
    services::{follow_edge_store::FollowEdgeStore, media::MediaPaths},
};

#[derive(Clone)]
pub struct FeedAssembler {
    follows: FollowEdgeStore,
    directory: Arc<dyn UserDirectory>,
    posts: Arc<dyn PostSource>,
    media: MediaPaths,
    config: FeedConfig,
}

impl FeedAssembler {
    pub fn new(
        follows: FollowEdgeStore,
        directory: Arc<dyn UserDirectory>,
        posts: Arc<dyn PostSource>,
        media: MediaPaths,
        config: FeedConfig,
    ) -> Self {
        Self {
            follows,
            directory,
            posts,
            media,
            config,
        }
    }

    /// Priority authors (viewer and followees) first, then everyone else;
    /// oldest first within each group.
    #[tracing::instrument(skip(self, viewer), fields(viewer = %viewer.user_id, request_id = %viewer.request_id))]
    pub async fn assemble(&self, viewer: &ViewerContext) -> AppResult<Vec<FeedEntry>> {
        let (users, following) = tokio::try_join!(
            self.directory.all_users(),
            self.follows.following(&viewer.user_id)
        )
        .map_err(|e| {
            tracing::error!(error = %e, "failed to resolve users or follow edges");
            AppError::Other(format!("Failed to build feed for {}: {}", viewer.user_id, e))
        })?;

        let mut priority: HashSet<UserId> = following.into_iter().map(|edge| edge.follows).collect();
        priority.insert(viewer.user_id.clone());

        let mut posts = self.collect_posts(users).await;
        for post in posts.iter_mut() {
            self.media.rewrite_post(post);
        }

        Ok(rank_feed(posts, &priority))
    }

    /// One fetch per author, all settled before returning. Failures and
    /// timeouts are logged and dropped.
    async fn collect_posts(&self, authors: Vec<UserId>) -> Vec<Post> {
        let timeout = self.config.source_timeout();
        let source = &self.posts;
        let author_count = authors.len();

        let settled: Vec<(UserId, Result<AppResult<Vec<Post>>, tokio::time::error::Elapsed>)> =
            stream::iter(authors)
                .map(|author| async move {
                    let result = tokio::time::timeout(timeout, source.posts_by_user(&author)).await;
                    (author, result)
                })
                .buffer_unordered(self.config.max_in_flight.max(1))
                .collect()
                .await;

        let mut posts = Vec::new();
        let mut failed = 0usize;
        for (author, result) in settled {
            match result {
                Ok(Ok(author_posts)) => posts.extend(author_posts),
                Ok(Err(e)) => {
                    failed += 1;
                    tracing::warn!(author = %author, error = %e, "dropping author from feed");
                }
                Err(_) => {
                    failed += 1;
                    tracing::warn!(author = %author, timeout_ms = timeout.as_millis() as u64, "author fetch timed out");
                }
            }
        }

        tracing::debug!(authors = author_count, failed, posts = posts.len(), "feed sources settled");
        posts
    }
}

/// Tag and order posts. Ties on `created_at` fall back to post id so the
/// result never depends on input order.
pub fn rank_feed(posts: Vec<Post>, priority: &HashSet<UserId>) -> Vec<FeedEntry> {
    let mut entries: Vec<FeedEntry> = posts
        .into_iter()
        .map(|post| FeedEntry {
            is_priority: priority.contains(&post.user_id),
            post,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.is_priority
            .cmp(&a.is_priority)
            .then_with(|| a.post.created_at.cmp(&b.post.created_at))
            .then_with(|| a.post.id.cmp(&b.post.id))
    });
    entries
}
