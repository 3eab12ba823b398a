use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    infrastructure::{
        PostSource, SqlPostSource, SqlUserDirectory, SqliteDatabase, UserDirectory,
    },
    services::{FeedAssembler, FollowEdgeStore, MediaPaths},
};

/// Services shared by every handler. Constructed once at startup and passed to
/// the router as state.
#[derive(Clone)]
pub struct AppState {
    pub database: SqliteDatabase,
    pub follows: FollowEdgeStore,
    pub feed: FeedAssembler,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> AppResult<Self> {
        let database = SqliteDatabase::connect(&config.database.url).await?;
        let directory: Arc<dyn UserDirectory> = Arc::new(SqlUserDirectory::new(
            database.pool().clone(),
            config.cache.capacity,
        ));
        let posts: Arc<dyn PostSource> = Arc::new(SqlPostSource::new(database.pool().clone()));

        Ok(Self::with_collaborators(database, directory, posts, config))
    }

    /// Wire the services over explicit collaborators.
    pub fn with_collaborators(
        database: SqliteDatabase,
        directory: Arc<dyn UserDirectory>,
        posts: Arc<dyn PostSource>,
        config: Config,
    ) -> Self {
        let follows = FollowEdgeStore::new(database.clone(), directory.clone());
        let feed = FeedAssembler::new(
            follows.clone(),
            directory,
            posts,
            MediaPaths::from_config(&config.media),
            config.feed.clone(),
        );

        Self {
            database,
            follows,
            feed,
            config,
        }
    }
}
