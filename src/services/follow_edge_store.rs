// FollowEdgeStore - authoritative CRUD over the follow graph
//
//   [absent] --request()--> [pending] --accept()--> [accepted]
//      ^                       |                        |
//      +-------remove()--------+-----------remove()-----+

use chrono::Utc;
use sqlx::{
    sqlite::{SqlitePool, SqliteRow},
    Row,
};
use std::sync::Arc;

use crate::{
    core::UserId,
    error::{AppError, AppResult},
    infrastructure::{sqlite_database::SqliteDatabase, traits::UserDirectory},
    models::{FollowEdge, FollowLookup},
};

const EDGE_COLUMNS: &str = "followed_by, follows, accepted, created_at";

#[derive(Clone)]
pub struct FollowEdgeStore {
    db: SqliteDatabase,
    directory: Arc<dyn UserDirectory>,
}

impl FollowEdgeStore {
    pub fn new(db: SqliteDatabase, directory: Arc<dyn UserDirectory>) -> Self {
        Self { db, directory }
    }

    /// `initiator` asks to follow `target`. The new edge starts pending.
    ///
    /// The insert is a single statement; the primary key on
    /// `(followed_by, follows)` decides which of several concurrent requests wins.
    #[tracing::instrument(skip(self))]
    pub async fn request(&self, initiator: &UserId, target: &UserId) -> AppResult<FollowEdge> {
        self.require_user(target).await?;

        if initiator == target {
            return Err(AppError::InvalidOperation("Cannot follow yourself!".to_string()));
        }

        let edge = FollowEdge::pending(initiator.clone(), target.clone(), Utc::now());
        let inserted = sqlx::query(
            "INSERT INTO followers (followed_by, follows, accepted, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(edge.followed_by.as_str())
        .bind(edge.follows.as_str())
        .bind(edge.accepted)
        .bind(edge.created_at)
        .execute(self.db.pool())
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(self.duplicate_of(initiator, target).await);
            }
            Err(e) => return Err(map_write_error(e)),
        }

        tracing::info!(followed_by = %initiator, follows = %target, "follow requested");
        Ok(edge)
    }

    /// `acceptor` accepts the pending request sent by `initiator`.
    #[tracing::instrument(skip(self))]
    pub async fn accept(&self, acceptor: &UserId, initiator: &UserId) -> AppResult<FollowEdge> {
        self.require_user(initiator).await?;

        let updated = sqlx::query(&format!(
            "UPDATE followers SET accepted = 1 WHERE followed_by = ? AND follows = ? RETURNING {}",
            EDGE_COLUMNS
        ))
        .bind(initiator.as_str())
        .bind(acceptor.as_str())
        .fetch_optional(self.db.pool())
        .await
        .map_err(map_write_error)?;

        let Some(row) = updated else {
            // Nothing to accept. A reverse edge means the caller is on the wrong side.
            return Err(match fetch_pair_edge(self.db.pool(), initiator, acceptor).await? {
                Some(edge) if &edge.follows != acceptor => AppError::Unauthorized(
                    "Cannot accept request on behalf of another user!".to_string(),
                ),
                _ => AppError::NotFound("Follow request does not exist!".to_string()),
            });
        };

        let edge = edge_from_row(&row)?;
        tracing::info!(followed_by = %initiator, follows = %acceptor, "follow accepted");
        Ok(edge)
    }

    /// `requester` withdraws its edge towards `target`, pending or accepted.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, requester: &UserId, target: &UserId) -> AppResult<()> {
        self.require_user(target).await?;

        let result = sqlx::query("DELETE FROM followers WHERE followed_by = ? AND follows = ?")
            .bind(requester.as_str())
            .bind(target.as_str())
            .execute(self.db.pool())
            .await
            .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(match fetch_pair_edge(self.db.pool(), requester, target).await? {
                Some(edge) if &edge.followed_by != requester => AppError::Unauthorized(
                    "Cannot delete follow on behalf of another user!".to_string(),
                ),
                _ => AppError::NotFound("Follow does not exist!".to_string()),
            });
        }

        tracing::info!(followed_by = %requester, follows = %target, "follow removed");
        Ok(())
    }

    /// Look edges up by target, initiator, or both. Acceptance state is not filtered.
    pub async fn query(
        &self,
        follows: Option<&UserId>,
        followed_by: Option<&UserId>,
    ) -> AppResult<FollowLookup> {
        match (follows, followed_by) {
            (Some(follows), Some(followed_by)) => {
                let row = sqlx::query(&format!(
                    "SELECT {} FROM followers WHERE followed_by = ? AND follows = ?",
                    EDGE_COLUMNS
                ))
                .bind(followed_by.as_str())
                .bind(follows.as_str())
                .fetch_optional(self.db.pool())
                .await
                .map_err(|e| AppError::Database(format!("Failed to look up follow edge: {}", e)))?;

                Ok(FollowLookup::Single(row.as_ref().map(edge_from_row).transpose()?))
            }
            (Some(follows), None) => Ok(FollowLookup::Many(self.followers(follows).await?)),
            (None, Some(followed_by)) => Ok(FollowLookup::Many(self.following(followed_by).await?)),
            (None, None) => Err(AppError::InvalidOperation(
                "Specify at least one user id!".to_string(),
            )),
        }
    }

    /// Edges whose target is `user`.
    pub async fn followers(&self, user: &UserId) -> AppResult<Vec<FollowEdge>> {
        self.edges_where("follows", user).await
    }

    /// Edges initiated by `user`, pending ones included.
    pub async fn following(&self, user: &UserId) -> AppResult<Vec<FollowEdge>> {
        self.edges_where("followed_by", user).await
    }

    async fn edges_where(&self, column: &'static str, user: &UserId) -> AppResult<Vec<FollowEdge>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM followers WHERE {} = ? ORDER BY created_at, followed_by, follows",
            EDGE_COLUMNS, column
        ))
        .bind(user.as_str())
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| AppError::Database(format!("Failed to list follow edges for {}: {}", user, e)))?;

        rows.iter().map(edge_from_row).collect()
    }

    async fn require_user(&self, id: &UserId) -> AppResult<()> {
        if self.directory.user_exists(id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound("User does not exist!".to_string()))
        }
    }

    /// The error for a request that lost to an existing edge. The message
    /// depends on whether that edge has been accepted yet.
    async fn duplicate_of(&self, initiator: &UserId, target: &UserId) -> AppError {
        let accepted = sqlx::query_scalar::<_, bool>(
            "SELECT accepted FROM followers WHERE followed_by = ? AND follows = ?",
        )
        .bind(initiator.as_str())
        .bind(target.as_str())
        .fetch_optional(self.db.pool())
        .await;

        match accepted {
            Ok(accepted) => duplicate_error(accepted.unwrap_or(false)),
            Err(e) => AppError::Database(format!("Failed to look up follow edge: {}", e)),
        }
    }
}

/// The edge `followed_by -> follows`, or failing that the reverse edge between
/// the same pair. Callers detect the reverse case through their party checks.
async fn fetch_pair_edge(
    pool: &SqlitePool,
    followed_by: &UserId,
    follows: &UserId,
) -> AppResult<Option<FollowEdge>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM followers
         WHERE (followed_by = ? AND follows = ?) OR (followed_by = ? AND follows = ?)
         ORDER BY CASE WHEN followed_by = ? THEN 0 ELSE 1 END
         LIMIT 1",
        EDGE_COLUMNS
    ))
    .bind(followed_by.as_str())
    .bind(follows.as_str())
    .bind(follows.as_str())
    .bind(followed_by.as_str())
    .bind(followed_by.as_str())
    .fetch_optional(pool)
    .await
    .map_err(|e| AppError::Database(format!("Failed to look up follow edge: {}", e)))?;

    row.as_ref().map(edge_from_row).transpose()
}

fn edge_from_row(row: &SqliteRow) -> AppResult<FollowEdge> {
    let decode = |e: sqlx::Error| AppError::Database(format!("Malformed follow edge row: {}", e));
    Ok(FollowEdge {
        followed_by: UserId::from(row.try_get::<String, _>("followed_by").map_err(decode)?),
        follows: UserId::from(row.try_get::<String, _>("follows").map_err(decode)?),
        accepted: row.try_get("accepted").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
    })
}

fn duplicate_error(accepted: bool) -> AppError {
    let msg = if accepted {
        "Already following!"
    } else {
        "Follow request already sent!"
    };
    AppError::AlreadyExists(msg.to_string())
}

/// Constraint violations on `followers` become domain errors.
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound("User does not exist!".to_string());
        }
        if db_err.is_check_violation() {
            return AppError::InvalidOperation("Cannot follow yourself!".to_string());
        }
    }
    AppError::Database(format!("Failed to write follow edge: {}", err))
}
