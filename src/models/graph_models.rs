use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::UserId;

/// Directed follow relationship. `(followed_by, follows)` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowEdge {
    /// The initiator of the request.
    pub followed_by: UserId,
    /// The target of the request.
    pub follows: UserId,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

impl FollowEdge {
    pub fn pending(followed_by: UserId, follows: UserId, created_at: DateTime<Utc>) -> Self {
        Self {
            followed_by,
            follows,
            accepted: false,
            created_at,
        }
    }
}

/// Result of a follow query. A pair lookup yields at most one edge; a
/// one-sided lookup yields every matching edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FollowLookup {
    Single(Option<FollowEdge>),
    Many(Vec<FollowEdge>),
}

impl FollowLookup {
    pub fn into_edges(self) -> Vec<FollowEdge> {
        match self {
            FollowLookup::Single(edge) => edge.into_iter().collect(),
            FollowLookup::Many(edges) => edges,
        }
    }
}
