use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::UserId;

/// A post as supplied by the post collaborator. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "picturesURLs", default)]
    pub pictures_urls: Vec<String>,
}

/// A post tagged with whether its author is the viewer or one of the viewer's
/// followees. Lives for a single feed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub post: Post,
    pub is_priority: bool,
}
