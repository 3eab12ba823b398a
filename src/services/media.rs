// Media path rewriting: stored picture names become user-scoped external paths

use crate::config::MediaConfig;
use crate::core::UserId;
use crate::models::Post;

#[derive(Debug, Clone)]
pub struct MediaPaths {
    prefix: String,
}

impl MediaPaths {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.url_prefix.clone())
    }

    /// `{prefix}/{user}/pictures/{file}`
    pub fn picture_path(&self, user: &UserId, file: &str) -> String {
        let file = file.trim_start_matches('/');
        if self.prefix.is_empty() {
            format!("{}/pictures/{}", user, file)
        } else {
            format!("{}/{}/pictures/{}", self.prefix, user, file)
        }
    }

    pub fn rewrite_post(&self, post: &mut Post) {
        let author = post.user_id.clone();
        for url in post.pictures_urls.iter_mut() {
            *url = self.picture_path(&author, url);
        }
    }
}

impl Default for MediaPaths {
    fn default() -> Self {
        Self::from_config(&MediaConfig::default())
    }
}
