// Domain models: follow graph edges and the posts a feed is built from

pub mod graph_models;
pub mod post;

pub use graph_models::{FollowEdge, FollowLookup};
pub use post::{FeedEntry, Post};
