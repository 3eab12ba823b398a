// Services - follow graph and feed composition over the infrastructure layer

pub mod feed_assembler;
pub mod follow_edge_store;
pub mod media;

pub use feed_assembler::{rank_feed, FeedAssembler};
pub use follow_edge_store::FollowEdgeStore;
pub use media::MediaPaths;
