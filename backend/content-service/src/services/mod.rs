//! Business logic layer for content-service: post, comment, and vote
//! services sitting between the HTTP handlers and the repository layer.

pub mod comments;
pub mod posts;
pub mod votes;

pub use comments::CommentService;
pub use posts::PostService;
pub use votes::VoteService;
