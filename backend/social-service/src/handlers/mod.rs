//! HTTP handlers for social-service: comments only.

pub mod comments;

pub use comments::{
    create_comment, delete_comment, like_comment, list_comments,
    service_get_root_comment_count, update_comment,
};
