//! HTTP handlers for content-service: posts, comments, and votes.

pub mod comments;
pub mod posts;
pub mod votes;

pub use comments::{
    create_comment, delete_comment, like_comment, list_comments,
    service_get_root_comment_count, update_comment,
};
pub use posts::{
    create_post, cursor_info, disable_comments, disable_sharing, generate_url_key, get_post,
    get_post_by_url_key, delete_post, query_posts, query_posts_with_cursor,
    search_posts_with_cursor, service_increment_comment_count, update_post,
};
pub use votes::{cast_vote, get_vote};
