//! Database access layer: one repository module per domain entity.
//! Callers reach entity operations through the module path
//! (`db::comment_repo::find_by_id`) rather than a blanket re-export, since
//! `content-service`'s analogous repositories use the same convention and
//! several repositories across the two services share operation names.

pub mod comment_like_repo;
pub mod comment_repo;
