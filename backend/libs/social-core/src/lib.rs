//! Shared pieces of the Posts/Comments/Votes core that cross the
//! content-service / social-service process boundary: deployment-mode
//! configuration and the `PostStatsUpdater` / `CommentCounter` RPC
//! adapters.
//!
//! Domain models, repositories, and cursor encoding are *not* here — each
//! service keeps its own copy against its own connection pool so either
//! can be deployed and scaled independently. What lives here is the
//! contract the two agree on when they're split across processes.

pub mod adapters;
pub mod deployment;

pub use adapters::{
    AdapterError, CommentCounter, PostStatsUpdater, RpcCommentCounter, RpcPostStatsUpdater,
};
pub use deployment::{DeploymentMode, HmacConfig, ServiceEndpoints};
