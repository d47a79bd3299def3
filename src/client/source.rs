// File: ./src/client/source.rs
//! The seam the sync routine reads tasks through.
use crate::client::error::ApiResult;
use crate::model::Task;
use async_trait::async_trait;

/// Anything that can report the current tasks of a list.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Returns the tasks of `list_id` in remote order.
    ///
    /// # Errors
    ///
    /// Any [`ApiError`](crate::client::ApiError); callers abort before
    /// touching local state.
    async fn get_tasks(&self, list_id: &str) -> ApiResult<Vec<Task>>;
}
