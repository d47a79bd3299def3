// File: ./src/client/mod.rs
pub mod core;
pub mod error;
pub mod middleware;
pub mod source;

pub use crate::client::core::{ClickUpClient, DEFAULT_API_URL};
pub use crate::client::error::{ApiError, ApiResult};
pub use crate::client::source::TaskSource;
