// Crate root library declaration and module exports.
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod model;
pub mod storage;
pub mod sync;
pub mod vault;
