#![forbid(unsafe_code)]

pub mod config;
pub mod dedup;
pub mod errors;
pub mod model;
pub mod secrets;
pub mod server;
pub mod slack;
pub mod state;
pub mod storage;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
