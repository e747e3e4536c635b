//! # GH Copilot Common Library
//!
//! Shared code for the gh_copilot analytics tools:
//! - Error and result types
//! - Configuration resolution (flag, environment, TOML, default)
//! - SQLite connection options and the SQL migration runner
//! - Timestamp and UUID helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
