//! # MyAnimeFigures Common Library
//!
//! Shared code for the MyAnimeFigures web service and its batch tools:
//! - Error type
//! - Bootstrap configuration loading
//! - Database schema initialization
//! - Timestamp helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
