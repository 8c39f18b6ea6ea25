//! # WIS Common Library
//!
//! Shared code for the work item service including:
//! - Canonical work item, payload and baseline models
//! - Wire records returned by the release ticket service and the legacy tracker
//! - The `ResolutionError` status/message pair used as every failure arm
//! - Configuration loading
//! - Timestamp parsing helpers

pub mod config;
pub mod error;
pub mod models;
pub mod resolution;
pub mod time;

pub use error::{Error, Result};
pub use resolution::{Resolution, ResolutionError, StatusClass};

/// Work item identity as issued by both backends
pub type WorkItemId = i32;
