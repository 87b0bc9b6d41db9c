//! # WSIS Common Library
//!
//! Shared code for the weekly safety-inspection reporting service:
//! - Report data model (WeeklyReport and friends)
//! - Static inspection taxonomy (sites, categories, subcategories)
//! - ISO reporting-week helpers
//! - Configuration resolution
//! - Error types

pub mod config;
pub mod error;
pub mod model;
pub mod taxonomy;
pub mod week;

pub use error::{Error, Result};
