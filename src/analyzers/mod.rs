//! Grading, validation and aggregation.
//!
//! This module turns raw scores and class ranks into 5-level and 9-level
//! grades, averages them per term and overall, and drives the chart for the
//! overall percentile.

pub mod aggregate;
pub mod analyzer;
pub mod grade;
pub mod types;
pub mod utility;
pub mod validate;
