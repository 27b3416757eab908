//! Type definitions for penguin-metrics

mod error;
mod metrics;

pub use error::*;
pub use metrics::*;
