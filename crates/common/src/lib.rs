//! Common utilities for push-display
//!
//! This crate provides functionality shared between the streamer library,
//! its binary and the tests: logging setup, error handling, transport
//! metrics and test patterns.

pub mod error;
pub mod logging;
pub mod metrics;
pub mod pattern;
pub mod test_utils;

pub use error::{Error, Result};
pub use logging::setup_logging;
pub use metrics::{MetricsSnapshot, TransportMetrics};
pub use pattern::{PatternGenerator, PatternKind};
