//! msa-sim library
//!
//! Execution-time estimation for memory-space assignment plans: given a
//! scheduled program and the asynchronous copies a plan inserted between
//! default and alternate memory, estimate how long the program runs.

pub mod config;
pub mod cost;
pub mod error;
pub mod estimator;
pub mod program;

pub use config::Config;
pub use error::{Result, SimError};
pub use estimator::{CopyContentionTracker, TimelineEstimator};
