//! Probe module for health checks.
//!
//! Probes classify outcomes into Samples instead of returning errors: a
//! failed check is data for the pipeline, never a crash for the caller.

mod db;
mod http;

pub use db::*;
pub use http::*;

use thiserror::Error;

/// Probe error types. Only construction can fail; probing itself always
/// yields a Sample.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("invalid probe configuration: {0}")]
    Config(String),
}
