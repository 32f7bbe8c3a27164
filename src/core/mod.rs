/*!
 * Core Module
 * Fundamental types, configuration, limits, and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod types;

// Re-export for convenience
pub use config::{FatalPolicy, HandleConfig, ProbeScope};
pub use errors::*;
pub use types::*;
