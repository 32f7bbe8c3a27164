/*!
 * Distributed Resource Handles
 *
 * Reference-counted ownership of resources held by an external distributed
 * runtime, with a teardown protocol that never frees a resource a peer
 * process may still be using.
 */

pub mod core;
pub mod handle;
pub mod monitoring;
pub mod runtime;

// Re-exports
pub use crate::core::{
    ErrorKind, FatalPolicy, HandleConfig, HandleError, HandleResult, ProbeScope, Refcount,
    ResourceId, ResourceRef, Scope,
};
pub use handle::{
    DistributedMatrix, FatalTeardown, Handle, KindTag, MatrixFormat, MatrixHandle, ResourceHandle,
    ResourceKind, SharedHandle, Unsupported,
};
pub use monitoring::init_tracing;
pub use runtime::{ExternalRuntime, LocalRuntime, RuntimeError, RuntimeStats};
