/*!
 * Distributed Resource Handles
 *
 * Reference-counted ownership of resources that live inside an external
 * runtime and may be shared with peer processes.
 *
 * ## Lifecycle
 *
 * - **Construct**: allocate and configure a new resource, or wrap an existing one
 * - **Copy**: `try_clone` takes another external reference
 * - **Move**: `take` transfers ownership and leaves the source inert
 * - **Release**: drop runs the teardown protocol (probe, decrement, conditional free)
 *
 * ## Example
 *
 * ```ignore
 * let runtime: Arc<dyn ExternalRuntime> = Arc::new(LocalRuntime::new());
 * let a = Handle::<DistributedMatrix>::create(runtime, Scope::World, MatrixFormat::Dense)?;
 * let b = a.try_clone()?;   // refcount 2
 * drop(a);                  // refcount 1
 * drop(b);                  // refcount 0, freed
 * ```
 */

mod base;
mod kind;
mod matrix;
mod status;
mod teardown;
mod traits;
mod unsupported;

pub use crate::core::errors::{ErrorKind, HandleError, HandleResult};
pub use base::Handle;
pub use kind::{KindTag, ResourceKind};
pub use matrix::{DistributedMatrix, MatrixFormat, MatrixHandle};
pub use status::ErrorSlot;
pub use teardown::FatalTeardown;
pub use traits::{ResourceHandle, SharedHandle};
pub use unsupported::Unsupported;

use crate::core::types::Scope;
use std::time::Instant;

/// Handle metadata for observability
#[derive(Debug, Clone)]
pub struct HandleMetadata {
    pub resource_kind: &'static str,
    pub creation_time: Instant,
    pub scope: Option<Scope>,
    pub trace_id: String,
}

impl HandleMetadata {
    #[inline]
    pub fn new(resource_kind: &'static str) -> Self {
        Self {
            resource_kind,
            creation_time: Instant::now(),
            scope: None,
            trace_id: crate::monitoring::generate_trace_id(),
        }
    }

    #[inline]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    #[inline]
    pub fn lifetime_micros(&self) -> u64 {
        self.creation_time.elapsed().as_micros() as u64
    }
}
