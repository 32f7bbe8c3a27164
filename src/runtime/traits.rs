/*!
 * Runtime Traits
 * Foreign contracts the handle core depends on
 */

use super::types::RuntimeResult;
use crate::core::types::{Refcount, ResourceId, Scope};

/// Object reference counting interface
pub trait ObjectRefcount: Send + Sync {
    /// Increment the object's reference count
    fn reference(&self, id: ResourceId) -> RuntimeResult<()>;

    /// Decrement the object's reference count, returning the new count
    fn dereference(&self, id: ResourceId) -> RuntimeResult<Refcount>;

    /// Current reference count
    fn reference_count(&self, id: ResourceId) -> RuntimeResult<Refcount>;
}

/// Object allocation interface
pub trait ObjectAllocator: Send + Sync {
    /// Allocate and register a new object with a reference count of one
    fn allocate(&self, kind: &'static str, scope: Scope) -> RuntimeResult<ResourceId>;

    /// Free the object in `slot`
    ///
    /// A successful free clears the slot.
    fn free(&self, slot: &mut Option<ResourceId>) -> RuntimeResult<()>;
}

/// Kind-specific configuration interface
pub trait ObjectConfigure: Send + Sync {
    /// Select the object's concrete type (storage format for matrices)
    fn set_type(&self, id: ResourceId, type_name: &str) -> RuntimeResult<()>;

    /// Destroy the runtime's internal state for the object
    fn destroy_internal(&self, id: ResourceId) -> RuntimeResult<()>;
}

/// Message-passing probe interface
pub trait MessageProbe: Send + Sync {
    /// Report whether any message is pending on `scope`
    ///
    /// Never blocks.
    fn probe_pending(&self, scope: Scope) -> bool;
}

/// Combined external runtime interface
pub trait ExternalRuntime: ObjectRefcount + ObjectAllocator + ObjectConfigure + MessageProbe {}

impl<T> ExternalRuntime for T where
    T: ObjectRefcount + ObjectAllocator + ObjectConfigure + MessageProbe
{
}
