/*!
 * Handle Traits
 *
 * Core abstractions shared by resource handles
 */

use super::HandleMetadata;
use crate::core::errors::{ErrorKind, HandleResult};
use crate::core::types::Refcount;

/// Core handle trait
///
/// # Type Safety
///
/// The resource kind is fixed at compile time; unsupported kinds never
/// produce a usable handle.
pub trait ResourceHandle: Send {
    /// Resource kind name for logging/debugging
    fn resource_kind(&self) -> &'static str;

    /// Get handle metadata
    fn metadata(&self) -> &HandleMetadata;

    /// Check whether the handle was moved from or released
    fn is_inert(&self) -> bool;

    /// Outcome of the most recent operation
    fn last_error(&self) -> ErrorKind;
}

/// Handles whose resource is shared through an external reference count
pub trait SharedHandle: ResourceHandle {
    /// Current external reference count
    fn ref_count(&self) -> HandleResult<Refcount>;

    /// Check if this is the last reference
    fn is_last_ref(&self) -> bool {
        matches!(self.ref_count(), Ok(1))
    }
}
