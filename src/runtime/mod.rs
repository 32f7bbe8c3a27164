/*!
 * External Runtime Boundary
 *
 * Contracts of the foreign runtime that owns allocation, reference counting,
 * and message passing, plus an in-process implementation of all of them.
 */

mod local;
mod traits;
mod types;

pub use local::LocalRuntime;
pub use traits::{ExternalRuntime, MessageProbe, ObjectAllocator, ObjectConfigure, ObjectRefcount};
pub use types::{Envelope, FaultPoint, ObjectInfo, RuntimeError, RuntimeResult, RuntimeStats};
