/*!
 * Teardown Protocol
 *
 * Release sequence run when a handle leaves scope:
 *
 * 1. Inert handle: nothing to do
 * 2. Probe the message-passing layer without blocking
 * 3. Pending message: fatal, nothing is released
 * 4. Drop this handle's external reference
 * 5. Re-query the count; at zero, destroy kind state and free
 * 6. Nonzero: other holders remain, the resource stays
 *
 * Every failure inside this sequence is fatal.
 */

use super::base::Handle;
use super::kind::ResourceKind;
use crate::core::config::FatalPolicy;
use crate::core::errors::{ErrorKind, HandleError};
use crate::core::types::ResourceRef;
use std::fmt;
use tracing::{debug, error};

/// Payload carried by an unwinding fatal teardown
#[derive(Debug, Clone)]
pub struct FatalTeardown {
    pub kind: ErrorKind,
    pub resource_kind: &'static str,
    pub resource: Option<ResourceRef>,
    pub error: HandleError,
}

impl fmt::Display for FatalTeardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fatal teardown of {} handle ({}): {}",
            self.resource_kind, self.kind, self.error
        )
    }
}

impl<K: ResourceKind> Handle<K> {
    pub(super) fn teardown(&mut self) {
        // Inert from here on; a drop after an unwinding fatal stop is a no-op.
        let Some(resource) = self.resource.take() else {
            return;
        };

        let probe_scope = self.config.probe_scope.resolve(&resource);
        if self.runtime.probe_pending(probe_scope) {
            self.fatal(resource, HandleError::PendingSignal { resource });
        }

        let after_decrement = match self.runtime.dereference(resource.id) {
            Ok(count) => count,
            Err(e) => self.fatal(resource, HandleError::runtime(Some(resource.id), e)),
        };

        let remaining = match self.runtime.reference_count(resource.id) {
            Ok(count) => count,
            Err(e) => {
                // Put the reference back so the shared count stays balanced.
                if let Err(restore) = self.runtime.reference(resource.id) {
                    error!(resource_id = %resource.id, error = %restore, "Could not restore reference");
                }
                self.fatal(resource, HandleError::runtime(Some(resource.id), e));
            }
        };

        if remaining > 0 {
            debug!(
                resource_id = %resource.id,
                kind = K::name(),
                refcount = remaining,
                after_decrement,
                "Handle released, resource still referenced"
            );
            self.status.clear();
            return;
        }

        self.free_resource(resource);
    }

    fn free_resource(&self, resource: ResourceRef) {
        if let Err(e) = K::kind_specific_destroy(&*self.runtime, resource.id) {
            self.fatal(resource, HandleError::runtime(Some(resource.id), e));
        }

        let mut slot = Some(resource.id);
        match (self.runtime.free(&mut slot), slot) {
            (Ok(()), None) => {
                debug!(
                    resource_id = %resource.id,
                    kind = K::name(),
                    lifetime_micros = self.metadata.lifetime_micros(),
                    "Resource freed"
                );
                self.status.clear();
            }
            (Ok(()), Some(_)) => self.fatal(resource, HandleError::WrongState {
                resource,
                detail: "free reported success but the reference is still set".into(),
            }),
            (Err(e), None) => self.fatal(resource, HandleError::WrongState {
                resource,
                detail: format!("free failed ({}) but cleared the reference", e),
            }),
            (Err(e), Some(_)) => self.fatal(resource, HandleError::runtime(Some(resource.id), e)),
        }
    }

    /// Record the condition and stop; there is no way back from here
    fn fatal(&self, resource: ResourceRef, err: HandleError) -> ! {
        let kind = err.kind();
        self.status.set(kind);

        error!(
            %resource,
            kind = K::name(),
            code = kind.code(),
            trace_id = %self.metadata.trace_id,
            error = %err,
            "Fatal condition during handle teardown"
        );

        let report = FatalTeardown {
            kind,
            resource_kind: K::name(),
            resource: Some(resource),
            error: err,
        };

        match self.config.fatal_policy {
            FatalPolicy::Panic if !std::thread::panicking() => std::panic::panic_any(report),
            _ => std::process::abort(),
        }
    }
}
