/*!
 * Generic Ownership Handle
 *
 * Holds one external reference to a runtime resource. Copy, move, and
 * release all flow through here; kind-specific steps come from `K`.
 */

use super::kind::ResourceKind;
use super::status::ErrorSlot;
use super::traits::{ResourceHandle, SharedHandle};
use super::HandleMetadata;
use crate::core::config::HandleConfig;
use crate::core::errors::{ErrorKind, HandleError, HandleResult};
use crate::core::types::{Refcount, ResourceId, ResourceRef, Scope};
use crate::monitoring::span_operation;
use crate::runtime::ExternalRuntime;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reference-counted handle to a resource of kind `K`
///
/// # Example
///
/// ```ignore
/// let a = Handle::<DistributedMatrix>::create(runtime, Scope::World, MatrixFormat::Dense)?;
/// let b = a.try_clone()?;
/// assert_eq!(b.refcount()?, 2);
/// ```
pub struct Handle<K: ResourceKind> {
    pub(super) resource: Option<ResourceRef>,
    pub(super) state: K::State,
    pub(super) status: ErrorSlot,
    pub(super) runtime: Arc<dyn ExternalRuntime>,
    pub(super) config: HandleConfig,
    pub(super) metadata: HandleMetadata,
    _kind: PhantomData<K>,
}

impl<K: ResourceKind> Handle<K> {
    /// Allocate, register, and configure a new resource
    ///
    /// The object is configured exactly once before the handle is returned.
    /// If configuration fails the fresh object is released again.
    pub fn new(
        runtime: Arc<dyn ExternalRuntime>,
        scope: Scope,
        settings: K::Settings,
    ) -> HandleResult<Self> {
        let span = span_operation("handle.construct");
        K::check_supported()?;

        let id = runtime
            .allocate(K::name(), scope)
            .map_err(|e| HandleError::allocation(K::name(), e))?;

        let state = match K::configure(&*runtime, id, settings) {
            Ok(state) => state,
            Err(e) => {
                span.record_error(&e.to_string());
                discard_unconfigured(&*runtime, id);
                return Err(e);
            }
        };

        debug!(resource_id = %id, kind = K::name(), %scope, "Handle constructed");
        span.record_result(true);
        Ok(Self::assemble(
            Some(ResourceRef::new(id, scope)),
            state,
            runtime,
        ))
    }

    /// Wrap an existing resource, taking a new external reference
    pub fn from_reference(
        runtime: Arc<dyn ExternalRuntime>,
        resource: ResourceRef,
    ) -> HandleResult<Self> {
        K::check_supported()?;

        runtime
            .reference(resource.id)
            .map_err(|e| HandleError::runtime(Some(resource.id), e))?;

        debug!(resource_id = %resource.id, kind = K::name(), "Handle wraps existing resource");
        Ok(Self::assemble(Some(resource), K::State::default(), runtime))
    }

    fn assemble(
        resource: Option<ResourceRef>,
        state: K::State,
        runtime: Arc<dyn ExternalRuntime>,
    ) -> Self {
        let mut metadata = HandleMetadata::new(K::name());
        if let Some(r) = resource {
            metadata = metadata.with_scope(r.scope);
        }
        Self {
            resource,
            state,
            status: ErrorSlot::new(),
            runtime,
            config: HandleConfig::default(),
            metadata,
            _kind: PhantomData,
        }
    }

    /// Replace the behaviour settings
    pub fn with_config(mut self, config: HandleConfig) -> Self {
        self.config = config;
        self
    }

    #[inline]
    pub fn config(&self) -> &HandleConfig {
        &self.config
    }

    /// Copy: take another external reference to the same resource
    ///
    /// On failure `self` is left untouched.
    pub fn try_clone(&self) -> HandleResult<Self> {
        let resource = self
            .resource
            .ok_or(HandleError::NullReference { kind: K::name() })?;

        if let Err(e) = self.runtime.reference(resource.id) {
            warn!(resource_id = %resource.id, kind = K::name(), error = %e, "Copy failed to take a reference");
            return Err(HandleError::runtime(Some(resource.id), e));
        }

        debug!(resource_id = %resource.id, kind = K::name(), "Handle copied");
        Ok(Self {
            resource: Some(resource),
            state: self.state.clone(),
            status: ErrorSlot::new(),
            runtime: Arc::clone(&self.runtime),
            config: self.config,
            metadata: HandleMetadata::new(K::name()).with_scope(resource.scope),
            _kind: PhantomData,
        })
    }

    /// Move: transfer the resource and error state into a new handle
    ///
    /// `self` becomes inert; its release is a no-op. No reference is taken.
    pub fn take(&mut self) -> Self {
        if let Some(r) = self.resource {
            debug!(resource_id = %r.id, kind = K::name(), "Handle moved");
        }
        Self {
            resource: self.resource.take(),
            state: std::mem::take(&mut self.state),
            status: ErrorSlot::from(self.status.take()),
            runtime: Arc::clone(&self.runtime),
            config: self.config,
            metadata: self.metadata.clone(),
            _kind: PhantomData,
        }
    }

    /// Dereference: the underlying resource
    ///
    /// An inert handle records `NullReference` and yields `None`.
    pub fn get(&self) -> Option<ResourceRef> {
        match self.resource {
            Some(r) => {
                self.status.clear();
                Some(r)
            }
            None => {
                self.status.set(ErrorKind::NullReference);
                None
            }
        }
    }

    /// Write the resource into `out`, returning the recorded code
    pub fn get_into(&self, out: &mut Option<ResourceRef>) -> ErrorKind {
        *out = self.get();
        self.status.get()
    }

    /// Identifier of the underlying resource, if any
    #[inline]
    pub fn id(&self) -> Option<ResourceId> {
        self.get().map(|r| r.id)
    }

    /// Current external reference count
    pub fn refcount(&self) -> HandleResult<Refcount> {
        let result = match self.resource {
            Some(r) => self
                .runtime
                .reference_count(r.id)
                .map_err(|e| HandleError::runtime(Some(r.id), e)),
            None => Err(HandleError::NullReference { kind: K::name() }),
        };
        self.status.record(result)
    }

    /// Write the reference count into `out`, returning the recorded code
    pub fn refcount_into(&self, out: &mut Refcount) -> ErrorKind {
        if let Ok(count) = self.refcount() {
            *out = count;
        }
        self.status.get()
    }

    #[inline]
    pub fn get_error(&self) -> ErrorKind {
        self.status.get()
    }

    #[inline]
    pub fn get_error_into(&self, out: &mut ErrorKind) {
        self.status.get_into(out)
    }

    #[inline]
    pub fn is_inert(&self) -> bool {
        self.resource.is_none()
    }

    #[inline]
    pub fn metadata(&self) -> &HandleMetadata {
        &self.metadata
    }

    /// Run the teardown protocol now instead of at scope exit
    ///
    /// A fatal stop under `FatalPolicy::Panic` unwinds out of this call.
    pub fn release(mut self) -> ErrorKind {
        self.teardown();
        self.status.get()
    }
}

/// Undo an allocation whose configuration step failed
fn discard_unconfigured(runtime: &dyn ExternalRuntime, id: ResourceId) {
    let mut slot = Some(id);
    let result = runtime
        .dereference(id)
        .and_then(|_| runtime.free(&mut slot));
    if let Err(e) = result {
        warn!(resource_id = %id, error = %e, "Could not discard unconfigured resource");
    }
}

impl From<ErrorKind> for ErrorSlot {
    fn from(kind: ErrorKind) -> Self {
        let slot = ErrorSlot::new();
        slot.set(kind);
        slot
    }
}

impl<K: ResourceKind> ResourceHandle for Handle<K> {
    fn resource_kind(&self) -> &'static str {
        K::name()
    }

    fn metadata(&self) -> &HandleMetadata {
        &self.metadata
    }

    fn is_inert(&self) -> bool {
        self.resource.is_none()
    }

    fn last_error(&self) -> ErrorKind {
        self.status.get()
    }
}

impl<K: ResourceKind> SharedHandle for Handle<K> {
    fn ref_count(&self) -> HandleResult<Refcount> {
        self.refcount()
    }
}

impl<K: ResourceKind> fmt::Debug for Handle<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &K::name())
            .field("resource", &self.resource)
            .field("state", &self.state)
            .field("last_error", &self.status.get())
            .finish()
    }
}

impl<K: ResourceKind> Drop for Handle<K> {
    fn drop(&mut self) {
        self.teardown();
    }
}
