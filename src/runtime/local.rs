/*!
 * Local Runtime
 *
 * In-process implementation of every external runtime contract.
 *
 * ## Features
 *
 * - **Object table**: concurrent map of live objects with their reference counts
 * - **Mailboxes**: one FIFO per communication scope, probed without blocking
 * - **Capacity limit**: allocation fails with `OutOfMemory` once the table is full
 * - **Fault injection**: one-shot failures for exercising error paths
 * - **Statistics**: allocation/free/reference counters for assertions
 */

use super::traits::{MessageProbe, ObjectAllocator, ObjectConfigure, ObjectRefcount};
use super::types::{Envelope, FaultPoint, ObjectInfo, RuntimeError, RuntimeResult, RuntimeStats};
use crate::core::limits::{DEFAULT_MAILBOX_DEPTH, DEFAULT_OBJECT_CAPACITY, INITIAL_REFCOUNT, MAX_REFCOUNT};
use crate::core::types::{Refcount, ResourceId, Scope, Tag};
use ahash::{AHashSet, RandomState};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tracing::{debug, info, trace};

#[derive(Debug)]
struct ObjectRecord {
    kind: &'static str,
    scope: Scope,
    refcount: Refcount,
    type_name: Option<String>,
    has_internal_state: bool,
}

#[derive(Debug, Default)]
struct Counters {
    allocations: AtomicU64,
    frees: AtomicU64,
    references: AtomicU64,
    dereferences: AtomicU64,
    probes: AtomicU64,
}

/// In-process external runtime
pub struct LocalRuntime {
    objects: DashMap<ResourceId, ObjectRecord, RandomState>,
    mailboxes: DashMap<Scope, VecDeque<Envelope>, RandomState>,
    next_id: AtomicU64,
    live: AtomicUsize,
    capacity: usize,
    mailbox_depth: usize,
    faults: Mutex<AHashSet<FaultPoint>>,
    counters: Counters,
}

impl LocalRuntime {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_OBJECT_CAPACITY)
    }

    /// Create a runtime holding at most `capacity` live objects
    pub fn with_capacity(capacity: usize) -> Self {
        info!(capacity, "Local runtime initialized");
        Self {
            objects: DashMap::with_hasher(RandomState::new()),
            mailboxes: DashMap::with_hasher(RandomState::new()),
            next_id: AtomicU64::new(1),
            live: AtomicUsize::new(0),
            capacity,
            mailbox_depth: DEFAULT_MAILBOX_DEPTH,
            faults: Mutex::new(AHashSet::new()),
            counters: Counters::default(),
        }
    }

    /// Arm a one-shot failure for the next call at `point`
    pub fn inject_fault(&self, point: FaultPoint) {
        debug!(?point, "Fault armed");
        self.faults.lock().insert(point);
    }

    #[inline]
    fn take_fault(&self, point: FaultPoint) -> bool {
        self.faults.lock().remove(&point)
    }

    /// Deliver a message into a scope's mailbox
    pub fn post(&self, scope: Scope, tag: Tag, payload: Vec<u8>) -> RuntimeResult<()> {
        let mut queue = self.mailboxes.entry(scope).or_default();
        if queue.len() >= self.mailbox_depth {
            return Err(RuntimeError::Failed(format!(
                "mailbox for scope {} is full ({} messages)",
                scope, self.mailbox_depth
            )));
        }
        queue.push_back(Envelope {
            scope,
            tag,
            payload,
        });
        trace!(%scope, tag, "Message posted");
        Ok(())
    }

    /// Remove and return every message pending on `scope`
    pub fn drain(&self, scope: Scope) -> Vec<Envelope> {
        self.mailboxes
            .get_mut(&scope)
            .map(|mut queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Take a reference on behalf of the runtime's own bookkeeping
    pub fn external_reference(&self, id: ResourceId) -> RuntimeResult<()> {
        debug!(resource_id = %id, "Runtime-held reference taken");
        self.reference(id)
    }

    /// Drop a reference previously taken with `external_reference`
    pub fn external_release(&self, id: ResourceId) -> RuntimeResult<Refcount> {
        debug!(resource_id = %id, "Runtime-held reference dropped");
        self.dereference(id)
    }

    /// Whether the object is still registered
    pub fn is_live(&self, id: ResourceId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Snapshot of a registered object
    pub fn object(&self, id: ResourceId) -> Option<ObjectInfo> {
        self.objects.get(&id).map(|record| ObjectInfo {
            id,
            kind: record.kind,
            scope: record.scope,
            refcount: record.refcount,
            type_name: record.type_name.clone(),
            has_internal_state: record.has_internal_state,
        })
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            allocations: self.counters.allocations.load(Ordering::Relaxed),
            frees: self.counters.frees.load(Ordering::Relaxed),
            references: self.counters.references.load(Ordering::Relaxed),
            dereferences: self.counters.dereferences.load(Ordering::Relaxed),
            probes: self.counters.probes.load(Ordering::Relaxed),
            live_objects: self.live.load(Ordering::Acquire),
        }
    }
}

impl Default for LocalRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectRefcount for LocalRuntime {
    fn reference(&self, id: ResourceId) -> RuntimeResult<()> {
        if self.take_fault(FaultPoint::Reference) {
            return Err(RuntimeError::Failed("injected reference failure".into()));
        }
        let mut record = self
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownObject(id))?;
        if record.refcount >= MAX_REFCOUNT {
            return Err(RuntimeError::RefcountOverflow(id));
        }
        record.refcount += 1;
        self.counters.references.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn dereference(&self, id: ResourceId) -> RuntimeResult<Refcount> {
        if self.take_fault(FaultPoint::Dereference) {
            return Err(RuntimeError::Failed("injected dereference failure".into()));
        }
        let mut record = self
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownObject(id))?;
        if record.refcount == 0 {
            return Err(RuntimeError::RefcountUnderflow(id));
        }
        record.refcount -= 1;
        self.counters.dereferences.fetch_add(1, Ordering::Relaxed);
        Ok(record.refcount)
    }

    fn reference_count(&self, id: ResourceId) -> RuntimeResult<Refcount> {
        if self.take_fault(FaultPoint::ReferenceCount) {
            return Err(RuntimeError::Failed("injected reference count failure".into()));
        }
        self.objects
            .get(&id)
            .map(|record| record.refcount)
            .ok_or(RuntimeError::UnknownObject(id))
    }
}

impl ObjectAllocator for LocalRuntime {
    fn allocate(&self, kind: &'static str, scope: Scope) -> RuntimeResult<ResourceId> {
        let out_of_memory = |live| RuntimeError::OutOfMemory {
            live,
            capacity: self.capacity,
        };
        if self.take_fault(FaultPoint::Allocate) {
            return Err(out_of_memory(self.live.load(Ordering::Acquire)));
        }

        // Reserve the slot before inserting so concurrent callers cannot overshoot.
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |live| {
                (live < self.capacity).then_some(live + 1)
            })
            .map_err(out_of_memory)?;

        let id = ResourceId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.objects.insert(
            id,
            ObjectRecord {
                kind,
                scope,
                refcount: INITIAL_REFCOUNT,
                type_name: None,
                has_internal_state: true,
            },
        );
        self.counters.allocations.fetch_add(1, Ordering::Relaxed);
        debug!(resource_id = %id, kind, %scope, "Object allocated");
        Ok(id)
    }

    fn free(&self, slot: &mut Option<ResourceId>) -> RuntimeResult<()> {
        let id = slot.ok_or_else(|| RuntimeError::Failed("free of a null object".into()))?;
        if self.take_fault(FaultPoint::Free) {
            return Err(RuntimeError::Failed("injected free failure".into()));
        }

        // Check and removal happen under one shard lock.
        if self.objects.remove_if(&id, |_, record| record.refcount == 0).is_none() {
            return Err(match self.objects.get(&id) {
                Some(record) => RuntimeError::Failed(format!(
                    "object {} still has {} references",
                    id, record.refcount
                )),
                None => RuntimeError::UnknownObject(id),
            });
        }
        self.live.fetch_sub(1, Ordering::AcqRel);
        self.counters.frees.fetch_add(1, Ordering::Relaxed);
        debug!(resource_id = %id, "Object freed");

        if !self.take_fault(FaultPoint::FreeKeepsSlot) {
            *slot = None;
        }
        Ok(())
    }
}

impl ObjectConfigure for LocalRuntime {
    fn set_type(&self, id: ResourceId, type_name: &str) -> RuntimeResult<()> {
        let invalid = || RuntimeError::InvalidType {
            id,
            type_name: type_name.to_string(),
        };
        if self.take_fault(FaultPoint::SetType) {
            return Err(invalid());
        }
        let mut record = self
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownObject(id))?;
        if record.type_name.is_some() {
            return Err(invalid());
        }
        record.type_name = Some(type_name.to_string());
        Ok(())
    }

    fn destroy_internal(&self, id: ResourceId) -> RuntimeResult<()> {
        if self.take_fault(FaultPoint::DestroyInternal) {
            return Err(RuntimeError::Failed("injected destroy failure".into()));
        }
        let mut record = self
            .objects
            .get_mut(&id)
            .ok_or(RuntimeError::UnknownObject(id))?;
        record.has_internal_state = false;
        Ok(())
    }
}

impl MessageProbe for LocalRuntime {
    fn probe_pending(&self, scope: Scope) -> bool {
        self.counters.probes.fetch_add(1, Ordering::Relaxed);
        self.mailboxes
            .get(&scope)
            .map(|queue| !queue.is_empty())
            .unwrap_or(false)
    }
}
