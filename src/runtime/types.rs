/*!
 * Runtime Types
 * Error codes and records exchanged with the external runtime
 */

use crate::core::types::{ResourceId, Scope, Tag};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External runtime operation result
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Failure codes reported by the external runtime
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Diagnostic)]
#[serde(rename_all = "snake_case", tag = "error", content = "details")]
pub enum RuntimeError {
    #[error("Runtime out of memory: {live} objects live, capacity {capacity}")]
    #[diagnostic(
        code(runtime::out_of_memory),
        help("The runtime object table is full. Release unused handles or raise the capacity.")
    )]
    OutOfMemory { live: usize, capacity: usize },

    #[error("Unknown object {0}")]
    #[diagnostic(
        code(runtime::unknown_object),
        help("The object was never allocated or has already been freed.")
    )]
    UnknownObject(ResourceId),

    #[error("Reference count underflow on object {0}")]
    #[diagnostic(
        code(runtime::refcount_underflow),
        help("More releases than references were issued for this object.")
    )]
    RefcountUnderflow(ResourceId),

    #[error("Reference count overflow on object {0}")]
    #[diagnostic(code(runtime::refcount_overflow))]
    RefcountOverflow(ResourceId),

    #[error("Invalid type '{type_name}' for object {id}")]
    #[diagnostic(
        code(runtime::invalid_type),
        help("The object type was already set or is not known to the runtime.")
    )]
    InvalidType { id: ResourceId, type_name: String },

    #[error("Runtime call failed: {0}")]
    #[diagnostic(code(runtime::failed))]
    Failed(String),
}

/// One-shot failure injected into the local runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPoint {
    Allocate,
    Reference,
    Dereference,
    ReferenceCount,
    Free,
    /// Free reports success but leaves the slot populated
    FreeKeepsSlot,
    SetType,
    DestroyInternal,
}

/// Message sitting in a scope's mailbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub scope: Scope,
    pub tag: Tag,
    pub payload: Vec<u8>,
}

/// Counters kept by the local runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeStats {
    pub allocations: u64,
    pub frees: u64,
    pub references: u64,
    pub dereferences: u64,
    pub probes: u64,
    pub live_objects: usize,
}

/// Snapshot of one object in the local runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    pub id: ResourceId,
    pub kind: &'static str,
    pub scope: Scope,
    pub refcount: u32,
    pub type_name: Option<String>,
    pub has_internal_state: bool,
}
