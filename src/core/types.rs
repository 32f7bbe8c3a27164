/*!
 * Core Types
 * Common types shared by handles and the external runtime boundary
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// External reference count as reported by the foreign runtime
pub type Refcount = u32;

/// Message tag on the message-passing layer
pub type Tag = i32;

/// Opaque identifier of an externally-allocated object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

/// Communication scope: the set of cooperating processes a resource lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every process in the job
    World,
    /// This process only
    SelfOnly,
    /// A sub-group of processes, identified by the runtime
    Group(u32),
}

impl Default for Scope {
    fn default() -> Self {
        Self::World
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::World => write!(f, "world"),
            Scope::SelfOnly => write!(f, "self"),
            Scope::Group(id) => write!(f, "group:{}", id),
        }
    }
}

/// Reference to a live external resource together with its scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    pub id: ResourceId,
    pub scope: Scope,
}

impl ResourceRef {
    #[inline]
    pub const fn new(id: ResourceId, scope: Scope) -> Self {
        Self { id, scope }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.scope)
    }
}
