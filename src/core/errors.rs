/*!
 * Error Types
 * Handle error taxonomy with thiserror, miette, and serde support
 */

use crate::core::types::{ResourceId, ResourceRef};
use crate::runtime::RuntimeError;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for handle operations
pub type HandleResult<T> = Result<T, HandleError>;

/// Outcome code stored in a handle's error-state slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[default]
    Ok,
    OutOfMemory,
    NullReference,
    UnsupportedKind,
    ExternalRuntime,
    PendingSignal,
    WrongState,
}

impl ErrorKind {
    /// Stable numeric code, zero on success
    #[inline]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::OutOfMemory => 55,
            Self::NullReference => 68,
            Self::UnsupportedKind => 56,
            Self::ExternalRuntime => 76,
            Self::PendingSignal => 59,
            Self::WrongState => 73,
        }
    }

    /// Conditions with no recovery path once they arise
    #[inline]
    pub const fn is_fatal(self) -> bool {
        matches!(
            self,
            Self::OutOfMemory | Self::PendingSignal | Self::WrongState
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::OutOfMemory => "out_of_memory",
            Self::NullReference => "null_reference",
            Self::UnsupportedKind => "unsupported_kind",
            Self::ExternalRuntime => "external_runtime",
            Self::PendingSignal => "pending_signal",
            Self::WrongState => "wrong_state",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle operation errors with miette diagnostics
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum HandleError {
    #[error("Out of memory allocating {kind}: {source}")]
    #[diagnostic(
        code(handle::out_of_memory),
        help("The external runtime could not allocate the resource. Release unused handles.")
    )]
    OutOfMemory {
        kind: &'static str,
        #[source]
        source: RuntimeError,
    },

    #[error("Dereferenced an inert {kind} handle")]
    #[diagnostic(
        code(handle::null_reference),
        help("The handle was moved from or released. Use the handle that received the resource.")
    )]
    NullReference { kind: &'static str },

    #[error("Unsupported resource kind: {kind}")]
    #[diagnostic(
        code(handle::unsupported_kind),
        help("Only resource kinds with a specialization can be constructed.")
    )]
    UnsupportedKind { kind: &'static str },

    #[error("External runtime error on {resource:?}: {source}")]
    #[diagnostic(
        code(handle::external_runtime),
        help("The foreign reference counting or allocation interface reported a failure.")
    )]
    ExternalRuntime {
        resource: Option<ResourceId>,
        #[source]
        source: RuntimeError,
    },

    #[error("Pending message on {resource} at teardown")]
    #[diagnostic(
        code(handle::pending_signal),
        help("A peer still considers this resource live. The resource was not freed.")
    )]
    PendingSignal { resource: ResourceRef },

    #[error("Wrong state after freeing {resource}: {detail}")]
    #[diagnostic(
        code(handle::wrong_state),
        help("The free call and the resource reference disagree about whether the resource exists.")
    )]
    WrongState { resource: ResourceRef, detail: String },
}

impl HandleError {
    /// Error-state code corresponding to this error
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::NullReference { .. } => ErrorKind::NullReference,
            Self::UnsupportedKind { .. } => ErrorKind::UnsupportedKind,
            Self::ExternalRuntime { .. } => ErrorKind::ExternalRuntime,
            Self::PendingSignal { .. } => ErrorKind::PendingSignal,
            Self::WrongState { .. } => ErrorKind::WrongState,
        }
    }

    #[inline]
    pub(crate) fn runtime(resource: Option<ResourceId>, source: RuntimeError) -> Self {
        Self::ExternalRuntime { resource, source }
    }

    /// Map an allocation failure, keeping out-of-memory distinct
    pub(crate) fn allocation(kind: &'static str, source: RuntimeError) -> Self {
        match source {
            RuntimeError::OutOfMemory { .. } => Self::OutOfMemory { kind, source },
            other => Self::ExternalRuntime {
                resource: None,
                source: other,
            },
        }
    }
}

impl From<&HandleError> for ErrorKind {
    fn from(err: &HandleError) -> Self {
        err.kind()
    }
}
