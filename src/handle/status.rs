/*!
 * Error-State Channel
 *
 * Per-handle last-error slot. Operations record their outcome here instead of
 * unwinding; callers read it back explicitly.
 */

use crate::core::errors::{ErrorKind, HandleResult};
use std::cell::Cell;

/// Last-error slot owned by a single handle
#[derive(Debug, Default)]
pub struct ErrorSlot {
    last: Cell<ErrorKind>,
}

impl ErrorSlot {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self) -> ErrorKind {
        self.last.get()
    }

    /// Write the current code into a caller-supplied slot
    #[inline]
    pub fn get_into(&self, out: &mut ErrorKind) {
        *out = self.last.get();
    }

    #[inline]
    pub fn set(&self, kind: ErrorKind) {
        self.last.set(kind);
    }

    #[inline]
    pub fn clear(&self) {
        self.last.set(ErrorKind::Ok);
    }

    /// Record the outcome of `result` and pass it through
    #[inline]
    pub fn record<T>(&self, result: HandleResult<T>) -> HandleResult<T> {
        match &result {
            Ok(_) => self.clear(),
            Err(e) => self.set(e.kind()),
        }
        result
    }

    /// Move the current code out, leaving `Ok`
    #[inline]
    pub fn take(&self) -> ErrorKind {
        self.last.replace(ErrorKind::Ok)
    }
}

impl Clone for ErrorSlot {
    fn clone(&self) -> Self {
        Self {
            last: Cell::new(self.last.get()),
        }
    }
}
