//! Error taxonomy for the DFTL (spec.md §7).
//!
//! `MissUnmapped` is deliberately not a variant here: a read of an LA with
//! no cached entry and no GTD entry is not an error to the caller, it is
//! expressed by setting `Event::noop` and scheduling the event as usual.

use std::fmt;

use crate::event::{EventKind, TranslationPageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DftlError {
    /// `trim` was requested; this FTL does not support it.
    UnsupportedOp(EventKind),
    /// An internal invariant was violated: a double in-flight mapping op
    /// for the same TPID, a wait queue with no matching in-flight entry, or
    /// a cache entry present in more than one eviction queue. These are
    /// not expected to be reachable through the public API -- most are
    /// also defended by `assert!` at the point of violation, since the
    /// spec calls them a fatal condition rather than a recoverable one.
    StructuralViolation(String),
    /// A scheduled mapping read/write completed with a non-success status.
    /// The DFTL still drains waiters (the op is logically complete) but
    /// leaves the GTD unchanged and propagates the failure upward.
    DownstreamFailure {
        op: EventKind,
        tpid: Option<TranslationPageId>,
    },
}

impl fmt::Display for DftlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DftlError::UnsupportedOp(kind) => {
                write!(f, "unsupported operation: {:?}", kind)
            }
            DftlError::StructuralViolation(msg) => {
                write!(f, "structural violation: {}", msg)
            }
            DftlError::DownstreamFailure { op, tpid } => {
                write!(f, "downstream failure on {:?} (tpid = {:?})", op, tpid)
            }
        }
    }
}

impl std::error::Error for DftlError {}

pub type DftlResult<T> = Result<T, DftlError>;
