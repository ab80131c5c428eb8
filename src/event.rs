//! The event record that crosses the boundary between the DFTL and its
//! collaborators (scheduler, data FTL, block manager), plus the small
//! address/id newtypes used throughout the crate.

use std::fmt;

/// Logical address in `[0, N)`, where `N` is the number of addressable
/// pages. The top `GTD.len()` addresses are reserved for mapping I/Os
/// (see `Config::meta_la`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalAddress(pub u64);

/// Identifier of a translation page: `LA / ENTRIES_PER_TRANSLATION_PAGE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TranslationPageId(pub u64);

/// An opaque flash location. There is no "invalid" variant on this type
/// itself -- validity is expressed by wrapping it in `Option`, the way the
/// global translation directory stores `Option<PhysicalAddress>` per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicalAddress(pub u64);

impl fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "la({})", self.0)
    }
}

impl fmt::Display for TranslationPageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tpid({})", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Read,
    Write,
    Trim,
}

/// The outcome reported back to the DFTL when a scheduled event completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Failure,
}

/// A single I/O event, user-issued or mapping-internal. The DFTL only ever
/// reads/writes the fields below -- it has no notion of block layout,
/// wear-leveling, or simulated time beyond what's stamped on the event.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub la: LogicalAddress,
    /// Always 1 for mapping ops.
    pub size: u32,
    pub start_time: u64,
    pub current_time: u64,

    pub is_mapping_op: bool,
    pub is_garbage_collection_op: bool,
    pub noop: bool,
    pub is_original_application_io: bool,

    pub address: Option<PhysicalAddress>,
    pub replace_address: Option<PhysicalAddress>,
    pub tag: u32,
}

impl Event {
    /// A user-issued event. `is_original_application_io` is set so
    /// collaborators can distinguish it from a GC-internal event of the
    /// same kind.
    pub fn user(kind: EventKind, la: LogicalAddress, now: u64) -> Self {
        Self {
            kind,
            la,
            size: 1,
            start_time: now,
            current_time: now,
            is_mapping_op: false,
            is_garbage_collection_op: false,
            noop: false,
            is_original_application_io: true,
            address: None,
            replace_address: None,
            tag: 0,
        }
    }

    /// A mapping-internal read or write, addressed at `meta_la(tpid)`.
    pub fn mapping(kind: EventKind, meta_la: LogicalAddress, now: u64) -> Self {
        Self {
            kind,
            la: meta_la,
            size: 1,
            start_time: now,
            current_time: now,
            is_mapping_op: true,
            is_garbage_collection_op: false,
            noop: false,
            is_original_application_io: false,
            address: None,
            replace_address: None,
            tag: 0,
        }
    }
}
