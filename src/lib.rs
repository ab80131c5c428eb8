//! Demand-based flash translation layer.
//!
//! A [`Dftl`] owns the cached mapping table, the global translation
//! directory and the dependency tracker, and drives the single-threaded,
//! cooperative event protocol tying them together: user reads and writes
//! that miss the cache are routed through the same event pipeline as
//! ordinary page I/O by encoding translation-page IDs into the reserved
//! tail of the logical address space (see [`Config::meta_la`]).
//!
//! The crate has no scheduler, data-path FTL or statistics collector of
//! its own -- embedders supply those through the [`Scheduler`],
//! [`DataFtl`] and [`Stats`] traits.

mod cmt;
mod collaborators;
mod config;
mod coordinator;
mod dependency;
mod error;
mod event;
mod gtd;
mod stats;

pub use cmt::{CacheEntry, Cmt};
pub use collaborators::{DataFtl, Scheduler, Stats};
pub use config::Config;
pub use coordinator::Dftl;
pub use dependency::DependencyTracker;
pub use error::{DftlError, DftlResult};
pub use event::{Event, EventKind, LogicalAddress, PhysicalAddress, Status, TranslationPageId};
pub use gtd::Gtd;
pub use stats::NullStats;
