//! Seams to the collaborators spec.md §1 and §4.E name but deliberately
//! keep out of this crate's scope: the event scheduler, the page-level
//! data FTL, and the statistics collector. The block manager has no trait
//! here -- per spec.md §4.E it only consumes the `tag` field the
//! coordinator stamps on write events, so there is nothing for the
//! coordinator to call.

use crate::event::{Event, LogicalAddress, PhysicalAddress, Status, TranslationPageId};

/// Inserts an event into simulated time.
pub trait Scheduler {
    fn schedule(&mut self, event: Event);
}

/// The underlying page-level FTL that performs data address allocation.
/// Out of scope for this crate (spec.md §1); represented here only by the
/// hooks the DFTL calls into.
pub trait DataFtl {
    fn register_read_completion(&mut self, event: &Event, status: Status);
    fn register_write_completion(&mut self, event: &Event, status: Status);
    fn register_trim_completion(&mut self, event: &Event);
    fn get_physical_address(&self, la: LogicalAddress) -> Option<PhysicalAddress>;
    fn get_logical_address(&self, pa: PhysicalAddress) -> Option<LogicalAddress>;
    fn set_read_address(&mut self, event: &mut Event);
    fn set_replace_address(&mut self, event: &mut Event);
}

/// Counters for cache size, dirty-entries-flushed-per-mapping-write
/// histogram, and per-TPID hit counts (spec.md §6).
pub trait Stats {
    fn record_cache_size(&mut self, total_user_writes: u64, cache_size: usize, threshold: usize);
    fn record_cleaned_histogram_bin(&mut self, dirty_entries_cleaned: usize);
    fn record_tpid_hit(&mut self, tpid: TranslationPageId);
}
