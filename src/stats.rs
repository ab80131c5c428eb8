//! A do-nothing [`Stats`] implementation for embedders that don't need the
//! counters spec.md §6 describes. Real deployments are expected to supply
//! their own collaborator backed by whatever the simulator's statistics
//! collector already is.

use crate::collaborators::Stats;
use crate::event::TranslationPageId;

#[derive(Default)]
pub struct NullStats;

impl Stats for NullStats {
    fn record_cache_size(&mut self, _total_user_writes: u64, _cache_size: usize, _threshold: usize) {}
    fn record_cleaned_histogram_bin(&mut self, _dirty_entries_cleaned: usize) {}
    fn record_tpid_hit(&mut self, _tpid: TranslationPageId) {}
}
