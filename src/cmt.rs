//! Cached Mapping Table (spec.md §4.A): the resident portion of the
//! logical-to-physical map, with clean/dirty state, hotness, and the two
//! eviction queues.
//!
//! Clean, dirty and fixed are modeled as one state per entry rather than
//! as membership in separate containers the caller must keep in sync --
//! the "preferred design" spec.md §9 calls out over the dual-queue
//! confusion the source sometimes exhibits. `fixed` entries are skipped in
//! place during `choose_dirty_victim` and rotated to the back of the dirty
//! queue, never removed mid-scan.

use std::collections::{HashMap, VecDeque};

use log::{debug, trace};

use crate::event::{Event, LogicalAddress};

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub dirty: bool,
    pub fixed: bool,
    pub hotness: u32,
    pub last_access: u64,
}

impl CacheEntry {
    fn new(dirty: bool, now: u64) -> Self {
        Self {
            dirty,
            fixed: false,
            hotness: 0,
            last_access: now,
        }
    }
}

pub struct Cmt {
    entries: HashMap<LogicalAddress, CacheEntry>,
    clean_queue: VecDeque<LogicalAddress>,
    dirty_queue: VecDeque<LogicalAddress>,
    threshold: usize,
}

impl Cmt {
    pub fn new(threshold: usize) -> Self {
        Self {
            entries: HashMap::new(),
            clean_queue: VecDeque::new(),
            dirty_queue: VecDeque::new(),
            threshold,
        }
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, la: LogicalAddress) -> bool {
        self.entries.contains_key(&la)
    }

    pub fn get(&self, la: LogicalAddress) -> Option<&CacheEntry> {
        self.entries.get(&la)
    }

    /// Returns true iff the entry for `event.la` is resident. On a hit,
    /// bumps hotness and touches recency.
    pub fn register_read_arrival(&mut self, event: &Event) -> bool {
        match self.entries.get_mut(&event.la) {
            Some(entry) => {
                entry.hotness += 1;
                entry.last_access = event.current_time;
                trace!("cmt: read hit {} (hotness {})", event.la, entry.hotness);
                true
            }
            None => false,
        }
    }

    /// Ensures an entry exists for `event.la`, marks it dirty, and enqueues
    /// it into the dirty eviction queue if it is newly present. Writes to
    /// an already-dirty entry count as a hit and bump hotness. A write to a
    /// previously clean entry moves it back from the clean queue to the
    /// dirty queue -- every entry sits in exactly one queue.
    pub fn register_write_arrival(&mut self, event: &Event) {
        match self.entries.get_mut(&event.la) {
            Some(entry) => {
                entry.hotness += 1;
                entry.last_access = event.current_time;
                if !entry.dirty {
                    entry.dirty = true;
                    if let Some(pos) = self.clean_queue.iter().position(|x| *x == event.la) {
                        self.clean_queue.remove(pos);
                    }
                    self.dirty_queue.push_back(event.la);
                }
            }
            None => {
                self.entries
                    .insert(event.la, CacheEntry::new(true, event.current_time));
                self.dirty_queue.push_back(event.la);
                trace!("cmt: new dirty entry for {}", event.la);
            }
        }
    }

    /// A user write completing makes no structural change to the table --
    /// the entry stays dirty until `mark_clean` runs at mapping-write
    /// completion.
    pub fn register_write_completion(&mut self, _event: &Event) {}

    /// Called when a user read has just unblocked due to a mapping fetch.
    /// Guarantees the entry is present (inserting a clean one if it wasn't
    /// already) and counts as a hit thereafter.
    pub fn handle_read_dependency(&mut self, event: &Event) {
        match self.entries.get_mut(&event.la) {
            Some(entry) => {
                entry.hotness += 1;
                entry.last_access = event.current_time;
            }
            None => {
                self.entries
                    .insert(event.la, CacheEntry::new(false, event.current_time));
                self.clean_queue.push_back(event.la);
            }
        }
    }

    /// If an entry for `la` exists and is dirty, clears `dirty` and
    /// `fixed`, moves it from the dirty to the clean queue, and returns
    /// `true`. A second call on the same (now clean) entry is a no-op that
    /// returns `false`.
    pub fn mark_clean(&mut self, la: LogicalAddress, now: u64) -> bool {
        let was_dirty = match self.entries.get_mut(&la) {
            Some(entry) if entry.dirty => {
                entry.dirty = false;
                entry.fixed = false;
                entry.last_access = now;
                true
            }
            _ => false,
        };

        if was_dirty {
            if let Some(pos) = self.dirty_queue.iter().position(|x| *x == la) {
                self.dirty_queue.remove(pos);
            }
            self.clean_queue.push_back(la);
        }

        was_dirty
    }

    /// Drains the clean eviction queue, removing entries from the table,
    /// until either the queue is empty or the table is at or below
    /// `threshold`.
    pub fn clear_clean_entries(&mut self, _now: u64) {
        while self.entries.len() > self.threshold {
            match self.clean_queue.pop_front() {
                Some(la) => {
                    self.entries.remove(&la);
                    debug!("cmt: evicted clean entry {}", la);
                }
                None => break,
            }
        }
    }

    /// Returns an LA to flush next, without removing it from the dirty
    /// queue, or `None` if the dirty queue is empty or every entry in it is
    /// fixed. Fixed entries encountered along the way are rotated to the
    /// back of the queue.
    pub fn choose_dirty_victim(&mut self) -> Option<LogicalAddress> {
        let scan_len = self.dirty_queue.len();
        for _ in 0..scan_len {
            let la = *self.dirty_queue.front()?;
            let fixed = self.entries.get(&la).map_or(false, |e| e.fixed);
            if fixed {
                self.dirty_queue.rotate_left(1);
                continue;
            }
            return Some(la);
        }
        None
    }

    /// Moves `la` (expected to currently sit at the front of the dirty
    /// queue, as left there by `choose_dirty_victim`) to the back, because
    /// its TPID already has a mapping op in flight.
    pub fn requeue_dirty_victim(&mut self, la: LogicalAddress) {
        if let Some(pos) = self.dirty_queue.iter().position(|x| *x == la) {
            self.dirty_queue.remove(pos);
        }
        self.dirty_queue.push_back(la);
    }

    /// Pins every dirty entry in `range` against eviction for the duration
    /// of an in-flight mapping writeback covering them (spec.md §9: "fixed
    /// ⇒ dirty", set when the mapping write is scheduled, cleared by
    /// `mark_clean`).
    pub fn fix_range(&mut self, range: std::ops::Range<u64>) {
        for la in range {
            if let Some(entry) = self.entries.get_mut(&LogicalAddress(la)) {
                if entry.dirty {
                    entry.fixed = true;
                }
            }
        }
    }

    /// Whether every LA in `range` is currently resident in the cache.
    pub fn all_present(&self, range: std::ops::Range<u64>) -> bool {
        range.into_iter().all(|la| self.entries.contains_key(&LogicalAddress(la)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;

    fn read(la: u64, now: u64) -> Event {
        Event::user(EventKind::Read, LogicalAddress(la), now)
    }

    fn write(la: u64, now: u64) -> Event {
        Event::user(EventKind::Write, LogicalAddress(la), now)
    }

    #[test]
    fn write_then_read_is_a_hit() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(5, 0));
        assert!(cmt.register_read_arrival(&read(5, 1)));
        assert_eq!(cmt.size(), 1);
        assert!(cmt.get(LogicalAddress(5)).unwrap().dirty);
    }

    #[test]
    fn read_miss_on_empty_cache() {
        let mut cmt = Cmt::new(10);
        assert!(!cmt.register_read_arrival(&read(5, 0)));
    }

    #[test]
    fn idempotent_mark_clean() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(5, 0));
        assert!(cmt.mark_clean(LogicalAddress(5), 1));
        assert!(!cmt.mark_clean(LogicalAddress(5), 2));
        assert!(!cmt.get(LogicalAddress(5)).unwrap().dirty);
    }

    #[test]
    fn clear_clean_entries_respects_threshold() {
        let mut cmt = Cmt::new(1);
        cmt.register_write_arrival(&write(1, 0));
        cmt.mark_clean(LogicalAddress(1), 0);
        cmt.register_write_arrival(&write(2, 0));
        cmt.mark_clean(LogicalAddress(2), 0);
        assert_eq!(cmt.size(), 2);

        cmt.clear_clean_entries(0);
        assert_eq!(cmt.size(), 1);
        assert!(cmt.contains(LogicalAddress(2)));
    }

    #[test]
    fn choose_dirty_victim_skips_fixed_entries() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(1, 0));
        cmt.register_write_arrival(&write(2, 0));
        cmt.fix_range(1..2); // fix only la=1

        assert_eq!(cmt.choose_dirty_victim(), Some(LogicalAddress(2)));
    }

    #[test]
    fn choose_dirty_victim_none_when_all_fixed() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(1, 0));
        cmt.fix_range(1..2);

        assert_eq!(cmt.choose_dirty_victim(), None);
    }

    #[test]
    fn fixed_implies_dirty_is_preserved_by_mark_clean() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(1, 0));
        cmt.fix_range(1..2);
        assert!(cmt.get(LogicalAddress(1)).unwrap().fixed);

        cmt.mark_clean(LogicalAddress(1), 1);
        let entry = cmt.get(LogicalAddress(1)).unwrap();
        assert!(!entry.dirty);
        assert!(!entry.fixed);
    }

    #[test]
    fn rewriting_a_clean_entry_moves_it_back_to_the_dirty_queue() {
        let mut cmt = Cmt::new(10);
        cmt.register_write_arrival(&write(1, 0));
        cmt.mark_clean(LogicalAddress(1), 1);
        assert!(!cmt.get(LogicalAddress(1)).unwrap().dirty);

        cmt.register_write_arrival(&write(1, 2));
        assert!(cmt.get(LogicalAddress(1)).unwrap().dirty);
        assert_eq!(cmt.choose_dirty_victim(), Some(LogicalAddress(1)));
    }
}
