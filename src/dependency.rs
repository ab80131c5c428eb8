//! Dependency tracker (spec.md §4.C): the set of in-flight translation
//! I/Os, and per-translation-page wait queues of user events blocked on
//! them.
//!
//! The in-flight set and the wait-queue map are the same `HashMap`: a TPID
//! is in flight exactly when it's a key. This makes the invariant "the
//! in-flight set and the wait-queue map have identical key sets" hold by
//! construction rather than by keeping two structures in sync by hand.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::event::{Event, TranslationPageId};

#[derive(Default)]
pub struct DependencyTracker {
    waiters: HashMap<TranslationPageId, VecDeque<Event>>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self {
            waiters: HashMap::new(),
        }
    }

    pub fn is_inflight(&self, tpid: TranslationPageId) -> bool {
        self.waiters.contains_key(&tpid)
    }

    /// Mark a mapping op in flight for `tpid` and open an empty wait queue.
    ///
    /// # Panics
    ///
    /// Panics if a mapping op is already in flight for `tpid` -- the spec
    /// treats a double in-flight op for the same TPID as a fatal
    /// structural violation, not a recoverable error.
    pub fn begin(&mut self, tpid: TranslationPageId) {
        let previous = self.waiters.insert(tpid, VecDeque::new());
        assert!(
            previous.is_none(),
            "mapping op already in flight for {}",
            tpid
        );
        trace!("dependency tracker: begin {}", tpid);
    }

    /// Append `event` to the wait queue for `tpid`.
    ///
    /// # Panics
    ///
    /// Panics if `tpid` is not currently in flight -- callers must check
    /// `is_inflight` (or have just called `begin`) first.
    pub fn attach(&mut self, tpid: TranslationPageId, event: Event) {
        let queue = self
            .waiters
            .get_mut(&tpid)
            .unwrap_or_else(|| panic!("attach to {} with no in-flight mapping op", tpid));
        queue.push_back(event);
    }

    /// Clear the in-flight flag for `tpid` and return its waiters in
    /// arrival order.
    pub fn complete(&mut self, tpid: TranslationPageId) -> Vec<Event> {
        let queue = self.waiters.remove(&tpid).unwrap_or_default();
        trace!("dependency tracker: complete {} ({} waiters)", tpid, queue.len());
        queue.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, LogicalAddress};

    fn event(la: u64) -> Event {
        Event::user(EventKind::Read, LogicalAddress(la), 0)
    }

    #[test]
    fn fifo_release_order() {
        let mut deps = DependencyTracker::new();
        let tpid = TranslationPageId(0);
        deps.begin(tpid);
        deps.attach(tpid, event(1));
        deps.attach(tpid, event(2));
        deps.attach(tpid, event(3));

        let released = deps.complete(tpid);
        let las: Vec<u64> = released.iter().map(|e| e.la.0).collect();
        assert_eq!(las, vec![1, 2, 3]);
        assert!(!deps.is_inflight(tpid));
    }

    #[test]
    fn complete_with_no_waiters_is_empty() {
        let mut deps = DependencyTracker::new();
        let tpid = TranslationPageId(4);
        deps.begin(tpid);
        assert!(deps.complete(tpid).is_empty());
    }

    #[test]
    #[should_panic(expected = "already in flight")]
    fn double_begin_panics() {
        let mut deps = DependencyTracker::new();
        let tpid = TranslationPageId(0);
        deps.begin(tpid);
        deps.begin(tpid);
    }

    #[test]
    #[should_panic(expected = "no in-flight mapping op")]
    fn attach_without_begin_panics() {
        let mut deps = DependencyTracker::new();
        deps.attach(TranslationPageId(0), event(1));
    }
}
