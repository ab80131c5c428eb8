//! Shared fixtures for the end-to-end scenarios in `dftl_test.rs`: a
//! `setup()` that wires up logging once per process, plus fake
//! collaborators standing in for the scheduler, the data-path FTL and the
//! statistics collector.
//!
//! The fakes hold their state behind `Rc<RefCell<_>>` so a test can keep a
//! handle to the same queue/counters after handing a clone of the fake to
//! `Dftl::new` (which takes its collaborators by value). A real embedder
//! doesn't need this -- its scheduler and stats collector are ordinary
//! objects it already owns and queries directly.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Once;

use dftl::{
    DataFtl, Event, LogicalAddress, PhysicalAddress, Scheduler, Status, Stats, TranslationPageId,
};

static INIT: Once = Once::new();

/// Sets up env_logger once per test binary.
pub fn setup() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

#[derive(Clone, Default)]
pub struct FakeScheduler(Rc<RefCell<VecDeque<Event>>>);

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pop(&self) -> Option<Event> {
        self.0.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Scheduler for FakeScheduler {
    fn schedule(&mut self, event: Event) {
        self.0.borrow_mut().push_back(event);
    }
}

/// A data-path FTL double that just counts calls and hands out
/// sequentially increasing physical addresses. Good enough for exercising
/// the DFTL coordinator, which never inspects the return values for
/// reserved-range events itself.
#[derive(Default)]
struct FakeDataFtlInner {
    read_completions: u32,
    write_completions: u32,
    trim_completions: u32,
    next_pa: u64,
}

#[derive(Clone, Default)]
pub struct FakeDataFtl(Rc<RefCell<FakeDataFtlInner>>);

impl FakeDataFtl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_completions(&self) -> u32 {
        self.0.borrow().read_completions
    }

    pub fn write_completions(&self) -> u32 {
        self.0.borrow().write_completions
    }
}

impl DataFtl for FakeDataFtl {
    fn register_read_completion(&mut self, _event: &Event, _status: Status) {
        self.0.borrow_mut().read_completions += 1;
    }

    fn register_write_completion(&mut self, _event: &Event, _status: Status) {
        self.0.borrow_mut().write_completions += 1;
    }

    fn register_trim_completion(&mut self, _event: &Event) {
        self.0.borrow_mut().trim_completions += 1;
    }

    fn get_physical_address(&self, _la: LogicalAddress) -> Option<PhysicalAddress> {
        None
    }

    fn get_logical_address(&self, _pa: PhysicalAddress) -> Option<LogicalAddress> {
        None
    }

    fn set_read_address(&mut self, event: &mut Event) {
        let mut inner = self.0.borrow_mut();
        event.address = Some(PhysicalAddress(inner.next_pa));
        inner.next_pa += 1;
    }

    fn set_replace_address(&mut self, event: &mut Event) {
        let mut inner = self.0.borrow_mut();
        event.replace_address = Some(PhysicalAddress(inner.next_pa));
        inner.next_pa += 1;
    }
}

#[derive(Default)]
struct FakeStatsInner {
    cache_size_samples: Vec<(u64, usize, usize)>,
    cleaned_histogram: Vec<usize>,
    tpid_hits: Vec<TranslationPageId>,
}

#[derive(Clone, Default)]
pub struct FakeStats(Rc<RefCell<FakeStatsInner>>);

impl FakeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tpid_hits(&self) -> Vec<TranslationPageId> {
        self.0.borrow().tpid_hits.clone()
    }

    pub fn cleaned_histogram(&self) -> Vec<usize> {
        self.0.borrow().cleaned_histogram.clone()
    }
}

impl Stats for FakeStats {
    fn record_cache_size(&mut self, total_user_writes: u64, cache_size: usize, threshold: usize) {
        self.0
            .borrow_mut()
            .cache_size_samples
            .push((total_user_writes, cache_size, threshold));
    }

    fn record_cleaned_histogram_bin(&mut self, dirty_entries_cleaned: usize) {
        self.0.borrow_mut().cleaned_histogram.push(dirty_entries_cleaned);
    }

    fn record_tpid_hit(&mut self, tpid: TranslationPageId) {
        self.0.borrow_mut().tpid_hits.push(tpid);
    }
}

/// `E=4, CACHE_THRESHOLD=3, N=16` -- the parameters spec.md §8's
/// end-to-end scenarios are written against.
pub fn scenario_config() -> dftl::Config {
    dftl::Config::new(16, 3).with_entries_per_translation_page(4)
}

pub fn user_read(la: u64, now: u64) -> Event {
    Event::user(dftl::EventKind::Read, LogicalAddress(la), now)
}

pub fn user_write(la: u64, now: u64) -> Event {
    Event::user(dftl::EventKind::Write, LogicalAddress(la), now)
}
