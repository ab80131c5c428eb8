//! The DFTL coordinator (spec.md §4.D): the protocol tying the cache, the
//! GTD and the dependency tracker together, and the seam into garbage
//! collection.

use log::debug;

use crate::cmt::Cmt;
use crate::collaborators::{DataFtl, Scheduler, Stats};
use crate::config::Config;
use crate::dependency::DependencyTracker;
use crate::error::{DftlError, DftlResult};
use crate::event::{Event, EventKind, LogicalAddress, Status, TranslationPageId};
use crate::gtd::Gtd;

pub struct Dftl<S, F, T> {
    config: Config,
    cmt: Cmt,
    gtd: Gtd,
    deps: DependencyTracker,
    total_user_writes: u64,
    scheduler: S,
    data_ftl: F,
    stats: T,
}

impl<S, F, T> Dftl<S, F, T>
where
    S: Scheduler,
    F: DataFtl,
    T: Stats,
{
    pub fn new(config: Config, scheduler: S, data_ftl: F, stats: T) -> Self {
        let gtd = Gtd::new(config.gtd_size());
        let cmt = Cmt::new(config.cache_threshold);
        Self {
            config,
            cmt,
            gtd,
            deps: DependencyTracker::new(),
            total_user_writes: 0,
            scheduler,
            data_ftl,
            stats,
        }
    }

    pub fn cmt(&self) -> &Cmt {
        &self.cmt
    }

    pub fn gtd(&self) -> &Gtd {
        &self.gtd
    }

    // ---- §4.D.1 user read -------------------------------------------

    pub fn read(&mut self, mut event: Event) {
        debug_assert!(
            !self.config.is_reserved(event.la),
            "user read addressed into reserved mapping range: {}",
            event.la
        );

        if self.cmt.register_read_arrival(&event) {
            let tpid = self.config.tpid_of(event.la);
            debug!("read hit for {}", event.la);
            self.stats.record_tpid_hit(tpid);
            self.scheduler.schedule(event);
            return;
        }

        let tpid = self.config.tpid_of(event.la);
        if self.gtd.lookup(tpid).is_none() {
            debug!("read miss, {} is unmapped, scheduling as no-op", event.la);
            event.noop = true;
            self.scheduler.schedule(event);
            return;
        }

        if self.deps.is_inflight(tpid) {
            debug!("read miss, {} already in flight, parking {}", tpid, event.la);
            self.deps.attach(tpid, event);
            return;
        }

        debug!("read miss, fetching translation page for {}", tpid);
        self.create_mapping_read(tpid, event.current_time, event);
    }

    // ---- §4.D.2 user write --------------------------------------------

    pub fn write(&mut self, mut event: Event) {
        debug_assert!(
            !self.config.is_reserved(event.la),
            "user write addressed into reserved mapping range: {}",
            event.la
        );

        if self.config.separate_mapping_pages {
            event.tag = 0;
        }

        self.total_user_writes += 1;
        self.cmt.register_write_arrival(&event);
        self.scheduler.schedule(event);
    }

    // ---- §4.D.3 read completion ----------------------------------------

    pub fn register_read_completion(&mut self, event: Event, status: Status) -> DftlResult<()> {
        self.data_ftl.register_read_completion(&event, status);

        if !event.is_mapping_op {
            return Ok(());
        }

        let tpid = self.config.tpid_from_meta_la(event.la);
        let now = event.current_time;

        let waiters = self.deps.complete(tpid);
        self.release_translation_waiters(tpid, waiters);

        self.try_clear_space_in_mapping_cache(now);

        if status == Status::Failure {
            return Err(DftlError::DownstreamFailure {
                op: event.kind,
                tpid: Some(tpid),
            });
        }
        Ok(())
    }

    /// Shared by read-completion and write-completion: a drained wait
    /// queue may contain a promoted mapping write (the dependant attached
    /// in step 6 of §4.D.5) alongside ordinary user reads. Released in the
    /// order they were attached.
    fn release_translation_waiters(&mut self, tpid: TranslationPageId, waiters: Vec<Event>) {
        for waiter in waiters {
            if waiter.is_mapping_op {
                debug_assert_eq!(waiter.kind, EventKind::Write);
                self.deps.begin(tpid);
                self.schedule_mapping_write(tpid, waiter);
            } else {
                self.cmt.handle_read_dependency(&waiter);
                self.stats.record_tpid_hit(tpid);
                self.scheduler.schedule(waiter);
            }
        }
    }

    // ---- §4.D.4 write completion ---------------------------------------

    pub fn register_write_completion(&mut self, event: Event, status: Status) -> DftlResult<()> {
        self.data_ftl.register_write_completion(&event, status);

        if event.noop {
            return Ok(());
        }

        if !event.is_mapping_op {
            self.cmt.register_write_completion(&event);
            let now = event.current_time;
            self.try_clear_space_in_mapping_cache(now);
            return Ok(());
        }

        let tpid = self.config.tpid_from_meta_la(event.la);
        let now = event.current_time;

        if status == Status::Success {
            let pa = event
                .address
                .expect("successful mapping write must carry an address");
            self.gtd.install(tpid, pa);

            let mut cleaned = 0usize;
            for la in self.config.la_range(tpid) {
                if self.cmt.mark_clean(LogicalAddress(la), now) {
                    cleaned += 1;
                }
            }
            self.stats
                .record_cache_size(self.total_user_writes, self.cmt.size(), self.config.cache_threshold);
            self.stats.record_cleaned_histogram_bin(cleaned);
        }

        let waiters = self.deps.complete(tpid);
        for waiter in waiters {
            debug_assert!(!waiter.is_mapping_op && waiter.kind == EventKind::Read);
            self.cmt.handle_read_dependency(&waiter);
            self.stats.record_tpid_hit(tpid);
            self.scheduler.schedule(waiter);
        }

        if status == Status::Failure {
            return Err(DftlError::DownstreamFailure {
                op: event.kind,
                tpid: Some(tpid),
            });
        }
        Ok(())
    }

    // ---- trim (non-goal, spec.md §7) -----------------------------------

    pub fn trim(&mut self, _event: Event) -> DftlResult<()> {
        Err(DftlError::UnsupportedOp(EventKind::Trim))
    }

    pub fn register_trim_completion(&mut self, event: &Event) {
        self.data_ftl.register_trim_completion(event);
    }

    pub fn get_physical_address(&self, la: LogicalAddress) -> Option<crate::event::PhysicalAddress> {
        self.data_ftl.get_physical_address(la)
    }

    pub fn get_logical_address(&self, pa: crate::event::PhysicalAddress) -> Option<LogicalAddress> {
        self.data_ftl.get_logical_address(pa)
    }

    // ---- §4.D.5 cache pressure handling ---------------------------------

    pub fn try_clear_space_in_mapping_cache(&mut self, now: u64) {
        self.cmt.clear_clean_entries(now);
        if self.cmt.size() <= self.config.cache_threshold {
            return;
        }

        let victim = match self.cmt.choose_dirty_victim() {
            Some(la) => la,
            None => return,
        };

        let tpid = self.config.tpid_of(victim);
        if self.deps.is_inflight(tpid) {
            debug!("victim {} belongs to in-flight {}, re-queueing", victim, tpid);
            self.cmt.requeue_dirty_victim(victim);
            return;
        }

        debug!("flushing dirty victim {} ({})", victim, tpid);

        let meta_la = self.config.meta_la(tpid);
        let mut write_event = Event::mapping(EventKind::Write, meta_la, now);
        if self.config.separate_mapping_pages {
            write_event.tag = self.config.mapping_tag();
        }

        if self.gtd.lookup(tpid).is_none() {
            self.deps.begin(tpid);
            self.schedule_mapping_write(tpid, write_event);
            return;
        }

        // The dead `are_all_mapping_entries_cached` branch in the source
        // (always false, so the fast path never fires) is a latent bug,
        // not an intended policy -- spec.md §9 directs implementing the
        // straightforward check instead.
        if self.cmt.all_present(self.config.la_range(tpid)) {
            self.deps.begin(tpid);
            self.schedule_mapping_write(tpid, write_event);
        } else {
            self.create_mapping_read(tpid, now, write_event);
        }
    }

    /// Pins the TPID's resident entries and hands the mapping write to the
    /// scheduler. Shared by the direct paths in
    /// `try_clear_space_in_mapping_cache` and the promoted-waiter path in
    /// `register_read_completion`.
    fn schedule_mapping_write(&mut self, tpid: TranslationPageId, write_event: Event) {
        self.cmt.fix_range(self.config.la_range(tpid));
        self.scheduler.schedule(write_event);
    }

    /// Issues a mapping read for `tpid`, attaching `dependant` (a user read
    /// or a mapping write) to be released on its completion.
    fn create_mapping_read(&mut self, tpid: TranslationPageId, now: u64, dependant: Event) {
        let meta_la = self.config.meta_la(tpid);
        let mut read_event = Event::mapping(EventKind::Read, meta_la, now);
        read_event.address = self.gtd.lookup(tpid);
        debug_assert!(read_event.address.is_some());

        self.deps.begin(tpid);
        self.deps.attach(tpid, dependant);
        self.scheduler.schedule(read_event);
    }

    // ---- §4.D.6 garbage-collection hooks --------------------------------

    pub fn set_read_address(&mut self, event: &mut Event) {
        if event.is_mapping_op {
            let tpid = self.config.tpid_from_meta_la(event.la);
            event.address = self.gtd.lookup(tpid);
        } else if event.is_garbage_collection_op && self.config.is_reserved(event.la) {
            let tpid = self.config.tpid_from_meta_la(event.la);
            event.address = self.gtd.lookup(tpid);
            event.is_mapping_op = true;
        } else {
            self.data_ftl.set_read_address(event);
        }
    }

    pub fn set_replace_address(&mut self, event: &mut Event) {
        if event.is_mapping_op {
            let tpid = self.config.tpid_from_meta_la(event.la);
            event.replace_address = self.gtd.lookup(tpid);
            if self.config.separate_mapping_pages {
                event.tag = self.config.mapping_tag();
            }
        } else if event.is_garbage_collection_op && self.config.is_reserved(event.la) {
            let tpid = self.config.tpid_from_meta_la(event.la);
            event.replace_address = self.gtd.lookup(tpid);
            event.is_mapping_op = true;
            if self.config.separate_mapping_pages {
                event.tag = self.config.mapping_tag();
            }
        } else {
            self.data_ftl.set_replace_address(event);
        }
    }
}

impl<S, F, T> std::fmt::Debug for Dftl<S, F, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dftl")
            .field("cache_size", &self.cmt.size())
            .field("gtd_size", &self.gtd.len())
            .field("total_user_writes", &self.total_user_writes)
            .finish()
    }
}
