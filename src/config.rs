//! In-process configuration. Reading configuration from a file or CLI is a
//! non-goal (see the crate's top-level docs) -- this is a plain struct the
//! embedding simulator fills in and hands to [`crate::coordinator::Dftl`].

use crate::event::{LogicalAddress, TranslationPageId};

/// Tag stamped on every user write when `separate_mapping_pages` is off,
/// and on every mapping write regardless (see `Config::mapping_tag`).
const DEFAULT_TAG: u32 = 1;

#[derive(Debug, Clone)]
pub struct Config {
    /// `N`: number of addressable logical pages, not counting the reserved
    /// mapping range.
    pub n_addressable_pages: u64,
    /// `E`: entries per translation page. Default 1024.
    pub entries_per_translation_page: u64,
    /// Maximum resident CMT entries before eviction kicks in.
    pub cache_threshold: usize,
    /// Whether mapping writes are tagged separately from data writes so the
    /// block manager can steer them into disjoint block pools. Default
    /// true. Purely a layout optimization; correctness does not depend on
    /// it (spec.md §4.D.7).
    pub separate_mapping_pages: bool,
    /// Block-manager variant id that triggers the large-tag branch, if any.
    pub large_tag_variant_id: Option<u32>,
    /// The large tag value to use when `active_block_manager_variant`
    /// matches `large_tag_variant_id`.
    pub large_tag_value: u32,
    /// Which block-manager variant is actually driving this simulation.
    pub active_block_manager_variant: u32,
}

impl Config {
    pub const DEFAULT_ENTRIES_PER_TRANSLATION_PAGE: u64 = 1024;

    pub fn new(n_addressable_pages: u64, cache_threshold: usize) -> Self {
        Self {
            n_addressable_pages,
            entries_per_translation_page: Self::DEFAULT_ENTRIES_PER_TRANSLATION_PAGE,
            cache_threshold,
            separate_mapping_pages: true,
            large_tag_variant_id: None,
            large_tag_value: DEFAULT_TAG,
            active_block_manager_variant: 0,
        }
    }

    pub fn with_entries_per_translation_page(mut self, entries: u64) -> Self {
        self.entries_per_translation_page = entries;
        self
    }

    pub fn with_separate_mapping_pages(mut self, enabled: bool) -> Self {
        self.separate_mapping_pages = enabled;
        self
    }

    pub fn with_large_tag_variant(mut self, variant_id: u32, large_tag_value: u32) -> Self {
        self.large_tag_variant_id = Some(variant_id);
        self.large_tag_value = large_tag_value;
        self
    }

    /// Size of the global translation directory: `ceil(N/E) + 1`.
    pub fn gtd_size(&self) -> usize {
        let n = self.n_addressable_pages;
        let e = self.entries_per_translation_page;
        ((n + e - 1) / e) as usize + 1
    }

    /// First logical address in the reserved mapping range,
    /// `N - ceil(N/E) - 1`.
    pub fn reserved_range_start(&self) -> LogicalAddress {
        LogicalAddress(self.n_addressable_pages - self.gtd_size() as u64)
    }

    pub fn is_reserved(&self, la: LogicalAddress) -> bool {
        la.0 >= self.reserved_range_start().0
    }

    pub fn tpid_of(&self, la: LogicalAddress) -> TranslationPageId {
        TranslationPageId(la.0 / self.entries_per_translation_page)
    }

    /// `meta_la(TPID) = N - TPID`, the logical address a mapping I/O for
    /// `tpid` is injected at.
    pub fn meta_la(&self, tpid: TranslationPageId) -> LogicalAddress {
        LogicalAddress(self.n_addressable_pages - tpid.0)
    }

    /// Inverse of `meta_la`: `TPID = N - la`.
    pub fn tpid_from_meta_la(&self, la: LogicalAddress) -> TranslationPageId {
        TranslationPageId(self.n_addressable_pages - la.0)
    }

    /// The half-open range of logical addresses `[tpid*E, tpid*E + E)`
    /// covered by one translation page.
    pub fn la_range(&self, tpid: TranslationPageId) -> std::ops::Range<u64> {
        let start = tpid.0 * self.entries_per_translation_page;
        start..(start + self.entries_per_translation_page)
    }

    /// The tag mapping writes carry when `separate_mapping_pages` is on
    /// (spec.md §4.D.7): a large constant when the configured
    /// block-manager variant is active, else `1`.
    pub fn mapping_tag(&self) -> u32 {
        match self.large_tag_variant_id {
            Some(id) if id == self.active_block_manager_variant => self.large_tag_value,
            _ => DEFAULT_TAG,
        }
    }
}
