//! Engine types
//!
//! Configuration and statistics for a sync run.

/// Configuration for sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Skip partitions whose stream skip rule applies once backfill is done
    pub is_backfilled: bool,
    /// Fail a partition once it needs more than this many pages
    pub max_pages: Option<u32>,
    /// Override every stream's page size
    pub page_size: Option<u32>,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backfill flag
    #[must_use]
    pub fn with_backfilled(mut self, is_backfilled: bool) -> Self {
        self.is_backfilled = is_backfilled;
        self
    }

    /// Set the page cap
    #[must_use]
    pub fn with_max_pages(mut self, max: Option<u32>) -> Self {
        self.max_pages = max;
        self
    }

    /// Set the page size override
    #[must_use]
    pub fn with_page_size(mut self, size: Option<u32>) -> Self {
        self.page_size = size;
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched for emitted streams
    pub pages_fetched: usize,
    /// Total streams synced
    pub streams_synced: usize,
    /// Partitions extracted to completion
    pub partitions_synced: usize,
    /// Partitions skipped by a skip rule
    pub partitions_skipped: usize,
    /// Bookmarks committed
    pub bookmarks_committed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a partition
    pub fn add_partition(&mut self) {
        self.partitions_synced += 1;
    }

    /// Add a skipped partition
    pub fn add_skipped(&mut self) {
        self.partitions_skipped += 1;
    }

    /// Add a committed bookmark
    pub fn add_commit(&mut self) {
        self.bookmarks_committed += 1;
    }

    /// Fold another run's counters into this one
    pub fn merge(&mut self, other: &SyncStats) {
        self.records_synced += other.records_synced;
        self.pages_fetched += other.pages_fetched;
        self.streams_synced += other.streams_synced;
        self.partitions_synced += other.partitions_synced;
        self.partitions_skipped += other.partitions_skipped;
        self.bookmarks_committed += other.bookmarks_committed;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
