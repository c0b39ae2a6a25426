//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! `SyncEngine` walks the selected streams in declared order. For each
//! stream it resolves partitions by replaying the parent chain, computes the
//! first date window of incremental partitions, pages through every window,
//! shapes and emits records, and commits the partition's bookmark only once
//! its last page has been consumed. Any error aborts the run; bookmarks of
//! partitions that already finished stay committed.

mod types;

pub use types::{SyncConfig, SyncStats};

use crate::error::Result;
use crate::http::HttpClient;
use crate::output::{Message, MessageSink};
use crate::pagination::{Cursor, PageIterator};
use crate::partition::{PartitionContext, PartitionResolver, RecordSource};
use crate::schema::stream_schema;
use crate::state::{parse_bookmark, BookmarkManager};
use crate::streams::{Catalog, StreamSpec};
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use chrono::NaiveDate;
use futures::TryStreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Stream definitions
    catalog: Catalog,
    /// Replication state for this run
    bookmarks: BookmarkManager,
    /// Output destination
    sink: Arc<dyn MessageSink>,
    /// Sync configuration
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(
        client: HttpClient,
        catalog: Catalog,
        bookmarks: BookmarkManager,
        sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            client,
            catalog,
            bookmarks,
            sink,
            config: SyncConfig::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the catalog
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the bookmark manager
    pub fn bookmarks(&self) -> &BookmarkManager {
        &self.bookmarks
    }

    /// Sync the selected streams (all streams when `selected` is empty)
    ///
    /// Emits the final state once every stream has finished.
    pub async fn run(&self, selected: &[String]) -> Result<SyncStats> {
        let start = Instant::now();
        let streams = self.catalog.select(selected)?;
        let mut stats = SyncStats::new();

        for stream in streams {
            let stream_stats = self.sync_stream(stream).await?;
            stats.merge(&stream_stats);
        }

        self.emit_state().await?;

        #[allow(clippy::cast_possible_truncation)]
        stats.set_duration(start.elapsed().as_millis() as u64);

        info!(
            "Sync finished: {} streams, {} records, {} pages in {}ms",
            stats.streams_synced, stats.records_synced, stats.pages_fetched, stats.duration_ms
        );

        Ok(stats)
    }

    /// Sync every partition of one stream
    pub async fn sync_stream(&self, stream: &StreamSpec) -> Result<SyncStats> {
        let mut stats = SyncStats::new();

        let bookmark_properties = stream.replication_key.iter().cloned().collect();
        self.sink.emit(&Message::schema(
            &stream.name,
            stream_schema(stream),
            stream.primary_key.clone(),
            bookmark_properties,
        ))?;

        let resolver = PartitionResolver::new(&self.catalog, self);
        let partitions = resolver.resolve(stream).await?;
        info!(
            "Starting sync for stream: {} ({} partitions)",
            stream.name,
            partitions.len()
        );

        for ctx in &partitions {
            if stream.should_skip(ctx, self.config.is_backfilled) {
                info!("Skipping inactive partition {} of {}", ctx, stream.name);
                stats.add_skipped();
                continue;
            }
            self.sync_partition(stream, ctx, &mut stats).await?;
        }

        stats.add_stream();
        info!(
            "Completed sync for {}: {} records, {} pages, {} partitions ({} skipped)",
            stream.name,
            stats.records_synced,
            stats.pages_fetched,
            stats.partitions_synced,
            stats.partitions_skipped
        );

        Ok(stats)
    }

    /// Extract one partition to exhaustion, then commit its bookmark
    async fn sync_partition(
        &self,
        stream: &StreamSpec,
        ctx: &PartitionContext,
        stats: &mut SyncStats,
    ) -> Result<()> {
        let Some(start) = self.start_cursor(stream, ctx).await? else {
            return Ok(());
        };

        let mut pages = std::pin::pin!(self.iterator(stream, ctx).starting_at(start).pages());
        let mut latest: Option<NaiveDate> = None;

        while let Some(page) = pages.try_next().await? {
            stats.add_page();
            stats.add_records(page.records.len());

            for raw in page.records {
                let record = stream.shape(raw);
                if let Some(value) = replication_value(stream, &record)? {
                    latest = latest.max(Some(value));
                }
                self.sink.emit(&Message::record(&stream.name, record))?;
            }
        }

        stats.add_partition();

        if let Some(value) = latest {
            if self.bookmarks.commit(stream, ctx, value).await? {
                stats.add_commit();
                self.emit_state().await?;
            }
        }

        Ok(())
    }

    /// Cursor an extraction starts from
    ///
    /// `Ok(None)` means the partition is up to date and nothing is fetched.
    async fn start_cursor(
        &self,
        stream: &StreamSpec,
        ctx: &PartitionContext,
    ) -> Result<Option<Option<Cursor>>> {
        let Some(limits) = stream.cursor.window_limits() else {
            return Ok(Some(None));
        };

        Ok(self
            .bookmarks
            .window_for(stream, ctx, limits)
            .await?
            .map(|window| {
                debug!("First window for {} {}: {}", stream.name, ctx, window);
                Some(Cursor::WindowStart(window.start))
            }))
    }

    fn iterator<'a>(&'a self, stream: &'a StreamSpec, ctx: &'a PartitionContext) -> PageIterator<'a> {
        let iter = PageIterator::new(&self.client, stream, ctx, self.bookmarks.yesterday())
            .max_pages(self.config.max_pages);
        match self.config.page_size {
            Some(size) => iter.page_size(size),
            None => iter,
        }
    }

    async fn emit_state(&self) -> Result<()> {
        let state = self.bookmarks.state().snapshot().await;
        self.sink.emit(&Message::state(state))
    }
}

#[async_trait]
impl RecordSource for SyncEngine {
    async fn collect(&self, stream: &StreamSpec, ctx: &PartitionContext) -> Result<Vec<Record>> {
        let Some(start) = self.start_cursor(stream, ctx).await? else {
            return Ok(Vec::new());
        };
        self.iterator(stream, ctx)
            .starting_at(start)
            .records()
            .try_collect()
            .await
    }
}

/// Replication-key value of a shaped record, as a date
fn replication_value(stream: &StreamSpec, record: &Record) -> Result<Option<NaiveDate>> {
    let Some(key) = stream.replication_key.as_deref() else {
        return Ok(None);
    };
    match record.get(key) {
        Some(JsonValue::String(value)) => parse_bookmark(value).map(Some),
        _ => Ok(None),
    }
}
