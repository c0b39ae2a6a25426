//! Bookmark manager
//!
//! Computes request windows for incremental partitions and commits their
//! bookmarks once extraction has finished.

use super::manager::StateManager;
use super::types::PartitionState;
use super::window::{format_bookmark, parse_bookmark, DateWindow, WindowLimits};
use crate::error::Result;
use crate::partition::PartitionContext;
use crate::streams::StreamSpec;
use chrono::{Duration, NaiveDate};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Per-run view of replication state
#[derive(Debug)]
pub struct BookmarkManager {
    state: StateManager,
    start_date: NaiveDate,
    today: NaiveDate,
    lookback_logged: AtomicBool,
}

impl BookmarkManager {
    /// Create a manager for a run happening on `today`
    pub fn new(state: StateManager, start_date: NaiveDate, today: NaiveDate) -> Self {
        Self {
            state,
            start_date,
            today,
            lookback_logged: AtomicBool::new(false),
        }
    }

    /// The run date
    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Latest date the API serves data for
    pub fn yesterday(&self) -> NaiveDate {
        self.today - Duration::days(1)
    }

    /// Underlying state store
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// First request window of a partition, or `None` when it is up to date
    ///
    /// Starts at the later of the configured start date and the partition's
    /// bookmark, moved forward into the upstream lookback limit if needed.
    pub async fn window_for(
        &self,
        stream: &StreamSpec,
        ctx: &PartitionContext,
        limits: WindowLimits,
    ) -> Result<Option<DateWindow>> {
        let yesterday = self.yesterday();
        let key = stream.state_key(ctx);

        let mut start = self.start_date;
        if let Some(raw) = self.state.bookmark(&stream.name, &key).await {
            let mut bookmark = parse_bookmark(&raw)?;
            if bookmark > yesterday {
                warn!(
                    "Bookmark {raw} for {} {ctx} is in the future, using {yesterday}",
                    stream.name
                );
                bookmark = yesterday;
            }
            start = std::cmp::max(start, bookmark);
        }

        let earliest = self.today - Duration::days(limits.lookback_days);
        if start < earliest {
            let clamped = self.today - Duration::days(limits.lookback_days - 1);
            if !self.lookback_logged.swap(true, Ordering::SeqCst) {
                warn!(
                    "Start date {start} is older than the {}-day lookback limit, starting from {clamped}",
                    limits.lookback_days
                );
            } else {
                debug!("Clamping start {start} to {clamped} for {} {ctx}", stream.name);
            }
            start = clamped;
        }

        let window = DateWindow::starting_at(start, yesterday, limits);
        if window.is_none() {
            debug!("{} {ctx} is up to date", stream.name);
        }
        Ok(window)
    }

    /// Commit the bookmark of a fully extracted partition
    ///
    /// The value is clamped to yesterday and never moves backwards. Returns
    /// `false` when the stored bookmark was already later.
    pub async fn commit(
        &self,
        stream: &StreamSpec,
        ctx: &PartitionContext,
        value: NaiveDate,
    ) -> Result<bool> {
        let Some(replication_key) = stream.replication_key.as_deref() else {
            return Ok(false);
        };

        let value = std::cmp::min(value, self.yesterday());
        let key = stream.state_key(ctx);
        let partition = PartitionState::new(
            ctx.project(stream.state_partition_keys.as_deref()),
            replication_key,
            format_bookmark(value),
        );

        let advanced = self.state.commit(&stream.name, &key, partition).await?;
        if advanced {
            info!("Committed bookmark {value} for {} {ctx}", stream.name);
        }
        Ok(advanced)
    }
}
