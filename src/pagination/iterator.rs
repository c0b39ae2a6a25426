//! Page iterator
//!
//! Drives one partition of one stream through every page, lazily.

use super::extract::{extract_records, extract_token};
use super::types::{Cursor, CursorStrategy, Page};
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::partition::PartitionContext;
use crate::state::DateWindow;
use crate::streams::StreamSpec;
use crate::template;
use crate::types::Record;
use chrono::NaiveDate;
use futures::stream::{self, Stream, TryStreamExt};
use tracing::debug;

/// Lazy, finite iterator over the pages of one partition
///
/// Not restartable mid-page: to resume, build a new iterator starting at a
/// cursor.
#[derive(Debug, Clone)]
pub struct PageIterator<'a> {
    client: &'a HttpClient,
    stream: &'a StreamSpec,
    ctx: &'a PartitionContext,
    yesterday: NaiveDate,
    start: Option<Cursor>,
    max_pages: Option<u32>,
    page_size: u32,
}

struct IterState<'a> {
    iter: PageIterator<'a>,
    cursor: Option<Cursor>,
    pages: u32,
    done: bool,
}

impl<'a> PageIterator<'a> {
    /// Create an iterator for one partition
    pub fn new(
        client: &'a HttpClient,
        stream: &'a StreamSpec,
        ctx: &'a PartitionContext,
        yesterday: NaiveDate,
    ) -> Self {
        Self {
            client,
            stream,
            ctx,
            yesterday,
            start: None,
            max_pages: None,
            page_size: stream.page_size(),
        }
    }

    /// Start from a cursor instead of the first page
    #[must_use]
    pub fn starting_at(mut self, cursor: Option<Cursor>) -> Self {
        self.start = cursor;
        self
    }

    /// Fail once more than `max` pages would be fetched
    #[must_use]
    pub fn max_pages(mut self, max: Option<u32>) -> Self {
        self.max_pages = max;
        self
    }

    /// Override the page size
    #[must_use]
    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Stream of pages
    ///
    /// Ends when a page has no next cursor. A next cursor equal to the
    /// current one, or exceeding `max_pages`, ends it with
    /// `Error::StalledPagination`.
    pub fn pages(self) -> impl Stream<Item = Result<Page>> + 'a {
        let done = matches!(self.stream.cursor, CursorStrategy::DateWindow(_))
            && !matches!(self.start, Some(Cursor::WindowStart(_)));
        let init = IterState {
            cursor: self.start.clone(),
            iter: self,
            pages: 0,
            done,
        };

        stream::try_unfold(init, |mut st| async move {
            if st.done {
                return Ok(None);
            }

            if let Some(max) = st.iter.max_pages {
                if st.pages >= max {
                    return Err(Error::StalledPagination {
                        stream: st.iter.stream.name.clone(),
                        cursor: st
                            .cursor
                            .as_ref()
                            .map(ToString::to_string)
                            .unwrap_or_default(),
                    });
                }
            }

            let Some(page) = st.iter.fetch(st.cursor.as_ref()).await? else {
                return Ok(None);
            };
            st.pages += 1;

            match &page.next {
                Some(next) if st.cursor.as_ref() == Some(next) => {
                    return Err(Error::StalledPagination {
                        stream: st.iter.stream.name.clone(),
                        cursor: next.to_string(),
                    });
                }
                Some(next) => st.cursor = Some(next.clone()),
                None => st.done = true,
            }

            Ok::<_, Error>(Some((page, st)))
        })
    }

    /// Stream of records, in page order
    pub fn records(self) -> impl Stream<Item = Result<Record>> + 'a {
        self.pages()
            .map_ok(|page| stream::iter(page.records.into_iter().map(Ok::<Record, Error>)))
            .try_flatten()
    }

    /// Fetch one page; `None` when a date cursor lies past yesterday
    async fn fetch(&self, cursor: Option<&Cursor>) -> Result<Option<Page>> {
        let window = match (&self.stream.cursor, cursor) {
            (CursorStrategy::DateWindow(limits), Some(Cursor::WindowStart(start))) => {
                match DateWindow::starting_at(*start, self.yesterday, *limits) {
                    Some(window) => Some(window),
                    None => return Ok(None),
                }
            }
            _ => None,
        };

        let path = template::render(&self.stream.path_template, self.ctx)?;

        let mut request = RequestConfig::new().overrides(self.stream.overrides.clone());
        request.query = self.stream.params.build(self.page_size, window.as_ref());
        if let (CursorStrategy::BodyToken { param, .. }, Some(Cursor::Bookmark(token))) =
            (&self.stream.cursor, cursor)
        {
            request.query.insert(param.clone(), token.clone());
        }

        debug!(
            "Fetching {} page for {} (cursor: {})",
            self.stream.name,
            self.ctx,
            cursor.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
        );

        let response = self.client.get_json(&path, &request).await?;
        let records = extract_records(&response.body, &self.stream.records_path)?;

        let next = match &self.stream.cursor {
            CursorStrategy::BodyToken {
                path,
                header_fallback,
                ..
            } => extract_token(
                &response.body,
                path,
                &response.headers,
                header_fallback.as_deref(),
            )?
            .map(Cursor::Bookmark),
            CursorStrategy::DateWindow(_) => window
                .and_then(|w| w.next_start(self.yesterday))
                .map(Cursor::WindowStart),
        };

        Ok(Some(Page {
            cursor: cursor.cloned(),
            window,
            records,
            next,
        }))
    }
}
