//! Partition resolution
//!
//! Expands a stream's parent chain into the list of contexts its own
//! extraction runs under, by replaying every ancestor's extraction.

use super::types::PartitionContext;
use crate::error::Result;
use crate::streams::{Catalog, StreamSpec};
use crate::types::Record;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use tracing::debug;

/// Something that can drive a stream's extraction for one partition
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Page through the stream under `ctx` and collect every record
    async fn collect(&self, stream: &StreamSpec, ctx: &PartitionContext) -> Result<Vec<Record>>;
}

/// Resolves partition contexts by replaying parent streams
pub struct PartitionResolver<'a> {
    catalog: &'a Catalog,
    source: &'a dyn RecordSource,
}

impl<'a> PartitionResolver<'a> {
    /// Create a resolver over a catalog
    pub fn new(catalog: &'a Catalog, source: &'a dyn RecordSource) -> Self {
        Self { catalog, source }
    }

    /// Resolve the contexts for `stream`
    ///
    /// A root stream gets a single global context. A child stream gets one
    /// context per parent record, in the order the parent returned them.
    pub fn resolve<'b>(
        &'b self,
        stream: &'b StreamSpec,
    ) -> BoxFuture<'b, Result<Vec<PartitionContext>>> {
        async move {
            let Some(parent_name) = stream.parent.as_deref() else {
                return Ok(vec![PartitionContext::new()]);
            };

            let parent = self.catalog.get(parent_name)?;
            let parent_contexts = self.resolve(parent).await?;

            let mut contexts = Vec::new();
            for parent_ctx in &parent_contexts {
                let records = self.source.collect(parent, parent_ctx).await?;
                for record in &records {
                    contexts.push(parent.child_context.project(&parent.name, record)?);
                }
            }

            debug!(
                "Resolved {} partitions for '{}' from parent '{}'",
                contexts.len(),
                stream.name,
                parent.name
            );

            Ok(contexts)
        }
        .boxed()
    }
}
