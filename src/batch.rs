// Bounded concurrent batches. A stage hands over its items and a per-item
// async operation; at most `limit` operations run at the same time and the
// first failure ends the batch.

use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use std::future::Future;

/// Run `op` over every item with at most `limit` operations in flight.
///
/// Returns once every operation has succeeded, or with the first error. On
/// error the operations still in flight are dropped; effects of operations
/// that already completed are kept. A `limit` of 0 is treated as 1.
pub async fn run_batch<T, F, Fut>(items: Vec<T>, limit: usize, op: F) -> Result<()>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    stream::iter(items)
        .map(Ok)
        .try_for_each_concurrent(limit.max(1), op)
        .await
}

/// Same as [`run_batch`], advancing `progress` after each completed item.
pub async fn run_batch_with_progress<T, F, Fut>(
    items: Vec<T>,
    limit: usize,
    progress: &ProgressBar,
    op: F,
) -> Result<()>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let op = &op;
    let result = run_batch(items, limit, |item| async move {
        op(item).await?;
        progress.inc(1);
        Ok::<(), anyhow::Error>(())
    })
    .await;
    if result.is_ok() {
        progress.finish_and_clear();
    } else {
        progress.abandon();
    }
    result
}
