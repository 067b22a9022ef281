//! Batch planning and per-batch fetching.

use std::ops::Range;
use std::sync::Arc;

use log::warn;

use crate::error_handling::{FetchError, FetchErrorKind};
use crate::initialization::init_semaphore;
use crate::models::CertificateRecord;
use crate::tls::{fetch_host, ChainSource};

use super::resources::RunResources;

/// Splits `total` hostnames into consecutive batches of `batch_size`.
///
/// The number of batches is `max(1, total / batch_size)` with integer division.
/// When `total < batch_size` the single batch covers the whole list (an empty
/// one for `total == 0`). Hostnames past the last full batch are not planned.
pub fn plan_batches(total: usize, batch_size: usize) -> Vec<Range<usize>> {
    let batch_size = batch_size.max(1);
    if total < batch_size {
        return vec![0..total];
    }
    (0..total / batch_size)
        .map(|i| i * batch_size..(i + 1) * batch_size)
        .collect()
}

/// Fetches every hostname of one batch concurrently and waits for all of them.
///
/// Records come back in dispatch order. A task that dies is replaced by an
/// error record for its hostname, so the batch always yields at least one
/// record per hostname.
pub(crate) async fn run_batch<S: ChainSource>(
    resources: &RunResources<S>,
    hosts: &[String],
) -> Vec<CertificateRecord> {
    let semaphore = init_semaphore(hosts.len().max(1));

    let tasks: Vec<_> = hosts
        .iter()
        .map(|host| {
            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&resources.source);
            let anchors = Arc::clone(&resources.anchors);
            let stats = Arc::clone(&resources.stats);
            let hard_timeout = resources.config.hard_timeout;
            let task_host = host.clone();
            let task = tokio::spawn(async move {
                // Hold the permit until the fetch completes
                let _permit = semaphore.acquire_owned().await.ok();
                fetch_host(source.as_ref(), &task_host, &anchors, hard_timeout, &stats).await
            });
            (host.clone(), task)
        })
        .collect();

    let mut records = Vec::with_capacity(tasks.len());
    for (host, task) in tasks {
        match task.await {
            Ok(host_records) => records.extend(host_records),
            Err(join_error) => {
                warn!("Fetch task for {host} failed: {join_error}");
                resources.stats.increment(FetchErrorKind::TaskFailed);
                let error = FetchError::TaskFailed(join_error.to_string());
                records.push(CertificateRecord::fetch_error(&host, error.to_string()));
            }
        }
    }
    records
}
