use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::trace;

use crate::error::Result;

/// Build a dedicated pool for one engine operation. Dropped when the
/// operation finishes, so no workers outlive it.
pub(crate) fn build_pool(workers: usize, label: &'static str) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(move |i| format!("file-scout-{}-{}", label, i))
        .build()?;
    trace!("Built {} pool with {} threads", label, workers);
    Ok(pool)
}
