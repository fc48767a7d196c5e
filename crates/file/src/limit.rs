//! A cap on store requests shared by a whole traversal.

use tokio::sync::{Semaphore, SemaphorePermit};

use crate::{FileError, Result};

/// Bounds the number of store requests in flight.
///
/// One limit is threaded through a recursive join or upload, so the bound
/// holds for the whole tree rather than for each level of it. Permits are
/// taken around single `get` and `put` calls only; a parent waiting on its
/// children holds none.
#[derive(Debug)]
pub struct RequestLimit {
    permits: Semaphore,
}

impl RequestLimit {
    /// Allows `concurrency` requests at once. 0 is treated as 1.
    pub fn new(concurrency: usize) -> Self {
        Self {
            permits: Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS)),
        }
    }

    /// Requests that may start right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub(crate) async fn acquire(&self) -> Result<SemaphorePermit<'_>> {
        self.permits
            .acquire()
            .await
            .map_err(|_| FileError::LimitClosed)
    }
}
