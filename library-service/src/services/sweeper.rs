//! Purge sweeper: destroys soft-deleted media whose grace window elapsed.

use chrono::{Duration, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use uuid::Uuid;

use crate::services::storage::Storage;
use crate::services::store::LibraryStore;

/// Pages processed per invocation, so one sweep stays bounded even when the
/// deleted set is large; the remainder is picked up by the next run.
const MAX_BATCHES_PER_SWEEP: usize = 16;

#[derive(Debug, Clone, Copy)]
pub struct SweepOutcome {
    pub purged: u64,
}

pub struct Sweeper {
    store: Arc<dyn LibraryStore>,
    storage: Arc<dyn Storage>,
    grace_days: i64,
    page_size: i64,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn LibraryStore>,
        storage: Arc<dyn Storage>,
        grace_days: i64,
        page_size: i64,
    ) -> Self {
        Self {
            store,
            storage,
            grace_days,
            page_size,
        }
    }

    /// Purge everything whose deletion aged past the grace window. Idempotent
    /// and safe to invoke concurrently: selection and deletion share the same
    /// predicate, and the store re-checks it at delete time, so entries
    /// restored after selection survive and repeated sweeps find nothing new.
    pub async fn sweep(&self) -> Result<SweepOutcome, AppError> {
        let cutoff = Utc::now() - Duration::days(self.grace_days);
        let mut purged = 0u64;

        for _ in 0..MAX_BATCHES_PER_SWEEP {
            let page = self.store.select_purgeable(cutoff, self.page_size).await?;
            if page.is_empty() {
                break;
            }

            // Artifact deletion is best-effort: a dangling blob is an
            // acceptable residual cost, an un-purged row is not.
            for candidate in &page {
                for url in &candidate.file_urls {
                    if let Err(e) = self.storage.delete_artifact(url).await {
                        tracing::warn!(
                            media_id = %candidate.media_id,
                            url = %url,
                            error = %e,
                            "Failed to delete file artifact during purge"
                        );
                    }
                }
                if let Some(cover_url) = &candidate.cover_url {
                    if let Err(e) = self.storage.delete_artifact(cover_url).await {
                        tracing::warn!(
                            media_id = %candidate.media_id,
                            url = %cover_url,
                            error = %e,
                            "Failed to delete cover artifact during purge"
                        );
                    }
                }
            }

            let ids: Vec<Uuid> = page.iter().map(|c| c.media_id).collect();
            let batch_purged = self.store.purge_media(&ids, cutoff).await?;
            purged += batch_purged;

            tracing::info!(purged = batch_purged, "Purged media batch");

            if (page.len() as i64) < self.page_size {
                break;
            }
        }

        Ok(SweepOutcome { purged })
    }
}
