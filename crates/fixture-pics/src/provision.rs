use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::cleanup::{CleanupReport, PreservedNames, clean};
use crate::fetch::AvatarFetcher;
use crate::layout::picture_filename;
use crate::outcome::{FailureCause, FetchFailure, ProvisionOutcome};
use crate::progress::ProgressObserver;
use crate::storage::PictureStore;

/// Errors that make the destination unusable and abort a run.
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("could not create directory {dir}: {source}")]
    DirectoryCreation {
        dir: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not list directory {dir}: {source}")]
    Listing {
        dir: String,
        #[source]
        source: std::io::Error,
    },
}

/// Tuning for the fetch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOptions {
    /// Maximum number of fetches in flight. `1` downloads strictly in order.
    pub concurrency: usize,
    /// Extra attempts for a retryable fetch failure.
    pub retries: u32,
    pub retry_delay: Duration,
}

impl Default for ProvisionOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            retries: 0,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Replaces the pictures of one folder with freshly downloaded avatars.
pub struct Provisioner<S, F> {
    store: Arc<S>,
    fetcher: F,
    preserved: PreservedNames,
    options: ProvisionOptions,
}

impl<S: PictureStore + 'static, F: AvatarFetcher> Provisioner<S, F> {
    pub fn new(store: S, fetcher: F) -> Self {
        Self {
            store: Arc::new(store),
            fetcher,
            preserved: PreservedNames::defaults(),
            options: ProvisionOptions::default(),
        }
    }

    pub fn with_preserved(mut self, preserved: PreservedNames) -> Self {
        self.preserved = preserved;
        self
    }

    pub fn with_options(mut self, options: ProvisionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &S {
        self.store.as_ref()
    }

    /// Create the destination if needed and remove stale pictures.
    pub fn prepare(&self) -> Result<CleanupReport, ProvisionError> {
        self.store
            .ensure_dir()
            .map_err(|source| ProvisionError::DirectoryCreation {
                dir: self.store.location(),
                source,
            })?;

        clean(self.store.as_ref(), &self.preserved).map_err(|source| ProvisionError::Listing {
            dir: self.store.location(),
            source,
        })
    }

    /// Run the full pipeline: prepare the folder, then fetch and store
    /// pictures `1..=count`.
    ///
    /// Individual fetch or write failures are recorded in the outcome and do
    /// not stop the run. Once `cancel` fires, indices that have not finished
    /// are recorded as cancelled.
    pub async fn provision(
        &self,
        count: u32,
        progress: &dyn ProgressObserver,
        cancel: &CancellationToken,
    ) -> Result<ProvisionOutcome, ProvisionError> {
        let cleanup = self.prepare()?;

        tracing::info!(
            count,
            dir = %self.store.location(),
            source = self.fetcher.label(),
            removed = cleanup.removed.len(),
            "downloading pictures"
        );

        let mut outcome = ProvisionOutcome {
            requested: count,
            removed: cleanup.removed,
            cleanup_warnings: cleanup.warnings,
            ..Default::default()
        };

        progress.started(count);

        let mut results = futures::stream::iter(1..=count)
            .map(|index| self.download_one(index, cancel))
            .buffer_unordered(self.options.concurrency.max(1));

        while let Some((index, result)) = results.next().await {
            progress.advanced(index, result.is_ok());
            match result {
                Ok(()) => outcome.downloaded += 1,
                Err(cause) => {
                    tracing::warn!(index, %cause, "picture not downloaded");
                    outcome.failures.push(FetchFailure { index, cause });
                }
            }
        }

        outcome.failures.sort_by_key(|f| f.index);
        progress.completed(&outcome);

        Ok(outcome)
    }

    async fn download_one(
        &self,
        index: u32,
        cancel: &CancellationToken,
    ) -> (u32, Result<(), FailureCause>) {
        let bytes = match self.fetch_with_retries(index, cancel).await {
            Ok(bytes) => bytes,
            Err(cause) => return (index, Err(cause)),
        };

        // Disk writes run on the blocking pool.
        let name = picture_filename(index);
        let size = bytes.len();
        let store = Arc::clone(&self.store);
        let file = name.clone();
        let result = match tokio::task::spawn_blocking(move || store.write(&file, &bytes)).await {
            Ok(written) => written.map_err(|e| FailureCause::Write(e.to_string())),
            Err(join) => Err(FailureCause::Write(join.to_string())),
        };

        if result.is_ok() {
            tracing::debug!(index, file = %name, bytes = size, "stored picture");
        }

        (index, result)
    }

    async fn fetch_with_retries(
        &self,
        index: u32,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, FailureCause> {
        let mut attempt = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(FailureCause::Cancelled);
            }

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FailureCause::Cancelled),
                result = self.fetcher.fetch(index) => result,
            };

            match result {
                Ok(bytes) => return Ok(bytes),
                Err(e) if attempt < self.options.retries && e.is_retryable() => {
                    attempt += 1;
                    tracing::debug!(index, attempt, error = %e, "retrying fetch");
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(FailureCause::Cancelled),
                        _ = tokio::time::sleep(self.options.retry_delay) => {}
                    }
                }
                Err(e) => return Err(FailureCause::Fetch(e)),
            }
        }
    }
}
