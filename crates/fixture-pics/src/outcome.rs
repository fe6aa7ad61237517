use std::fmt;

use crate::cleanup::CleanupWarning;
use crate::fetch::FetchError;

/// Why a single index did not produce a picture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    Fetch(FetchError),
    /// Fetched fine, but the bytes could not be written.
    Write(String),
    /// The run was cancelled before this index completed.
    Cancelled,
}

impl fmt::Display for FailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(e) => write!(f, "fetch failed: {e}"),
            Self::Write(msg) => write!(f, "write failed: {msg}"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub index: u32,
    pub cause: FailureCause,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}: {}", self.index, self.cause)
    }
}

/// Result of one provision run.
///
/// Every requested index is accounted for exactly once: it is either counted
/// in `downloaded` or listed in `failures`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub requested: u32,
    pub downloaded: u32,
    /// Sorted by index.
    pub failures: Vec<FetchFailure>,
    /// Files deleted during cleanup.
    pub removed: Vec<String>,
    pub cleanup_warnings: Vec<CleanupWarning>,
}

impl ProvisionOutcome {
    /// True when every requested picture was downloaded and cleanup was clean.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.cleanup_warnings.is_empty()
    }

    pub fn failed_indices(&self) -> Vec<u32> {
        self.failures.iter().map(|f| f.index).collect()
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let noun = if self.downloaded == 1 { "picture" } else { "pictures" };
        if self.failures.is_empty() {
            format!("{} {noun} successfully downloaded", self.downloaded)
        } else {
            format!(
                "{} {noun} successfully downloaded ({} of {} failed)",
                self.downloaded,
                self.failures.len(),
                self.requested
            )
        }
    }
}
