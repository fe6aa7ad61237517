use std::collections::BTreeSet;
use std::fmt;

use crate::storage::PictureStore;

/// File names that cleanup never removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedNames(BTreeSet<String>);

impl PreservedNames {
    /// The stock placeholder pictures shipped alongside fixture folders.
    pub fn defaults() -> Self {
        Self::new(["0.svg", "0.jpg", "0.jpeg", "0.png", "0.jfif"])
    }

    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Nothing is preserved; cleanup empties the folder.
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for PreservedNames {
    fn default() -> Self {
        Self::defaults()
    }
}

/// A file that cleanup tried and failed to delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub file: String,
    pub cause: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not remove {}: {}", self.file, self.cause)
    }
}

/// What a cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<String>,
    pub kept: Vec<String>,
    pub warnings: Vec<CleanupWarning>,
}

/// Delete every file in `store` whose name is not in `preserved`.
///
/// Per-file failures are collected as warnings; only a failure to list the
/// directory is returned as an error.
pub fn clean(
    store: &dyn PictureStore,
    preserved: &PreservedNames,
) -> std::io::Result<CleanupReport> {
    let mut report = CleanupReport::default();

    for name in store.list()? {
        let file_name = name.to_string_lossy().into_owned();
        if name.to_str().is_some_and(|n| preserved.contains(n)) {
            report.kept.push(file_name);
            continue;
        }

        match store.remove(&name) {
            Ok(()) => {
                tracing::debug!(file = %file_name, "removed stale picture");
                report.removed.push(file_name);
            }
            Err(e) => {
                tracing::warn!(file = %file_name, error = %e, "could not remove stale picture");
                report.warnings.push(CleanupWarning {
                    file: file_name,
                    cause: e.to_string(),
                });
            }
        }
    }

    Ok(report)
}
