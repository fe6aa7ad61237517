use anyhow::{Context, Result};
use fixture_pics::{LocalDirStore, PictureStore, clean};

use crate::config::AppConfig;

/// Remove every non-default picture from a folder without downloading new ones.
pub fn run(config: &AppConfig, folder_name: &str) -> Result<()> {
    let dir = config.layout().folder(folder_name)?;
    let store = LocalDirStore::new(&dir);

    store
        .ensure_dir()
        .with_context(|| format!("could not create {}", dir.display()))?;

    let report = clean(&store, &config.preserved())
        .with_context(|| format!("could not list {}", dir.display()))?;

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }

    println!(
        "Removed {} picture(s) from {} ({} default(s) kept).",
        report.removed.len(),
        dir.display(),
        report.kept.len()
    );

    Ok(())
}
