use std::path::Path;

use anyhow::{Result, bail};
use fixture_pics::{FileUploader, UploadError};

use crate::config::AppConfig;

/// Validate a local image and store it in the configured upload directory.
pub fn run(config: &AppConfig, file: &Path) -> Result<()> {
    let uploader = FileUploader::new(&config.upload.target_dir)
        .with_constraints(config.upload_constraints());

    match uploader.upload_path(file) {
        Ok(filename) => {
            println!("Stored {}", uploader.target_dir().join(filename).display());
            Ok(())
        }
        Err(UploadError::Rejected(violations)) => {
            for violation in &violations {
                eprintln!("  - {violation}");
            }
            bail!(
                "{} was rejected ({} problem(s))",
                file.display(),
                violations.len()
            );
        }
        Err(e) => Err(e.into()),
    }
}
