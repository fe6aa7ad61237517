use std::path::{Path, PathBuf};

/// Default root under which picture folders live, relative to the project.
pub const DEFAULT_ASSETS_ROOT: &str = "public/assets/images";

/// Default folder name for fixture avatars.
pub const DEFAULT_FOLDER: &str = "userPictures";

/// Default number of pictures to download.
pub const DEFAULT_COUNT: u32 = 20;

/// Errors raised when a provision request is malformed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("folder name must not be empty")]
    EmptyFolder,
    #[error("folder name must be a single path segment: {0}")]
    InvalidFolder(String),
}

/// One provision run's parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest {
    desired_count: u32,
    folder_name: String,
}

impl ProvisionRequest {
    pub fn new(desired_count: u32, folder_name: impl Into<String>) -> Result<Self, RequestError> {
        let folder_name = folder_name.into();
        validate_folder(&folder_name)?;
        Ok(Self {
            desired_count,
            folder_name,
        })
    }

    pub fn desired_count(&self) -> u32 {
        self.desired_count
    }

    pub fn folder_name(&self) -> &str {
        &self.folder_name
    }
}

impl Default for ProvisionRequest {
    fn default() -> Self {
        Self {
            desired_count: DEFAULT_COUNT,
            folder_name: DEFAULT_FOLDER.to_owned(),
        }
    }
}

/// Where picture folders are placed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLayout {
    root: PathBuf,
}

impl AssetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Destination directory for a request: `root/folder_name`.
    pub fn destination(&self, request: &ProvisionRequest) -> PathBuf {
        self.root.join(request.folder_name())
    }

    /// Destination directory for a bare folder name, validated the same way
    /// a request is.
    pub fn folder(&self, folder_name: &str) -> Result<PathBuf, RequestError> {
        validate_folder(folder_name)?;
        Ok(self.root.join(folder_name))
    }
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ASSETS_ROOT)
    }
}

/// File name a downloaded avatar is stored under. The extension is always
/// `.jfif`, whatever the remote content actually is.
pub fn picture_filename(index: u32) -> String {
    format!("{index}.jfif")
}

fn validate_folder(name: &str) -> Result<(), RequestError> {
    if name.is_empty() {
        return Err(RequestError::EmptyFolder);
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(RequestError::InvalidFolder(name.to_owned()));
    }
    Ok(())
}
