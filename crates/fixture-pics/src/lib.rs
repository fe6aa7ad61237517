pub mod cleanup;
pub mod entity;
pub mod fetch;
pub mod layout;
pub mod outcome;
pub mod progress;
pub mod provision;
pub mod storage;
pub mod upload;

pub use cleanup::{CleanupReport, CleanupWarning, PreservedNames, clean};
pub use entity::{DenormalizeError, EntityLookup, IdDenormalizer, LookupError};
pub use fetch::{AvatarFetcher, FetchError};
pub use layout::{AssetLayout, ProvisionRequest, RequestError, picture_filename};
pub use outcome::{FailureCause, FetchFailure, ProvisionOutcome};
pub use progress::{NoProgress, ProgressObserver};
pub use provision::{ProvisionError, ProvisionOptions, Provisioner};
pub use storage::{LocalDirStore, PictureStore};
pub use upload::{FileUploader, UploadConstraints, UploadError, UploadedFile, Violation};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
