use std::fmt;
use std::path::{Path, PathBuf};

/// Limits an uploaded image must satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadConstraints {
    /// Maximum size in bytes.
    pub max_size: u64,
    /// Accepted content types, e.g. `image/png`.
    pub allowed_types: Vec<String>,
}

impl Default for UploadConstraints {
    fn default() -> Self {
        Self {
            max_size: 5_000_000,
            allowed_types: vec![
                "image/png".to_owned(),
                "image/jpeg".to_owned(),
                "image/jpg".to_owned(),
            ],
        }
    }
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(original_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes,
        }
    }

    /// Read a local file as if it had been uploaded.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    /// Content type sniffed from the leading bytes, if it is a known image.
    pub fn detected_type(&self) -> Option<&'static str> {
        sniff_image_type(&self.bytes)
    }
}

/// A constraint an upload broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    Empty,
    TooLarge { size: u64, max: u64 },
    NotAnImage,
    TypeNotAllowed { detected: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "the file is empty"),
            Self::TooLarge { size, max } => {
                write!(f, "the file is too large ({size} bytes, max {max})")
            }
            Self::NotAnImage => write!(f, "the file is not a valid image"),
            Self::TypeNotAllowed { detected } => {
                write!(f, "content type {detected} is not allowed")
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload rejected: {}", join_violations(.0))]
    Rejected(Vec<Violation>),

    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not store upload: {0}")]
    Store(#[from] std::io::Error),
}

impl UploadError {
    /// HTTP status a web handler should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Rejected(_) | Self::Read { .. } => 400,
            Self::Store(_) => 422,
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Check `file` against `constraints`. An empty list means the file is valid.
pub fn validate(file: &UploadedFile, constraints: &UploadConstraints) -> Vec<Violation> {
    let mut violations = Vec::new();
    let size = file.bytes.len() as u64;

    if size == 0 {
        violations.push(Violation::Empty);
        return violations;
    }

    if size > constraints.max_size {
        violations.push(Violation::TooLarge {
            size,
            max: constraints.max_size,
        });
    }

    match file.detected_type() {
        None => violations.push(Violation::NotAnImage),
        Some(detected) => {
            if !constraints.allowed_types.iter().any(|t| t == detected) {
                violations.push(Violation::TypeNotAllowed {
                    detected: detected.to_owned(),
                });
            }
        }
    }

    violations
}

/// Validates image uploads and stores them under unique names.
#[derive(Debug, Clone)]
pub struct FileUploader {
    target_dir: PathBuf,
    constraints: UploadConstraints,
}

impl FileUploader {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            constraints: UploadConstraints::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: UploadConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Validate and store the local file at `path`.
    ///
    /// The size limit is checked against the file's metadata first, so an
    /// oversized file is rejected without being read.
    pub fn upload_path(&self, path: &Path) -> Result<String, UploadError> {
        let read_error = |source| UploadError::Read {
            path: path.display().to_string(),
            source,
        };

        let size = std::fs::metadata(path).map_err(read_error)?.len();
        if size > self.constraints.max_size {
            tracing::warn!(file = %path.display(), size, "upload rejected before reading");
            return Err(UploadError::Rejected(vec![Violation::TooLarge {
                size,
                max: self.constraints.max_size,
            }]));
        }

        let file = UploadedFile::from_path(path).map_err(read_error)?;
        self.upload(&file)
    }

    /// Validate and store `file`. Returns the stored file name.
    pub fn upload(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let violations = validate(file, &self.constraints);
        if !violations.is_empty() {
            tracing::warn!(file = %file.original_name, count = violations.len(), "upload rejected");
            return Err(UploadError::Rejected(violations));
        }

        let extension = file
            .detected_type()
            .and_then(extension_for)
            .unwrap_or("bin");
        let filename = format!("{}.{extension}", uuid::Uuid::new_v4().simple());

        std::fs::create_dir_all(&self.target_dir)?;
        std::fs::write(self.target_dir.join(&filename), &file.bytes)?;

        tracing::info!(file = %file.original_name, stored = %filename, "upload stored");
        Ok(filename)
    }
}

fn sniff_image_type(bytes: &[u8]) -> Option<&'static str> {
    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n";
    const JPEG: &[u8] = b"\xff\xd8\xff";
    const GIF87: &[u8] = b"GIF87a";
    const GIF89: &[u8] = b"GIF89a";
    const BMP: &[u8] = b"BM";

    if bytes.starts_with(PNG) {
        Some("image/png")
    } else if bytes.starts_with(JPEG) {
        Some("image/jpeg")
    } else if bytes.starts_with(GIF87) || bytes.starts_with(GIF89) {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else if bytes.starts_with(BMP) {
        Some("image/bmp")
    } else {
        None
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/bmp" => Some("bmp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
    const JPEG_HEADER: &[u8] = b"\xff\xd8\xff\xe0\0\x10JFIF\0";

    fn png(len: usize) -> Vec<u8> {
        let mut bytes = PNG_HEADER.to_vec();
        bytes.resize(len.max(PNG_HEADER.len()), 0);
        bytes
    }

    #[test]
    fn sniffs_common_formats() {
        assert_eq!(sniff_image_type(PNG_HEADER), Some("image/png"));
        assert_eq!(sniff_image_type(JPEG_HEADER), Some("image/jpeg"));
        assert_eq!(sniff_image_type(b"GIF89a...."), Some("image/gif"));
        assert_eq!(sniff_image_type(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_image_type(b"hello world"), None);
    }

    #[test]
    fn valid_png_passes() {
        let file = UploadedFile::new("avatar.png", png(1024));
        assert!(validate(&file, &UploadConstraints::default()).is_empty());
    }

    #[test]
    fn empty_file_rejected() {
        let file = UploadedFile::new("empty.png", Vec::new());
        assert_eq!(validate(&file, &UploadConstraints::default()), vec![Violation::Empty]);
    }

    #[test]
    fn oversize_file_rejected() {
        let constraints = UploadConstraints {
            max_size: 100,
            ..Default::default()
        };
        let file = UploadedFile::new("big.png", png(101));
        assert_eq!(
            validate(&file, &constraints),
            vec![Violation::TooLarge { size: 101, max: 100 }]
        );
    }

    #[test]
    fn exactly_max_size_is_accepted() {
        let constraints = UploadConstraints {
            max_size: 100,
            ..Default::default()
        };
        assert!(validate(&UploadedFile::new("ok.png", png(100)), &constraints).is_empty());
    }

    #[test]
    fn non_image_rejected_even_with_image_name() {
        let file = UploadedFile::new("fake.png", b"#!/bin/sh\necho hi".to_vec());
        assert_eq!(
            validate(&file, &UploadConstraints::default()),
            vec![Violation::NotAnImage]
        );
    }

    #[test]
    fn gif_not_in_default_allow_list() {
        let file = UploadedFile::new("anim.gif", b"GIF89a\x01\0\x01\0".to_vec());
        assert_eq!(
            validate(&file, &UploadConstraints::default()),
            vec![Violation::TypeNotAllowed {
                detected: "image/gif".into()
            }]
        );
    }

    #[test]
    fn upload_stores_with_guessed_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let uploader = FileUploader::new(tmp.path().join("uploads"));
        let file = UploadedFile::new("photo.jpeg", JPEG_HEADER.to_vec());

        let name = uploader.upload(&file).unwrap();

        assert!(name.ends_with(".jpg"), "{name}");
        assert_eq!(name.len(), 32 + ".jpg".len());
        let stored = std::fs::read(tmp.path().join("uploads").join(&name)).unwrap();
        assert_eq!(stored, JPEG_HEADER);
    }

    #[test]
    fn uploads_get_distinct_names() {
        let tmp = tempfile::tempdir().unwrap();
        let uploader = FileUploader::new(tmp.path());
        let file = UploadedFile::new("a.png", png(64));

        let first = uploader.upload(&file).unwrap();
        let second = uploader.upload(&file).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn rejected_upload_maps_to_bad_request() {
        let tmp = tempfile::tempdir().unwrap();
        let uploader = FileUploader::new(tmp.path());
        let err = uploader
            .upload(&UploadedFile::new("x.txt", b"text".to_vec()))
            .unwrap_err();

        assert!(matches!(err, UploadError::Rejected(_)));
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            "upload rejected: the file is not a valid image"
        );
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn store_failure_maps_to_unprocessable() {
        let tmp = tempfile::tempdir().unwrap();
        // a regular file where the target directory should be
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, b"").unwrap();
        let uploader = FileUploader::new(&blocker);

        let err = uploader.upload(&UploadedFile::new("a.png", png(32))).unwrap_err();

        assert!(matches!(err, UploadError::Store(_)));
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn oversized_path_rejected_from_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("huge.png");
        // sparse, so nothing is actually allocated
        std::fs::File::create(&path).unwrap().set_len(6_000_000).unwrap();
        let uploader = FileUploader::new(tmp.path().join("uploads"));

        let err = uploader.upload_path(&path).unwrap_err();

        // contents were never sniffed, so only the size is reported
        match err {
            UploadError::Rejected(violations) => assert_eq!(
                violations,
                vec![Violation::TooLarge { size: 6_000_000, max: 5_000_000 }]
            ),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!tmp.path().join("uploads").exists());
    }

    #[test]
    fn upload_path_stores_valid_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("avatar.png");
        std::fs::write(&path, png(256)).unwrap();
        let uploader = FileUploader::new(tmp.path().join("uploads"));

        let name = uploader.upload_path(&path).unwrap();

        assert!(name.ends_with(".png"), "{name}");
    }

    #[test]
    fn unreadable_path_is_a_read_error() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FileUploader::new(tmp.path())
            .upload_path(&tmp.path().join("missing.png"))
            .unwrap_err();

        assert!(matches!(err, UploadError::Read { .. }));
        assert_eq!(err.status_code(), 400);
    }
}
