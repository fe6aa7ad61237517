pub mod clean;
pub mod download;
pub mod progress;
pub mod upload;
