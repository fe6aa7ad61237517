use std::path::{Path, PathBuf};
use std::time::Duration;

use fixture_pics::layout::DEFAULT_ASSETS_ROOT;
use fixture_pics::{AssetLayout, PreservedNames, ProvisionOptions, UploadConstraints};
use fixture_pics_http::PravatarConfig;
use serde::{Deserialize, Serialize};

/// Project-local config file, checked before the user config.
const LOCAL_CONFIG_FILE: &str = "fixture-pics.toml";

/// Top-level application configuration. Every key is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub assets_root: PathBuf,
    pub preserved_names: Vec<String>,
    pub avatar: AvatarSection,
    pub download: DownloadSection,
    pub upload: UploadSection,
}

/// Remote avatar service settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AvatarSection {
    pub base_url: Option<String>,
    pub size: u32,
    pub timeout_secs: u64,
}

/// Fetch loop settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadSection {
    pub concurrency: usize,
    pub retries: u32,
    pub retry_delay_ms: u64,
}

/// Upload helper settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadSection {
    pub target_dir: PathBuf,
    pub max_size: u64,
    pub allowed_types: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: PathBuf::from(DEFAULT_ASSETS_ROOT),
            preserved_names: PreservedNames::defaults().iter().map(str::to_owned).collect(),
            avatar: AvatarSection::default(),
            download: DownloadSection::default(),
            upload: UploadSection::default(),
        }
    }
}

impl Default for AvatarSection {
    fn default() -> Self {
        let defaults = PravatarConfig::default();
        Self {
            base_url: defaults.base_url,
            size: defaults.size,
            timeout_secs: defaults.timeout.as_secs(),
        }
    }
}

impl Default for DownloadSection {
    fn default() -> Self {
        let defaults = ProvisionOptions::default();
        Self {
            concurrency: defaults.concurrency,
            retries: defaults.retries,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
        }
    }
}

impl Default for UploadSection {
    fn default() -> Self {
        let defaults = UploadConstraints::default();
        Self {
            target_dir: PathBuf::from("public/images/uploads"),
            max_size: defaults.max_size,
            allowed_types: defaults.allowed_types,
        }
    }
}

impl AppConfig {
    pub fn layout(&self) -> AssetLayout {
        AssetLayout::new(&self.assets_root)
    }

    pub fn preserved(&self) -> PreservedNames {
        PreservedNames::new(self.preserved_names.iter().cloned())
    }

    pub fn pravatar_config(&self) -> PravatarConfig {
        PravatarConfig {
            base_url: self.avatar.base_url.clone(),
            size: self.avatar.size,
            timeout: Duration::from_secs(self.avatar.timeout_secs.max(1)),
        }
    }

    pub fn provision_options(&self) -> ProvisionOptions {
        ProvisionOptions {
            concurrency: self.download.concurrency.max(1),
            retries: self.download.retries,
            retry_delay: Duration::from_millis(self.download.retry_delay_ms),
        }
    }

    pub fn upload_constraints(&self) -> UploadConstraints {
        UploadConstraints {
            max_size: self.upload.max_size,
            allowed_types: self.upload.allowed_types.clone(),
        }
    }
}

/// User config file path: `~/.config/fixture-pics/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fixture-pics").join("config.toml"))
}

/// Candidate config files, most specific first.
fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
    paths.extend(config_path());
    paths
}

fn load_from(path: &Path) -> Option<AppConfig> {
    let contents = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<AppConfig>(&contents) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            Some(config)
        }
        Err(e) => {
            eprintln!(
                "warning: failed to parse config at {}, using defaults: {e}",
                path.display()
            );
            Some(AppConfig::default())
        }
    }
}

/// Load config from the first file found, falling back to defaults.
pub fn load_config() -> AppConfig {
    candidate_paths()
        .iter()
        .find_map(|path| load_from(path))
        .unwrap_or_default()
}
