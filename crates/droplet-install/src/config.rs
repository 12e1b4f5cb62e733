use std::path::{Component, Path, PathBuf};

use droplet_fs::OwnerSpec;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 200 * 1024 * 1024;

/// Everything the pipeline needs to know about where and how to install.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallConfig {
    /// Pre-existing directory the application is installed into.
    pub target: PathBuf,
    /// File name whose presence identifies the project root.
    pub marker: String,
    /// Target-relative script that must end up executable.
    pub entry_point: PathBuf,
    /// Target-relative directories made group-writable.
    pub writable_dirs: Vec<PathBuf>,
    #[serde(deserialize_with = "deserialize_owner")]
    pub owner: OwnerSpec,
    pub max_upload_bytes: u64,
    /// Accepted upload extension, without the dot.
    pub accepted_extension: String,
    /// Parent for staging directories and stored uploads; system temp when unset.
    pub staging_root: Option<PathBuf>,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("/var/www/html"),
            marker: "artisan".to_string(),
            entry_point: PathBuf::from("artisan"),
            writable_dirs: vec![PathBuf::from("storage"), PathBuf::from("bootstrap/cache")],
            owner: OwnerSpec::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            accepted_extension: "zip".to_string(),
            staging_root: None,
        }
    }
}

impl InstallConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no install could succeed with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.marker.is_empty() || self.marker.contains('/') {
            return Err(ConfigError::Invalid(format!(
                "marker must be a bare file name, got '{}'",
                self.marker
            )));
        }
        if !is_below_target(&self.entry_point) {
            return Err(ConfigError::Invalid(format!(
                "entry_point must be a relative path inside the target, got '{}'",
                self.entry_point.display()
            )));
        }
        if let Some(dir) = self.writable_dirs.iter().find(|d| !is_below_target(d)) {
            return Err(ConfigError::Invalid(format!(
                "writable_dirs must be relative paths inside the target, got '{}'",
                dir.display()
            )));
        }
        if self.accepted_extension.is_empty() || self.accepted_extension.starts_with('.') {
            return Err(ConfigError::Invalid(
                "accepted_extension must be given without a leading dot".to_string(),
            ));
        }
        Ok(())
    }
}

/// Relative, non-empty and free of `..`.
fn is_below_target(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::Normal(_)))
        && path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

fn deserialize_owner<'de, D>(deserializer: D) -> Result<OwnerSpec, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}
