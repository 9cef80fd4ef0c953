//! Upload storage configuration.

use crate::{env_or_default, ConfigError, FromEnv};
use std::path::PathBuf;

/// Where uploaded files (documents, payment proofs, product media) are stored.
///
/// Loaded from environment variables:
/// - `UPLOAD_DIR`: directory for stored files (default: `uploads`)
#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub dir: PathBuf,
}

impl UploadConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Subdirectory for a given upload category (`papiers`, `payments`, `products`).
    pub fn subdir(&self, category: &str) -> PathBuf {
        self.dir.join(category)
    }
}

impl FromEnv for UploadConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            dir: PathBuf::from(env_or_default("UPLOAD_DIR", "uploads")),
        })
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_with_default() {
        temp_env::with_var_unset("UPLOAD_DIR", || {
            let config = UploadConfig::from_env().unwrap();
            assert_eq!(config.dir, PathBuf::from("uploads"));
        });
    }

    #[test]
    fn subdir_joins_category() {
        temp_env::with_var("UPLOAD_DIR", Some("/srv/files"), || {
            let config = UploadConfig::from_env().unwrap();
            assert_eq!(config.subdir("payments"), PathBuf::from("/srv/files/payments"));
        });
    }
}
