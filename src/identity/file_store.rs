//! TOML-file credential store.
//!
//! Credentials live in a TOML file adjacent to the engine configuration,
//! one `[credentials]` table mapping credential id to a hex-encoded
//! private key:
//!
//! ```toml
//! [credentials]
//! deployer = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318"
//! ```
//!
//! The file is re-read on every resolution, so a key rotated between
//! configuration time and execution time is picked up without a restart.

use super::{IdentityError, IdentityResolver, IdentityResult, SigningIdentity};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: BTreeMap<String, String>,
}

/// Identity resolver backed by a TOML credentials file.
#[derive(Debug, Clone)]
pub struct FileIdentityResolver {
    path: PathBuf,
}

impl FileIdentityResolver {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the backing credentials file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> IdentityResult<CredentialsFile> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            IdentityError::Store(format!(
                "failed to read credentials file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        toml::from_str(&contents).map_err(|e| {
            IdentityError::Store(format!(
                "failed to parse credentials file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl IdentityResolver for FileIdentityResolver {
    fn resolve(&self, id: &str) -> IdentityResult<SigningIdentity> {
        let file = self.load()?;
        let key_hex = file
            .credentials
            .get(id)
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;

        SigningIdentity::from_hex(id, key_hex)
    }
}
