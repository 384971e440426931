//! Files of interest in a checkout's client directory

mod checkout_config;
mod directory_map;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

pub use checkout_config::{CheckoutConfig, InodeCatalogType, MountProtocol};
pub use directory_map::{load_client_directory_map, resolve_client_dir};

use crate::{
    checkout::CheckoutStateStore,
    error::Result,
    storage::{DurableWriter, RetryPolicy},
};

const SNAPSHOT_FILE: &str = "SNAPSHOT";
const OVERLAY_DIR: &str = "local";
const CHECKOUT_CONFIG_FILE: &str = "config.toml";
const INTENTIONALLY_UNMOUNTED_FILE: &str = "intentionally-unmounted";

/// A mounted checkout and the private directory holding its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDirectory {
    mount_path: PathBuf,
    client_dir: PathBuf,
}

impl ClientDirectory {
    pub fn new<M: AsRef<Path>, C: AsRef<Path>>(mount_path: M, client_dir: C) -> Self {
        Self {
            mount_path: mount_path.as_ref().to_path_buf(),
            client_dir: client_dir.as_ref().to_path_buf(),
        }
    }

    pub fn mount_path(&self) -> &Path {
        &self.mount_path
    }

    pub fn client_dir(&self) -> &Path {
        &self.client_dir
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.client_dir.join(SNAPSHOT_FILE)
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.client_dir.join(OVERLAY_DIR)
    }

    pub fn config_path(&self) -> PathBuf {
        self.client_dir.join(CHECKOUT_CONFIG_FILE)
    }

    /// State store for this checkout's SNAPSHOT file
    pub fn state_store(&self, policy: RetryPolicy) -> CheckoutStateStore {
        CheckoutStateStore::with_writer(self.snapshot_path(), DurableWriter::new(policy))
    }

    pub fn load_checkout_config(&self) -> Result<CheckoutConfig> {
        CheckoutConfig::load(&self.config_path())
    }

    /// Set when the user unmounted on purpose, so nothing remounts it
    pub fn is_intentionally_unmounted(&self) -> bool {
        self.client_dir.join(INTENTIONALLY_UNMOUNTED_FILE).exists()
    }

    pub fn clear_intentionally_unmounted_flag(&self) -> Result<()> {
        match fs::remove_file(self.client_dir.join(INTENTIONALLY_UNMOUNTED_FILE)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
