use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use serde::Deserialize;

use crate::error::{Error, Result};

/// How the checkout is exposed to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountProtocol {
    Fuse,
    Nfs,
    Prjfs,
}

impl MountProtocol {
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            MountProtocol::Prjfs
        } else {
            MountProtocol::Fuse
        }
    }
}

impl FromStr for MountProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fuse" => Ok(MountProtocol::Fuse),
            "nfs" => Ok(MountProtocol::Nfs),
            "prjfs" => Ok(MountProtocol::Prjfs),
            other => Err(Error::Config(format!("unknown mount protocol: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeCatalogType {
    Legacy,
    Sqlite,
    InMemory,
    Lmdb,
}

impl FromStr for InodeCatalogType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "legacy" => Ok(InodeCatalogType::Legacy),
            "sqlite" => Ok(InodeCatalogType::Sqlite),
            "inmemory" | "in-memory" => Ok(InodeCatalogType::InMemory),
            "lmdb" => Ok(InodeCatalogType::Lmdb),
            other => Err(Error::Config(format!("unknown inode catalog type: {}", other))),
        }
    }
}

/// On-disk shape of config.toml
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    repository: RawRepository,
    #[serde(default)]
    redirection_targets: BTreeMap<String, String>,
    recas: Option<RawRecas>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawRepository {
    path: String,
    #[serde(rename = "type")]
    repo_type: String,
    case_sensitive: Option<bool>,
    protocol: Option<String>,
    require_utf8_path: Option<bool>,
    inode_catalog_type: Option<String>,
    enable_sqlite_overlay: Option<bool>,
    use_write_back_cache: Option<bool>,
    #[cfg_attr(not(windows), allow(dead_code))]
    guid: Option<String>,
    #[cfg_attr(not(windows), allow(dead_code))]
    enable_windows_symlinks: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct RawRecas {
    use_case: Option<String>,
}

/// Repository settings of a single checkout, from its config.toml
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Where the backing repository lives
    pub repo_source: String,
    pub repo_type: String,
    pub case_sensitive: bool,
    pub mount_protocol: MountProtocol,
    pub require_utf8_path: bool,
    pub inode_catalog_type: Option<InodeCatalogType>,
    pub enable_sqlite_overlay: bool,
    pub use_write_back_cache: bool,
    pub re_use_case: Option<String>,
    /// Redirected path -> target
    pub redirection_targets: BTreeMap<String, String>,
    /// Projected filesystem virtualization id; the mount layer assigns one
    /// when absent
    #[cfg(windows)]
    pub repo_guid: Option<String>,
    #[cfg(windows)]
    pub enable_windows_symlinks: bool,
}

impl CheckoutConfig {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("loading checkout config from {:?}", path);
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let repo = raw.repository;

        // Only NFS may be chosen over the platform default; anything else,
        // including typos, falls back.
        let mount_protocol = match repo.protocol.as_deref().map(MountProtocol::from_str) {
            Some(Ok(MountProtocol::Nfs)) => MountProtocol::Nfs,
            _ => MountProtocol::platform_default(),
        };

        let inode_catalog_type = repo
            .inode_catalog_type
            .as_deref()
            .and_then(|s| s.parse().ok());

        Ok(CheckoutConfig {
            repo_source: repo.path,
            repo_type: repo.repo_type,
            case_sensitive: repo
                .case_sensitive
                .unwrap_or(!cfg!(any(windows, target_os = "macos"))),
            mount_protocol,
            require_utf8_path: repo.require_utf8_path.unwrap_or(true),
            inode_catalog_type,
            // Always on for Windows, where the key is not consulted
            enable_sqlite_overlay: cfg!(windows) || repo.enable_sqlite_overlay.unwrap_or(false),
            use_write_back_cache: repo.use_write_back_cache.unwrap_or(false),
            re_use_case: raw.recas.and_then(|r| r.use_case),
            redirection_targets: raw.redirection_targets,
            #[cfg(windows)]
            repo_guid: repo.guid,
            #[cfg(windows)]
            enable_windows_symlinks: repo.enable_windows_symlinks.unwrap_or(false),
        })
    }
}
