use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use crate::error::{Error, Result};

/// Mount path -> client name, kept in the state directory
const CLIENT_DIRECTORY_MAP: &str = "config.json";
const CLIENTS_DIR: &str = "clients";

/// Load the mount path -> client name map.
///
/// A missing or empty file is an empty map. The file may carry `//` and
/// `/* */` comments and trailing commas.
pub fn load_client_directory_map(state_dir: &Path) -> Result<BTreeMap<String, String>> {
    let path = state_dir.join(CLIENT_DIRECTORY_MAP);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(e.into()),
    };

    if content.is_empty() {
        return Ok(BTreeMap::new());
    }

    Ok(json5::from_str(&content)?)
}

/// Client directory registered for `mount_path`
pub fn resolve_client_dir(state_dir: &Path, mount_path: &Path) -> Result<PathBuf> {
    let map = load_client_directory_map(state_dir)?;
    let key = mount_path.to_string_lossy();
    let client = map.get(key.as_ref()).ok_or_else(|| {
        Error::Config(format!("no checkout is registered for {}", mount_path.display()))
    })?;
    Ok(state_dir.join(CLIENTS_DIR).join(client))
}
