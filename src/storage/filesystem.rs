use std::{
    io::{self, Write},
    path::Path,
    time::Duration,
};

use tempfile::NamedTempFile;

use super::traits::{AtomicReplace, Backoff};

/// Replace a file by writing a sibling temp file and renaming it over the
/// destination (atomic on POSIX, `MoveFileEx` with replace on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct TempFileReplace;

impl AtomicReplace for TempFileReplace {
    fn replace(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        // The temp file must live on the same filesystem for rename to be atomic
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // 1. Write to temp file; dropped (and deleted) on any error below
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content)?;

        // 2. Flush to disk before it becomes visible
        temp.as_file().sync_all()?;

        // 3. Atomic rename
        temp.persist(path).map_err(|e| e.error)?;

        Ok(())
    }
}

/// Blocking sleep between attempts.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Backoff for ThreadSleep {
    fn wait(&self, _attempt: u32, delay: Duration) {
        std::thread::sleep(delay);
    }
}
