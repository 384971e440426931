use std::{io, path::Path, time::Duration};

/// All-or-nothing replacement of a file's contents.
///
/// Implementations must guarantee that a reader of `path` sees either the
/// previous contents or `content` in full, never a mix or a truncated file,
/// including when this returns an error.
pub trait AtomicReplace {
    fn replace(&self, path: &Path, content: &[u8]) -> io::Result<()>;
}

/// Delay between write attempts.
/// Split out so tests can exercise retry exhaustion without sleeping.
pub trait Backoff {
    /// Called after failed attempt number `attempt` (1-based), before the next one
    fn wait(&self, attempt: u32, delay: Duration);
}

impl<T: AtomicReplace + ?Sized> AtomicReplace for &T {
    fn replace(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        (**self).replace(path, content)
    }
}

impl<T: Backoff + ?Sized> Backoff for &T {
    fn wait(&self, attempt: u32, delay: Duration) {
        (**self).wait(attempt, delay)
    }
}
