use std::{path::Path, time::Duration};

use tracing::{debug, warn};

use super::{
    filesystem::{TempFileReplace, ThreadSleep},
    traits::{AtomicReplace, Backoff},
};
use crate::error::{Error, Result};

/// How many times a durable write is attempted, and how long to wait in
/// between.
///
/// Retrying absorbs transient interference such as a virus scanner briefly
/// holding the file open exclusively. Persistent failures still surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (0 is treated as 1)
    pub attempts: u32,
    /// Delay between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(1),
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single attempt, no retry
    pub fn no_retry() -> Self {
        Self {
            attempts: 1,
            ..Default::default()
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Writes a whole buffer to a fixed path atomically, retrying on failure.
///
/// The retry delay blocks the calling thread.
#[derive(Debug, Clone)]
pub struct DurableWriter<R = TempFileReplace, B = ThreadSleep> {
    replace: R,
    backoff: B,
    policy: RetryPolicy,
}

impl DurableWriter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_parts(TempFileReplace, ThreadSleep, policy)
    }
}

impl Default for DurableWriter {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl<R: AtomicReplace, B: Backoff> DurableWriter<R, B> {
    pub fn with_parts(replace: R, backoff: B, policy: RetryPolicy) -> Self {
        Self {
            replace,
            backoff,
            policy,
        }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Replace the contents of `path` with `content`.
    ///
    /// On error the file still holds whatever it held before the call.
    pub fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        let attempts = self.policy.attempts.max(1);

        for attempt in 1..attempts {
            match self.replace.replace(path, content) {
                Ok(()) => {
                    debug!(path = %path.display(), attempt, "wrote {} bytes", content.len());
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        attempt,
                        error = %e,
                        "write failed, retrying"
                    );
                    self.backoff.wait(attempt, self.policy.delay);
                }
            }
        }

        self.replace.replace(path, content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "write failed after {} attempts", attempts);
            Error::Io(e)
        })?;
        debug!(path = %path.display(), attempt = attempts, "wrote {} bytes", content.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        fs, io,
        io::Write,
    };

    use tempfile::{NamedTempFile, TempDir};

    use super::*;

    /// Fails the first `failures` calls, then delegates to the real replace.
    /// Failing calls leave a half-written temp file behind them to make sure
    /// nothing partial reaches the destination.
    struct FlakyReplace {
        failures: u32,
        calls: Cell<u32>,
    }

    impl FlakyReplace {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: Cell::new(0),
            }
        }
    }

    impl AtomicReplace for FlakyReplace {
        fn replace(&self, path: &Path, content: &[u8]) -> io::Result<()> {
            let call = self.calls.get() + 1;
            self.calls.set(call);
            if call <= self.failures {
                let mut temp = NamedTempFile::new_in(path.parent().unwrap())?;
                temp.write_all(&content[..content.len() / 2])?;
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "sharing violation",
                ));
            }
            TempFileReplace.replace(path, content)
        }
    }

    #[derive(Default)]
    struct RecordingBackoff {
        waits: RefCell<Vec<(u32, Duration)>>,
    }

    impl Backoff for RecordingBackoff {
        fn wait(&self, attempt: u32, delay: Duration) {
            self.waits.borrow_mut().push((attempt, delay));
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new().with_delay(Duration::from_secs(3600))
    }

    #[test]
    fn test_transient_failure_is_retried() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SNAPSHOT");
        fs::write(&path, b"old contents").unwrap();

        let replace = FlakyReplace::new(2);
        let backoff = RecordingBackoff::default();
        let writer = DurableWriter::with_parts(&replace, &backoff, policy());

        writer.write_atomic(&path, b"new contents").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"new contents");
        assert_eq!(replace.calls.get(), 3);
        assert_eq!(
            *backoff.waits.borrow(),
            vec![(1, Duration::from_secs(3600)), (2, Duration::from_secs(3600))]
        );
    }

    #[test]
    fn test_persistent_failure_keeps_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SNAPSHOT");
        fs::write(&path, b"old contents").unwrap();

        let replace = FlakyReplace::new(u32::MAX);
        let backoff = RecordingBackoff::default();
        let writer = DurableWriter::with_parts(&replace, &backoff, policy());

        let err = writer.write_atomic(&path, b"new contents").unwrap_err();

        assert!(err.is_io());
        assert_eq!(replace.calls.get(), 3);
        assert_eq!(backoff.waits.borrow().len(), 2);
        assert_eq!(fs::read(&path).unwrap(), b"old contents");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_no_retry_makes_one_attempt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SNAPSHOT");

        let replace = FlakyReplace::new(1);
        let backoff = RecordingBackoff::default();
        let writer = DurableWriter::with_parts(&replace, &backoff, RetryPolicy::no_retry());

        assert!(writer.write_atomic(&path, b"data").is_err());
        assert_eq!(replace.calls.get(), 1);
        assert!(backoff.waits.borrow().is_empty());
        assert!(!path.exists());
    }

    #[test]
    fn test_zero_attempts_still_writes_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("SNAPSHOT");

        let writer = DurableWriter::new(RetryPolicy::new().with_attempts(0));
        writer.write_atomic(&path, b"data").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"data");
    }
}
