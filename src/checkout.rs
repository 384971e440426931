//! Checkout state transitions over the SNAPSHOT file
//!
//! Nothing is cached: every call reads the file again, so an external edit
//! (another process, a recovery tool) is always observed. No locking is
//! done here either; concurrent writers race and the last rename wins.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    error::{Error, Result},
    snapshot::{self, RevisionId, RevisionPreference, SnapshotState},
    storage::{AtomicReplace, Backoff, DurableWriter, TempFileReplace, ThreadSleep},
};

/// Current OS process id, as recorded in v3 snapshots
pub fn current_pid() -> i32 {
    std::process::id() as i32
}

/// Reads and transitions the checkout state stored in one SNAPSHOT file
#[derive(Debug, Clone)]
pub struct CheckoutStateStore<R = TempFileReplace, B = ThreadSleep> {
    snapshot_path: PathBuf,
    writer: DurableWriter<R, B>,
}

impl CheckoutStateStore {
    pub fn new<P: AsRef<Path>>(snapshot_path: P) -> Self {
        Self::with_writer(snapshot_path, DurableWriter::default())
    }
}

impl<R: AtomicReplace, B: Backoff> CheckoutStateStore<R, B> {
    pub fn with_writer<P: AsRef<Path>>(snapshot_path: P, writer: DurableWriter<R, B>) -> Self {
        Self {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            writer,
        }
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Read and decode the SNAPSHOT file.
    ///
    /// Callers check for `InProgress` here to detect a checkout that was
    /// interrupted by a crash. A missing or corrupt file is an error, never
    /// a default state.
    pub fn get_state(&self) -> Result<SnapshotState> {
        let contents = fs::read(&self.snapshot_path)?;
        debug!(
            path = %self.snapshot_path.display(),
            "read {} byte snapshot",
            contents.len()
        );

        snapshot::decode(&contents).map_err(|e| match e {
            Error::Format(msg) => {
                Error::Format(format!("{}: {}", msg, self.snapshot_path.display()))
            }
            other => other,
        })
    }

    /// Record that a checkout from `from` to `to` is starting.
    /// Overwrites whatever was there, including a stale in-progress record.
    pub fn begin_checkout(&self, from: &RevisionId, to: &RevisionId) -> Result<()> {
        let state = SnapshotState::InProgress {
            from: from.clone(),
            to: to.clone(),
            pid: current_pid(),
        };
        info!(from = %from, to = %to, "checkout in progress");
        self.write(&state)
    }

    /// Record a finished checkout: the working copy parent and the checked
    /// out revision both become `commit`.
    pub fn complete_checkout(&self, commit: &RevisionId) -> Result<()> {
        info!(commit = %commit, "checkout complete");
        self.write(&SnapshotState::checked_out(commit.clone()))
    }

    /// Move the working copy parent without touching the checked out
    /// revision, as done by reset or amend.
    pub fn set_working_copy_parent(&self, commit: &RevisionId) -> Result<()> {
        let current = self.get_state()?;
        let checked_out = current
            .last_checkout_id(RevisionPreference::OnlyStable)
            .ok_or_else(|| {
                Error::State(format!(
                    "checkout in progress, cannot set working copy parent to {}",
                    commit
                ))
            })?
            .clone();

        info!(commit = %commit, checked_out = %checked_out, "setting working copy parent");
        self.write(&SnapshotState::Stable {
            working_copy_parent: commit.clone(),
            checked_out,
        })
    }

    fn write(&self, state: &SnapshotState) -> Result<()> {
        let bytes = snapshot::encode(state);
        self.writer.write_atomic(&self.snapshot_path, &bytes)
    }
}
