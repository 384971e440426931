use serde::Serialize;

use super::RevisionId;

/// What the SNAPSHOT file of a checkout currently says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SnapshotState {
    /// No checkout is running.
    ///
    /// `working_copy_parent` is the revision the working tree logically
    /// tracks and can move without touching files (reset, amend).
    /// `checked_out` is what is actually materialized on disk.
    Stable {
        working_copy_parent: RevisionId,
        checked_out: RevisionId,
    },
    /// A checkout from `from` to `to` was started by `pid` and never
    /// recorded as complete. Reading this back after a restart means the
    /// previous checkout was interrupted.
    InProgress {
        from: RevisionId,
        to: RevisionId,
        pid: i32,
    },
}

/// Which side of an interrupted checkout to report as "last checked out"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionPreference {
    From,
    To,
    /// Report nothing while a checkout is in progress
    OnlyStable,
}

impl SnapshotState {
    /// Stable state where both revisions are the same
    pub fn checked_out(commit: RevisionId) -> Self {
        SnapshotState::Stable {
            working_copy_parent: commit.clone(),
            checked_out: commit,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, SnapshotState::InProgress { .. })
    }

    /// The revision the working tree is based on. While a checkout is in
    /// flight this is still the revision being moved away from.
    pub fn working_copy_parent(&self) -> &RevisionId {
        match self {
            SnapshotState::Stable {
                working_copy_parent,
                ..
            } => working_copy_parent,
            SnapshotState::InProgress { from, .. } => from,
        }
    }

    pub fn last_checkout_id(&self, preference: RevisionPreference) -> Option<&RevisionId> {
        match (self, preference) {
            (SnapshotState::Stable { checked_out, .. }, _) => Some(checked_out),
            (SnapshotState::InProgress { from, .. }, RevisionPreference::From) => Some(from),
            (SnapshotState::InProgress { to, .. }, RevisionPreference::To) => Some(to),
            (SnapshotState::InProgress { .. }, RevisionPreference::OnlyStable) => None,
        }
    }

    pub fn in_progress_pid(&self) -> Option<i32> {
        match self {
            SnapshotState::InProgress { pid, .. } => Some(*pid),
            SnapshotState::Stable { .. } => None,
        }
    }
}
