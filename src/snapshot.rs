mod codec;
mod revision;
mod state;

pub use codec::{decode, encode, SnapshotVersion, HEADER_SIZE, MAGIC};
pub use revision::RevisionId;
pub use state::{RevisionPreference, SnapshotState};
