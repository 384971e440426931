//! SNAPSHOT file codec
//!
//! Layout, all integers big endian:
//! - 4 byte identifier: "eden"
//! - 4 byte format version
//!
//! Followed by:
//! - v1: 20 byte binary commit hash, optionally a second 20 byte hash
//!   (second parent, never used)
//! - v2: u32 length + revision bytes
//! - v3 (checkout in progress): i32 pid, u32 length + `from` bytes,
//!   u32 length + `to` bytes
//! - v4: u32 length + working copy parent bytes, u32 length + checked out
//!   revision bytes

use tracing::debug;

use super::{
    revision::{RevisionId, HASH20_SIZE},
    SnapshotState,
};
use crate::error::{Error, Result};

pub const MAGIC: &[u8; 4] = b"eden";
pub const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SnapshotVersion {
    /// Legacy: binary hash
    V1 = 1,
    /// Legacy: single length-prefixed revision
    V2 = 2,
    /// Written while a checkout is ongoing
    CheckoutInProgress = 3,
    /// Working copy parent and checked out revision
    WorkingCopyParentAndCheckedOut = 4,
}

impl SnapshotVersion {
    pub const CURRENT: SnapshotVersion = SnapshotVersion::WorkingCopyParentAndCheckedOut;

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for SnapshotVersion {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            1 => Ok(SnapshotVersion::V1),
            2 => Ok(SnapshotVersion::V2),
            3 => Ok(SnapshotVersion::CheckoutInProgress),
            4 => Ok(SnapshotVersion::WorkingCopyParentAndCheckedOut),
            other => Err(Error::Format(format!(
                "unsupported snapshot format version {}",
                other
            ))),
        }
    }
}

/// Bounds-checked big endian reader over the raw file contents
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8], pos: usize) -> Self {
        Reader { buf, pos }
    }

    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::Format(format!(
                "truncated snapshot: needed {} bytes at offset {}, {} available",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let buf = self.buf;
        let bytes = &buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_revision(&mut self) -> Result<RevisionId> {
        let len = self.read_u32()? as usize;
        Ok(RevisionId::from(self.take(len)?))
    }
}

/// Decode the raw contents of a SNAPSHOT file
pub fn decode(contents: &[u8]) -> Result<SnapshotState> {
    if contents.len() < HEADER_SIZE {
        return Err(Error::Format(format!(
            "snapshot file is too short ({} bytes)",
            contents.len()
        )));
    }

    if contents[..MAGIC.len()] != MAGIC[..] {
        return Err(Error::Format("unsupported legacy snapshot file".to_string()));
    }

    let mut reader = Reader::new(contents, MAGIC.len());
    let version = SnapshotVersion::try_from(reader.read_u32()?)?;
    debug!("decoding snapshot version {:?}", version);

    match version {
        SnapshotVersion::V1 => decode_v1(&mut reader),
        SnapshotVersion::V2 => {
            let id = reader.read_revision()?;
            Ok(SnapshotState::checked_out(id))
        }
        SnapshotVersion::CheckoutInProgress => {
            let pid = reader.read_i32()?;
            let from = reader.read_revision()?;
            let to = reader.read_revision()?;
            Ok(SnapshotState::InProgress { from, to, pid })
        }
        SnapshotVersion::WorkingCopyParentAndCheckedOut => {
            let working_copy_parent = reader.read_revision()?;
            let checked_out = reader.read_revision()?;
            Ok(SnapshotState::Stable {
                working_copy_parent,
                checked_out,
            })
        }
    }
}

fn decode_v1(reader: &mut Reader<'_>) -> Result<SnapshotState> {
    let body = reader.remaining();
    if body != HASH20_SIZE && body != HASH20_SIZE * 2 {
        return Err(Error::Format(format!(
            "unexpected length for v1 snapshot ({} bytes)",
            body + HEADER_SIZE
        )));
    }

    let parent: [u8; HASH20_SIZE] = reader.read_array()?;
    if reader.remaining() > 0 {
        // Second parent, only ever written for merges and never read back.
        let _second: [u8; HASH20_SIZE] = reader.read_array()?;
    }

    Ok(SnapshotState::checked_out(RevisionId::from_hash20(&parent)))
}

/// Encode a state in the layout writers produce: v4 for `Stable`, v3 for
/// `InProgress`.
///
/// Panics if a revision is longer than a u32 length prefix can describe.
pub fn encode(state: &SnapshotState) -> Vec<u8> {
    match state {
        SnapshotState::Stable {
            working_copy_parent,
            checked_out,
        } => {
            let mut buf = Vec::with_capacity(
                HEADER_SIZE + 8 + working_copy_parent.len() + checked_out.len(),
            );
            push_header(&mut buf, SnapshotVersion::CURRENT);
            push_revision(&mut buf, working_copy_parent);
            push_revision(&mut buf, checked_out);
            buf
        }
        SnapshotState::InProgress { from, to, pid } => {
            let mut buf = Vec::with_capacity(HEADER_SIZE + 12 + from.len() + to.len());
            push_header(&mut buf, SnapshotVersion::CheckoutInProgress);
            buf.extend_from_slice(&pid.to_be_bytes());
            push_revision(&mut buf, from);
            push_revision(&mut buf, to);
            buf
        }
    }
}

fn push_header(buf: &mut Vec<u8>, version: SnapshotVersion) {
    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&version.as_u32().to_be_bytes());
}

fn push_revision(buf: &mut Vec<u8>, id: &RevisionId) {
    buf.extend_from_slice(&length_prefix(id.len()).to_be_bytes());
    buf.extend_from_slice(id.as_bytes());
}

/// Revision ids are produced internally, so one that overflows the prefix
/// is a bug rather than bad input.
fn length_prefix(len: usize) -> u32 {
    assert!(
        len <= u32::MAX as usize,
        "revision id of {} bytes does not fit a u32 length prefix",
        len
    );
    len as u32
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn header(version: u32) -> Vec<u8> {
        let mut buf = MAGIC.to_vec();
        buf.extend_from_slice(&version.to_be_bytes());
        buf
    }

    fn field(bytes: &[u8]) -> Vec<u8> {
        let mut buf = (bytes.len() as u32).to_be_bytes().to_vec();
        buf.extend_from_slice(bytes);
        buf
    }

    fn hash(seed: u8) -> [u8; 20] {
        let mut raw = [0u8; 20];
        for (i, b) in raw.iter_mut().enumerate() {
            *b = seed.wrapping_add(i as u8);
        }
        raw
    }

    #[test]
    fn test_v1_single_hash() {
        let raw = hash(0xA0);
        let mut buf = header(1);
        buf.extend_from_slice(&raw);

        let expected = RevisionId::from(hex::encode(raw));
        assert_eq!(decode(&buf).unwrap(), SnapshotState::checked_out(expected));
    }

    #[test]
    fn test_v1_second_parent_is_ignored() {
        let raw = hash(0x10);
        let mut buf = header(1);
        buf.extend_from_slice(&raw);
        buf.extend_from_slice(&hash(0x77));

        let state = decode(&buf).unwrap();
        let expected = RevisionId::from(hex::encode(raw));
        assert_eq!(state, SnapshotState::checked_out(expected));
    }

    #[test]
    fn test_v1_bad_length() {
        for len in [0usize, 19, 21, 39, 41] {
            let mut buf = header(1);
            buf.extend(std::iter::repeat(0xEE).take(len));
            let err = decode(&buf).unwrap_err();
            assert!(err.is_format(), "len {} gave {}", len, err);
        }
    }

    #[test]
    fn test_v2() {
        let mut buf = header(2);
        buf.extend(field(b"abc"));

        assert_eq!(
            decode(&buf).unwrap(),
            SnapshotState::checked_out(RevisionId::from("abc"))
        );
    }

    #[test]
    fn test_v3() {
        let mut buf = header(3);
        buf.extend_from_slice(&1234i32.to_be_bytes());
        buf.extend(field(b"a"));
        buf.extend(field(b"b"));

        assert_eq!(
            decode(&buf).unwrap(),
            SnapshotState::InProgress {
                from: RevisionId::from("a"),
                to: RevisionId::from("b"),
                pid: 1234,
            }
        );
    }

    #[test]
    fn test_v4() {
        let mut buf = header(4);
        buf.extend(field(b"parent"));
        buf.extend(field(b"checked-out"));

        assert_eq!(
            decode(&buf).unwrap(),
            SnapshotState::Stable {
                working_copy_parent: RevisionId::from("parent"),
                checked_out: RevisionId::from("checked-out"),
            }
        );
    }

    #[test]
    fn test_too_short() {
        for len in 0..HEADER_SIZE {
            let buf = &b"eden\0\0\0\x04"[..len];
            let err = decode(buf).unwrap_err();
            assert!(err.is_format());
            assert!(err.to_string().contains("too short"));
        }
    }

    #[test]
    fn test_bad_magic() {
        let mut buf = b"EDEN".to_vec();
        buf.extend_from_slice(&4u32.to_be_bytes());
        buf.extend(field(b"a"));
        buf.extend(field(b"a"));

        let err = decode(&buf).unwrap_err();
        assert!(err.to_string().contains("legacy"));
    }

    #[test]
    fn test_unknown_version() {
        let mut buf = header(99);
        buf.extend(field(b"a"));

        let err = decode(&buf).unwrap_err();
        assert!(err.is_format());
        assert!(err.to_string().contains("version 99"));
    }

    #[test]
    fn test_truncated_fields() {
        // length prefix claims more bytes than are present
        let mut buf = header(2);
        buf.extend_from_slice(&10u32.to_be_bytes());
        buf.extend_from_slice(b"abc");
        assert!(decode(&buf).unwrap_err().to_string().contains("truncated"));

        // v4 missing its second field entirely
        let mut buf = header(4);
        buf.extend(field(b"parent"));
        assert!(decode(&buf).unwrap_err().is_format());

        // v3 with a partial pid
        let mut buf = header(3);
        buf.extend_from_slice(&[0, 0]);
        assert!(decode(&buf).unwrap_err().is_format());
    }

    #[test]
    fn test_encode_stable_writes_current_version() {
        let state = SnapshotState::Stable {
            working_copy_parent: RevisionId::from("wcp"),
            checked_out: RevisionId::from("co"),
        };

        let mut expected = header(4);
        expected.extend(field(b"wcp"));
        expected.extend(field(b"co"));
        assert_eq!(encode(&state), expected);
    }

    #[test]
    fn test_encode_in_progress_writes_v3() {
        let state = SnapshotState::InProgress {
            from: RevisionId::from("r1"),
            to: RevisionId::from("r2"),
            pid: -7,
        };

        let bytes = encode(&state);
        assert_eq!(&bytes[4..8], &3u32.to_be_bytes());
        assert_eq!(&bytes[8..12], &(-7i32).to_be_bytes());
        assert_eq!(decode(&bytes).unwrap(), state);
    }

    #[test]
    fn test_legacy_versions_reencode_as_v4() {
        let mut buf = header(2);
        buf.extend(field(b"abc"));

        let state = decode(&buf).unwrap();
        let reencoded = encode(&state);
        assert_eq!(&reencoded[4..8], &4u32.to_be_bytes());
        assert_eq!(decode(&reencoded).unwrap(), state);
    }

    #[test]
    fn test_large_revision_roundtrip() {
        let big = RevisionId::from(vec![0x5A; 1 << 20]);
        let state = SnapshotState::Stable {
            working_copy_parent: RevisionId::default(),
            checked_out: big,
        };
        assert_eq!(decode(&encode(&state)).unwrap(), state);
    }

    #[test]
    fn test_length_prefix_at_u32_boundary() {
        assert_eq!(length_prefix(0), 0);
        assert_eq!(length_prefix(u32::MAX as usize - 1), u32::MAX - 1);
        assert_eq!(length_prefix(u32::MAX as usize), u32::MAX);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    #[should_panic(expected = "does not fit a u32 length prefix")]
    fn test_length_prefix_overflow_panics() {
        length_prefix(u32::MAX as usize + 1);
    }

    proptest! {
        #[test]
        fn prop_stable_roundtrip(
            wcp in proptest::collection::vec(any::<u8>(), 0..256),
            co in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let state = SnapshotState::Stable {
                working_copy_parent: RevisionId::from(wcp),
                checked_out: RevisionId::from(co),
            };
            prop_assert_eq!(decode(&encode(&state)).unwrap(), state);
        }

        #[test]
        fn prop_short_buffers_never_decode(bytes in proptest::collection::vec(any::<u8>(), 0..HEADER_SIZE)) {
            prop_assert!(decode(&bytes).unwrap_err().is_format());
        }
    }
}
