use std::fmt;

use serde::{Serialize, Serializer};

/// Size of a raw binary commit hash as stored by v1 SNAPSHOT files
pub const HASH20_SIZE: usize = 20;

/// Opaque identifier of a source-tree revision.
///
/// The bytes are whatever the back-end handed out; this crate never
/// interprets them. Comparison and ordering are byte-wise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RevisionId(Vec<u8>);

impl RevisionId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        RevisionId(bytes.into())
    }

    /// Build an id from a raw 20-byte hash, inflated to lowercase hex
    pub fn from_hash20(raw: &[u8; HASH20_SIZE]) -> Self {
        RevisionId(hex::encode(raw).into_bytes())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

impl From<&str> for RevisionId {
    fn from(s: &str) -> Self {
        RevisionId(s.as_bytes().to_vec())
    }
}

impl From<String> for RevisionId {
    fn from(s: String) -> Self {
        RevisionId(s.into_bytes())
    }
}

impl From<Vec<u8>> for RevisionId {
    fn from(bytes: Vec<u8>) -> Self {
        RevisionId(bytes)
    }
}

impl From<&[u8]> for RevisionId {
    fn from(bytes: &[u8]) -> Self {
        RevisionId(bytes.to_vec())
    }
}

impl Serialize for RevisionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hash20_is_lowercase_hex() {
        let mut raw = [0u8; HASH20_SIZE];
        raw[0] = 0xAB;
        raw[19] = 0x0F;

        let id = RevisionId::from_hash20(&raw);

        assert_eq!(id.len(), 40);
        assert_eq!(id.to_string(), "ab0000000000000000000000000000000000000f");
    }

    #[test]
    fn test_ordering_is_bytewise() {
        let a = RevisionId::from("abc");
        let b = RevisionId::from("abd");
        let prefix = RevisionId::from("ab");

        assert!(a < b);
        assert!(prefix < a);
        assert_eq!(a, RevisionId::new(b"abc".to_vec()));
    }

    #[test]
    fn test_display_is_lossy_for_binary() {
        let id = RevisionId::from(vec![b'x', 0xFF]);
        assert_eq!(id.to_string(), "x\u{FFFD}");
        assert_eq!(id.as_bytes(), &[b'x', 0xFF]);
    }
}
