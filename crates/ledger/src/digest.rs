//! Fixed-size content digests.

use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// BLAKE3 digest (32 bytes) of a file's exact bytes.
///
/// Displayed, parsed and serialized as 64 lowercase hexadecimal characters.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest(blake3::Hash);

impl Digest {
    pub const LEN: usize = blake3::OUT_LEN;

    /// The all-zero digest, used as the predecessor of the first ledger entry.
    pub const ZERO: Self = Self(blake3::Hash::from_bytes([0; blake3::OUT_LEN]));

    pub fn of(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes))
    }

    /// Digest of a file's contents as they are on disk right now.
    pub async fn of_file(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await.map_err(ErrorKind::Io)?;
        Ok(Self::of(&bytes))
    }

    /// Link in a hash chain: `blake3(previous || self)`.
    pub fn chained(&self, previous: &Digest) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(previous.as_bytes());
        hasher.update(self.as_bytes());
        Self(hasher.finalize())
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        self.0.as_bytes()
    }

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(blake3::Hash::from_bytes(bytes))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.to_hex().as_str())
    }
}
impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({self})")
    }
}

impl FromStr for Digest {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(Self(blake3::Hash::from_hex(s.trim()).map_err(|_| ErrorKind::InvalidDigest(s.to_string()))?))
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0.to_hex().as_str())
    }
}
impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        blake3::Hash::from_hex(&hex).map(Self).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_same_bytes_same_digest() {
        assert_eq!(Digest::of(b"date,time,o3\n"), Digest::of(b"date,time,o3\n"));
        assert_ne!(Digest::of(b"date,time,o3\n"), Digest::of(b"date,time,o3"));
    }

    #[test]
    fn test_hex_round_trip() {
        let digest = Digest::of(b"hello");
        let hex = digest.to_string();
        assert_eq!(hex.len(), 64);
        assert_eq!(hex.parse::<Digest>().unwrap(), digest);
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("abcdef")]
    #[case::not_hex(&"z".repeat(64))]
    fn test_parse_invalid(#[case] input: &str) {
        let err = input.parse::<Digest>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidDigest(_)));
    }

    #[tokio::test]
    async fn test_of_file_matches_bytes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("2022-03-21.csv");
        tokio::fs::write(&path, b"date,time,o3\n2022-03-21,11:19:47,1.0").await.unwrap();
        assert_eq!(Digest::of_file(&path).await.unwrap(), Digest::of(b"date,time,o3\n2022-03-21,11:19:47,1.0"));
        assert!(Digest::of_file(temp_dir.path().join("missing")).await.is_err());
    }

    #[test]
    fn test_chain_depends_on_order() {
        let (a, b) = (Digest::of(b"a"), Digest::of(b"b"));
        assert_ne!(b.chained(&a), a.chained(&b));
        assert_ne!(a.chained(&Digest::ZERO), a);
    }

    #[test]
    fn test_serde_as_hex_string() {
        let digest = Digest::of(b"hello");
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{digest}\""));
        assert_eq!(serde_json::from_str::<Digest>(&json).unwrap(), digest);
    }
}
