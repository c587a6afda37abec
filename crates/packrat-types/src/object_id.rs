use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// What kind of content an identifier refers to.
///
/// Blob identifiers name raw file content; tree identifiers name encoded
/// directory listings. The kind participates in the digest, so a blob and a
/// tree can never share an identifier even for byte-equal payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    Tree,
}

impl ObjectKind {
    fn domain_tag(self) -> u8 {
        match self {
            ObjectKind::Blob => 0,
            ObjectKind::Tree => 1,
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
        }
    }
}

/// A stable, content-derived identifier for an object in the store.
///
/// Computed as BLAKE2b-256 over a one-byte kind tag followed by the object
/// bytes. Writing byte-identical content twice yields equal identifiers,
/// which is the invariant the store's deduplication rests on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId {
    pub kind: ObjectKind,
    pub digest: [u8; 32],
}

impl ObjectId {
    pub fn compute(kind: ObjectKind, data: &[u8]) -> Self {
        let mut hasher = Blake2b256::new();
        hasher.update([kind.domain_tag()]);
        hasher.update(data);
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hasher.finalize());
        ObjectId { kind, digest }
    }

    /// Hex-encode the full digest.
    pub fn to_hex(&self) -> String {
        hex::encode(self.digest)
    }

    /// First digest byte as a two-char hex string, used for shard directories.
    pub fn shard_prefix(&self) -> String {
        hex::encode(&self.digest[..1])
    }

    /// Storage key under which the object lives in a backend.
    pub fn storage_key(&self) -> String {
        format!("objects/{}/{}", self.shard_prefix(), self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ObjectId({}:{})",
            self.kind.short_name(),
            &self.to_hex()[..16]
        )
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.short_name(), &self.to_hex()[..16])
    }
}
