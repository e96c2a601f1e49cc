//! Core types for content addressing.

use crate::varint::{decode_uvarint, encode_uvarint};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Digest: BLAKE3 hash of a block's bytes
pub type Digest = [u8; 32];

/// Identifier version written into every binary form.
pub const CID_VERSION: u64 = 1;

/// Multihash code for BLAKE3-256.
pub const BLAKE3_CODE: u64 = 0x1e;

/// Digest length in bytes.
pub const DIGEST_LEN: usize = 32;

/// Multibase prefix of the printable form (lowercase base16).
pub const MULTIBASE_BASE16: char = 'f';

/// How a block's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Codec {
    /// Opaque file content.
    Raw,
    /// Encoded [`crate::tree::node::DagNode`].
    Node,
}

impl Codec {
    pub fn code(self) -> u64 {
        match self {
            Codec::Raw => 0x55,
            Codec::Node => 0x70,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0x55 => Some(Codec::Raw),
            0x70 => Some(Codec::Node),
            _ => None,
        }
    }
}

/// Content identifier: codec tag plus the BLAKE3 digest of the block bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    codec: Codec,
    digest: Digest,
}

/// Errors from parsing a [`Cid`] out of bytes or text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidParseError {
    #[error("identifier is truncated")]
    Truncated,
    #[error("unsupported identifier version {0}")]
    UnsupportedVersion(u64),
    #[error("unknown codec 0x{0:x}")]
    UnknownCodec(u64),
    #[error("unsupported hash function 0x{0:x}")]
    UnsupportedHash(u64),
    #[error("digest length {0} is not 32")]
    BadDigestLength(u64),
    #[error("missing multibase prefix 'f'")]
    MissingPrefix,
    #[error("invalid hex: {0}")]
    InvalidHex(String),
    #[error("{0} trailing bytes after identifier")]
    TrailingBytes(usize),
}

impl Cid {
    pub fn new(codec: Codec, digest: Digest) -> Self {
        Cid { codec, digest }
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    /// Binary form: `version | codec | hash code | digest length | digest`, each header
    /// field a varint.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + DIGEST_LEN);
        encode_uvarint(CID_VERSION, &mut buf);
        encode_uvarint(self.codec.code(), &mut buf);
        encode_uvarint(BLAKE3_CODE, &mut buf);
        encode_uvarint(DIGEST_LEN as u64, &mut buf);
        buf.extend_from_slice(&self.digest);
        buf
    }

    /// Parse the binary form from the front of `data`, returning the identifier and the
    /// number of bytes it occupied.
    pub fn read_bytes(data: &[u8]) -> Result<(Self, usize), CidParseError> {
        let mut pos = 0;
        let next = |pos: &mut usize| -> Result<u64, CidParseError> {
            let (value, used) = decode_uvarint(&data[*pos..]).ok_or(CidParseError::Truncated)?;
            *pos += used;
            Ok(value)
        };

        let version = next(&mut pos)?;
        if version != CID_VERSION {
            return Err(CidParseError::UnsupportedVersion(version));
        }
        let code = next(&mut pos)?;
        let codec = Codec::from_code(code).ok_or(CidParseError::UnknownCodec(code))?;
        let hash = next(&mut pos)?;
        if hash != BLAKE3_CODE {
            return Err(CidParseError::UnsupportedHash(hash));
        }
        let len = next(&mut pos)?;
        if len != DIGEST_LEN as u64 {
            return Err(CidParseError::BadDigestLength(len));
        }
        let end = pos + DIGEST_LEN;
        if data.len() < end {
            return Err(CidParseError::Truncated);
        }
        let mut digest = [0u8; DIGEST_LEN];
        digest.copy_from_slice(&data[pos..end]);
        Ok((Cid::new(codec, digest), end))
    }

    /// Parse an identifier that must occupy all of `data`.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CidParseError> {
        let (cid, used) = Self::read_bytes(data)?;
        if used != data.len() {
            return Err(CidParseError::TrailingBytes(data.len() - used));
        }
        Ok(cid)
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", MULTIBASE_BASE16, hex::encode(self.to_bytes()))
    }
}

impl fmt::Debug for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cid({})", self)
    }
}

impl FromStr for Cid {
    type Err = CidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(MULTIBASE_BASE16)
            .ok_or(CidParseError::MissingPrefix)?;
        let bytes = hex::decode(body).map_err(|e| CidParseError::InvalidHex(e.to_string()))?;
        Cid::from_bytes(&bytes)
    }
}

impl Serialize for Cid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Cid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Serde adapter writing a [`Cid`] as its compact binary form, for binary encodings.
pub mod cid_bytes {
    use super::Cid;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(cid: &Cid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&cid.to_bytes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cid, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        Cid::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}
