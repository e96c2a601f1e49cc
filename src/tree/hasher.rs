//! Hash computation for blocks

use crate::error::StorageError;
use crate::types::{Cid, Codec};

/// Compute the identifier of a block: BLAKE3 over the exact stored bytes.
pub fn hash_block(codec: Codec, data: &[u8]) -> Cid {
    Cid::new(codec, *blake3::hash(data).as_bytes())
}

/// Check that `data` hashes to `cid`.
pub fn verify_block(cid: &Cid, data: &[u8]) -> Result<(), StorageError> {
    let actual = hash_block(cid.codec(), data);
    if actual != *cid {
        return Err(StorageError::Corrupt {
            expected: *cid,
            actual,
        });
    }
    Ok(())
}
