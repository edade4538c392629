//! Hashing utilities.

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};

use crate::buf::Buf32;

/// Computes the SHA-256 hash of the given bytes.
pub fn raw(data: &[u8]) -> Buf32 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Buf32::from(<[u8; 32]>::from(hasher.finalize()))
}

/// Computes the SHA-256 hash of the borsh serialization of the value.
///
/// Borsh encoding is canonical, so for a fixed in-memory state this is
/// reproducible byte-for-byte across nodes.
pub fn sha256_borsh<T: BorshSerialize>(value: &T) -> Buf32 {
    let buf = borsh::to_vec(value).expect("hash: borsh serialization");
    raw(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_known_vector() {
        // sha256("") well-known vector
        let h = raw(b"");
        assert_eq!(
            h.to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_borsh_hash_stable() {
        let v: (u64, Vec<u8>) = (42, vec![1, 2, 3]);
        assert_eq!(sha256_borsh(&v), sha256_borsh(&v.clone()));
        let w: (u64, Vec<u8>) = (43, vec![1, 2, 3]);
        assert_ne!(sha256_borsh(&v), sha256_borsh(&w));
    }
}
