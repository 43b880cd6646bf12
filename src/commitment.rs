//! Symmetric key-commitment primitives: a ChaCha20 stream cipher for
//! solution encryption, and RIPEMD-160 of the raw key as the commitment's
//! binding hash.
//!
//! Seeing `key_hash` before `key` constitutes a commitment; revealing `key`
//! constitutes opening it. The nonce convention is fixed (all-zero, initial
//! block counter zero) because each key commits exactly one ciphertext and
//! is never reused, so there is no (key, nonce) pair to repeat.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::ChaCha20;
use ripemd::{Digest, Ripemd160};

/// A 32-byte ChaCha20 key, as revealed by the server for one puzzle-set
/// position.
pub type ChachaKey = [u8; 32];

/// The fixed nonce used for every commitment encryption. Safe only because
/// each key is used to encrypt exactly one value.
const FIXED_NONCE: [u8; 12] = [0u8; 12];

/// Encrypts `plaintext` under `key`, returning the ciphertext.
#[must_use]
pub fn stream_encrypt(key: &ChachaKey, plaintext: &[u8]) -> Vec<u8> {
    let mut buf = plaintext.to_vec();
    let mut cipher = ChaCha20::new(key.into(), (&FIXED_NONCE).into());
    cipher.apply_keystream(&mut buf);
    buf
}

/// Decrypts `ciphertext` under `key`, returning the plaintext. ChaCha20 is
/// its own inverse, so this is identical to [`stream_encrypt`]; it exists
/// as a distinct name for readability at call sites.
#[must_use]
pub fn stream_decrypt(key: &ChachaKey, ciphertext: &[u8]) -> Vec<u8> {
    stream_encrypt(key, ciphertext)
}

/// RIPEMD-160 of the raw key bytes, used as the commitment's binding hash.
#[must_use]
pub fn key_hash(key: &ChachaKey) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(key);
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest);
    out
}

/// A single server-supplied commitment for one puzzle-set position: a
/// binding hash of the key that will later be revealed, and the solution
/// encrypted under that key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleCommitment {
    /// 20-byte RIPEMD-160 of the key.
    pub key_hash: [u8; 20],
    /// The solution, encrypted under the key.
    pub encrypted_solution: Vec<u8>,
}

impl PuzzleCommitment {
    /// Builds a commitment by hashing `key` and encrypting `solution`
    /// under it. Used by tests to construct an honest server's messages.
    #[must_use]
    pub fn commit(key: &ChachaKey, solution: &[u8]) -> PuzzleCommitment {
        PuzzleCommitment { key_hash: key_hash(key), encrypted_solution: stream_encrypt(key, solution) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = [7u8; 32];
        let plaintext = b"solution bytes go here";
        let ciphertext = stream_encrypt(&key, plaintext);
        assert_ne!(ciphertext, plaintext);
        assert_eq!(stream_decrypt(&key, &ciphertext), plaintext);
    }

    #[test]
    fn different_keys_different_ciphertext() {
        let plaintext = b"same plaintext";
        let a = stream_encrypt(&[1u8; 32], plaintext);
        let b = stream_encrypt(&[2u8; 32], plaintext);
        assert_ne!(a, b);
    }

    #[test]
    fn key_hash_is_20_bytes_and_deterministic() {
        let key = [9u8; 32];
        let h1 = key_hash(&key);
        let h2 = key_hash(&key);
        assert_eq!(h1.len(), 20);
        assert_eq!(h1, h2);
    }

    #[test]
    fn key_hash_distinguishes_keys() {
        assert_ne!(key_hash(&[1u8; 32]), key_hash(&[2u8; 32]));
    }

    #[test]
    fn commit_opens_correctly() {
        let key = [3u8; 32];
        let solution = b"the preimage";
        let commitment = PuzzleCommitment::commit(&key, solution);
        assert_eq!(commitment.key_hash, key_hash(&key));
        assert_eq!(stream_decrypt(&key, &commitment.encrypted_solution), solution);
    }
}
