//! Blind-RSA primitives: puzzle generation, blinding, unblinding, and
//! verification under an RSA public key.
//!
//! All group elements are canonically encoded as fixed-width, big-endian
//! unsigned integers of `ceil(bitlen(n)/8)` bytes. `RsaPublicKey::decode`
//! rejects any slice that deviates from that width.

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use rand::RngCore;
use zeroize::Zeroize;

use crate::errors::SolverError;

/// An RSA ciphertext, an integer mod `n`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Puzzle(pub(crate) BigUint);

impl Puzzle {
    /// Wraps an already-reduced integer as a puzzle. Callers that parse
    /// wire bytes should go through [`RsaPublicKey::decode`] instead.
    #[must_use]
    pub fn from_raw(value: BigUint) -> Puzzle {
        Puzzle(value)
    }
}

/// The secret randomness used to blind a real puzzle, an integer in the
/// multiplicative group mod `n`.
///
/// Zeroized on drop: a blind factor reveals which puzzle was real if it
/// leaks before the client chooses to reveal it in T3.
#[derive(Clone)]
pub struct BlindFactor(BigUint);

impl Drop for BlindFactor {
    fn drop(&mut self) {
        // BigUint has no bit-for-bit zeroize impl; overwriting the limbs
        // with a fresh zero value is the best available substitute.
        self.0 = BigUint::zero();
    }
}

impl BlindFactor {
    #[must_use]
    pub(crate) fn value(&self) -> &BigUint {
        &self.0
    }
}

/// The canonical encoding of a fake puzzle's known preimage.
///
/// Revealed to the server for every fake position during T2, so it's not
/// secret for the session's full lifetime the way a [`BlindFactor`] is; it's
/// still zeroized on drop to hold it to the same memory-hygiene standard as
/// the rest of the session's secret material before that reveal happens.
#[derive(Clone, PartialEq, Eq)]
pub struct FakePuzzleSecret(Vec<u8>);

impl FakePuzzleSecret {
    pub(crate) fn new(bytes: Vec<u8>) -> FakePuzzleSecret {
        FakePuzzleSecret(bytes)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for FakePuzzleSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// An RSA public key: the modulus `n` and public exponent `e`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RsaPublicKey {
    n: BigUint,
    e: BigUint,
    byte_len: usize,
}

impl RsaPublicKey {
    /// Builds a public key from its raw modulus and exponent.
    #[must_use]
    pub fn new(n: BigUint, e: BigUint) -> RsaPublicKey {
        let byte_len = ((n.bits() + 7) / 8) as usize;
        RsaPublicKey { n, e, byte_len }
    }

    /// The modulus.
    #[must_use]
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    /// The public exponent.
    #[must_use]
    pub fn exponent(&self) -> &BigUint {
        &self.e
    }

    /// The canonical encoded width of a group element under this key, in
    /// bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.byte_len
    }

    /// Canonically encodes `x` as a fixed-width big-endian byte string.
    #[must_use]
    pub fn encode(&self, x: &BigUint) -> Vec<u8> {
        let raw = x.to_bytes_be();
        debug_assert!(raw.len() <= self.byte_len, "value does not fit in the modulus width");
        let mut out = vec![0u8; self.byte_len - raw.len()];
        out.extend_from_slice(&raw);
        out
    }

    /// Decodes a fixed-width big-endian byte string as a group element,
    /// rejecting any length other than [`RsaPublicKey::byte_len`] and any
    /// value not reduced mod `n`.
    pub fn decode(&self, bytes: &[u8]) -> Result<BigUint, SolverError> {
        if bytes.len() != self.byte_len {
            return Err(SolverError::InvalidArgument(format!(
                "expected a {}-byte value, got {}",
                self.byte_len,
                bytes.len()
            )));
        }
        let value = BigUint::from_bytes_be(bytes);
        if value >= self.n {
            return Err(SolverError::InvalidArgument("value is not reduced mod n".into()));
        }
        Ok(value)
    }

    /// Generates a fresh puzzle by picking a random `s` in `Z_n*` and
    /// returns `(s^e mod n, canonical_encoding(s))`.
    #[must_use]
    pub fn generate_puzzle(&self, rng: &mut impl RngCore) -> (Puzzle, FakePuzzleSecret) {
        let s = self.random_nonzero_below_n(rng);
        let puzzle = s.modpow(&self.e, &self.n);
        let solution = FakePuzzleSecret::new(self.encode(&s));
        (Puzzle(puzzle), solution)
    }

    /// Blinds `puzzle` with a fresh random factor `r`, returning
    /// `(puzzle * r^e mod n, r)`.
    #[must_use]
    pub fn blind(&self, rng: &mut impl RngCore, puzzle: &Puzzle) -> (Puzzle, BlindFactor) {
        let r = self.random_nonzero_below_n(rng);
        let blinded = (&puzzle.0 * r.modpow(&self.e, &self.n)) % &self.n;
        (Puzzle(blinded), BlindFactor(r))
    }

    /// Removes a blinding factor from a solution: `blinded_solution * r^-1
    /// mod n`.
    ///
    /// # Panics
    ///
    /// Panics if `r` shares a nontrivial factor with `n`, which would mean
    /// either `r` was not sampled from `Z_n*` or `n` is not a valid RSA
    /// modulus. Neither can happen through this crate's own API.
    #[must_use]
    pub fn unblind(&self, blinded_solution: &BigUint, r: &BlindFactor) -> BigUint {
        let r_inv = mod_inverse(r.value(), &self.n).expect("blind factor not invertible mod n");
        (blinded_solution * r_inv) % &self.n
    }

    /// Returns whether `candidate^e mod n == puzzle`.
    #[must_use]
    pub fn verify(&self, puzzle: &Puzzle, candidate: &BigUint) -> bool {
        candidate.modpow(&self.e, &self.n) == puzzle.0
    }

    /// Samples a uniformly random nonzero element of `Z_n` via rejection
    /// sampling (no modulo bias). In practice this is also coprime to `n`
    /// with overwhelming probability since `n` is a product of large
    /// primes.
    fn random_nonzero_below_n(&self, rng: &mut impl RngCore) -> BigUint {
        let mut bytes = vec![0u8; self.byte_len];
        loop {
            rng.fill_bytes(&mut bytes);
            let candidate = BigUint::from_bytes_be(&bytes);
            if !candidate.is_zero() && candidate < self.n {
                return candidate;
            }
        }
    }
}

/// Computes `a^-1 mod n` via the extended Euclidean algorithm, or `None` if
/// `a` and `n` are not coprime.
fn mod_inverse(a: &BigUint, n: &BigUint) -> Option<BigUint> {
    let (mut old_r, mut r) = (BigInt::from(a.clone()), BigInt::from(n.clone()));
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());

    while !r.is_zero() {
        let q = &old_r / &r;
        let new_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, new_r);
        let new_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, new_s);
    }

    if old_r != BigInt::one() {
        return None;
    }

    let n_int = BigInt::from(n.clone());
    let inv = ((old_s % &n_int) + &n_int) % &n_int;
    Some(inv.magnitude().clone())
}

#[cfg(test)]
mod tests {
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaChaRng;

    use super::*;

    // A small (not cryptographically sized) RSA modulus used purely to
    // speed up these unit tests. p = 61, q = 53, n = 3233, e = 17.
    fn test_key() -> RsaPublicKey {
        RsaPublicKey::new(BigUint::from(3233u32), BigUint::from(17u32))
    }

    #[test]
    fn encode_decode_round_trip() {
        let pk = test_key();
        let x = BigUint::from(1234u32);
        let encoded = pk.encode(&x);
        assert_eq!(encoded.len(), pk.byte_len());
        assert_eq!(pk.decode(&encoded).unwrap(), x);
    }

    #[test]
    fn decode_rejects_wrong_length() {
        let pk = test_key();
        assert!(pk.decode(&[0u8; 1]).is_err());
        assert!(pk.decode(&vec![0u8; pk.byte_len() + 1]).is_err());
    }

    #[test]
    fn decode_rejects_unreduced_value() {
        let pk = test_key();
        // n itself, canonically encoded, is >= n and must be rejected.
        let bytes = pk.encode(pk.modulus());
        assert!(pk.decode(&bytes).is_err());
    }

    #[test]
    fn blind_unblind_round_trip() {
        let pk = test_key();
        let mut rng = ChaChaRng::seed_from_u64(0);

        let (puzzle, solution) = pk.generate_puzzle(&mut rng);
        let solution = pk.decode(solution.as_bytes()).unwrap();

        let (blinded_puzzle, r) = pk.blind(&mut rng, &puzzle);
        let blinded_solution = solution.modpow(pk.exponent(), pk.modulus());
        assert_eq!(blinded_solution, blinded_puzzle.0);

        let unblinded = pk.unblind(&blinded_solution, &r);
        assert_eq!(unblinded, solution);
        assert!(pk.verify(&puzzle, &unblinded));
    }

    #[test]
    fn verify_rejects_wrong_solution() {
        let pk = test_key();
        let mut rng = ChaChaRng::seed_from_u64(1);
        let (puzzle, _) = pk.generate_puzzle(&mut rng);
        assert!(!pk.verify(&puzzle, &BigUint::from(9999u32)));
    }

    #[test]
    fn mod_inverse_known_value() {
        // 3 * 4 = 12 = 1 mod 11
        let inv = mod_inverse(&BigUint::from(3u32), &BigUint::from(11u32)).unwrap();
        assert_eq!(inv, BigUint::from(4u32));
    }

    #[test]
    fn mod_inverse_rejects_non_coprime() {
        assert_eq!(mod_inverse(&BigUint::from(6u32), &BigUint::from(9u32)), None);
    }
}
