//! The typed collection of real and fake puzzles the client presents to the
//! server, in a uniformly random, session-fixed order.

use num_bigint::BigUint;
use rand::seq::SliceRandom;
use rand::RngCore;

use crate::params::SolverParams;
use crate::rsa::{BlindFactor, FakePuzzleSecret, Puzzle, RsaPublicKey};

/// One position in a [`PuzzleSet`]: either a blinding of the real target, or
/// a freshly generated puzzle whose solution the client already knows.
pub enum PuzzleSetElement {
    /// A blinded copy of the client's true target puzzle.
    Real {
        /// The blinded puzzle sent to the server.
        puzzle: Puzzle,
        /// The blind factor used to produce it, revealed to the server in
        /// T3 and consumed to unblind the final solution in T4.
        blind_factor: BlindFactor,
    },
    /// A freshly generated puzzle the client can already solve, used to
    /// audit the server's honesty.
    Fake {
        /// The fake puzzle sent to the server.
        puzzle: Puzzle,
        /// The canonical encoding of the puzzle's known solution.
        known_solution: FakePuzzleSecret,
    },
}

impl PuzzleSetElement {
    /// The puzzle at this position, real or fake.
    #[must_use]
    pub fn puzzle(&self) -> &Puzzle {
        match self {
            PuzzleSetElement::Real { puzzle, .. } | PuzzleSetElement::Fake { puzzle, .. } => puzzle,
        }
    }

    #[must_use]
    pub fn is_real(&self) -> bool {
        matches!(self, PuzzleSetElement::Real { .. })
    }
}

/// An ordered sequence of `real_count + fake_count` puzzle-set elements.
/// Positions are stable indices for the rest of the session: the server and
/// client refer to puzzles solely by their index in this order.
pub struct PuzzleSet {
    elements: Vec<PuzzleSetElement>,
}

impl PuzzleSet {
    /// Builds a puzzle set for `target` under `pk`: `params.real_count`
    /// blindings of the target and `params.fake_count` fresh puzzles,
    /// concatenated and then shuffled in place with `rng`.
    ///
    /// `rng` must be a CSPRNG; a deterministic, seeded RNG is appropriate
    /// for tests that need a reproducible shuffle.
    #[must_use]
    pub fn new(
        rng: &mut (impl RngCore + rand::CryptoRng),
        pk: &RsaPublicKey,
        target: &Puzzle,
        params: &SolverParams,
    ) -> PuzzleSet {
        let mut elements = Vec::with_capacity(params.total());

        for _ in 0..params.real_count {
            let (puzzle, blind_factor) = pk.blind(rng, target);
            elements.push(PuzzleSetElement::Real { puzzle, blind_factor });
        }
        for _ in 0..params.fake_count {
            let (puzzle, known_solution) = pk.generate_puzzle(rng);
            elements.push(PuzzleSetElement::Fake { puzzle, known_solution });
        }

        elements.shuffle(rng);

        PuzzleSet { elements }
    }

    /// Number of elements in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&PuzzleSetElement> {
        self.elements.get(index)
    }

    /// The puzzles in index order, exactly as emitted to the server in T1.
    #[must_use]
    pub fn puzzles(&self) -> Vec<BigUint> {
        self.elements.iter().map(|e| e.puzzle().0.clone()).collect()
    }

    /// Indices of the real elements, in ascending order.
    #[must_use]
    pub fn real_indices(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_real())
            .map(|(i, _)| i)
            .collect()
    }

    /// Indices of the fake elements, in ascending order.
    #[must_use]
    pub fn fake_indices(&self) -> Vec<usize> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| !e.is_real())
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigUint;
    use rand_chacha::rand_core::SeedableRng;
    use rand_chacha::ChaChaRng;

    use super::*;

    fn test_key() -> RsaPublicKey {
        RsaPublicKey::new(BigUint::from(3233u32), BigUint::from(17u32))
    }

    #[test]
    fn has_expected_length_and_index_partition() {
        let pk = test_key();
        let mut rng = ChaChaRng::seed_from_u64(0);
        let (target, _) = pk.generate_puzzle(&mut rng);
        let params = SolverParams::new(2, 3).unwrap();

        let set = PuzzleSet::new(&mut rng, &pk, &target, &params);

        assert_eq!(set.len(), 5);
        assert_eq!(set.real_indices().len(), 2);
        assert_eq!(set.fake_indices().len(), 3);

        let mut all: Vec<usize> = set.real_indices();
        all.extend(set.fake_indices());
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn shuffle_is_deterministic_given_seed() {
        let pk = test_key();
        let mut rng_a = ChaChaRng::seed_from_u64(42);
        let (target, _) = pk.generate_puzzle(&mut rng_a);
        let params = SolverParams::new(2, 3).unwrap();

        let mut rng_b = ChaChaRng::seed_from_u64(42);
        let (target_b, _) = pk.generate_puzzle(&mut rng_b);

        let set_a = PuzzleSet::new(&mut rng_a, &pk, &target, &params);
        let set_b = PuzzleSet::new(&mut rng_b, &pk, &target_b, &params);

        assert_eq!(set_a.real_indices(), set_b.real_indices());
        assert_eq!(set_a.puzzles(), set_b.puzzles());
    }
}
