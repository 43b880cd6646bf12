//! The cut-and-choose client state machine: the core of this crate.
//!
//! `PuzzleSolver` drives the five-state protocol by which a client obtains
//! the RSA preimage of a target puzzle from a server without the server
//! learning which of the puzzles it saw was real, and with cryptographic
//! assurance the server didn't cheat.
//!
//! # State-machine encoding
//!
//! A tempting alternative design gives each state its own consuming type,
//! so that calling a transition out of order is a compile error rather
//! than a runtime one. That's rejected here on purpose: this protocol's
//! correctness tests require that misordering a call return a recoverable
//! [`SolverError::InvalidState`] and leave the session usable for the
//! *correct* next call (see the `state_linearity` test below). A type that
//! doesn't offer the wrong method at all can't satisfy that: there's
//! nothing to call, and nothing left afterward to call correctly. So
//! `PuzzleSolver` keeps one type with an internal `State` field, checked at
//! the top of every transition.

use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::commitment::{key_hash, stream_decrypt, ChachaKey, PuzzleCommitment};
use crate::errors::SolverError;
use crate::params::SolverParams;
use crate::puzzle_set::PuzzleSet;
use crate::rsa::{Puzzle, RsaPublicKey};

enum State {
    Initialized,
    WaitingCommitments { puzzle_set: PuzzleSet },
    WaitingFakeKeys { puzzle_set: PuzzleSet, commitments: Vec<PuzzleCommitment> },
    WaitingRealKeys { puzzle_set: PuzzleSet, commitments: Vec<PuzzleCommitment> },
    Completed { solution: Vec<u8> },
    /// Entered on any fatal verification failure. Terminal: no further
    /// transition succeeds.
    Poisoned,
}

/// The client's side of one puzzle-solving session with the Tumbler.
///
/// Constructed with the server's public key, the target puzzle, and the
/// session's parameters. Drives through `generate_puzzles`,
/// `accept_commitments`, `accept_fake_keys`, and `accept_real_keys` in that
/// order; any other call order fails with [`SolverError::InvalidState`]
/// without disturbing the session, and any verification failure poisons the
/// session permanently.
pub struct PuzzleSolver {
    pk: RsaPublicKey,
    target_puzzle: Puzzle,
    params: SolverParams,
    state: State,
}

/// A single fake-position challenge handed back to the server after T2:
/// "prove you committed honestly to the puzzle I now reveal as fake."
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PuzzleSolution {
    /// The puzzle-set index being revealed.
    pub index: usize,
    /// The client's previously-chosen solution for that index.
    pub solution_bytes: Vec<u8>,
}

impl PuzzleSolver {
    /// Begins a new session for `target_puzzle` under `pk` with `params`.
    #[must_use]
    pub fn new(pk: RsaPublicKey, target_puzzle: Puzzle, params: SolverParams) -> PuzzleSolver {
        PuzzleSolver { pk, target_puzzle, params, state: State::Initialized }
    }

    /// The parameters this session was created with.
    #[must_use]
    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// T1: builds the puzzle set and returns the puzzles to send to the
    /// server, in index order.
    ///
    /// `Initialized -> WaitingCommitments`.
    pub fn generate_puzzles(
        &mut self,
        rng: &mut (impl RngCore + CryptoRng),
    ) -> Result<Vec<BigUint>, SolverError> {
        match &self.state {
            State::Initialized => {}
            _ => return Err(self.invalid_state()),
        }

        let puzzle_set = PuzzleSet::new(rng, &self.pk, &self.target_puzzle, &self.params);
        let puzzles = puzzle_set.puzzles();
        self.state = State::WaitingCommitments { puzzle_set };
        Ok(puzzles)
    }

    /// T2: accepts the server's commitments and returns the fake-position
    /// challenges (T2's output, "reveal the fake solutions").
    ///
    /// `WaitingCommitments -> WaitingEncryptedFakePuzzleKeys`.
    pub fn accept_commitments(
        &mut self,
        commitments: Vec<PuzzleCommitment>,
    ) -> Result<Vec<PuzzleSolution>, SolverError> {
        let puzzle_set = match &self.state {
            State::WaitingCommitments { .. } => {
                let State::WaitingCommitments { puzzle_set } =
                    std::mem::replace(&mut self.state, State::Poisoned)
                else {
                    unreachable!()
                };
                puzzle_set
            }
            _ => return Err(self.invalid_state()),
        };

        if commitments.len() != self.params.total() {
            // Put the state back: a wrong-length argument must not mutate
            // the session.
            self.state = State::WaitingCommitments { puzzle_set };
            return Err(SolverError::InvalidArgument(format!(
                "expected {} commitments, got {}",
                self.params.total(),
                commitments.len()
            )));
        }

        let fake_solutions = puzzle_set
            .fake_indices()
            .into_iter()
            .map(|index| {
                let crate::puzzle_set::PuzzleSetElement::Fake { known_solution, .. } =
                    puzzle_set.get(index).expect("fake index is in range")
                else {
                    unreachable!("fake_indices only yields Fake elements")
                };
                PuzzleSolution { index, solution_bytes: known_solution.as_bytes().to_vec() }
            })
            .collect();

        self.state = State::WaitingFakeKeys { puzzle_set, commitments };
        Ok(fake_solutions)
    }

    /// T3: verifies the server's fake-puzzle keys against the prior
    /// commitments and the client's known fake solutions, and returns the
    /// blind factors for the real puzzles (T3's output, "reveal the blind
    /// factors").
    ///
    /// `WaitingEncryptedFakePuzzleKeys -> WaitingEncryptedRealPuzzleKeys`.
    ///
    /// `keys` must be ordered to match the ascending fake-index order T2
    /// revealed. A hash or decrypted-solution mismatch is fatal and
    /// protocol-ends the session (see module docs): it's proof the server
    /// didn't commit honestly.
    pub fn accept_fake_keys(
        &mut self,
        mut keys: Vec<ChachaKey>,
    ) -> Result<Vec<Vec<u8>>, SolverError> {
        let (puzzle_set, commitments) = match &self.state {
            State::WaitingFakeKeys { .. } => {
                let State::WaitingFakeKeys { puzzle_set, commitments } =
                    std::mem::replace(&mut self.state, State::Poisoned)
                else {
                    unreachable!()
                };
                (puzzle_set, commitments)
            }
            _ => return Err(self.invalid_state()),
        };

        if keys.len() != self.params.fake_count {
            self.state = State::WaitingFakeKeys { puzzle_set, commitments };
            return Err(SolverError::InvalidArgument(format!(
                "expected {} fake keys, got {}",
                self.params.fake_count,
                keys.len()
            )));
        }

        let fake_indices = puzzle_set.fake_indices();
        for (key, index) in keys.iter_mut().zip(fake_indices.iter().copied()) {
            let result = verify_fake_position(&puzzle_set, &commitments, index, key);
            key.zeroize();
            result?;
        }

        let blind_factors = puzzle_set
            .real_indices()
            .into_iter()
            .map(|index| {
                let crate::puzzle_set::PuzzleSetElement::Real { blind_factor, .. } =
                    puzzle_set.get(index).expect("real index is in range")
                else {
                    unreachable!("real_indices only yields Real elements")
                };
                self.pk.encode(blind_factor.value())
            })
            .collect();

        self.state = State::WaitingRealKeys { puzzle_set, commitments };
        Ok(blind_factors)
    }

    /// T4: scans the real positions in ascending index order for one whose
    /// revealed key decrypts to a value that verifies against the target
    /// puzzle, unblinds it, and completes the session.
    ///
    /// `WaitingEncryptedRealPuzzleKeys -> Completed`.
    ///
    /// The real-phase hash check is lenient: a real position whose key
    /// hash doesn't match its commitment is skipped rather than treated as
    /// fatal, accommodating a server that only ever reveals one valid real
    /// key. Unlike T3, failing to find *any* verifying solution across all
    /// positions is still fatal.
    pub fn accept_real_keys(&mut self, mut keys: Vec<ChachaKey>) -> Result<Vec<u8>, SolverError> {
        let (puzzle_set, commitments) = match &self.state {
            State::WaitingRealKeys { .. } => {
                let State::WaitingRealKeys { puzzle_set, commitments } =
                    std::mem::replace(&mut self.state, State::Poisoned)
                else {
                    unreachable!()
                };
                (puzzle_set, commitments)
            }
            _ => return Err(self.invalid_state()),
        };

        if keys.len() != self.params.real_count {
            self.state = State::WaitingRealKeys { puzzle_set, commitments };
            return Err(SolverError::InvalidArgument(format!(
                "expected {} real keys, got {}",
                self.params.real_count,
                keys.len()
            )));
        }

        let real_indices = puzzle_set.real_indices();
        let mut found = None;

        for (key, index) in keys.iter_mut().zip(real_indices.iter().copied()) {
            let element = puzzle_set.get(index).expect("real index is in range");
            let crate::puzzle_set::PuzzleSetElement::Real { puzzle, blind_factor } = element else {
                unreachable!("real_indices only yields Real elements")
            };

            if found.is_none() && key_hash(key) == commitments[index].key_hash {
                let candidate_bytes = stream_decrypt(key, &commitments[index].encrypted_solution);
                if let Ok(candidate) = self.pk.decode(&candidate_bytes) {
                    if self.pk.verify(puzzle, &candidate) {
                        found = Some(self.pk.unblind(&candidate, blind_factor));
                    }
                }
            }
            key.zeroize();
        }

        match found {
            Some(solution) => {
                let solution_bytes = self.pk.encode(&solution);
                self.state = State::Completed { solution: solution_bytes.clone() };
                Ok(solution_bytes)
            }
            None => {
                // Already poisoned above; this is proof of server
                // misbehavior, not a recoverable condition.
                Err(SolverError::SolutionNotFound)
            }
        }
    }

    fn invalid_state(&self) -> SolverError {
        SolverError::InvalidState
    }
}

fn verify_fake_position(
    puzzle_set: &PuzzleSet,
    commitments: &[PuzzleCommitment],
    index: usize,
    key: &ChachaKey,
) -> Result<(), SolverError> {
    let commitment = &commitments[index];

    if key_hash(key) != commitment.key_hash {
        return Err(SolverError::CommitmentHashInvalid);
    }

    let crate::puzzle_set::PuzzleSetElement::Fake { known_solution, .. } =
        puzzle_set.get(index).expect("fake index is in range")
    else {
        unreachable!("fake_indices only yields Fake elements")
    };

    let decrypted = stream_decrypt(key, &commitment.encrypted_solution);
    if decrypted != known_solution.as_bytes() {
        return Err(SolverError::CommitmentSolutionInvalid);
    }

    Ok(())
}
