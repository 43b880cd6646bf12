#![warn(missing_docs)]

//! A client implementation of the cut-and-choose puzzle-solving protocol at
//! the heart of a TumbleBit-style unlinkable Bitcoin mixing scheme.
//!
//! The Tumbler holds the RSA decryption of a "puzzle" the client cannot
//! compute on its own. [`PuzzleSolver`] drives the client through a
//! cut-and-choose audit that extracts that decryption while cryptographically
//! binding the Tumbler to having done so honestly, without ever telling the
//! Tumbler which puzzle among the batch it sent was the real one.
//!
//! This crate is the state machine only. Shipping the puzzles and commitments
//! over the wire, the surrounding promise sub-protocol, and on-chain
//! transaction construction are all the caller's responsibility.
//!
//! ```
//! use num_bigint::BigUint;
//! use puzzle_solver::{Puzzle, PuzzleCommitment, PuzzleSolver, RsaPublicKey, SolverParams};
//! use rand::rngs::OsRng;
//!
//! # fn server_solve(puzzle: &BigUint, n: &BigUint, d: &BigUint) -> BigUint {
//! #     puzzle.modpow(d, n)
//! # }
//! #
//! // Toy RSA key; a real Tumbler's key is thousands of bits.
//! let n = BigUint::from(3233u32);
//! let e = BigUint::from(17u32);
//! let d = BigUint::from(2753u32);
//! let pk = RsaPublicKey::new(n.clone(), e);
//!
//! let target_solution = BigUint::from(0x42u32);
//! let target_puzzle = Puzzle::from_raw(target_solution.modpow(pk.exponent(), pk.modulus()));
//!
//! let mut solver = PuzzleSolver::new(pk.clone(), target_puzzle, SolverParams::new(2, 3)?);
//! let mut rng = OsRng;
//!
//! let puzzles = solver.generate_puzzles(&mut rng)?;
//!
//! // The Tumbler commits to a key and an encrypted solution per puzzle.
//! let mut keys = Vec::new();
//! let mut commitments = Vec::new();
//! for puzzle in &puzzles {
//!     let mut key = [0u8; 32];
//!     rand::RngCore::fill_bytes(&mut rng, &mut key);
//!     let solution = server_solve(puzzle, &n, &d);
//!     commitments.push(PuzzleCommitment::commit(&key, &pk.encode(&solution)));
//!     keys.push(key);
//! }
//!
//! let challenges = solver.accept_commitments(commitments)?;
//! let fake_keys = challenges.iter().map(|c| keys[c.index]).collect();
//! solver.accept_fake_keys(fake_keys)?;
//!
//! let fake_idx: std::collections::HashSet<usize> = challenges.iter().map(|c| c.index).collect();
//! let real_keys = (0..puzzles.len()).filter(|i| !fake_idx.contains(i)).map(|i| keys[i]).collect();
//! let solution = solver.accept_real_keys(real_keys)?;
//!
//! assert_eq!(solution, pk.encode(&target_solution));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use crate::commitment::{stream_decrypt, stream_encrypt, ChachaKey, PuzzleCommitment};
pub use crate::errors::SolverError;
pub use crate::params::SolverParams;
pub use crate::rsa::{BlindFactor, Puzzle, RsaPublicKey};
pub use crate::solver::{PuzzleSolution, PuzzleSolver};

mod commitment;
mod errors;
mod params;
mod puzzle_set;
mod rsa;
mod solver;
