use thiserror::Error;

/// An error returned by a `PuzzleSolver` transition.
///
/// The last three variants are protocol-fatal: they constitute proof that
/// the server deviated from the protocol and the session must be abandoned.
/// `InvalidArgument` and `InvalidState` are programmer errors and never
/// indicate server misbehavior.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SolverError {
    /// A caller-supplied argument had the wrong shape (usually the wrong
    /// number of elements for the current transition).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The transition was invoked in a state other than its prerequisite,
    /// or the session was previously poisoned by a fatal verification
    /// failure.
    #[error("invalid operation for the current session state")]
    InvalidState,

    /// A revealed fake-puzzle key's RIPEMD-160 hash did not match the
    /// commitment made for that position.
    #[error("commitment hash invalid")]
    CommitmentHashInvalid,

    /// A revealed fake-puzzle key decrypted its commitment to a value other
    /// than the solution the client chose when fabricating that puzzle.
    #[error("commitment encrypted solution invalid")]
    CommitmentSolutionInvalid,

    /// No real-puzzle position yielded a solution that verified against the
    /// target puzzle.
    #[error("impossible to find solution to the puzzle")]
    SolutionNotFound,
}
