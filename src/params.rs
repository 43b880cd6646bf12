use crate::errors::SolverError;

/// The two puzzle counts negotiated with the server for a session.
///
/// Both counts are fixed for the lifetime of a `PuzzleSolver`; there is no
/// renegotiation. A mismatch with the server's own counts is detected
/// implicitly by the length checks each transition performs on the
/// server's batches, not by anything in this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SolverParams {
    /// Number of real (blinded target) puzzles in the set.
    pub real_count: usize,
    /// Number of fake (freshly generated, client-known) puzzles in the set.
    pub fake_count: usize,
}

impl SolverParams {
    /// The reference production parameters used by the TumbleBit paper and
    /// the x42/Tumbler implementation: 15 real puzzles audited against 285
    /// fakes.
    pub const PRODUCTION: SolverParams = SolverParams { real_count: 15, fake_count: 285 };

    /// Builds a new parameter pair, rejecting degenerate counts.
    ///
    /// Zero of either count would make the cut-and-choose audit vacuous (no
    /// fakes to check, or no real puzzle to solve), so both are required to
    /// be nonzero.
    pub fn new(real_count: usize, fake_count: usize) -> Result<SolverParams, SolverError> {
        if real_count == 0 {
            return Err(SolverError::InvalidArgument("real_count must be nonzero".into()));
        }
        if fake_count == 0 {
            return Err(SolverError::InvalidArgument("fake_count must be nonzero".into()));
        }
        Ok(SolverParams { real_count, fake_count })
    }

    /// Total number of elements in the puzzle set.
    #[must_use]
    pub fn total(&self) -> usize {
        self.real_count + self.fake_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_counts() {
        assert_eq!(
            SolverParams::new(0, 5),
            Err(SolverError::InvalidArgument("real_count must be nonzero".into()))
        );
        assert_eq!(
            SolverParams::new(5, 0),
            Err(SolverError::InvalidArgument("fake_count must be nonzero".into()))
        );
    }

    #[test]
    fn production_total() {
        assert_eq!(SolverParams::PRODUCTION.total(), 300);
    }
}
