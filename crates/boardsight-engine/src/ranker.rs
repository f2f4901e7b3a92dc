use crate::{EngineError, Score};
use boardsight_position::PositionEncoding;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One candidate move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankedMove {
    /// 1-based.
    pub rank: u32,
    /// Coordinate notation, e.g. `e2e4` or `e7e8q`.
    pub uci: String,
    pub score: Score,
}

/// Per-query search budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchLimits {
    pub movetime_ms: u64,
    /// Number of candidates K.
    pub multipv: u32,
    /// Extra wait on top of `movetime_ms` before the query is abandoned.
    pub deadline_grace_ms: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            movetime_ms: 500,
            multipv: 3,
            deadline_grace_ms: 500,
        }
    }
}

impl SearchLimits {
    pub fn movetime(&self) -> Duration {
        Duration::from_millis(self.movetime_ms)
    }

    /// Hard bound on one query.
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.movetime_ms.saturating_add(self.deadline_grace_ms))
    }
}

/// The external search collaborator.
///
/// `rank` returns at most `limits.multipv` moves, ranks `1..=n` in order with
/// no duplicate moves. An empty list means the position has no legal moves.
pub trait MoveRanker {
    fn rank(
        &mut self,
        position: &PositionEncoding,
        limits: &SearchLimits,
    ) -> Result<Vec<RankedMove>, EngineError>;

    /// Tear down and reacquire the collaborator after a failure.
    fn restart(&mut self) -> Result<(), EngineError>;

    /// Release the collaborator. Safe to call more than once.
    fn shutdown(&mut self);
}

impl<R: MoveRanker + ?Sized> MoveRanker for Box<R> {
    fn rank(
        &mut self,
        position: &PositionEncoding,
        limits: &SearchLimits,
    ) -> Result<Vec<RankedMove>, EngineError> {
        (**self).rank(position, limits)
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        (**self).restart()
    }

    fn shutdown(&mut self) {
        (**self).shutdown()
    }
}
