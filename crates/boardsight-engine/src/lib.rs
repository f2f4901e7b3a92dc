//! Move Ranker boundary for boardsight.
//!
//! The reconstruction pipeline hands a validated [`PositionEncoding`] to a
//! [`MoveRanker`] and gets back up to K candidate moves in rank order. The
//! provided implementation, [`UciEngine`], drives an external engine process
//! over the UCI text protocol with a hard per-query deadline.
//!
//! Every failure is returned as an [`EngineError`]; callers are expected to
//! skip the cycle and call [`MoveRanker::restart`] rather than abort.
//!
//! [`PositionEncoding`]: boardsight_position::PositionEncoding

mod error;
mod protocol;
mod ranker;
mod uci;

pub use error::EngineError;
pub use protocol::{parse_bestmove, parse_info_line, InfoLine, Score};
pub use ranker::{MoveRanker, RankedMove, SearchLimits};
pub use uci::{EngineCommand, UciEngine};
