//! Watch an on-screen chess board and rank candidate moves for it.
//!
//! This is the facade crate. It re-exports the pipeline crates under short
//! names and adds the parts that touch the outside world: screen sources,
//! JSON session configuration, the monitor loop and its text renderer.
//!
//! ```no_run
//! use boardsight::{Monitor, MonitorSettings, SessionConfig, UciEngine, XcapScreen};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = SessionConfig::default();
//! let engine = UciEngine::start(cfg.engine_command())?;
//! let monitor = Monitor::new(
//!     XcapScreen::new(),
//!     cfg.build_classifier()?,
//!     engine,
//!     MonitorSettings::from(&cfg),
//! );
//! monitor.run(CancellationToken::new(), std::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

pub use boardsight_core as core;
pub use boardsight_engine as engine;
pub use boardsight_position as position;
pub use boardsight_vision as vision;

mod capture;
mod config;
mod error;
mod monitor;
pub mod render;

pub use capture::{load_rgb, rgb_from_rgba, save_png, ReplaySource, ScreenSource};
#[cfg(feature = "capture")]
pub use capture::XcapScreen;
pub use config::{SessionConfig, Strategy};
pub use error::{CaptureError, ConfigError, MonitorError};
pub use monitor::{
    classify_board, rank_and_render, Monitor, MonitorSettings, MonitorState, TickOutcome,
};

pub use boardsight_core::{BoardRegion, Occupant};
pub use boardsight_engine::{EngineCommand, MoveRanker, RankedMove, SearchLimits, UciEngine};
pub use boardsight_position::{PositionAssembler, PositionEncoding, PositionMatrix};
pub use boardsight_vision::{SquareClassifier, TemplateSet};
