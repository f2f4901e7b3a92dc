//! Monitor Loop: locate once, then check and react on an interval.

use crate::capture::ScreenSource;
use crate::core::{BoardRegion, RgbImageView};
use crate::engine::{MoveRanker, RankedMove, SearchLimits};
use crate::position::{Assembly, PositionAssembler, PositionEncoding, PositionMatrix};
use crate::render;
use crate::vision::{
    fingerprint, locate_board, square_patch, ChangeDetector, LocatorParams, SquareClassifier,
};
use crate::{MonitorError, SessionConfig};
use log::{debug, info, warn};
use std::io::Write;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Classify all 64 squares of `region`. Squares past the capture edge are
/// classified from black padding.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(region = %region)))]
pub fn classify_board(
    capture: &RgbImageView<'_>,
    region: &BoardRegion,
    classifier: &dyn SquareClassifier,
) -> PositionMatrix {
    PositionMatrix::from_fn(|square| {
        let patch = square_patch(capture, region, square);
        classifier.classify(&patch.view())
    })
}

/// Rank `position` and render the result. A ranking failure is reported and
/// the ranker restarted; the caller gets `Ok(None)`.
pub fn rank_and_render<R: MoveRanker + ?Sized>(
    ranker: &mut R,
    position: &PositionEncoding,
    limits: &SearchLimits,
    out: &mut impl Write,
) -> std::io::Result<Option<Vec<RankedMove>>> {
    match ranker.rank(position, limits) {
        Ok(moves) => {
            render::render_moves(out, position, &moves)?;
            Ok(Some(moves))
        }
        Err(err) => {
            render::render_status(out, &format!("Engine error: {err}; skipping this cycle."))?;
            if let Err(restart) = ranker.restart() {
                warn!("engine restart failed: {restart}");
            }
            Ok(None)
        }
    }
}

/// Timing and search settings of a session.
#[derive(Clone, Debug, PartialEq)]
pub struct MonitorSettings {
    pub locator: LocatorParams,
    pub limits: SearchLimits,
    pub poll_interval: Duration,
    pub search_retry: Duration,
}

impl From<&SessionConfig> for MonitorSettings {
    fn from(cfg: &SessionConfig) -> Self {
        Self {
            locator: cfg.locator.clone(),
            limits: cfg.search,
            poll_interval: cfg.poll_interval(),
            search_retry: cfg.search_retry(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorState {
    /// Board region unknown.
    Searching,
    /// Board region found; it is kept for the rest of the session.
    Tracking(BoardRegion),
}

/// What one tick did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    NotFound,
    Located(BoardRegion),
    Unchanged,
    /// Visual change that reconstructed to the position ranked last time.
    Duplicate,
    Ranked(Vec<RankedMove>),
    RankingFailed,
}

/// The session context: every piece of mutable state the loop needs.
pub struct Monitor<S, R> {
    source: S,
    classifier: Box<dyn SquareClassifier>,
    ranker: R,
    settings: MonitorSettings,
    state: MonitorState,
    detector: ChangeDetector,
    assembler: PositionAssembler,
    last_ranked: Option<PositionEncoding>,
    ticks: u64,
}

impl<S: ScreenSource, R: MoveRanker> Monitor<S, R> {
    pub fn new(
        source: S,
        classifier: Box<dyn SquareClassifier>,
        ranker: R,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            source,
            classifier,
            ranker,
            settings,
            state: MonitorState::Searching,
            detector: ChangeDetector::new(),
            assembler: PositionAssembler::new(),
            last_ranked: None,
            ticks: 0,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn region(&self) -> Option<BoardRegion> {
        match self.state {
            MonitorState::Searching => None,
            MonitorState::Tracking(region) => Some(region),
        }
    }

    pub fn assembler(&self) -> &PositionAssembler {
        &self.assembler
    }

    pub fn ranker_mut(&mut self) -> &mut R {
        &mut self.ranker
    }

    /// Delay before the next tick in the current state.
    pub fn period(&self) -> Duration {
        match self.state {
            MonitorState::Searching => self.settings.search_retry,
            MonitorState::Tracking(_) => self.settings.poll_interval,
        }
    }

    /// One Region Locator attempt. Switches to tracking on success.
    pub fn locate_once(&mut self, out: &mut impl Write) -> Result<Option<BoardRegion>, MonitorError> {
        let capture = self.source.capture()?;
        match locate_board(&capture.view(), &self.settings.locator) {
            Some(region) => {
                info!("board located at {region}");
                render::render_region(out, &region)?;
                self.state = MonitorState::Tracking(region);
                Ok(Some(region))
            }
            None => {
                render::render_status(
                    out,
                    &format!(
                        "Board not found; retrying in {:.1}s.",
                        self.settings.search_retry.as_secs_f32()
                    ),
                )?;
                Ok(None)
            }
        }
    }

    /// Run one step of the state machine.
    pub fn tick(&mut self, out: &mut impl Write) -> Result<TickOutcome, MonitorError> {
        let region = match self.state {
            MonitorState::Searching => {
                return Ok(match self.locate_once(out)? {
                    Some(region) => TickOutcome::Located(region),
                    None => TickOutcome::NotFound,
                });
            }
            MonitorState::Tracking(region) => region,
        };
        self.ticks += 1;

        let capture = self.source.capture()?;
        let view = capture.view();
        let current = fingerprint(&view, &region).map_err(crate::CaptureError::from)?;
        if self.detector.last() == Some(&current) {
            debug!("tick {}: unchanged", self.ticks);
            return Ok(TickOutcome::Unchanged);
        }
        render::render_status(out, &format!("Change detected (tick {}).", self.ticks))?;

        // the fingerprint is committed only once the board has been read
        let matrix = classify_board(&view, &region, self.classifier.as_ref());
        self.detector.observe_fingerprint(current);
        let assembly = self.assembler.assemble(&matrix);
        self.react(assembly, out)
    }

    /// Route operator-supplied text through validation and ranking.
    pub fn apply_override(&mut self, input: &str, out: &mut impl Write) -> Result<TickOutcome, MonitorError> {
        let assembly = self.assembler.apply_override(input);
        self.react(assembly, out)
    }

    fn react(&mut self, assembly: Assembly, out: &mut impl Write) -> Result<TickOutcome, MonitorError> {
        render::render_assembly_note(out, &assembly)?;
        let position = assembly.encoding;
        if self.last_ranked.as_ref() == Some(&position) {
            debug!("position unchanged since last ranking: {position}");
            return Ok(TickOutcome::Duplicate);
        }

        render::render_position(out, &position)?;
        match rank_and_render(&mut self.ranker, &position, &self.settings.limits, out)? {
            Some(moves) => {
                self.last_ranked = Some(position);
                Ok(TickOutcome::Ranked(moves))
            }
            None => Ok(TickOutcome::RankingFailed),
        }
    }

    /// Drive the loop until `cancel` fires, then release the ranker.
    ///
    /// Capture failures are transient and only reported; output failures end
    /// the session.
    pub async fn run(mut self, cancel: CancellationToken, mut out: impl Write) -> Result<(), MonitorError> {
        let mut period = self.period();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("monitor loop shutting down");
                    break Ok(());
                }
                _ = ticker.tick() => {
                    match self.tick(&mut out) {
                        Ok(_) => {}
                        Err(MonitorError::Capture(err)) => {
                            warn!("capture failed: {err}");
                            let _ = render::render_status(&mut out, &format!("Capture failed: {err}"));
                        }
                        Err(err) => break Err(err),
                    }
                    let _ = out.flush();
                    if self.period() != period {
                        period = self.period();
                        ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
                        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    }
                }
            }
        };

        self.ranker.shutdown();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ReplaySource;
    use crate::core::{Occupant, RgbImage, SquareIndex};
    use crate::engine::{EngineError, Score};
    use crate::vision::HeuristicClassifier;

    /// Classifier that answers from a fixed matrix by patch position.
    struct Oracle(PositionMatrix);

    impl SquareClassifier for Oracle {
        fn classify(&self, patch: &RgbImageView<'_>) -> Occupant {
            // patches are tagged by their first pixel: [file, rank, 0]
            let [file, rank, _] = patch.pixel(0, 0);
            SquareIndex::from_coords(file as usize, rank as usize)
                .map(|sq| self.0.get(sq))
                .unwrap_or_default()
        }

        fn name(&self) -> &'static str {
            "oracle"
        }
    }

    #[derive(Default)]
    struct CountingRanker {
        calls: usize,
        fail_next: bool,
        restarts: usize,
        shut_down: bool,
    }

    impl MoveRanker for CountingRanker {
        fn rank(&mut self, _: &PositionEncoding, _: &SearchLimits) -> Result<Vec<RankedMove>, EngineError> {
            self.calls += 1;
            if std::mem::take(&mut self.fail_next) {
                return Err(EngineError::NotRunning);
            }
            Ok(vec![RankedMove {
                rank: 1,
                uci: "e2e4".into(),
                score: Score::Centipawns(20),
            }])
        }

        fn restart(&mut self) -> Result<(), EngineError> {
            self.restarts += 1;
            Ok(())
        }

        fn shutdown(&mut self) {
            self.shut_down = true;
        }
    }

    fn tagged_board(region: BoardRegion, extra: u8) -> RgbImage {
        let mut img = RgbImage::filled(region.x + region.width, region.y + region.height, [0, 0, 0]);
        for sq in SquareIndex::all() {
            let r = region.square_rect(sq);
            img.fill_region(&r, [sq.file() as u8, sq.rank() as u8, extra]);
        }
        img
    }

    fn monitor(frames: Vec<RgbImage>, matrix: PositionMatrix) -> Monitor<ReplaySource, CountingRanker> {
        let settings = MonitorSettings::from(&SessionConfig::default());
        Monitor::new(
            ReplaySource::new(frames),
            Box::new(Oracle(matrix)),
            CountingRanker::default(),
            settings,
        )
    }

    #[test]
    fn searching_reports_and_stays_searching() {
        let blank = RgbImage::filled(64, 64, [30, 30, 30]);
        let mut m = monitor(vec![blank], PositionMatrix::starting());
        let mut out = Vec::new();
        assert_eq!(m.tick(&mut out).expect("tick"), TickOutcome::NotFound);
        assert_eq!(m.state(), MonitorState::Searching);
        assert!(String::from_utf8_lossy(&out).contains("Board not found"));
        assert_eq!(m.period(), Duration::from_secs(2));
    }

    #[test]
    fn unchanged_board_is_not_reanalysed() {
        let region = BoardRegion::new(0, 0, 80, 80);
        let mut m = monitor(vec![tagged_board(region, 0)], PositionMatrix::starting());
        m.state = MonitorState::Tracking(region);
        let mut out = Vec::new();

        assert!(matches!(m.tick(&mut out).expect("tick"), TickOutcome::Ranked(_)));
        assert_eq!(m.tick(&mut out).expect("tick"), TickOutcome::Unchanged);
        assert_eq!(m.ranker.calls, 1);
    }

    #[test]
    fn visual_change_with_same_position_is_a_duplicate() {
        let region = BoardRegion::new(0, 0, 80, 80);
        let frames = vec![tagged_board(region, 0), tagged_board(region, 1)];
        let mut m = monitor(frames, PositionMatrix::starting());
        m.state = MonitorState::Tracking(region);
        let mut out = Vec::new();

        assert!(matches!(m.tick(&mut out).expect("tick"), TickOutcome::Ranked(_)));
        assert_eq!(m.tick(&mut out).expect("tick"), TickOutcome::Duplicate);
        assert_eq!(m.ranker.calls, 1);
    }

    #[test]
    fn ranking_failure_restarts_and_retries_next_change() {
        let region = BoardRegion::new(0, 0, 80, 80);
        let frames = vec![tagged_board(region, 0), tagged_board(region, 1)];
        let mut m = monitor(frames, PositionMatrix::starting());
        m.state = MonitorState::Tracking(region);
        m.ranker.fail_next = true;
        let mut out = Vec::new();

        assert_eq!(m.tick(&mut out).expect("tick"), TickOutcome::RankingFailed);
        assert_eq!(m.ranker.restarts, 1);
        // nothing was ranked, so the same position is not a duplicate
        assert!(matches!(m.tick(&mut out).expect("tick"), TickOutcome::Ranked(_)));
        assert!(String::from_utf8_lossy(&out).contains("Engine error"));
    }

    #[test]
    fn invalid_reconstruction_falls_back_to_starting_position() {
        let region = BoardRegion::new(0, 0, 80, 80);
        let mut m = monitor(vec![tagged_board(region, 0)], PositionMatrix::empty());
        m.state = MonitorState::Tracking(region);
        let mut out = Vec::new();

        assert!(matches!(m.tick(&mut out).expect("tick"), TickOutcome::Ranked(_)));
        let text = String::from_utf8_lossy(&out);
        assert!(text.contains("Invalid position"), "{text}");
        assert!(text.contains(&format!("FEN: {}", PositionEncoding::starting())), "{text}");
    }

    #[test]
    fn override_goes_through_validation() {
        let mut m = monitor(vec![], PositionMatrix::starting());
        let mut out = Vec::new();
        assert!(matches!(
            m.apply_override("start", &mut out).expect("override"),
            TickOutcome::Ranked(_)
        ));
        // garbage keeps the trusted position, which was already ranked
        assert_eq!(
            m.apply_override("not a fen", &mut out).expect("override"),
            TickOutcome::Duplicate
        );
        assert!(String::from_utf8_lossy(&out).contains("Invalid position"));
    }

    #[test]
    fn classify_board_reads_squares_past_the_capture_as_empty() {
        let img = RgbImage::filled(40, 40, [0, 0, 0]);
        let matrix = classify_board(
            &img.view(),
            &BoardRegion::new(0, 0, 80, 80),
            &HeuristicClassifier::default(),
        );
        assert_eq!(matrix.occupied_count(), 0);
    }

    #[test]
    fn short_board_at_the_bottom_edge_is_still_analysed() {
        // 400x340 board flush with the bottom of a 600x420 screen: the
        // 50px squares of rank 1 lie entirely below the capture
        let mut screen = RgbImage::filled(600, 420, [48, 46, 43]);
        screen.fill_region(&BoardRegion::new(100, 80, 400, 340), [118, 150, 86]);
        let settings = MonitorSettings::from(&SessionConfig::default());
        let mut m = Monitor::new(
            ReplaySource::new(vec![screen]),
            Box::new(HeuristicClassifier::default()),
            CountingRanker::default(),
            settings,
        );
        let mut out = Vec::new();

        assert_eq!(
            m.tick(&mut out).expect("locate"),
            TickOutcome::Located(BoardRegion::new(100, 80, 400, 340))
        );
        assert!(matches!(m.tick(&mut out).expect("analyse"), TickOutcome::Ranked(_)));
        assert_eq!(m.tick(&mut out).expect("idle"), TickOutcome::Unchanged);
        assert_eq!(m.ranker.calls, 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn run_returns_once_cancelled() {
        let region = BoardRegion::new(0, 0, 80, 80);
        let m = monitor(vec![tagged_board(region, 0)], PositionMatrix::starting());
        let cancel = CancellationToken::new();
        let handle = {
            let cancel = cancel.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                cancel.cancel();
            }
        };
        let (result, ()) = tokio::join!(m.run(cancel.clone(), std::io::sink()), handle);
        assert!(result.is_ok());
    }
}
