//! Diagnostics for the monitor and its engine child.
//!
//! Operator output (located region, diagrams, ranked moves) goes to stdout
//! through the renderer. Everything here goes to stderr, one record per line:
//!
//! ```text
//! [   2.014s  INFO monitor] board located at x=120, y=80, size=400x400
//! [   4.530s DEBUG uci] uci > go movetime 500
//! ```
//!
//! The tag is the last segment of the record's module path. With the
//! `tracing` feature the binary installs a `tracing-subscriber` instead.

use std::fmt;
use std::io::{self, Write};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use log::{Level, LevelFilter, Log, Metadata, Record};

#[cfg(feature = "tracing")]
use tracing_subscriber::fmt::format::FmtSpan;
#[cfg(feature = "tracing")]
use tracing_subscriber::util::SubscriberInitExt;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

/// `boardsight_engine::uci` -> `uci`.
fn tag(target: &str) -> &str {
    target.rsplit("::").next().unwrap_or(target)
}

fn write_record(
    out: &mut impl Write,
    since_start: Duration,
    level: Level,
    target: &str,
    message: fmt::Arguments<'_>,
) -> io::Result<()> {
    writeln!(
        out,
        "[{:8.3}s {:>5} {}] {}",
        since_start.as_secs_f64(),
        level,
        tag(target),
        message
    )
}

struct SessionLog {
    max: LevelFilter,
    session_start: Instant,
}

impl Log for SessionLog {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            // a closed stderr must not take the monitor down
            let _ = write_record(
                &mut io::stderr().lock(),
                self.session_start.elapsed(),
                record.level(),
                record.target(),
                *record.args(),
            );
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
    }
}

static SESSION_LOG: OnceLock<SessionLog> = OnceLock::new();

/// Route `log` records at or above `level` to stderr.
///
/// The first call wins; later calls keep the installed logger and its level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    if SESSION_LOG.get().is_some() {
        return Ok(());
    }
    let logger = SESSION_LOG.get_or_init(|| SessionLog {
        max: level,
        session_start: Instant::now(),
    });
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

/// Parse `off|error|warn|info|debug|trace` (case-insensitive).
pub fn parse_level(s: &str) -> Option<LevelFilter> {
    s.parse().ok()
}

/// Install a `tracing` subscriber. `RUST_LOG` wins over `level` when set;
/// closing spans are reported so per-tick timings show up.
#[cfg(feature = "tracing")]
pub fn init_tracing(level: LevelFilter) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(tracing_subscriber::fmt::time::Uptime::default())
        .with_writer(io::stderr)
        .finish()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(level: Level, target: &str, message: &str) -> String {
        let mut buf = Vec::new();
        write_record(
            &mut buf,
            Duration::from_millis(2014),
            level,
            target,
            format_args!("{message}"),
        )
        .expect("write");
        String::from_utf8(buf).expect("utf8")
    }

    #[test]
    fn parses_level_names() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::Warn));
        assert_eq!(parse_level("loud"), None);
    }

    #[test]
    fn records_are_tagged_with_the_module_name() {
        assert_eq!(
            line(Level::Info, "boardsight::monitor", "board located"),
            "[   2.014s  INFO monitor] board located\n"
        );
        assert_eq!(
            line(Level::Debug, "boardsight_engine::uci", "uci > isready"),
            "[   2.014s DEBUG uci] uci > isready\n"
        );
        assert_eq!(tag("boardsight"), "boardsight");
    }
}
