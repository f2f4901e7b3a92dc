//! `UciEngine`: a child process spoken to over stdin/stdout.

use crate::protocol::{parse_bestmove, parse_info_line};
use crate::{EngineError, MoveRanker, RankedMove, Score, SearchLimits};
use boardsight_position::PositionEncoding;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use tracing::instrument;

const CMD_UCI: &str = "uci";
const CMD_IS_READY: &str = "isready";
const CMD_SET_OPTION: &str = "setoption";
const CMD_POSITION: &str = "position";
const CMD_GO: &str = "go";
const CMD_STOP: &str = "stop";
const CMD_QUIT: &str = "quit";

const REPLY_UCI_OK: &str = "uciok";
const REPLY_READY_OK: &str = "readyok";
const REPLY_BEST_MOVE: &str = "bestmove";

/// Budget for the start-up `uci`/`isready` round trips.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
/// How long `quit` gets before the process is killed.
const QUIT_GRACE: Duration = Duration::from_millis(300);

/// Program and arguments used to start the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl EngineCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

struct EngineProcess {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    reader: Option<JoinHandle<()>>,
    multipv: Option<u32>,
}

impl EngineProcess {
    fn spawn(command: &EngineCommand) -> Result<Self, EngineError> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => EngineError::NotFound(command.program.clone()),
                _ => EngineError::Spawn {
                    path: command.program.clone(),
                    source,
                },
            })?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(EngineError::NotRunning);
        };

        let (tx, lines) = crossbeam_channel::unbounded();
        let reader = std::thread::Builder::new()
            .name("uci-stdout".to_string())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            child,
            stdin,
            lines,
            reader: Some(reader),
            multipv: None,
        })
    }

    fn send(&mut self, command: &str) -> Result<(), EngineError> {
        debug!("uci > {command}");
        writeln!(self.stdin, "{command}")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Next line, or an error once `deadline` passes or the engine exits.
    fn next_line(
        &self,
        deadline: Instant,
        started: Instant,
        waiting_for: &'static str,
    ) -> Result<String, EngineError> {
        match self.lines.recv_deadline(deadline) {
            Ok(line) => {
                debug!("uci < {line}");
                Ok(line)
            }
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout {
                waiting_for,
                elapsed: started.elapsed(),
            }),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::UnexpectedEof(waiting_for)),
        }
    }

    fn wait_for(&mut self, reply: &'static str, timeout: Duration) -> Result<(), EngineError> {
        let started = Instant::now();
        self.wait_until(reply, started, started + timeout)
    }

    /// Skip lines until one starts with `reply`.
    fn wait_until(
        &mut self,
        reply: &'static str,
        started: Instant,
        deadline: Instant,
    ) -> Result<(), EngineError> {
        loop {
            let line = self.next_line(deadline, started, reply)?;
            if line.trim_start().starts_with(reply) {
                return Ok(());
            }
        }
    }

    fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(CMD_UCI)?;
        self.wait_for(REPLY_UCI_OK, HANDSHAKE_TIMEOUT)?;
        self.send(CMD_IS_READY)?;
        self.wait_for(REPLY_READY_OK, HANDSHAKE_TIMEOUT)
    }

    fn search(
        &mut self,
        position: &PositionEncoding,
        limits: &SearchLimits,
    ) -> Result<Vec<RankedMove>, EngineError> {
        // the ready fence and the search share one deadline
        let started = Instant::now();
        let deadline = started + limits.deadline();

        let wanted = limits.multipv.max(1);
        if self.multipv != Some(wanted) {
            self.send(&format!("{CMD_SET_OPTION} name MultiPV value {wanted}"))?;
            self.multipv = Some(wanted);
        }
        self.send(CMD_IS_READY)?;
        self.wait_until(REPLY_READY_OK, started, deadline)?;

        self.send(&format!("{CMD_POSITION} fen {position}"))?;
        self.send(&format!("{CMD_GO} movetime {}", limits.movetime_ms))?;

        // later lines are deeper and replace earlier ones
        let mut lines: BTreeMap<u32, (String, Score)> = BTreeMap::new();
        loop {
            let line = match self.next_line(deadline, started, REPLY_BEST_MOVE) {
                Ok(line) => line,
                Err(err) => {
                    let _ = self.send(CMD_STOP);
                    return Err(err);
                }
            };
            if let Some(info) = parse_info_line(&line) {
                if (1..=wanted).contains(&info.multipv) {
                    lines.insert(info.multipv, (info.best, info.score));
                }
                continue;
            }
            if let Some(best) = parse_bestmove(&line) {
                return Ok(collect_ranked(lines, best));
            }
        }
    }

    fn quit(mut self) {
        let _ = self.send(CMD_QUIT);
        let deadline = Instant::now() + QUIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() < deadline => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                _ => {
                    let _ = self.child.kill();
                    let _ = self.child.wait();
                    break;
                }
            }
        }
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
    }
}

/// Order candidates by rank and drop repeated moves. A `bestmove` with no
/// accompanying score is not reported.
fn collect_ranked(lines: BTreeMap<u32, (String, Score)>, best: Option<String>) -> Vec<RankedMove> {
    if best.is_none() {
        return Vec::new();
    }
    let mut out: Vec<RankedMove> = Vec::with_capacity(lines.len());
    for (_, (uci, score)) in lines {
        if out.iter().any(|m| m.uci == uci) {
            continue;
        }
        out.push(RankedMove {
            rank: out.len() as u32 + 1,
            uci,
            score,
        });
    }
    out
}

/// UCI engine process owned for a whole session.
pub struct UciEngine {
    command: EngineCommand,
    process: Option<EngineProcess>,
}

impl UciEngine {
    /// Start the engine and complete the `uci` / `isready` handshake.
    pub fn start(command: EngineCommand) -> Result<Self, EngineError> {
        let mut engine = Self {
            command,
            process: None,
        };
        engine.launch()?;
        Ok(engine)
    }

    pub fn command(&self) -> &EngineCommand {
        &self.command
    }

    pub fn is_running(&self) -> bool {
        self.process.is_some()
    }

    fn launch(&mut self) -> Result<(), EngineError> {
        let mut process = EngineProcess::spawn(&self.command)?;
        if let Err(err) = process.handshake() {
            process.quit();
            return Err(err);
        }
        info!("engine {} ready", self.command.program.display());
        self.process = Some(process);
        Ok(())
    }
}

impl MoveRanker for UciEngine {
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip_all, fields(position = %position)))]
    fn rank(
        &mut self,
        position: &PositionEncoding,
        limits: &SearchLimits,
    ) -> Result<Vec<RankedMove>, EngineError> {
        let process = self.process.as_mut().ok_or(EngineError::NotRunning)?;
        process.search(position, limits)
    }

    fn restart(&mut self) -> Result<(), EngineError> {
        warn!("restarting engine {}", self.command.program.display());
        self.shutdown();
        self.launch()
    }

    fn shutdown(&mut self) {
        if let Some(process) = self.process.take() {
            process.quit();
            debug!("engine stopped");
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for UciEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UciEngine")
            .field("command", &self.command)
            .field("running", &self.is_running())
            .finish()
    }
}
