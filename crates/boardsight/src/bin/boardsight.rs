use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use boardsight::core::{BoardRegion, RgbImage};
use boardsight::position::{ManualInput, PositionAssembler, PositionEncoding};
use boardsight::render;
use boardsight::vision::{locate_board, TemplateError, TemplateSet};
use boardsight::{
    load_rgb, rank_and_render, save_png, CaptureError, ConfigError, Monitor, MonitorError,
    MonitorSettings, MoveRanker, ReplaySource, ScreenSource, SessionConfig, Strategy, UciEngine,
};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use tokio_util::sync::CancellationToken;

#[cfg(not(feature = "tracing"))]
use log::info;
#[cfg(feature = "tracing")]
use tracing::info;

#[cfg(feature = "tracing")]
use boardsight::core::init_tracing;
#[cfg(not(feature = "tracing"))]
use boardsight::core::init_with_level;

#[derive(Debug, Parser)]
#[command(name = "boardsight", version)]
#[command(about = "Watch an on-screen chess board and rank candidate moves", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Session config (JSON). Flags below override its values.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// UCI engine binary.
    #[arg(long, global = true)]
    engine: Option<PathBuf>,

    /// Square classifier: heuristic or template.
    #[arg(long, global = true)]
    strategy: Option<Strategy>,

    /// Directory with the 13 piece templates.
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Number of candidate moves to request.
    #[arg(long, global = true)]
    multipv: Option<u32>,

    /// Engine think time per query.
    #[arg(long, global = true)]
    movetime_ms: Option<u64>,

    #[arg(long, global = true, default_value = "info", value_parser = parse_log_level)]
    log_level: LevelFilter,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Monitor the screen until Ctrl-C.
    Watch,
    /// Capture once and report the board region.
    Locate {
        /// Read the capture from an image file instead of the screen.
        #[arg(long)]
        image: Option<PathBuf>,
        /// Write the board crop as PNG.
        #[arg(long)]
        save_crop: Option<PathBuf>,
    },
    /// Cut piece templates from a board showing the starting position.
    Templates {
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Validate a position (or `start`), rank it once and print the result.
    Analyze { position: String },
    /// Validate a position without starting the engine. Exits 1 if invalid.
    Check { position: String },
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Monitor(#[from] MonitorError),
    #[error(transparent)]
    Templates(#[from] TemplateError),
    #[error("no board found in the capture")]
    BoardNotFound,
    #[error("failed to start the runtime: {0}")]
    Runtime(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

fn parse_log_level(s: &str) -> Result<LevelFilter, String> {
    boardsight::core::parse_level(s).ok_or_else(|| format!("unknown log level {s:?}"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(not(feature = "tracing"))]
    if let Err(err) = init_with_level(cli.global.log_level) {
        eprintln!("failed to install logger: {err}");
    }
    #[cfg(feature = "tracing")]
    init_tracing(cli.global.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::Check { position } => check(&position),
        Command::Analyze { position } => {
            let cfg = session_config(&cli.global)?;
            analyze(&cfg, &position)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Locate { image, save_crop } => {
            let cfg = session_config(&cli.global)?;
            locate(&cfg, image.as_deref(), save_crop.as_deref())?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Templates { out, image } => {
            let cfg = session_config(&cli.global)?;
            bootstrap_templates(&cfg, image.as_deref(), &out)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Watch => {
            let cfg = session_config(&cli.global)?;
            watch(&cfg)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// JSON file (or defaults), then command-line overrides.
fn session_config(args: &GlobalArgs) -> Result<SessionConfig, ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => SessionConfig::load_json(path)?,
        None => SessionConfig::default(),
    };
    if let Some(engine) = &args.engine {
        cfg.engine_path = engine.clone();
    }
    if let Some(strategy) = args.strategy {
        cfg.strategy = strategy;
    }
    if let Some(dir) = &args.templates {
        cfg.templates_dir = Some(dir.clone());
    }
    if let Some(k) = args.multipv {
        cfg.search.multipv = k.max(1);
    }
    if let Some(ms) = args.movetime_ms {
        cfg.search.movetime_ms = ms;
    }
    Ok(cfg)
}

fn screen(image: Option<&Path>) -> Result<Box<dyn ScreenSource>, CaptureError> {
    if let Some(path) = image {
        return Ok(Box::new(ReplaySource::new(vec![load_rgb(path)?])));
    }
    #[cfg(feature = "capture")]
    {
        Ok(Box::new(boardsight::XcapScreen::new()))
    }
    #[cfg(not(feature = "capture"))]
    {
        Err(CaptureError::NoDisplay)
    }
}

fn check(input: &str) -> Result<ExitCode, CliError> {
    let parsed = ManualInput::parse(input).and_then(|manual| match manual {
        ManualInput::StartingPosition => Ok(PositionEncoding::starting()),
        ManualInput::Encoding(text) => PositionEncoding::parse(&text),
    });
    let mut out = std::io::stdout().lock();
    match parsed {
        Ok(position) => {
            writeln!(out, "valid: {position}")?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            writeln!(out, "invalid: {err}")?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn analyze(cfg: &SessionConfig, input: &str) -> Result<(), CliError> {
    let mut engine = UciEngine::start(cfg.engine_command()).map_err(ConfigError::from)?;
    let mut assembler = PositionAssembler::new();
    let assembly = assembler.apply_override(input);

    let mut out = std::io::stdout().lock();
    render::render_assembly_note(&mut out, &assembly)?;
    render::render_position(&mut out, &assembly.encoding)?;
    rank_and_render(&mut engine, &assembly.encoding, &cfg.search, &mut out)?;
    engine.shutdown();
    Ok(())
}

fn capture_board(
    cfg: &SessionConfig,
    image: Option<&Path>,
) -> Result<(RgbImage, BoardRegion), CliError> {
    let capture = screen(image)?.capture()?;
    let region = locate_board(&capture.view(), &cfg.locator)
        .ok_or(CliError::BoardNotFound)?;
    Ok((capture, region))
}

fn locate(cfg: &SessionConfig, image: Option<&Path>, save_crop: Option<&Path>) -> Result<(), CliError> {
    let (capture, region) = capture_board(cfg, image)?;
    render::render_region(&mut std::io::stdout().lock(), &region)?;
    if let Some(path) = save_crop {
        let crop = capture
            .view()
            .crop(&region)
            .map_err(CaptureError::from)?;
        save_png(&crop, path)?;
        info!("board crop written to {}", path.display());
    }
    Ok(())
}

fn bootstrap_templates(cfg: &SessionConfig, image: Option<&Path>, out: &Path) -> Result<(), CliError> {
    let (capture, region) = capture_board(cfg, image)?;
    let templates = TemplateSet::bootstrap_from_start(&capture.view(), &region)?;
    templates.save_dir(out)?;
    println!("Wrote 13 templates to {}", out.display());
    Ok(())
}

fn watch(cfg: &SessionConfig) -> Result<(), CliError> {
    // Prerequisites first: a missing engine or template must stop us before
    // the board search starts.
    let classifier = cfg.build_classifier()?;
    let engine = UciEngine::start(cfg.engine_command()).map_err(ConfigError::from)?;
    info!("engine {} ready", cfg.engine_path.display());

    let monitor = Monitor::new(screen(None)?, classifier, engine, MonitorSettings::from(cfg));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let on_signal = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_signal.cancel();
            }
        });
        monitor.run(cancel, std::io::stdout()).await
    })?;
    Ok(())
}
