use crate::engine::EngineError;
use crate::vision::TemplateError;
use std::path::PathBuf;

/// Failure to produce a screen capture.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("no display available for capture")]
    NoDisplay,

    #[error("screen capture backend failed: {0}")]
    Backend(String),

    #[error("failed to read image {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write image {}: {source}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(transparent)]
    Pixels(#[from] crate::core::ImageError),
}

/// Problems with the session configuration. Fatal before monitoring starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to access config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("the template strategy needs a templates directory")]
    MissingTemplatesDir,

    #[error("unknown classification strategy {0:?} (expected heuristic or template)")]
    UnknownStrategy(String),

    #[error(transparent)]
    Templates(#[from] TemplateError),

    #[error("engine prerequisite failed: {0}")]
    Engine(#[from] EngineError),
}

/// Errors that end a monitoring session.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("failed to write monitor output: {0}")]
    Output(#[from] std::io::Error),
}
