//! JSON session configuration.

use crate::engine::{EngineCommand, SearchLimits};
use crate::vision::{
    HeuristicClassifier, HeuristicParams, LocatorParams, SquareClassifier, TemplateClassifier,
    TemplateParams, TemplateSet,
};
use crate::ConfigError;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Square classification strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Data-free shape heuristic, low precision.
    #[default]
    Heuristic,
    /// Normalized cross-correlation against 13 stored templates.
    Template,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Strategy::Heuristic => "heuristic",
            Strategy::Template => "template",
        })
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Ok(Strategy::Heuristic),
            "template" | "templates" => Ok(Strategy::Template),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Everything a monitoring session needs. Missing JSON fields take defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub engine_path: PathBuf,
    pub search: SearchLimits,
    pub poll_interval_ms: u64,
    pub search_retry_ms: u64,
    pub strategy: Strategy,
    pub templates_dir: Option<PathBuf>,
    pub locator: LocatorParams,
    pub template: TemplateParams,
    pub heuristic: HeuristicParams,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            engine_path: PathBuf::from("stockfish"),
            search: SearchLimits::default(),
            poll_interval_ms: 2000,
            search_retry_ms: 2000,
            strategy: Strategy::default(),
            templates_dir: None,
            locator: LocatorParams::default(),
            template: TemplateParams::default(),
            heuristic: HeuristicParams::default(),
        }
    }
}

impl SessionConfig {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let text = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, text).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn search_retry(&self) -> Duration {
        Duration::from_millis(self.search_retry_ms.max(1))
    }

    pub fn engine_command(&self) -> EngineCommand {
        EngineCommand::new(&self.engine_path)
    }

    /// Build the configured classifier. The template strategy loads all 13
    /// templates here so that missing files fail before monitoring starts.
    pub fn build_classifier(&self) -> Result<Box<dyn SquareClassifier>, ConfigError> {
        match self.strategy {
            Strategy::Heuristic => {
                info!("using heuristic classifier (low precision)");
                Ok(Box::new(HeuristicClassifier::new(self.heuristic)))
            }
            Strategy::Template => {
                let dir = self
                    .templates_dir
                    .as_ref()
                    .ok_or(ConfigError::MissingTemplatesDir)?;
                let templates = TemplateSet::load_dir(dir)?;
                Ok(Box::new(TemplateClassifier::new(templates, self.template)))
            }
        }
    }
}
