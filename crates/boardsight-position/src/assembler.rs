use crate::{encode, EncodingError, ManualInput, PositionEncoding, PositionMatrix};
use log::{debug, warn};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Where an [`Assembly`]'s encoding came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssemblySource {
    /// The candidate validated and is now the last-known-good encoding.
    Assembled,
    /// The candidate was rejected; the previous validated encoding is reused.
    LastKnownGood,
    /// The candidate was rejected and nothing had validated yet.
    StartingPosition,
}

/// Result of one assembly: always carries a usable encoding.
#[derive(Clone, Debug)]
pub struct Assembly {
    pub encoding: PositionEncoding,
    pub source: AssemblySource,
    /// The text that was offered for validation.
    pub candidate: String,
    /// Why the candidate was rejected, if it was.
    pub rejection: Option<EncodingError>,
}

impl Assembly {
    #[inline]
    pub fn is_fresh(&self) -> bool {
        self.source == AssemblySource::Assembled
    }
}

/// Folds occupant matrices into validated encodings with a last-known-good fallback.
#[derive(Clone, Debug, Default)]
pub struct PositionAssembler {
    last_valid: Option<PositionEncoding>,
}

impl PositionAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent encoding that validated, if any.
    pub fn last_valid(&self) -> Option<&PositionEncoding> {
        self.last_valid.as_ref()
    }

    /// Encode `matrix`, validate it, and fall back if validation fails.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn assemble(&mut self, matrix: &PositionMatrix) -> Assembly {
        self.accept(encode(matrix))
    }

    /// Route operator input through the same validation gate.
    pub fn apply_override(&mut self, input: &str) -> Assembly {
        match ManualInput::parse(input) {
            Ok(ManualInput::StartingPosition) => {
                let encoding = PositionEncoding::starting();
                self.last_valid = Some(encoding.clone());
                Assembly {
                    candidate: encoding.to_string(),
                    encoding,
                    source: AssemblySource::Assembled,
                    rejection: None,
                }
            }
            Ok(ManualInput::Encoding(text)) => self.accept(text),
            Err(err) => self.reject(input.trim().to_string(), err),
        }
    }

    fn accept(&mut self, candidate: String) -> Assembly {
        match PositionEncoding::parse(&candidate) {
            Ok(encoding) => {
                debug!("validated position {encoding}");
                self.last_valid = Some(encoding.clone());
                Assembly {
                    encoding,
                    source: AssemblySource::Assembled,
                    candidate,
                    rejection: None,
                }
            }
            Err(err) => self.reject(candidate, err),
        }
    }

    fn reject(&self, candidate: String, err: EncodingError) -> Assembly {
        let (encoding, source) = match &self.last_valid {
            Some(prev) => (prev.clone(), AssemblySource::LastKnownGood),
            None => (PositionEncoding::starting(), AssemblySource::StartingPosition),
        };
        warn!("rejected position {candidate:?}: {err}; using {source:?} {encoding}");
        Assembly {
            encoding,
            source,
            candidate,
            rejection: Some(err),
        }
    }
}
