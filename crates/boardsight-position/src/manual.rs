use crate::EncodingError;

/// Operator-supplied position: a sentinel for the starting position, or raw text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManualInput {
    StartingPosition,
    Encoding(String),
}

impl ManualInput {
    /// Sentinels accepted for the standard starting position.
    pub const START_SENTINELS: [&'static str; 3] = ["start", "startpos", "initial"];

    pub fn parse(text: &str) -> Result<Self, EncodingError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EncodingError::Empty);
        }
        if Self::START_SENTINELS
            .iter()
            .any(|s| s.eq_ignore_ascii_case(text))
        {
            return Ok(ManualInput::StartingPosition);
        }
        Ok(ManualInput::Encoding(text.to_string()))
    }
}
