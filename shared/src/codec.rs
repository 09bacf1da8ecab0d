//! Frame encoding. JSON goes out as text frames, bincode as binary frames.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum WireFormat {
    #[default]
    Json,
    Binary,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bincode: {0}")]
    Binary(#[from] bincode::Error),
    #[error("expected a {expected} frame")]
    WrongFrameType { expected: &'static str },
}

impl WireFormat {
    pub fn is_text(self) -> bool {
        matches!(self, WireFormat::Json)
    }

    pub fn encode<T: Serialize>(self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::to_vec(value)?),
            WireFormat::Binary => Ok(bincode::serialize(value)?),
        }
    }

    pub fn decode<T: DeserializeOwned>(self, bytes: &[u8]) -> Result<T, CodecError> {
        match self {
            WireFormat::Json => Ok(serde_json::from_slice(bytes)?),
            WireFormat::Binary => Ok(bincode::deserialize(bytes)?),
        }
    }
}
