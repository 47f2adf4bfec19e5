//! Error types for the scribe pipeline.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type ScribeResult<T> = Result<T, ScribeError>;

/// Errors that can occur in the transcription and summarization pipeline.
///
/// Setup-class variants (device open, stream negotiation, configuration)
/// are fatal and propagate to the supervisor; everything else is absorbed
/// by the loop that encounters it.
#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Audio device error: {0}")]
    AudioDevice(String),

    #[error("Audio stream error: {0}")]
    AudioStream(String),

    #[error("Transcription stream error: {0}")]
    Transcription(String),

    #[error("Summarization error: {0}")]
    Summarize(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<cpal::DevicesError> for ScribeError {
    fn from(err: cpal::DevicesError) -> Self {
        ScribeError::AudioDevice(err.to_string())
    }
}

impl From<cpal::DefaultStreamConfigError> for ScribeError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        ScribeError::AudioDevice(err.to_string())
    }
}

impl From<cpal::BuildStreamError> for ScribeError {
    fn from(err: cpal::BuildStreamError) -> Self {
        ScribeError::AudioStream(err.to_string())
    }
}

impl From<cpal::PlayStreamError> for ScribeError {
    fn from(err: cpal::PlayStreamError) -> Self {
        ScribeError::AudioStream(err.to_string())
    }
}
