//! YM2149 / AY-3-8910 register score streaming
//!
//! Turns a timestamped sequence of PSG register snapshots (one per frame,
//! typically 50Hz) into a continuous stream of interleaved 16-bit stereo
//! samples, pulled block by block by an audio device callback.
//!
//! # Pipeline
//! - [`score`]: frame table and playback parameters (text and raw loaders)
//! - [`render::latch`]: applies one register snapshot to the chip model
//! - [`render::RenderClock`]: decides on which output sample a frame is latched
//! - [`render::render_block`]: synthesizes one fixed-size block
//! - [`streaming`]: pull-callback driver and the controller-side session
//!
//! # Crate feature flags
//! - `export-wav` (default): offline WAV rendering (`export`)
//! - `streaming` (opt-in): real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Render a score offline
//! ```no_run
//! use ym2149_stream::score;
//! use ym2149_stream::chip::Psg;
//! use ym2149_stream::export::render_to_vec;
//!
//! let score = score::load_file("song.txt").unwrap();
//! let samples = render_to_vec(&score, Psg::new(), 1024).unwrap();
//! println!("{} stereo samples", samples.len() / 2);
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use std::sync::Arc;
//! use ym2149_stream::{score, AudioDevice, PlaybackSession, Psg, StreamConfig};
//!
//! let score = Arc::new(score::load_file("song.txt").unwrap());
//! let cfg = StreamConfig::low_latency(score.config.sample_rate);
//! let mut session = PlaybackSession::new(score, cfg).unwrap();
//! session.open(Psg::new(), AudioDevice::open).unwrap();
//! let report = session.run().unwrap();
//! println!("{} samples played", report.samples_rendered);
//! # }
//! ```

#![warn(missing_docs)]

pub mod chip; // PSG model seam and bundled emulation
#[cfg(feature = "export-wav")]
pub mod export; // Offline rendering
pub mod render; // Clock, latch, block renderer
pub mod score; // Frame table and loaders
pub mod streaming; // Pull driver and session control

#[cfg(test)]
mod test_support;

/// Error types for score streaming operations
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// Error while parsing a score
    #[error("Parse error at line {line}: {message}")]
    ParseError {
        /// 1-based line number (0 for binary input)
        line: usize,
        /// What went wrong
        message: String,
    },

    /// The chip model or the playback parameters were rejected
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The score has nothing to play
    #[error("Empty score: {0}")]
    EmptyScore(String),

    /// Audio device error
    #[error("Audio device error: {0}")]
    AudioDeviceError(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem or device
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl StreamError {
    /// Build a [`StreamError::ParseError`] for the given line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        StreamError::ParseError {
            line,
            message: message.into(),
        }
    }
}

impl From<String> for StreamError {
    /// Converts a String into `StreamError::Other`.
    ///
    /// Prefer the specific variants (`ConfigError`, `EmptyScore`, ...) where
    /// the caller may want to tell failures apart.
    fn from(msg: String) -> Self {
        StreamError::Other(msg)
    }
}

impl From<&str> for StreamError {
    fn from(msg: &str) -> Self {
        StreamError::Other(msg.to_string())
    }
}

/// Result type for score streaming operations
pub type Result<T> = std::result::Result<T, StreamError>;

// Public API exports
pub use chip::{ChipMode, ChipModel, Psg};
pub use render::{latch, render_block, RenderClock};
pub use score::{FrameTable, PlaybackConfig, RegisterFrame, Score};
#[cfg(feature = "streaming")]
pub use streaming::AudioDevice;
pub use streaming::{
    AudioSink, PlaybackOutcome, PlaybackReport, PlaybackSession, SessionState, StopHandle,
    StreamConfig, StreamingDriver,
};
