//! Streaming audio playback
//!
//! The audio device pulls fixed-size blocks from a [`StreamingDriver`] on its
//! own thread; the controller thread drives a [`PlaybackSession`] and sleeps
//! on a condition variable until the driver reports the score has finished.
//!
//! Cross-thread state is limited to the published frame/sample counters, the
//! stop flag and the completion signal. The chip and render clock live
//! inside the driver and are only ever touched by the callback thread.

#[cfg(feature = "streaming")]
pub mod audio_device;
pub mod driver;
pub mod session;

#[cfg(feature = "streaming")]
pub use audio_device::AudioDevice;
pub use driver::{PlaybackOutcome, StreamingDriver};
pub use session::{AudioSink, PlaybackReport, PlaybackSession, SessionState, StopHandle};

use crate::{Result, StreamError};
use serde::{Deserialize, Serialize};

/// Default sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Interleaved output channels (stereo)
pub const OUTPUT_CHANNELS: u16 = 2;

/// Configuration for streaming playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Block length in stereo sample pairs
    /// Larger blocks = more latency but less chance of underrun
    pub block_len: usize,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of audio channels
    pub channels: u16,
}

impl StreamConfig {
    /// Create a streaming configuration optimized for low latency
    /// Block = 1024 pairs ≈ 23ms @ 44.1kHz
    pub fn low_latency(sample_rate: u32) -> Self {
        StreamConfig {
            block_len: 1024,
            sample_rate,
            channels: OUTPUT_CHANNELS,
        }
    }

    /// Create a streaming configuration optimized for stability
    /// Block = 4096 pairs ≈ 93ms @ 44.1kHz
    pub fn stable(sample_rate: u32) -> Self {
        StreamConfig {
            block_len: 4096,
            sample_rate,
            channels: OUTPUT_CHANNELS,
        }
    }

    /// Replace the block length
    pub fn with_block_len(mut self, block_len: usize) -> Self {
        self.block_len = block_len;
        self
    }

    /// Get latency of one block in milliseconds
    pub fn latency_ms(&self) -> f32 {
        ((self.block_len as f32) / (self.sample_rate as f32)) * 1000.0
    }

    /// Interleaved `i16` slots in one block
    pub fn block_samples(&self) -> usize {
        self.block_len * usize::from(self.channels)
    }

    /// Check the configuration can be negotiated
    pub fn validate(&self) -> Result<()> {
        if self.block_len == 0 {
            return Err(StreamError::ConfigError("block length must be non-zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(StreamError::ConfigError("stream sample rate must be non-zero".into()));
        }
        if self.channels != OUTPUT_CHANNELS {
            return Err(StreamError::ConfigError(format!(
                "only interleaved stereo is supported, got {} channels",
                self.channels
            )));
        }
        Ok(())
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::stable(DEFAULT_SAMPLE_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_config_latency() {
        let config = StreamConfig::low_latency(44100);
        let latency = config.latency_ms();
        assert!(latency > 23.0 && latency < 23.5);
        assert_eq!(config.block_samples(), 2048);
    }

    #[test]
    fn test_stream_config_validation() {
        assert!(StreamConfig::default().validate().is_ok());
        assert!(StreamConfig::low_latency(44100).with_block_len(0).validate().is_err());
        let mono = StreamConfig {
            channels: 1,
            ..StreamConfig::default()
        };
        assert!(mono.validate().is_err());
    }
}
