//! Score domain
//!
//! A score is a [`FrameTable`] of 14-register snapshots plus the
//! [`PlaybackConfig`] it was authored for. Scores are built once at load time
//! and only read afterwards.

pub mod raw;
pub mod text;

pub use raw::RawParser;
pub use text::TextParser;

use crate::chip::{ChipMode, NUM_CHANNELS};
use crate::{Result, StreamError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of registers carried by one frame (R0-R13)
pub const NUM_REGISTERS: usize = 14;

/// R13 value meaning "leave the envelope shape alone"
pub const NO_SHAPE_CHANGE: u8 = 255;

/// Default output rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default frame rate (PAL VBL)
pub const DEFAULT_FRAME_RATE: u32 = 50;

/// Default chip clock (Atari ST)
pub const DEFAULT_CLOCK_RATE: u32 = 2_000_000;

/// Global playback parameters of a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Output sample rate in Hz
    pub sample_rate: u32,
    /// Register frames per second
    pub frame_rate: u32,
    /// Chip master clock in Hz
    pub clock_rate: u32,
    /// AY or YM output stage
    pub chip_mode: ChipMode,
    /// Run the chip's DC removal after every sample
    pub dc_filter_on: bool,
    /// Use the equal-power pan law
    pub stereo_eq_on: bool,
    /// Output gain applied before 16-bit conversion (0..1)
    pub master_volume: f32,
    /// Per-channel pan; `None` keeps the chip's default
    pub pan: [Option<f32>; NUM_CHANNELS],
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            frame_rate: DEFAULT_FRAME_RATE,
            clock_rate: DEFAULT_CLOCK_RATE,
            chip_mode: ChipMode::Ym,
            dc_filter_on: true,
            stereo_eq_on: false,
            master_volume: 1.0,
            pan: [None; NUM_CHANNELS],
        }
    }
}

impl PlaybackConfig {
    /// Output samples per frame (fractional)
    pub fn samples_per_frame(&self) -> f64 {
        f64::from(self.sample_rate) / f64::from(self.frame_rate)
    }

    /// Check the parameters are playable
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(StreamError::ConfigError("sample rate must be non-zero".into()));
        }
        if self.frame_rate == 0 {
            return Err(StreamError::ConfigError("frame rate must be non-zero".into()));
        }
        if self.frame_rate > self.sample_rate {
            return Err(StreamError::ConfigError(format!(
                "frame rate {} Hz exceeds sample rate {} Hz",
                self.frame_rate, self.sample_rate
            )));
        }
        if !self.master_volume.is_finite() || self.master_volume < 0.0 {
            return Err(StreamError::ConfigError(format!(
                "master volume {} must be a non-negative number",
                self.master_volume
            )));
        }
        for (channel, pan) in self.pan.iter().enumerate() {
            if let Some(pan) = pan {
                if !(0.0..=1.0).contains(pan) {
                    return Err(StreamError::ConfigError(format!(
                        "pan {pan} for channel {channel} is outside [0, 1]"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// One register snapshot (R0-R13)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterFrame(pub [u8; NUM_REGISTERS]);

impl RegisterFrame {
    /// A frame with every register zeroed and the shape left unchanged
    pub fn silent() -> Self {
        let mut regs = [0u8; NUM_REGISTERS];
        regs[7] = 0x3f;
        regs[13] = NO_SHAPE_CHANGE;
        RegisterFrame(regs)
    }

    /// Raw register values
    pub fn registers(&self) -> &[u8; NUM_REGISTERS] {
        &self.0
    }

    /// 12-bit tone period of a channel (`high << 8 | low`)
    pub fn tone_period(&self, channel: usize) -> u16 {
        let base = channel * 2;
        (u16::from(self.0[base + 1]) << 8) | u16::from(self.0[base])
    }

    /// Noise period (R6)
    pub fn noise_period(&self) -> u8 {
        self.0[6]
    }

    /// Mixer/enable byte (R7)
    pub fn mixer(&self) -> u8 {
        self.0[7]
    }

    /// Volume byte of a channel (R8-R10), envelope-enable in the high nibble
    pub fn volume(&self, channel: usize) -> u8 {
        self.0[8 + channel]
    }

    /// Envelope period (R12 << 8 | R11)
    pub fn envelope_period(&self) -> u16 {
        (u16::from(self.0[12]) << 8) | u16::from(self.0[11])
    }

    /// Envelope shape (R13), `None` for the no-change marker
    pub fn envelope_shape(&self) -> Option<u8> {
        match self.0[13] {
            NO_SHAPE_CHANGE => None,
            shape => Some(shape),
        }
    }
}

impl From<[u8; NUM_REGISTERS]> for RegisterFrame {
    fn from(regs: [u8; NUM_REGISTERS]) -> Self {
        RegisterFrame(regs)
    }
}

/// Ordered register frames of a score
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTable {
    frames: Vec<RegisterFrame>,
}

impl FrameTable {
    /// Wrap a frame sequence
    pub fn new(frames: Vec<RegisterFrame>) -> Self {
        Self { frames }
    }

    /// Number of frames
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// True when there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame at `index`
    pub fn get(&self, index: usize) -> Option<&RegisterFrame> {
        self.frames.get(index)
    }

    /// Iterate frames in playback order
    pub fn iter(&self) -> std::slice::Iter<'_, RegisterFrame> {
        self.frames.iter()
    }

    /// Frames whose R13 restarts the envelope with a shape above 15
    ///
    /// The chip only decodes the low nibble of such values.
    pub fn out_of_range_shapes(&self) -> usize {
        self.frames
            .iter()
            .filter(|frame| matches!(frame.envelope_shape(), Some(shape) if shape > 15))
            .count()
    }
}

impl From<Vec<RegisterFrame>> for FrameTable {
    fn from(frames: Vec<RegisterFrame>) -> Self {
        Self::new(frames)
    }
}

/// A loaded score: parameters plus frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Score {
    /// Playback parameters
    pub config: PlaybackConfig,
    /// Register frames
    pub frames: FrameTable,
}

/// Serializable overview used by `--info`
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    /// Effective playback parameters
    pub config: PlaybackConfig,
    /// Number of frames
    pub frame_count: usize,
    /// Stereo sample pairs the score lasts
    pub total_samples: u64,
    /// Length in seconds
    pub duration_seconds: f64,
    /// Frames that request an envelope restart
    pub envelope_restarts: usize,
    /// Envelope restarts with a shape above 15
    pub out_of_range_shapes: usize,
}

impl Score {
    /// Build a score from parts
    pub fn new(config: PlaybackConfig, frames: FrameTable) -> Self {
        Self { config, frames }
    }

    /// Number of frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Stereo sample pairs covering every frame
    pub fn total_samples(&self) -> u64 {
        if self.config.frame_rate == 0 {
            return 0;
        }
        (self.config.samples_per_frame() * self.frames.len() as f64).round() as u64
    }

    /// Length in seconds
    pub fn duration_seconds(&self) -> f64 {
        if self.config.frame_rate == 0 {
            return 0.0;
        }
        self.frames.len() as f64 / f64::from(self.config.frame_rate)
    }

    /// Check the score can be played
    ///
    /// # Errors
    ///
    /// [`StreamError::ConfigError`] for unusable parameters,
    /// [`StreamError::EmptyScore`] when nothing would be rendered.
    pub fn validate(&self) -> Result<()> {
        self.config.validate()?;
        if self.frames.is_empty() {
            return Err(StreamError::EmptyScore("score has no frames".into()));
        }
        if self.total_samples() == 0 {
            return Err(StreamError::EmptyScore(format!(
                "{} frames at {} Hz produce no samples",
                self.frames.len(),
                self.config.frame_rate
            )));
        }
        Ok(())
    }

    /// Overview for reporting
    pub fn summary(&self) -> ScoreSummary {
        ScoreSummary {
            config: self.config,
            frame_count: self.frame_count(),
            total_samples: self.total_samples(),
            duration_seconds: self.duration_seconds(),
            envelope_restarts: self
                .frames
                .iter()
                .filter(|frame| frame.envelope_shape().is_some())
                .count(),
            out_of_range_shapes: self.frames.out_of_range_shapes(),
        }
    }
}

/// Load a score from disk
///
/// `.bin`, `.raw` and `.regs` files are read as raw register dumps, anything
/// else as a text score.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Score> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;

    let is_raw = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "bin" | "raw" | "regs"))
        .unwrap_or(false);

    let score = if is_raw {
        Score::new(PlaybackConfig::default(), RawParser::parse_frames(&data)?)
    } else {
        let text = String::from_utf8(data)
            .map_err(|e| StreamError::parse(0, format!("score is not valid UTF-8: {e}")))?;
        TextParser::parse(&text)?
    };

    let out_of_range = score.frames.out_of_range_shapes();
    if out_of_range > 0 {
        log::warn!(
            "{}: {out_of_range} frames set an envelope shape above 15; only the low 4 bits are used",
            path.display()
        );
    }

    log::debug!(
        "Loaded {} frames from {} ({} Hz frames, {} Hz output)",
        score.frame_count(),
        path.display(),
        score.config.frame_rate,
        score.config.sample_rate
    );
    Ok(score)
}
