//! Sound generators for the PSG model
//!
//! This module contains the individual generator components:
//! - Tone generators (3 channels)
//! - Noise generator (shared LFSR)
//! - Envelope generator
//!
//! All generators tick at the internal rate of `clock_rate / 8`.

use super::tables::{EnvelopeSegment, ENVELOPE_SHAPES};

/// Number of tone channels
pub const NUM_CHANNELS: usize = 3;

/// Tone generator for a single channel
///
/// The output toggles each time the counter reaches the 12-bit period.
#[derive(Clone, Debug)]
pub struct ToneGenerator {
    /// Current counter value
    counter: u32,
    /// Period from registers (12-bit, 0 treated as 1)
    period: u32,
    /// Square wave output (0 or 1)
    output: u32,
}

impl ToneGenerator {
    /// Create a new tone generator
    pub fn new() -> Self {
        Self {
            counter: 0,
            period: 1,
            output: 0,
        }
    }

    /// Set the period from the reconstructed register pair
    #[inline]
    pub fn set_period(&mut self, period: u16) {
        let period = u32::from(period) & 0x0fff;
        self.period = period.max(1);
    }

    /// Get current period
    #[inline]
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Tick the generator, returns the current square output
    #[inline]
    pub fn tick(&mut self) -> u32 {
        self.counter += 1;
        if self.counter >= self.period {
            self.counter = 0;
            self.output ^= 1;
        }
        self.output
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Noise generator using 17-bit LFSR
///
/// Steps once every `2 * period` internal ticks, i.e. at half the tone rate.
#[derive(Clone, Debug)]
pub struct NoiseGenerator {
    /// Current counter value
    counter: u32,
    /// Period from register R6 (5-bit, 0 treated as 1)
    period: u32,
    /// 17-bit LFSR state, bit 0 is the output
    lfsr: u32,
}

impl NoiseGenerator {
    /// Create a new noise generator
    pub fn new() -> Self {
        Self {
            counter: 0,
            period: 1,
            lfsr: 1, // Must be non-zero
        }
    }

    /// Set the period from register R6
    #[inline]
    pub fn set_period(&mut self, period: u8) {
        self.period = u32::from(period & 0x1f).max(1);
    }

    /// Tick the generator, returns the current noise bit
    #[inline]
    pub fn tick(&mut self) -> u32 {
        self.counter += 1;
        if self.counter >= self.period << 1 {
            self.counter = 0;
            let bit0 = self.lfsr & 1;
            let bit3 = (self.lfsr >> 3) & 1;
            self.lfsr = (self.lfsr >> 1) | ((bit0 ^ bit3) << 16);
        }
        self.lfsr & 1
    }
}

impl Default for NoiseGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Envelope generator with 16 hardware shapes
///
/// Each shape is two segments from [`ENVELOPE_SHAPES`]; the level moves one
/// step (of 32) every `period` internal ticks.
#[derive(Clone, Debug)]
pub struct EnvelopeGenerator {
    /// Current counter value
    counter: u32,
    /// Period from registers R11/R12 (16-bit, 0 treated as 1)
    period: u32,
    /// Shape from R13 (low nibble)
    shape: usize,
    /// Active segment (0 or 1)
    segment: usize,
    /// Current level (0-31)
    level: i32,
}

impl EnvelopeGenerator {
    /// Create a new envelope generator
    pub fn new() -> Self {
        let mut envelope = Self {
            counter: 0,
            period: 1,
            shape: 0,
            segment: 0,
            level: 0,
        };
        envelope.reset_segment();
        envelope
    }

    /// Set the period from registers R11/R12
    #[inline]
    pub fn set_period(&mut self, period: u16) {
        self.period = u32::from(period).max(1);
    }

    /// Set the envelope shape from register R13
    ///
    /// This restarts the envelope from its first segment.
    pub fn set_shape(&mut self, shape: u8) {
        self.shape = usize::from(shape & 0x0f);
        self.counter = 0;
        self.segment = 0;
        self.reset_segment();
    }

    /// Index of the selected shape (0-15)
    #[inline]
    pub fn shape(&self) -> u8 {
        self.shape as u8
    }

    fn current_segment(&self) -> EnvelopeSegment {
        ENVELOPE_SHAPES[self.shape][self.segment]
    }

    fn reset_segment(&mut self) {
        self.level = self.current_segment().start_level();
    }

    /// Tick the generator
    #[inline]
    pub fn tick(&mut self) {
        self.counter += 1;
        if self.counter < self.period {
            return;
        }
        self.counter = 0;
        match self.current_segment() {
            EnvelopeSegment::SlideUp => {
                self.level += 1;
                if self.level > 31 {
                    self.segment ^= 1;
                    self.reset_segment();
                }
            }
            EnvelopeSegment::SlideDown => {
                self.level -= 1;
                if self.level < 0 {
                    self.segment ^= 1;
                    self.reset_segment();
                }
            }
            EnvelopeSegment::HoldTop | EnvelopeSegment::HoldBottom => {}
        }
    }

    /// Get the current envelope level (0-31)
    #[inline]
    pub fn level(&self) -> usize {
        self.level as usize
    }
}

impl Default for EnvelopeGenerator {
    fn default() -> Self {
        Self::new()
    }
}
