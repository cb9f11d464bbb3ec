//! PSG chip model seam
//!
//! The renderer drives the chip exclusively through [`ChipModel`], a set of
//! discrete control calls plus `process`/`remove_dc` once per output sample.
//! [`Psg`] is the bundled implementation; any other emulation can be plugged
//! in by implementing the trait.

mod dc_filter;
mod generators;
mod psg;
mod tables;

pub use dc_filter::DcFilter;
pub use generators::{EnvelopeGenerator, NoiseGenerator, ToneGenerator, NUM_CHANNELS};
pub use psg::Psg;
pub use tables::{EnvelopeSegment, AY_DAC_TABLE, ENVELOPE_SHAPES, YM_DAC_TABLE};

use crate::score::PlaybackConfig;
use serde::{Deserialize, Serialize};

/// Output stage flavour of the chip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChipMode {
    /// General Instrument AY-3-8910 (16 output levels)
    Ay,
    /// Yamaha YM2149 (32 output levels)
    #[default]
    Ym,
}

impl ChipMode {
    /// Map the score's `is_ym` flag to a mode
    pub fn from_is_ym(is_ym: bool) -> Self {
        if is_ym {
            ChipMode::Ym
        } else {
            ChipMode::Ay
        }
    }
}

/// Control surface of a three-voice square/noise PSG
///
/// All calls come from a single rendering thread, in the order a frame is
/// latched, so implementations need no internal synchronization.
pub trait ChipModel: Send {
    /// Prepare the chip for the given clock and output rate
    ///
    /// # Errors
    ///
    /// Returns [`crate::StreamError::ConfigError`] when the model cannot run
    /// at `sample_rate` with `clock_rate`.
    fn configure(&mut self, mode: ChipMode, clock_rate: u32, sample_rate: u32)
        -> crate::Result<()>;

    /// Place a channel in the stereo field (`0.0` = left, `1.0` = right)
    fn set_pan(&mut self, channel: usize, pan: f32, equal_power: bool);

    /// Set a channel's 12-bit tone period
    fn set_tone(&mut self, channel: usize, period: u16);

    /// Set the shared 5-bit noise period
    fn set_noise(&mut self, period: u8);

    /// Route tone/noise/envelope for one channel
    ///
    /// `tone_off` and `noise_off` follow the R7 polarity (true = muted).
    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool);

    /// Set a channel's fixed 4-bit volume
    fn set_volume(&mut self, channel: usize, volume: u8);

    /// Set the 16-bit envelope period
    fn set_envelope(&mut self, period: u16);

    /// Select an envelope shape and restart the envelope from its first phase
    fn set_envelope_shape(&mut self, shape: u8);

    /// Advance internal state by one output sample
    fn process(&mut self);

    /// Remove the running DC offset from the current output
    fn remove_dc(&mut self);

    /// Current `(left, right)` output, nominally in `[-1.0, 1.0]`
    fn output(&self) -> (f32, f32);
}

/// Configure `chip` for a score and apply the pans it sets
///
/// Channels whose pan is unset keep the chip's default placement.
pub fn configure_for<C: ChipModel + ?Sized>(
    chip: &mut C,
    config: &PlaybackConfig,
) -> crate::Result<()> {
    chip.configure(config.chip_mode, config.clock_rate, config.sample_rate)?;
    for (channel, pan) in config.pan.iter().enumerate().take(NUM_CHANNELS) {
        if let Some(pan) = *pan {
            chip.set_pan(channel, pan, config.stereo_eq_on);
        }
    }
    Ok(())
}

impl<C: ChipModel + ?Sized> ChipModel for Box<C> {
    fn configure(
        &mut self,
        mode: ChipMode,
        clock_rate: u32,
        sample_rate: u32,
    ) -> crate::Result<()> {
        (**self).configure(mode, clock_rate, sample_rate)
    }

    fn set_pan(&mut self, channel: usize, pan: f32, equal_power: bool) {
        (**self).set_pan(channel, pan, equal_power)
    }

    fn set_tone(&mut self, channel: usize, period: u16) {
        (**self).set_tone(channel, period)
    }

    fn set_noise(&mut self, period: u8) {
        (**self).set_noise(period)
    }

    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) {
        (**self).set_mixer(channel, tone_off, noise_off, envelope_on)
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        (**self).set_volume(channel, volume)
    }

    fn set_envelope(&mut self, period: u16) {
        (**self).set_envelope(period)
    }

    fn set_envelope_shape(&mut self, shape: u8) {
        (**self).set_envelope_shape(shape)
    }

    fn process(&mut self) {
        (**self).process()
    }

    fn remove_dc(&mut self) {
        (**self).remove_dc()
    }

    fn output(&self) -> (f32, f32) {
        (**self).output()
    }
}
