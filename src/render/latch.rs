//! Register snapshot → chip control calls
//!
//! Decodes one 14-register frame into the discrete calls of [`ChipModel`].
//! Holds no state of its own.

use crate::chip::{ChipModel, NUM_CHANNELS};
use crate::score::RegisterFrame;
use bitflags::bitflags;

bitflags! {
    /// Mixer Control Register (R7) bitflags
    ///
    /// A set bit mutes the source (1 = disable, 0 = enable).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MixerFlags: u8 {
        /// Channel A tone disable
        const TONE_A_OFF = 0x01;
        /// Channel B tone disable
        const TONE_B_OFF = 0x02;
        /// Channel C tone disable
        const TONE_C_OFF = 0x04;
        /// Channel A noise disable
        const NOISE_A_OFF = 0x08;
        /// Channel B noise disable
        const NOISE_B_OFF = 0x10;
        /// Channel C noise disable
        const NOISE_C_OFF = 0x20;
    }
}

impl MixerFlags {
    /// Create mixer flags from raw register value (port direction bits dropped)
    pub fn from_register(value: u8) -> Self {
        MixerFlags::from_bits_truncate(value)
    }

    /// True if the channel's tone is muted
    pub fn tone_off(&self, channel: usize) -> bool {
        self.contains(MixerFlags::from_bits_truncate(1 << channel))
    }

    /// True if the channel's noise is muted
    pub fn noise_off(&self, channel: usize) -> bool {
        self.contains(MixerFlags::from_bits_truncate(1 << (channel + 3)))
    }
}

/// Volume byte bit that hands the channel level to the envelope
const ENVELOPE_MODE_MASK: u8 = 0xf0;

/// Apply one frame to the chip
///
/// Call order is fixed: tones, noise, mixer, volumes, envelope period, then
/// the envelope shape, which is skipped for the no-change marker (255) so a
/// running envelope is not restarted.
pub fn latch<C: ChipModel + ?Sized>(chip: &mut C, frame: &RegisterFrame) {
    for channel in 0..NUM_CHANNELS {
        chip.set_tone(channel, frame.tone_period(channel));
    }
    chip.set_noise(frame.noise_period());

    let mixer = MixerFlags::from_register(frame.mixer());
    for channel in 0..NUM_CHANNELS {
        let envelope_on = frame.volume(channel) & ENVELOPE_MODE_MASK != 0;
        chip.set_mixer(
            channel,
            mixer.tone_off(channel),
            mixer.noise_off(channel),
            envelope_on,
        );
    }
    for channel in 0..NUM_CHANNELS {
        chip.set_volume(channel, frame.volume(channel) & 0x0f);
    }

    chip.set_envelope(frame.envelope_period());
    if let Some(shape) = frame.envelope_shape() {
        chip.set_envelope_shape(shape);
    }
}
