//! Test doubles shared by unit tests

use crate::chip::{ChipMode, ChipModel};

/// One recorded control call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChipCall {
    Configure(ChipMode, u32, u32),
    Pan(usize, f32, bool),
    Tone(usize, u16),
    Noise(u8),
    Mixer(usize, bool, bool, bool),
    Volume(usize, u8),
    Envelope(u16),
    EnvelopeShape(u8),
}

/// Chip that records control calls and emits a fixed output
#[derive(Debug, Default)]
pub struct RecordingChip {
    pub calls: Vec<ChipCall>,
    pub processed: usize,
    pub dc_removed: usize,
    pub output: (f32, f32),
}

impl RecordingChip {
    pub fn with_output(left: f32, right: f32) -> Self {
        Self {
            output: (left, right),
            ..Self::default()
        }
    }

    pub fn shape_resets(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, ChipCall::EnvelopeShape(_)))
            .count()
    }
}

impl ChipModel for RecordingChip {
    fn configure(
        &mut self,
        mode: ChipMode,
        clock_rate: u32,
        sample_rate: u32,
    ) -> crate::Result<()> {
        self.calls
            .push(ChipCall::Configure(mode, clock_rate, sample_rate));
        Ok(())
    }

    fn set_pan(&mut self, channel: usize, pan: f32, equal_power: bool) {
        self.calls.push(ChipCall::Pan(channel, pan, equal_power));
    }

    fn set_tone(&mut self, channel: usize, period: u16) {
        self.calls.push(ChipCall::Tone(channel, period));
    }

    fn set_noise(&mut self, period: u8) {
        self.calls.push(ChipCall::Noise(period));
    }

    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) {
        self.calls
            .push(ChipCall::Mixer(channel, tone_off, noise_off, envelope_on));
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        self.calls.push(ChipCall::Volume(channel, volume));
    }

    fn set_envelope(&mut self, period: u16) {
        self.calls.push(ChipCall::Envelope(period));
    }

    fn set_envelope_shape(&mut self, shape: u8) {
        self.calls.push(ChipCall::EnvelopeShape(shape));
    }

    fn process(&mut self) {
        self.processed += 1;
    }

    fn remove_dc(&mut self) {
        self.dc_removed += 1;
    }

    fn output(&self) -> (f32, f32) {
        self.output
    }
}
