//! Bundled PSG model
//!
//! Runs tone, noise and envelope generators at `clock_rate / 8` and
//! box-averages every internal tick that falls inside one output sample.

use super::dc_filter::DcFilter;
use super::generators::{EnvelopeGenerator, NoiseGenerator, ToneGenerator, NUM_CHANNELS};
use super::tables::{AY_DAC_TABLE, YM_DAC_TABLE};
use super::{ChipMode, ChipModel};
use crate::StreamError;

/// Default Atari ST master clock (2 MHz)
pub const DEFAULT_CLOCK_RATE: u32 = 2_000_000;

/// Default audio sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Lowest output rate the model accepts
const MIN_SAMPLE_RATE: u32 = 8_000;

/// Internal generator rate divider
const CLOCK_DIVIDER: u32 = 8;

/// Per-channel routing and level state
#[derive(Clone, Debug)]
struct Voice {
    tone: ToneGenerator,
    tone_off: u32,
    noise_off: u32,
    envelope_on: bool,
    volume: u8,
    pan_left: f32,
    pan_right: f32,
}

impl Voice {
    fn new() -> Self {
        let (pan_left, pan_right) = pan_gains(0.5, false);
        Self {
            tone: ToneGenerator::new(),
            tone_off: 1,
            noise_off: 1,
            envelope_on: false,
            volume: 0,
            pan_left,
            pan_right,
        }
    }
}

fn pan_gains(pan: f32, equal_power: bool) -> (f32, f32) {
    let pan = pan.clamp(0.0, 1.0);
    if equal_power {
        ((1.0 - pan).sqrt(), pan.sqrt())
    } else {
        (1.0 - pan, pan)
    }
}

/// Three-voice square/noise PSG (AY-3-8910 / YM2149)
///
/// # Example
///
/// ```
/// use ym2149_stream::{ChipMode, ChipModel, Psg};
///
/// let mut chip = Psg::new();
/// chip.configure(ChipMode::Ym, 2_000_000, 44_100).unwrap();
/// chip.set_tone(0, 0x11c);
/// chip.set_mixer(0, false, true, false);
/// chip.set_volume(0, 15);
///
/// chip.process();
/// let (left, right) = chip.output();
/// ```
#[derive(Clone, Debug)]
pub struct Psg {
    mode: ChipMode,
    /// Internal ticks per output sample
    step: f64,
    /// Fractional tick carry between samples
    tick_accumulator: f64,

    voices: [Voice; NUM_CHANNELS],
    noise: NoiseGenerator,
    envelope: EnvelopeGenerator,

    dc_left: DcFilter,
    dc_right: DcFilter,

    left: f32,
    right: f32,
}

impl Psg {
    /// Create a chip in YM mode with the default clocks
    pub fn new() -> Self {
        Self {
            mode: ChipMode::Ym,
            step: f64::from(DEFAULT_CLOCK_RATE / CLOCK_DIVIDER) / f64::from(DEFAULT_SAMPLE_RATE),
            tick_accumulator: 0.0,
            voices: [Voice::new(), Voice::new(), Voice::new()],
            noise: NoiseGenerator::new(),
            envelope: EnvelopeGenerator::new(),
            dc_left: DcFilter::new(),
            dc_right: DcFilter::new(),
            left: 0.0,
            right: 0.0,
        }
    }

    /// Output stage currently in use
    pub fn mode(&self) -> ChipMode {
        self.mode
    }

    /// Internal generator ticks per output sample
    pub fn ticks_per_sample(&self) -> f64 {
        self.step
    }

    fn dac(&self) -> &'static [f32; 32] {
        match self.mode {
            ChipMode::Ay => &AY_DAC_TABLE,
            ChipMode::Ym => &YM_DAC_TABLE,
        }
    }

    /// One internal tick; returns the stereo mix for that tick
    #[inline]
    fn tick(&mut self) -> (f32, f32) {
        let noise = self.noise.tick();
        self.envelope.tick();
        let envelope_level = self.envelope.level();
        let dac = self.dac();

        let mut left = 0.0;
        let mut right = 0.0;
        for voice in self.voices.iter_mut() {
            let tone = voice.tone.tick();
            let gate = (tone | voice.tone_off) & (noise | voice.noise_off);
            let level = if voice.envelope_on {
                envelope_level
            } else {
                usize::from(voice.volume) * 2 + 1
            };
            let amplitude = dac[gate as usize * level];
            left += amplitude * voice.pan_left;
            right += amplitude * voice.pan_right;
        }
        (left, right)
    }
}

impl Default for Psg {
    fn default() -> Self {
        Self::new()
    }
}

impl ChipModel for Psg {
    fn configure(
        &mut self,
        mode: ChipMode,
        clock_rate: u32,
        sample_rate: u32,
    ) -> crate::Result<()> {
        if clock_rate == 0 || sample_rate == 0 {
            return Err(StreamError::ConfigError(format!(
                "clock rate {clock_rate} Hz and sample rate {sample_rate} Hz must be non-zero"
            )));
        }
        if sample_rate < MIN_SAMPLE_RATE {
            return Err(StreamError::ConfigError(format!(
                "sample rate {sample_rate} Hz is below the supported minimum of {MIN_SAMPLE_RATE} Hz"
            )));
        }
        let step = f64::from(clock_rate) / f64::from(CLOCK_DIVIDER) / f64::from(sample_rate);
        if step < 1.0 {
            return Err(StreamError::ConfigError(format!(
                "sample rate {sample_rate} Hz exceeds the chip's internal rate at {clock_rate} Hz clock"
            )));
        }

        *self = Self::new();
        self.mode = mode;
        self.step = step;
        Ok(())
    }

    fn set_pan(&mut self, channel: usize, pan: f32, equal_power: bool) {
        if let Some(voice) = self.voices.get_mut(channel) {
            (voice.pan_left, voice.pan_right) = pan_gains(pan, equal_power);
        }
    }

    fn set_tone(&mut self, channel: usize, period: u16) {
        if let Some(voice) = self.voices.get_mut(channel) {
            voice.tone.set_period(period);
        }
    }

    fn set_noise(&mut self, period: u8) {
        self.noise.set_period(period);
    }

    fn set_mixer(&mut self, channel: usize, tone_off: bool, noise_off: bool, envelope_on: bool) {
        if let Some(voice) = self.voices.get_mut(channel) {
            voice.tone_off = u32::from(tone_off);
            voice.noise_off = u32::from(noise_off);
            voice.envelope_on = envelope_on;
        }
    }

    fn set_volume(&mut self, channel: usize, volume: u8) {
        if let Some(voice) = self.voices.get_mut(channel) {
            voice.volume = volume & 0x0f;
        }
    }

    fn set_envelope(&mut self, period: u16) {
        self.envelope.set_period(period);
    }

    fn set_envelope_shape(&mut self, shape: u8) {
        self.envelope.set_shape(shape);
    }

    fn process(&mut self) {
        self.tick_accumulator += self.step;

        let mut sum_left = 0.0;
        let mut sum_right = 0.0;
        let mut ticks = 0u32;
        while self.tick_accumulator >= 1.0 {
            self.tick_accumulator -= 1.0;
            let (left, right) = self.tick();
            sum_left += left;
            sum_right += right;
            ticks += 1;
        }

        if ticks > 0 {
            self.left = sum_left / ticks as f32;
            self.right = sum_right / ticks as f32;
        }
    }

    fn remove_dc(&mut self) {
        self.left = self.dc_left.process(self.left);
        self.right = self.dc_right.process(self.right);
    }

    fn output(&self) -> (f32, f32) {
        (self.left, self.right)
    }
}
