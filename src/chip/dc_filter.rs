//! DC offset removal filter
//!
//! PSG output is unipolar, so a constant offset follows whatever is playing.
//! This filter subtracts a running average to center the output around zero.

/// History buffer size (1024 samples ≈ 23ms at 44.1kHz)
const HISTORY_SIZE_BITS: usize = 10;
const HISTORY_SIZE: usize = 1 << HISTORY_SIZE_BITS;

/// DC offset removal filter using a running average
///
/// Keeps a circular buffer of recent samples; the sum is kept in `f64` so
/// long sessions do not accumulate rounding drift.
#[derive(Clone)]
pub struct DcFilter {
    /// Circular buffer of recent samples
    buffer: Box<[f32; HISTORY_SIZE]>,
    /// Current write position in buffer
    position: usize,
    /// Running sum of all samples in buffer
    running_sum: f64,
}

impl DcFilter {
    /// Create a new DC filter
    pub fn new() -> Self {
        Self {
            buffer: Box::new([0.0; HISTORY_SIZE]),
            position: 0,
            running_sum: 0.0,
        }
    }

    /// Process a sample and return the DC-adjusted value
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        self.running_sum -= f64::from(self.buffer[self.position]);
        self.running_sum += f64::from(sample);
        self.buffer[self.position] = sample;

        self.position = (self.position + 1) & (HISTORY_SIZE - 1);

        let dc_offset = self.running_sum / HISTORY_SIZE as f64;
        sample - dc_offset as f32
    }
}

impl Default for DcFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DcFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DcFilter")
            .field("position", &self.position)
            .field("running_sum", &self.running_sum)
            .finish_non_exhaustive()
    }
}
