//! Frame/sample rate synchronization
//!
//! Frames arrive at a low rate (typically 50Hz, the PAL VBL) while samples
//! are produced at the output rate. The clock advances a fractional frame
//! accumulator once per output sample and reports when the next frame must be
//! latched.

/// Render clock
#[derive(Debug, Clone)]
pub struct RenderClock {
    /// Fraction of a frame advanced per output sample
    isr_step: f64,
    /// Fractional frame accumulator; crossing 1.0 latches a frame
    isr_counter: f64,
    /// Number of frames latched so far (index of the next frame)
    frame_index: usize,
    /// Frames in the score
    frame_count: usize,
    /// Output samples advanced so far
    samples_rendered: u64,
    /// Sample count at which the last frame finished playing
    elapsed_at: Option<u64>,
}

impl RenderClock {
    /// Create a clock for `frame_count` frames at `frame_rate` Hz
    ///
    /// The accumulator starts full, so the very first sample latches frame 0.
    pub fn new(frame_rate: u32, sample_rate: u32, frame_count: usize) -> Self {
        let isr_step = if sample_rate == 0 {
            0.0
        } else {
            f64::from(frame_rate) / f64::from(sample_rate)
        };
        RenderClock {
            isr_step,
            isr_counter: 1.0,
            frame_index: 0,
            frame_count,
            samples_rendered: 0,
            elapsed_at: None,
        }
    }

    /// Advance by one output sample
    ///
    /// Returns the index of the frame to latch before synthesizing this
    /// sample, if any. Must be called exactly once per sample.
    pub fn advance_one_sample(&mut self) -> Option<usize> {
        self.samples_rendered += 1;
        self.isr_counter += self.isr_step;
        if self.isr_counter < 1.0 {
            return None;
        }
        self.isr_counter -= 1.0;

        if self.frame_index < self.frame_count {
            let index = self.frame_index;
            self.frame_index += 1;
            Some(index)
        } else {
            // One full frame after the last latch: the score is over
            if self.elapsed_at.is_none() {
                self.elapsed_at = Some(self.samples_rendered - 1);
            }
            None
        }
    }

    /// Fraction of a frame per sample
    pub fn isr_step(&self) -> f64 {
        self.isr_step
    }

    /// Frames latched so far
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Frames in the score
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// True once every frame has been latched
    pub fn is_finished(&self) -> bool {
        self.frame_index >= self.frame_count
    }

    /// True once the last frame has also played for its full duration
    pub fn is_elapsed(&self) -> bool {
        self.elapsed_at.is_some()
    }

    /// Samples the score lasted, once it has elapsed
    pub fn elapsed_at(&self) -> Option<u64> {
        self.elapsed_at
    }

    /// Samples advanced so far
    pub fn samples_rendered(&self) -> u64 {
        self.samples_rendered
    }
}
