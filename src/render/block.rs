//! Block renderer
//!
//! Synthesizes one block of interleaved 16-bit stereo samples, latching
//! frames as the render clock reaches them.

use super::clock::RenderClock;
use super::latch::latch;
use crate::chip::ChipModel;
use crate::score::{FrameTable, PlaybackConfig};

/// Full-scale factor between unit-range samples and 16-bit PCM
const PCM_SCALE: f64 = 32768.0;

/// Convert a unit-range sample to 16-bit PCM
///
/// Truncates toward zero. Values beyond the 16-bit range saturate at
/// `i16::MIN`/`i16::MAX` instead of wrapping; NaN becomes 0.
#[inline]
pub fn to_pcm(sample: f32, master_volume: f32) -> i16 {
    (f64::from(sample) * f64::from(master_volume) * PCM_SCALE) as i16
}

/// Render one block into `out`
///
/// `out` holds interleaved `[left, right]` pairs; a trailing odd slot is left
/// untouched. Every pair is rendered: once the score has run out the chip
/// keeps producing its last-latched state, so the block is always complete.
///
/// Returns the number of sample pairs written.
pub fn render_block<C: ChipModel + ?Sized>(
    clock: &mut RenderClock,
    chip: &mut C,
    config: &PlaybackConfig,
    frames: &FrameTable,
    out: &mut [i16],
) -> usize {
    let mut written = 0;
    for pair in out.chunks_exact_mut(2) {
        if let Some(frame) = clock.advance_one_sample().and_then(|index| frames.get(index)) {
            latch(chip, frame);
        }
        chip.process();
        if config.dc_filter_on {
            chip.remove_dc();
        }
        let (left, right) = chip.output();
        pair[0] = to_pcm(left, config.master_volume);
        pair[1] = to_pcm(right, config.master_volume);
        written += 1;
    }

    log::trace!(
        "Rendered {} samples, frame {}/{}",
        written,
        clock.frame_index(),
        clock.frame_count()
    );
    written
}
