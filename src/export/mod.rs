//! Offline rendering
//!
//! Drives the same block renderer as real-time playback, without a device,
//! and collects the whole score in memory.

pub mod wav;

pub use wav::{export_to_wav, export_to_wav_with_chip};

use crate::chip::{configure_for, ChipModel};
use crate::render::{render_block, RenderClock};
use crate::score::Score;
use crate::{Result, StreamError};

/// Render a whole score to interleaved 16-bit stereo samples
///
/// Blocks of `block_len` pairs are rendered until the last frame has played
/// for its full duration; the result is trimmed to exactly that length.
///
/// # Examples
///
/// ```no_run
/// use ym2149_stream::{export::render_to_vec, score, Psg};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let score = score::load_file("song.txt")?;
/// let samples = render_to_vec(&score, Psg::new(), 4096)?;
/// assert_eq!(samples.len() % 2, 0);
/// # Ok(())
/// # }
/// ```
pub fn render_to_vec<C: ChipModel>(
    score: &Score,
    mut chip: C,
    block_len: usize,
) -> Result<Vec<i16>> {
    score.validate()?;
    if block_len == 0 {
        return Err(StreamError::ConfigError("block length must be non-zero".into()));
    }
    configure_for(&mut chip, &score.config)?;

    let config = &score.config;
    let mut clock = RenderClock::new(config.frame_rate, config.sample_rate, score.frame_count());
    let mut block = vec![0i16; block_len * 2];
    let mut samples = Vec::with_capacity(score.total_samples() as usize * 2 + block.len());

    while !clock.is_elapsed() {
        render_block(&mut clock, &mut chip, config, &score.frames, &mut block);
        samples.extend_from_slice(&block);
    }

    let pairs = clock.elapsed_at().unwrap_or_default() as usize;
    samples.truncate(pairs * 2);
    log::debug!(
        "Rendered {} frames offline: {} samples ({:.2}s)",
        score.frame_count(),
        pairs,
        pairs as f64 / f64::from(config.sample_rate)
    );
    Ok(samples)
}
