//! WAV file export functionality

use super::render_to_vec;
use crate::chip::{ChipModel, Psg};
use crate::score::Score;
use crate::streaming::OUTPUT_CHANNELS;
use crate::{Result, StreamError};
use std::path::Path;

/// Block length used for offline rendering, in sample pairs
const EXPORT_BLOCK_LEN: usize = 4096;

/// Render a score to a 16-bit stereo WAV file with the bundled [`Psg`]
///
/// # Examples
///
/// ```no_run
/// use ym2149_stream::export::export_to_wav;
/// use ym2149_stream::score;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let score = score::load_file("song.txt")?;
/// export_to_wav(&score, "output.wav")?;
/// # Ok(())
/// # }
/// ```
pub fn export_to_wav<P: AsRef<Path>>(score: &Score, output_path: P) -> Result<u64> {
    export_to_wav_with_chip(score, Psg::new(), output_path)
}

/// Render a score through `chip` to a 16-bit stereo WAV file
///
/// Returns the number of stereo sample pairs written.
pub fn export_to_wav_with_chip<C: ChipModel, P: AsRef<Path>>(
    score: &Score,
    chip: C,
    output_path: P,
) -> Result<u64> {
    let samples = render_to_vec(score, chip, EXPORT_BLOCK_LEN)?;
    write_wav_file(output_path.as_ref(), &samples, score.config.sample_rate)?;
    log::info!(
        "Wrote {} samples to {}",
        samples.len() / 2,
        output_path.as_ref().display()
    );
    Ok(samples.len() as u64 / 2)
}

/// Write interleaved stereo samples to a WAV file
fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: OUTPUT_CHANNELS,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| StreamError::AudioFileError(format!("Failed to create WAV file: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| StreamError::AudioFileError(format!("Failed to write sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| StreamError::AudioFileError(format!("Failed to finalize WAV file: {}", e)))?;

    Ok(())
}
