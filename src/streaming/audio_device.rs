//! Audio device integration using rodio
//!
//! rodio's mixer thread pulls samples from a [`BlockSource`], which refills
//! its internal buffer from the [`StreamingDriver`] one block at a time.

use super::driver::StreamingDriver;
use super::session::AudioSink;
use super::OUTPUT_CHANNELS;
use crate::chip::ChipModel;
use crate::{Result, StreamError};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source that pulls from the streaming driver
struct BlockSource<C: ChipModel> {
    driver: StreamingDriver<C>,
    sample_rate: u32,
    finished: Arc<AtomicBool>,
    /// One block of interleaved samples, refilled when exhausted
    buffer: Vec<i16>,
    buffer_pos: usize,
}

impl<C: ChipModel> BlockSource<C> {
    fn new(driver: StreamingDriver<C>, sample_rate: u32, finished: Arc<AtomicBool>) -> Self {
        let len = driver.block_len() * usize::from(OUTPUT_CHANNELS);
        BlockSource {
            driver,
            sample_rate,
            finished,
            buffer: vec![0; len],
            buffer_pos: len, // Start by pulling a new block
        }
    }
}

impl<C: ChipModel> Source for BlockSource<C> {
    fn current_frame_len(&self) -> Option<usize> {
        let remaining = self.buffer.len() - self.buffer_pos;
        if remaining > 0 {
            Some(remaining)
        } else {
            Some(self.buffer.len())
        }
    }

    fn channels(&self) -> u16 {
        OUTPUT_CHANNELS
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl<C: ChipModel> Iterator for BlockSource<C> {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.finished.load(Ordering::Relaxed) {
            return None;
        }
        if self.buffer_pos >= self.buffer.len() {
            self.driver.fill(&mut self.buffer);
            self.buffer_pos = 0;
        }
        let sample = self.buffer[self.buffer_pos];
        self.buffer_pos += 1;
        Some(sample)
    }
}

/// Audio playback device using rodio
///
/// Opened paused; [`AudioSink::resume`] starts the pull.
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    finished: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device for `driver`
    ///
    /// Matches the `open_sink` argument of
    /// [`PlaybackSession::open`](super::PlaybackSession::open).
    pub fn open<C: ChipModel + 'static>(driver: StreamingDriver<C>) -> Result<Self> {
        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            StreamError::AudioDeviceError(format!("Failed to create audio stream: {}", e))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            StreamError::AudioDeviceError(format!("Failed to create audio sink: {}", e))
        })?;
        sink.pause();

        let finished = Arc::new(AtomicBool::new(false));
        let sample_rate = driver.sample_rate();
        sink.append(BlockSource::new(driver, sample_rate, Arc::clone(&finished)));

        log::debug!("Audio device opened at {} Hz", sample_rate);
        Ok(AudioDevice {
            _stream: stream,
            sink,
            finished,
        })
    }
}

impl AudioSink for AudioDevice {
    fn resume(&mut self) -> Result<()> {
        self.sink.play();
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
    }

    fn close(&mut self) {
        self.finished.store(true, Ordering::Relaxed);
        self.sink.stop();
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.finished.store(true, Ordering::Relaxed);
        self.sink.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{FrameTable, PlaybackConfig, RegisterFrame, Score};
    use crate::streaming::{PlaybackSession, StreamConfig};
    use crate::test_support::RecordingChip;

    fn session(frames: usize) -> PlaybackSession {
        let score = Arc::new(Score::new(
            PlaybackConfig::default(),
            FrameTable::new(vec![RegisterFrame::silent(); frames]),
        ));
        PlaybackSession::new(score, StreamConfig::low_latency(44_100)).unwrap()
    }

    fn source(chip: RecordingChip) -> (BlockSource<RecordingChip>, Arc<AtomicBool>) {
        let finished = Arc::new(AtomicBool::new(false));
        let mut slot = None;
        let mut session = session(4);
        session
            .open(chip, |driver| {
                slot = Some(BlockSource::new(driver, 44_100, Arc::clone(&finished)));
                Ok(NullSink)
            })
            .unwrap();
        (slot.unwrap(), finished)
    }

    struct NullSink;

    impl AudioSink for NullSink {
        fn resume(&mut self) -> Result<()> {
            Ok(())
        }
        fn pause(&mut self) {}
        fn close(&mut self) {}
    }

    #[test]
    fn test_block_source_format() {
        let (source, _finished) = source(RecordingChip::default());
        assert_eq!(source.sample_rate(), 44_100);
        assert_eq!(source.channels(), 2);
        assert_eq!(source.current_frame_len(), Some(2048));
        assert!(source.total_duration().is_none());
    }

    #[test]
    fn test_block_source_pulls_from_driver() {
        let (mut source, _finished) = source(RecordingChip::with_output(0.5, -0.5));
        assert_eq!(source.next(), Some(16384));
        assert_eq!(source.next(), Some(-16384));
        assert_eq!(source.current_frame_len(), Some(2046));
    }

    #[test]
    fn test_block_source_finished_signal() {
        let (mut source, finished) = source(RecordingChip::default());
        assert!(source.next().is_some());
        finished.store(true, Ordering::Relaxed);
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_audio_device_open() {
        let mut session = session(10);
        match session.open(crate::chip::Psg::new(), AudioDevice::open) {
            Ok(()) => {
                session.close().unwrap();
            }
            Err(err) => {
                eprintln!(
                    "Skipping streaming::audio_device test (audio backend unavailable): {}",
                    err
                );
            }
        }
    }
}
