//! Pull-callback driver
//!
//! Owns the chip, the render clock and a single block buffer. The audio
//! device asks for output of whatever length suits it; the driver hands out
//! rendered samples and renders the next block whenever the buffer runs dry.

use super::StreamConfig;
use crate::chip::ChipModel;
use crate::render::{render_block, RenderClock};
use crate::score::Score;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// How a playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame was latched and played for its full duration
    Finished,
    /// A stop was requested before the score ended
    Stopped,
    /// The session was closed before either happened
    Interrupted,
}

/// State shared between the callback thread and the controller
#[derive(Debug)]
pub(crate) struct SessionShared {
    frame_count: usize,
    frame_index: AtomicUsize,
    samples_rendered: AtomicU64,
    stop_requested: AtomicBool,
    done: AtomicBool,
    outcome: Mutex<Option<PlaybackOutcome>>,
    completed: Condvar,
}

impl SessionShared {
    pub(crate) fn new(frame_count: usize) -> Self {
        Self {
            frame_count,
            frame_index: AtomicUsize::new(0),
            samples_rendered: AtomicU64::new(0),
            stop_requested: AtomicBool::new(false),
            done: AtomicBool::new(false),
            outcome: Mutex::new(None),
            completed: Condvar::new(),
        }
    }

    pub(crate) fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub(crate) fn frame_index(&self) -> usize {
        self.frame_index.load(Ordering::Acquire)
    }

    pub(crate) fn samples_rendered(&self) -> u64 {
        self.samples_rendered.load(Ordering::Acquire)
    }

    fn publish(&self, clock: &RenderClock) {
        self.samples_rendered
            .store(clock.samples_rendered(), Ordering::Release);
        self.frame_index.store(clock.frame_index(), Ordering::Release);
    }

    pub(crate) fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.complete(PlaybackOutcome::Stopped);
    }

    pub(crate) fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record the outcome and wake waiters; the first outcome wins
    pub(crate) fn complete(&self, outcome: PlaybackOutcome) {
        if self.is_completed() {
            return;
        }
        let mut slot = self.outcome.lock();
        if slot.is_none() {
            *slot = Some(outcome);
            self.done.store(true, Ordering::Release);
            self.completed.notify_all();
        }
    }

    /// Lock-free check for a recorded outcome
    pub(crate) fn is_completed(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }

    pub(crate) fn outcome(&self) -> Option<PlaybackOutcome> {
        *self.outcome.lock()
    }

    pub(crate) fn wait(&self) -> PlaybackOutcome {
        let mut slot = self.outcome.lock();
        loop {
            if let Some(outcome) = *slot {
                return outcome;
            }
            self.completed.wait(&mut slot);
        }
    }

    pub(crate) fn wait_until(&self, deadline: std::time::Instant) -> Option<PlaybackOutcome> {
        let mut slot = self.outcome.lock();
        while slot.is_none() {
            if self.completed.wait_until(&mut slot, deadline).timed_out() {
                break;
            }
        }
        *slot
    }
}

/// Streaming driver
///
/// Created by [`PlaybackSession::open`](super::PlaybackSession::open) and
/// handed to the audio sink, which calls [`fill`](Self::fill) from its
/// callback thread.
pub struct StreamingDriver<C: ChipModel> {
    chip: C,
    clock: RenderClock,
    score: Arc<Score>,
    shared: Arc<SessionShared>,
    block: Vec<i16>,
    cursor: usize,
    /// Interleaved samples handed to the device so far
    delivered: u64,
    finish_signalled: bool,
}

impl<C: ChipModel> StreamingDriver<C> {
    pub(crate) fn new(
        chip: C,
        score: Arc<Score>,
        stream: &StreamConfig,
        shared: Arc<SessionShared>,
    ) -> Self {
        let clock = RenderClock::new(
            score.config.frame_rate,
            score.config.sample_rate,
            score.frame_count(),
        );
        let block = vec![0i16; stream.block_samples()];
        let cursor = block.len();
        Self {
            chip,
            clock,
            score,
            shared,
            block,
            cursor,
            delivered: 0,
            finish_signalled: false,
        }
    }

    /// Fill `dest` with interleaved stereo samples
    ///
    /// The destination is cleared first, then the rendered output is mixed
    /// into it, so a request the driver cannot serve is heard as silence.
    /// After a stop request only silence is produced.
    pub fn fill(&mut self, dest: &mut [i16]) {
        dest.fill(0);
        if self.shared.stop_requested() {
            return;
        }
        for slot in dest.iter_mut() {
            *slot = slot.saturating_add(self.next_sample());
        }
    }

    /// Byte-oriented variant of [`fill`](Self::fill)
    ///
    /// `dest` holds native-endian `i16` samples; a trailing odd byte is left
    /// zeroed.
    pub fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
        if self.shared.stop_requested() {
            return;
        }
        for chunk in dest.chunks_exact_mut(2) {
            let mixed = i16::from_ne_bytes([chunk[0], chunk[1]]).saturating_add(self.next_sample());
            chunk.copy_from_slice(&mixed.to_ne_bytes());
        }
    }

    fn next_sample(&mut self) -> i16 {
        if self.cursor >= self.block.len() {
            self.render_next_block();
        }
        let sample = self.block[self.cursor];
        self.cursor += 1;
        self.delivered += 1;
        if !self.finish_signalled {
            self.signal_finish_once_delivered();
        }
        sample
    }

    fn render_next_block(&mut self) {
        render_block(
            &mut self.clock,
            &mut self.chip,
            &self.score.config,
            &self.score.frames,
            &mut self.block,
        );
        self.cursor = 0;
        self.shared.publish(&self.clock);
    }

    /// Finished is reported only after the last frame's final sample has
    /// left the block buffer
    fn signal_finish_once_delivered(&mut self) {
        let Some(end) = self.clock.elapsed_at() else {
            return;
        };
        if self.delivered >= end * 2 {
            self.finish_signalled = true;
            log::trace!("Score elapsed after {end} samples");
            if !self.shared.is_completed() {
                self.shared.complete(PlaybackOutcome::Finished);
            }
        }
    }

    /// Stereo pairs per rendered block
    pub fn block_len(&self) -> usize {
        self.block.len() / 2
    }

    /// Output sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.score.config.sample_rate
    }

    /// Frames latched so far
    pub fn frame_index(&self) -> usize {
        self.clock.frame_index()
    }

    /// True once the last frame has played for its full duration
    pub fn is_elapsed(&self) -> bool {
        self.clock.is_elapsed()
    }

    /// Mutable access to the chip
    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{FrameTable, PlaybackConfig, RegisterFrame};
    use crate::test_support::RecordingChip;

    fn driver(
        frames: usize,
        block_len: usize,
        chip: RecordingChip,
    ) -> (StreamingDriver<RecordingChip>, Arc<SessionShared>) {
        let score = Arc::new(Score::new(
            PlaybackConfig::default(),
            FrameTable::new(vec![RegisterFrame::silent(); frames]),
        ));
        let shared = Arc::new(SessionShared::new(frames));
        let stream = StreamConfig::low_latency(44_100).with_block_len(block_len);
        (
            StreamingDriver::new(chip, score, &stream, Arc::clone(&shared)),
            shared,
        )
    }

    #[test]
    fn test_fill_spans_block_boundaries() {
        let (mut driver, shared) = driver(4, 16, RecordingChip::with_output(0.5, -0.5));
        let mut dest = vec![1i16; 50];

        driver.fill(&mut dest);

        // 25 pairs need two 16-pair blocks
        assert_eq!(driver.chip_mut().processed, 32);
        assert_eq!(shared.samples_rendered(), 32);
        for pair in dest.chunks_exact(2) {
            assert_eq!(pair, &[16384, -16384]);
        }
    }

    #[test]
    fn test_fill_continues_where_it_left_off() {
        let (mut driver, _shared) = driver(4, 16, RecordingChip::with_output(0.25, 0.25));
        let mut a = vec![0i16; 6];
        let mut b = vec![0i16; 6];
        driver.fill(&mut a);
        driver.fill(&mut b);
        assert_eq!(driver.chip_mut().processed, 16);
        assert!(a.iter().chain(b.iter()).all(|&s| s == 8192));
    }

    #[test]
    fn test_completion_signalled_once_elapsed() {
        let (mut driver, shared) = driver(2, 256, RecordingChip::default());
        let mut dest = vec![0i16; 512];

        // 2 frames at 50Hz / 44.1kHz elapse after ~1764 samples
        for _ in 0..6 {
            driver.fill(&mut dest);
            assert_eq!(shared.outcome(), None);
        }
        driver.fill(&mut dest);
        assert!(driver.is_elapsed());
        assert_eq!(shared.outcome(), Some(PlaybackOutcome::Finished));
        assert_eq!(shared.frame_index(), 2);
        assert_eq!(shared.frame_count(), 2);
    }

    #[test]
    fn test_completion_waits_for_delivery_of_the_last_frame() {
        // 100-pair blocks served 77 pairs at a time never line up
        let (mut driver, shared) = driver(6, 100, RecordingChip::default());
        let mut dest = vec![0i16; 77 * 2];
        let mut delivered = 0u64;
        let mut before_last_fill = 0u64;

        while shared.outcome().is_none() {
            before_last_fill = delivered;
            driver.fill(&mut dest);
            delivered += 77;
            assert!(delivered < 10_000, "playback never finished");
        }

        let end = driver.clock.elapsed_at().unwrap();
        assert!(end.abs_diff(6 * 882) <= 1, "elapsed at {end}");
        assert!(delivered >= end, "finished after {delivered} of {end} pairs");
        assert!(before_last_fill < end);
        assert_eq!(shared.outcome(), Some(PlaybackOutcome::Finished));
    }

    #[test]
    fn test_is_completed_tracks_outcome() {
        let shared = SessionShared::new(1);
        assert!(!shared.is_completed());
        shared.complete(PlaybackOutcome::Stopped);
        assert!(shared.is_completed());
        shared.complete(PlaybackOutcome::Finished);
        assert_eq!(shared.outcome(), Some(PlaybackOutcome::Stopped));
    }

    #[test]
    fn test_stop_produces_silence() {
        let (mut driver, shared) = driver(100, 64, RecordingChip::with_output(0.5, 0.5));
        let mut dest = vec![0i16; 32];
        driver.fill(&mut dest);
        assert!(dest.iter().all(|&s| s != 0));

        shared.request_stop();
        dest.fill(5);
        driver.fill(&mut dest);
        assert!(dest.iter().all(|&s| s == 0));
        assert_eq!(shared.outcome(), Some(PlaybackOutcome::Stopped));
    }

    #[test]
    fn test_fill_bytes_matches_fill() {
        let (mut a, _) = driver(3, 32, RecordingChip::with_output(0.3, -0.7));
        let (mut b, _) = driver(3, 32, RecordingChip::with_output(0.3, -0.7));
        let mut samples = vec![0i16; 40];
        let mut bytes = vec![0u8; 81];

        a.fill(&mut samples);
        b.fill_bytes(&mut bytes);

        let decoded: Vec<i16> = bytes
            .chunks_exact(2)
            .map(|c| i16::from_ne_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(decoded, samples);
        assert_eq!(bytes[80], 0);
    }

    #[test]
    fn test_first_outcome_wins() {
        let shared = SessionShared::new(1);
        shared.complete(PlaybackOutcome::Finished);
        shared.request_stop();
        assert_eq!(shared.wait(), PlaybackOutcome::Finished);
        assert!(shared.stop_requested());
    }

    #[test]
    fn test_wait_until_times_out() {
        let shared = SessionShared::new(1);
        let deadline = std::time::Instant::now() + std::time::Duration::from_millis(10);
        assert_eq!(shared.wait_until(deadline), None);
    }
}
