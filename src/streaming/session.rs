//! Playback session (controller side)
//!
//! Configures the chip, hands a [`StreamingDriver`] to an audio sink, starts
//! playback and blocks until the driver signals that the score has elapsed.

use super::driver::{PlaybackOutcome, SessionShared, StreamingDriver};
use super::StreamConfig;
use crate::chip::{configure_for, ChipModel};
use crate::score::Score;
use crate::{Result, StreamError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Output device seam
///
/// The sink owns the [`StreamingDriver`] it was opened with and calls
/// [`StreamingDriver::fill`] from its callback thread. It is created paused.
pub trait AudioSink {
    /// Start or resume pulling samples
    fn resume(&mut self) -> Result<()>;

    /// Stop pulling samples without releasing the device
    fn pause(&mut self);

    /// Release the device; no callback runs after this returns
    fn close(&mut self);
}

impl<S: AudioSink + ?Sized> AudioSink for Box<S> {
    fn resume(&mut self) -> Result<()> {
        (**self).resume()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Lifecycle of a [`PlaybackSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Score accepted, no device yet
    Idle,
    /// Chip configured and device opened, paused
    Opened,
    /// Callback running, frames still being latched
    Playing,
    /// Every frame latched, the last one still playing
    Draining,
    /// Device released
    Closed,
}

/// Summary returned by [`PlaybackSession::close`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackReport {
    /// How the playback ended
    pub outcome: PlaybackOutcome,
    /// Frames latched by the renderer
    pub frames_latched: usize,
    /// Frames in the score
    pub frame_count: usize,
    /// Stereo sample pairs rendered (whole blocks)
    pub samples_rendered: u64,
    /// Wall-clock time between start and close
    pub wall_time: Duration,
}

/// Real-time playback of one score
pub struct PlaybackSession {
    score: Arc<Score>,
    stream: StreamConfig,
    shared: Arc<SessionShared>,
    sink: Option<Box<dyn AudioSink>>,
    state: SessionState,
    started_at: Option<Instant>,
}

impl PlaybackSession {
    /// Accept a score for playback
    ///
    /// # Errors
    ///
    /// [`StreamError::EmptyScore`] when the score would render nothing,
    /// [`StreamError::ConfigError`] when its parameters or the stream
    /// configuration are unusable.
    pub fn new(score: Arc<Score>, stream: StreamConfig) -> Result<Self> {
        score.validate()?;
        stream.validate()?;
        if stream.sample_rate != score.config.sample_rate {
            return Err(StreamError::ConfigError(format!(
                "stream runs at {} Hz but the score renders at {} Hz",
                stream.sample_rate, score.config.sample_rate
            )));
        }

        let shared = Arc::new(SessionShared::new(score.frame_count()));
        Ok(Self {
            score,
            stream,
            shared,
            sink: None,
            state: SessionState::Idle,
            started_at: None,
        })
    }

    /// Configure `chip` and open the output device
    ///
    /// `open_sink` receives the driver and returns the sink that will pull
    /// from it, created paused. With the `streaming` feature,
    /// [`AudioDevice::open`](super::AudioDevice::open) fits here.
    ///
    /// # Errors
    ///
    /// [`StreamError::ConfigError`] if the chip rejects the parameters, or
    /// whatever `open_sink` fails with (typically
    /// [`StreamError::AudioDeviceError`]). The session stays `Idle` on error.
    pub fn open<C, S, F>(&mut self, mut chip: C, open_sink: F) -> Result<()>
    where
        C: ChipModel,
        S: AudioSink + 'static,
        F: FnOnce(StreamingDriver<C>) -> Result<S>,
    {
        if self.state != SessionState::Idle {
            return Err(StreamError::Other(format!(
                "cannot open a session in state {:?}",
                self.state
            )));
        }

        let config = &self.score.config;
        configure_for(&mut chip, config)?;

        let driver = StreamingDriver::new(
            chip,
            Arc::clone(&self.score),
            &self.stream,
            Arc::clone(&self.shared),
        );
        let sink = open_sink(driver)?;
        self.sink = Some(Box::new(sink));
        self.state = SessionState::Opened;

        log::info!(
            "Opened playback: {} frames @ {} Hz, {} Hz output, block {} pairs ({:.1} ms)",
            self.score.frame_count(),
            config.frame_rate,
            self.stream.sample_rate,
            self.stream.block_len,
            self.stream.latency_ms()
        );
        Ok(())
    }

    /// Start the callback
    pub fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Opened {
            return Err(StreamError::Other(format!(
                "cannot start a session in state {:?}",
                self.state
            )));
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.resume()?;
        }
        self.started_at = Some(Instant::now());
        self.state = SessionState::Playing;
        log::debug!("Playback started");
        Ok(())
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        match self.state {
            SessionState::Playing if self.shared.frame_index() >= self.shared.frame_count() => {
                SessionState::Draining
            }
            state => state,
        }
    }

    /// `(frames latched, frame count)` as last published by the callback
    pub fn progress(&self) -> (usize, usize) {
        (self.shared.frame_index(), self.shared.frame_count())
    }

    /// Block until the score has elapsed or a stop was requested
    ///
    /// Returns immediately with [`PlaybackOutcome::Interrupted`] when the
    /// callback is not running, since nothing could signal completion.
    pub fn wait(&self) -> PlaybackOutcome {
        match self.state {
            SessionState::Playing => {
                let outcome = self.shared.wait();
                log::info!(
                    "Playback ended ({outcome:?}) at frame {}/{}",
                    self.shared.frame_index(),
                    self.shared.frame_count()
                );
                outcome
            }
            _ => self
                .shared
                .outcome()
                .unwrap_or(PlaybackOutcome::Interrupted),
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`
    pub fn wait_timeout(&self, timeout: Duration) -> Option<PlaybackOutcome> {
        self.shared.wait_until(Instant::now() + timeout)
    }

    /// Ask the callback to stop; it produces silence from then on
    ///
    /// Other threads stop the session through [`stop_handle`](Self::stop_handle).
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// Handle that can stop this session from another thread
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Release the device and report what was played
    pub fn close(&mut self) -> Result<PlaybackReport> {
        if self.state == SessionState::Closed {
            return Err(StreamError::Other("session already closed".into()));
        }
        if let Some(mut sink) = self.sink.take() {
            sink.pause();
            sink.close();
        }
        self.shared.complete(PlaybackOutcome::Interrupted);
        self.state = SessionState::Closed;

        let report = PlaybackReport {
            outcome: self.shared.outcome().unwrap_or(PlaybackOutcome::Interrupted),
            frames_latched: self.shared.frame_index(),
            frame_count: self.shared.frame_count(),
            samples_rendered: self.shared.samples_rendered(),
            wall_time: self.started_at.map(|t| t.elapsed()).unwrap_or_default(),
        };
        log::info!(
            "Playback closed ({:?}): {}/{} frames, {} samples in {:.2}s",
            report.outcome,
            report.frames_latched,
            report.frame_count,
            report.samples_rendered,
            report.wall_time.as_secs_f64()
        );
        Ok(report)
    }

    /// Start, wait for the score to elapse, then close
    pub fn run(mut self) -> Result<PlaybackReport> {
        self.start()?;
        self.wait();
        self.close()
    }

    /// The score being played
    pub fn score(&self) -> &Score {
        &self.score
    }

    /// The negotiated stream configuration
    pub fn stream_config(&self) -> StreamConfig {
        self.stream
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        if let Some(mut sink) = self.sink.take() {
            sink.pause();
            sink.close();
        }
    }
}

/// Cloneable stop request for a running session
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<SessionShared>,
}

impl StopHandle {
    /// Ask the session to stop
    pub fn stop(&self) {
        self.shared.request_stop();
    }

    /// True once a stop was requested
    pub fn is_stopped(&self) -> bool {
        self.shared.stop_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{FrameTable, PlaybackConfig, RegisterFrame};
    use crate::test_support::{ChipCall, RecordingChip};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Events(Mutex<Vec<&'static str>>);

    /// Sink that records lifecycle calls and never pulls
    struct InertSink(Arc<Events>);

    impl AudioSink for InertSink {
        fn resume(&mut self) -> Result<()> {
            self.0 .0.lock().push("resume");
            Ok(())
        }

        fn pause(&mut self) {
            self.0 .0.lock().push("pause");
        }

        fn close(&mut self) {
            self.0 .0.lock().push("close");
        }
    }

    fn score(frames: usize, config: PlaybackConfig) -> Arc<Score> {
        Arc::new(Score::new(
            config,
            FrameTable::new(vec![RegisterFrame::silent(); frames]),
        ))
    }

    #[test]
    fn test_empty_score_is_rejected() {
        let result =
            PlaybackSession::new(score(0, PlaybackConfig::default()), StreamConfig::default());
        assert!(matches!(result, Err(StreamError::EmptyScore(_))));
    }

    #[test]
    fn test_rate_mismatch_is_rejected() {
        let result = PlaybackSession::new(
            score(4, PlaybackConfig::default()),
            StreamConfig::stable(48_000),
        );
        assert!(matches!(result, Err(StreamError::ConfigError(_))));
    }

    #[test]
    fn test_open_configures_chip_and_pans() {
        let config = PlaybackConfig {
            pan: [Some(0.1), None, Some(0.9)],
            stereo_eq_on: true,
            ..PlaybackConfig::default()
        };
        let mut session =
            PlaybackSession::new(score(4, config), StreamConfig::default()).unwrap();
        let events = Arc::new(Events::default());
        let calls = Arc::new(Mutex::new(Vec::new()));

        let sink_events = Arc::clone(&events);
        let seen = Arc::clone(&calls);
        session
            .open(RecordingChip::default(), move |mut driver| {
                *seen.lock() = driver.chip_mut().calls.clone();
                Ok(InertSink(sink_events))
            })
            .unwrap();

        assert_eq!(session.state(), SessionState::Opened);
        let calls = calls.lock();
        assert!(matches!(calls[0], ChipCall::Configure(_, 2_000_000, 44_100)));
        assert_eq!(calls[1], ChipCall::Pan(0, 0.1, true));
        assert_eq!(calls[2], ChipCall::Pan(2, 0.9, true));
        assert_eq!(calls.len(), 3);
    }

    #[test]
    fn test_sink_failure_keeps_session_idle() {
        let mut session =
            PlaybackSession::new(score(4, PlaybackConfig::default()), StreamConfig::default())
                .unwrap();
        let result = session.open(RecordingChip::default(), |_driver| -> Result<InertSink> {
            Err(StreamError::AudioDeviceError("no device".into()))
        });
        assert!(matches!(result, Err(StreamError::AudioDeviceError(_))));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_lifecycle_and_stop() {
        let mut session =
            PlaybackSession::new(score(4, PlaybackConfig::default()), StreamConfig::default())
                .unwrap();
        let events = Arc::new(Events::default());
        let sink_events = Arc::clone(&events);
        session
            .open(RecordingChip::default(), move |_driver| Ok(InertSink(sink_events)))
            .unwrap();
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Playing);
        assert!(session.start().is_err());

        let handle = session.stop_handle();
        std::thread::spawn(move || handle.stop());
        assert_eq!(session.wait(), PlaybackOutcome::Stopped);

        let report = session.close().unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Stopped);
        assert_eq!(report.frame_count, 4);
        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(*events.0.lock(), vec!["resume", "pause", "close"]);
        assert!(session.close().is_err());
    }

    #[test]
    fn test_close_without_start_is_interrupted() {
        let mut session =
            PlaybackSession::new(score(4, PlaybackConfig::default()), StreamConfig::default())
                .unwrap();
        let events = Arc::new(Events::default());
        let sink_events = Arc::clone(&events);
        session
            .open(RecordingChip::default(), move |_driver| Ok(InertSink(sink_events)))
            .unwrap();
        assert_eq!(session.wait(), PlaybackOutcome::Interrupted);
        assert_eq!(session.wait_timeout(Duration::from_millis(5)), None);
        let report = session.close().unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Interrupted);
        assert_eq!(report.samples_rendered, 0);
    }
}
