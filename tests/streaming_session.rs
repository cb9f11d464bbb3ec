use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use ym2149_stream::score::TextParser;
use ym2149_stream::{
    AudioSink, ChipModel, PlaybackOutcome, PlaybackSession, Psg, Result, Score, SessionState,
    StreamConfig, StreamError, StreamingDriver,
};

/// Sink whose "device thread" pulls blocks as fast as it can (or paced)
struct ThreadSink {
    running: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadSink {
    fn open<C: ChipModel + 'static>(
        mut driver: StreamingDriver<C>,
        request: usize,
        pace: Option<Duration>,
        captured: Arc<Mutex<Vec<i16>>>,
    ) -> Result<Self> {
        let running = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));
        let (thread_running, thread_closed) = (Arc::clone(&running), Arc::clone(&closed));

        let handle = std::thread::spawn(move || {
            let mut buf = vec![0i16; request];
            while !thread_closed.load(Ordering::Acquire) {
                if !thread_running.load(Ordering::Acquire) {
                    std::thread::sleep(Duration::from_millis(1));
                    continue;
                }
                driver.fill(&mut buf);
                captured.lock().extend_from_slice(&buf);
                if let Some(pace) = pace {
                    std::thread::sleep(pace);
                }
            }
        });

        Ok(Self {
            running,
            closed,
            handle: Some(handle),
        })
    }
}

impl AudioSink for ThreadSink {
    fn resume(&mut self) -> Result<()> {
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn pause(&mut self) {
        self.running.store(false, Ordering::Release);
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            handle.join().expect("device thread panicked");
        }
    }
}

const TWO_FRAMES: &str = "\
sample_rate 44100
frame_rate 50
frame_data
28 1 0 0 0 0 0 62 15 0 0 0 0 255
28 1 0 0 0 0 0 62 0 0 0 0 0 255
";

fn tone_score(frames: usize) -> Score {
    let mut text = String::from("frame_data\n");
    for _ in 0..frames {
        text.push_str("28 1 0 0 0 0 0 62 15 0 0 0 0 255\n");
    }
    TextParser::parse(&text).unwrap()
}

fn open_session(
    score: Score,
    block_len: usize,
    request: usize,
    pace: Option<Duration>,
) -> (PlaybackSession, Arc<Mutex<Vec<i16>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let stream = StreamConfig::low_latency(score.config.sample_rate).with_block_len(block_len);
    let mut session = PlaybackSession::new(Arc::new(score), stream).unwrap();
    let sink_capture = Arc::clone(&captured);
    session
        .open(Psg::new(), move |driver| {
            ThreadSink::open(driver, request, pace, sink_capture)
        })
        .unwrap();
    (session, captured)
}

#[test]
fn session_plays_to_completion() {
    let score = TextParser::parse(TWO_FRAMES).unwrap();
    let total = score.total_samples();
    let (mut session, captured) = open_session(score, 256, 300, None);
    assert_eq!(session.state(), SessionState::Opened);

    session.start().unwrap();
    assert_eq!(session.wait(), PlaybackOutcome::Finished);
    assert_eq!(session.state(), SessionState::Draining);
    assert_eq!(session.progress(), (2, 2));

    let report = session.close().unwrap();
    assert_eq!(report.outcome, PlaybackOutcome::Finished);
    assert_eq!(report.frames_latched, 2);
    assert_eq!(report.frame_count, 2);
    assert!(report.samples_rendered >= total);
    assert_eq!(report.samples_rendered % 256, 0, "whole blocks only");
    assert_eq!(session.state(), SessionState::Closed);

    let captured = captured.lock();
    assert!(captured.len() as u64 >= total * 2);
}

#[test]
fn volume_drop_decays_towards_silence() {
    let score = TextParser::parse(TWO_FRAMES).unwrap();
    let (session, captured) = open_session(score, 256, 512, None);
    let report = session.run().unwrap();
    assert_eq!(report.outcome, PlaybackOutcome::Finished);

    let captured = captured.lock();
    let first_frame = &captured[..2 * 882];
    let tail = &captured[2 * 1664..2 * 1764];

    let peak = first_frame.iter().map(|s| s.unsigned_abs()).max().unwrap();
    assert!(peak > 10_000, "tone should be loud, peak {peak}");
    let tail_peak = tail.iter().map(|s| s.unsigned_abs()).max().unwrap();
    assert!(
        u32::from(tail_peak) * 4 < u32::from(peak),
        "tail {tail_peak} vs peak {peak}"
    );
}

#[cfg(feature = "export-wav")]
#[test]
fn streamed_output_matches_offline_render() {
    use ym2149_stream::export::render_to_vec;

    let score = tone_score(6);
    let offline = render_to_vec(&score, Psg::new(), 4096).unwrap();

    // Odd request sizes straddle block boundaries
    let (session, captured) = open_session(score, 100, 77 * 2, None);
    session.run().unwrap();

    let captured = captured.lock();
    assert!(captured.len() >= offline.len());
    assert_eq!(&captured[..offline.len()], &offline[..]);
}

#[test]
fn stop_silences_output_and_ends_wait() {
    let score = tone_score(500);
    let (mut session, captured) = open_session(score, 256, 512, Some(Duration::from_millis(2)));
    session.start().unwrap();

    assert_eq!(session.wait_timeout(Duration::from_millis(30)), None);
    let handle = session.stop_handle();
    handle.stop();
    assert!(handle.is_stopped());
    assert_eq!(session.wait(), PlaybackOutcome::Stopped);

    // let the device thread run a few more callbacks
    std::thread::sleep(Duration::from_millis(20));
    let report = session.close().unwrap();
    assert_eq!(report.outcome, PlaybackOutcome::Stopped);
    assert!(report.frames_latched < 500);

    let captured = captured.lock();
    let tail = &captured[captured.len() - 512..];
    assert!(tail.iter().all(|&s| s == 0));
}

#[test]
fn empty_score_is_rejected_before_audio() {
    let score = TextParser::parse("frame_rate 50\nframe_data\n").unwrap();
    let result = PlaybackSession::new(Arc::new(score), StreamConfig::default());
    assert!(matches!(result, Err(StreamError::EmptyScore(_))));
}

#[test]
fn chip_configuration_errors_surface_on_open() {
    let text = "sample_rate 44100\nclock_rate 100000\nframe_data\n0 0 0 0 0 0 0 63 0 0 0 0 0 255\n";
    let score = TextParser::parse(text).unwrap();
    let stream = StreamConfig::low_latency(44_100);
    let mut session = PlaybackSession::new(Arc::new(score), stream).unwrap();
    let opened = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&opened);
    let result = session.open(Psg::new(), move |driver| {
        flag.store(true, Ordering::Release);
        ThreadSink::open(driver, 64, None, Arc::new(Mutex::new(Vec::new())))
    });
    assert!(matches!(result, Err(StreamError::ConfigError(_))));
    assert!(!opened.load(Ordering::Acquire), "sink must not be opened");
    assert_eq!(session.state(), SessionState::Idle);
}
