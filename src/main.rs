//! Command-line front end: play a register score, export it, or describe it.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use ym2149_stream::{score, Score};

#[derive(Parser, Debug)]
#[command(name = "ym2149-stream", version)]
#[command(about = "Stream YM2149/AY register scores to the audio device")]
struct Args {
    /// Score file (text score, or .bin/.raw/.regs register dump)
    score: PathBuf,

    /// Override the output sample rate in Hz
    #[arg(long, value_name = "HZ")]
    sample_rate: Option<u32>,

    /// Override the master volume
    #[arg(long, value_name = "V")]
    volume: Option<f32>,

    /// Block length in stereo sample pairs
    #[arg(long, value_name = "PAIRS")]
    block: Option<usize>,

    /// Disable DC offset removal
    #[arg(long)]
    no_dc_filter: bool,

    /// Render to a WAV file instead of playing
    #[arg(long, value_name = "OUT")]
    wav: Option<PathBuf>,

    /// Print the score summary as JSON and exit
    #[arg(long)]
    info: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut score = score::load_file(&args.score)
        .with_context(|| format!("failed to load score {}", args.score.display()))?;
    apply_overrides(&mut score, &args);
    score.validate().context("score cannot be played")?;

    if args.info {
        println!("{}", serde_json::to_string_pretty(&score.summary())?);
        return Ok(());
    }

    if let Some(out) = &args.wav {
        return export_wav(&score, out);
    }

    play(score, &args)
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

fn apply_overrides(score: &mut Score, args: &Args) {
    if let Some(rate) = args.sample_rate {
        score.config.sample_rate = rate;
    }
    if let Some(volume) = args.volume {
        score.config.master_volume = volume;
    }
    if args.no_dc_filter {
        score.config.dc_filter_on = false;
    }
    log::debug!("Effective playback config: {:?}", score.config);
}

#[cfg(feature = "export-wav")]
fn export_wav(score: &Score, out: &Path) -> Result<()> {
    println!(
        "Rendering {} frames ({:.1}s) to {}...",
        score.frame_count(),
        score.duration_seconds(),
        out.display()
    );
    let written = ym2149_stream::export::export_to_wav(score, out)
        .with_context(|| format!("failed to export {}", out.display()))?;
    println!("Export complete: {} samples", written);
    Ok(())
}

#[cfg(not(feature = "export-wav"))]
fn export_wav(_score: &Score, _out: &Path) -> Result<()> {
    anyhow::bail!("WAV export requires the \"export-wav\" feature. Rebuild with `--features export-wav`.")
}

#[cfg(feature = "streaming")]
fn play(score: Score, args: &Args) -> Result<()> {
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;
    use ym2149_stream::{AudioDevice, PlaybackSession, Psg, StreamConfig};

    const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

    let score = Arc::new(score);
    let mut stream = StreamConfig::stable(score.config.sample_rate);
    if let Some(block) = args.block {
        stream = stream.with_block_len(block);
    }

    let mut session = PlaybackSession::new(Arc::clone(&score), stream)?;
    session
        .open(Psg::new(), AudioDevice::open)
        .context("failed to open audio output")?;

    println!(
        "Playing {} ({} frames, {:.1}s, {} Hz, {:.1} ms blocks)",
        args.score.display(),
        score.frame_count(),
        score.duration_seconds(),
        stream.sample_rate,
        stream.latency_ms()
    );
    session.start()?;

    let mut stdout = std::io::stdout();
    while session.wait_timeout(PROGRESS_INTERVAL).is_none() {
        let (frame, count) = session.progress();
        print!("\rFrame {:>6}/{}  {:?}   ", frame, count, session.state());
        stdout.flush()?;
    }
    println!();

    let report = session.close()?;
    println!(
        "{:?}: {}/{} frames, {} samples in {:.2}s",
        report.outcome,
        report.frames_latched,
        report.frame_count,
        report.samples_rendered,
        report.wall_time.as_secs_f64()
    );
    Ok(())
}

#[cfg(not(feature = "streaming"))]
fn play(_score: Score, _args: &Args) -> Result<()> {
    anyhow::bail!(
        "Playback requires the \"streaming\" feature. Rebuild with `--features streaming`, or use --wav."
    )
}
