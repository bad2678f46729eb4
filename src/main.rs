//! SN76489 VGM renderer CLI
//!
//! Renders VGM files to five WAV tracks, prints song information and cross-checks songs
//! against raw captures.

mod args;

use anyhow::{anyhow, bail, Context, Result};
use args::{CaptureSource, CliArgs, CliCommand, RenderArgs};
use sn76489::export::{export_song, ExportConfig};
use sn76489::replayer::{verify_capture, MismatchPolicy, RenderConfig};
use sn76489::vgm_loader::{find_companion_capture, load_capture, load_file, VgmSong};
use std::fs;
use std::path::Path;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    if args.show_help {
        CliArgs::print_help();
        return if args.invalid {
            Err(anyhow!("Invalid arguments"))
        } else {
            Ok(())
        };
    }

    match args.command {
        Some(CliCommand::Info { input, json }) => run_info(&input, json),
        Some(CliCommand::Render(render)) => run_render(&render),
        Some(CliCommand::Check { input, capture }) => run_check(&input, &capture),
        None => Ok(()),
    }
}

fn load_song(path: &Path) -> Result<VgmSong> {
    load_file(path).with_context(|| format!("Failed to load '{}'", path.display()))
}

fn run_info(path: &Path, json: bool) -> Result<()> {
    let song = load_song(path)?;

    if json {
        let text = serde_json::to_string_pretty(&song).context("Failed to encode song info")?;
        println!("{}", text);
        return Ok(());
    }

    let h = &song.header;
    println!("File:            {}", path.display());
    println!("Format:          {:?}, version {}", song.format, h.version_string());
    println!("SN76489 clock:   {} Hz", h.clock_hz());
    println!("Playback rate:   {} Hz (header {})", song.rate, h.rate);
    println!(
        "Noise register:  {} bits, taps 0x{:04X}",
        h.noise_config().width,
        h.noise_config().taps
    );
    println!("Flags:           {:?}", h.flags());
    println!("Data start:      0x{:X}", h.data_start());
    if let Some(pos) = h.loop_position() {
        println!("Loop:            0x{:X} ({} samples)", pos, h.loop_samples);
    }
    println!(
        "Frames:          {} ({:.2}s), header implies {}",
        song.frames.len(),
        song.duration_secs(),
        song.expected_frames()
    );
    println!(
        "Writes:          {} ({} misaligned waits, {} data blocks)",
        song.stats.register_writes, song.stats.misaligned_waits, song.stats.data_blocks
    );
    match song.check() {
        Ok(()) => println!("Consistency:     ok"),
        Err(e) => println!("Consistency:     {}", e),
    }
    if let Some(tag) = &song.gd3 {
        println!("Title:           {}", tag.title());
        println!("Game:            {}", tag.game_english);
        println!("System:          {}", tag.system_english);
        println!("Author:          {}", tag.author());
        println!("Released:        {}", tag.release_date);
    }
    Ok(())
}

/// Start from the header-derived settings, overlay a JSON file, then the flags
fn build_config(song: &VgmSong, args: &RenderArgs) -> Result<RenderConfig> {
    let mut config = RenderConfig::for_song(song);

    if let Some(path) = &args.config {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config '{}'", path.display()))?;
        let overlay: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Invalid JSON in '{}'", path.display()))?;
        let mut merged = serde_json::to_value(&config)?;
        match (merged.as_object_mut(), overlay) {
            (Some(base), serde_json::Value::Object(fields)) => base.extend(fields),
            _ => bail!("Config '{}' must be a JSON object", path.display()),
        }
        config = serde_json::from_value(merged)
            .with_context(|| format!("Invalid render config in '{}'", path.display()))?;
    }

    if let Some(rate) = args.sample_rate {
        config.sample_rate = rate;
    }
    if let Some(seconds) = args.max_seconds {
        config.max_duration = Some(seconds);
    }
    if let Some(loops) = args.loops {
        config.loops = loops;
    }
    if let Some(divider) = args.divider {
        config.divider = divider;
    }
    if args.lenient {
        config.mismatch_policy = MismatchPolicy::Warn;
    }

    config.validate()?;
    Ok(config)
}

fn cross_check_song(song: &VgmSong, args: &RenderArgs, policy: MismatchPolicy) -> Result<()> {
    let capture_path = match &args.capture {
        CaptureSource::Skip => return Ok(()),
        CaptureSource::File(path) => Some(path.clone()),
        CaptureSource::Companion => find_companion_capture(&args.input),
    };
    let Some(capture_path) = capture_path else {
        println!("No raw capture found, skipping cross-check");
        return Ok(());
    };

    let capture = load_capture(&capture_path)
        .with_context(|| format!("Failed to load capture '{}'", capture_path.display()))?;
    let report = verify_capture(song, &capture, policy)
        .with_context(|| format!("Cross-check against '{}' failed", capture_path.display()))?;

    match &report.divergence {
        Some(msg) => eprintln!("WARNING: cross-check: {}", msg),
        None => println!(
            "Cross-check against {}: {} frames match ({} empty padding)",
            capture_path.display(),
            report.compared,
            report.padding()
        ),
    }
    Ok(())
}

fn run_render(args: &RenderArgs) -> Result<()> {
    let song = load_song(&args.input)?;
    let config = build_config(&song, args)?;

    if let Err(e) = song.check() {
        match config.mismatch_policy {
            MismatchPolicy::Fatal => return Err(e).context("Frame timing check failed"),
            MismatchPolicy::Warn => eprintln!("WARNING: {}", e),
        }
    }
    cross_check_song(&song, args, config.mismatch_policy)?;

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    let mut export = ExportConfig::for_path(out_dir, &args.input).with_render(config);
    if let Some(trace) = &args.trace {
        export = export.with_trace_path(trace);
    }

    let summary = export_song(&song, &export).context("Export failed")?;
    println!(
        "{} samples per track, {} files",
        summary.samples,
        summary.wav_files.len() + summary.trace_file.iter().count()
    );
    Ok(())
}

fn run_check(input: &Path, capture_path: &Path) -> Result<()> {
    let song = load_song(input)?;
    let capture = load_capture(capture_path)
        .with_context(|| format!("Failed to load capture '{}'", capture_path.display()))?;

    song.check().context("Frame timing check failed")?;
    let report = verify_capture(&song, &capture, MismatchPolicy::Fatal)?;
    println!(
        "OK: {} frames match (VGM {}, capture {})",
        report.compared, report.left_len, report.right_len
    );
    Ok(())
}
