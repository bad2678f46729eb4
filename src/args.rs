//! Command-line argument parsing for the sn76489 CLI.
//!
//! Three subcommands:
//! - `info`: header, metadata and frame statistics of a VGM file
//! - `render`: render a VGM file to five WAV tracks
//! - `check`: compare a VGM file against a raw capture

use sn76489::ClockDivider;
use std::env;
use std::path::PathBuf;

/// Where the reference capture for `render` comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureSource {
    /// Look for `<stem>.sn76489.bin`, then `<stem>.bin`
    #[default]
    Companion,
    /// Use this file
    File(PathBuf),
    /// Skip the cross-check
    Skip,
}

/// Options of the `render` subcommand
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderArgs {
    /// Song to render
    pub input: PathBuf,
    /// Output directory (default: next to the input)
    pub out_dir: Option<PathBuf>,
    /// Output sample rate
    pub sample_rate: Option<u32>,
    /// Length limit in seconds
    pub max_seconds: Option<f64>,
    /// Loop count
    pub loops: Option<u32>,
    /// Divider override
    pub divider: Option<ClockDivider>,
    /// JSON render configuration
    pub config: Option<PathBuf>,
    /// Cross-check source
    pub capture: CaptureSource,
    /// Report cross-check divergence instead of failing
    pub lenient: bool,
    /// Frame trace output
    pub trace: Option<PathBuf>,
}

/// Subcommand to run
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Print song information
    Info {
        /// Song path
        input: PathBuf,
        /// Emit JSON instead of text
        json: bool,
    },
    /// Render to WAV
    Render(RenderArgs),
    /// Cross-check a song against a capture
    Check {
        /// Song path
        input: PathBuf,
        /// Capture path
        capture: PathBuf,
    },
}

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Selected subcommand
    pub command: Option<CliCommand>,
    /// Whether help should be printed
    pub show_help: bool,
    /// Whether the arguments were unusable
    pub invalid: bool,
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Option<T> {
    match value {
        Some(v) => match v.parse() {
            Ok(n) => Some(n),
            Err(_) => {
                eprintln!("{} expects a number, got '{}'", flag, v);
                None
            }
        },
        None => {
            eprintln!("{} requires an argument", flag);
            None
        }
    }
}

impl CliArgs {
    fn fail(&mut self) {
        self.invalid = true;
        self.show_help = true;
    }

    /// Parse arguments from command line.
    pub fn parse() -> Self {
        Self::parse_from(env::args().skip(1))
    }

    /// Parse an argument list (without the program name).
    pub fn parse_from<I: IntoIterator<Item = String>>(items: I) -> Self {
        let mut args = Self::default();
        let mut iter = items.into_iter();

        let Some(sub) = iter.next() else {
            args.show_help = true;
            return args;
        };

        let mut positional: Vec<PathBuf> = Vec::new();
        let mut json = false;
        let mut render = RenderArgs::default();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" | "-h" => args.show_help = true,
                "--json" => json = true,
                "--lenient" => render.lenient = true,
                "--no-check" => render.capture = CaptureSource::Skip,
                "--out" => match iter.next() {
                    Some(dir) => render.out_dir = Some(dir.into()),
                    None => {
                        eprintln!("--out requires a directory");
                        args.fail();
                    }
                },
                "--raw" => match iter.next() {
                    Some(file) => render.capture = CaptureSource::File(file.into()),
                    None => {
                        eprintln!("--raw requires a capture file");
                        args.fail();
                    }
                },
                "--config" => match iter.next() {
                    Some(file) => render.config = Some(file.into()),
                    None => {
                        eprintln!("--config requires a JSON file");
                        args.fail();
                    }
                },
                "--trace" => match iter.next() {
                    Some(file) => render.trace = Some(file.into()),
                    None => {
                        eprintln!("--trace requires a CSV file");
                        args.fail();
                    }
                },
                "--sample-rate" => {
                    render.sample_rate = parse_number(&arg, iter.next());
                    if render.sample_rate.is_none() {
                        args.fail();
                    }
                }
                "--max-seconds" => {
                    render.max_seconds = parse_number(&arg, iter.next());
                    if render.max_seconds.is_none() {
                        args.fail();
                    }
                }
                "--loops" => {
                    render.loops = parse_number(&arg, iter.next());
                    if render.loops.is_none() {
                        args.fail();
                    }
                }
                "--divider" => match iter.next().as_deref().map(ClockDivider::from_str) {
                    Some(Some(divider)) => render.divider = Some(divider),
                    _ => {
                        eprintln!("--divider expects 16, 128 or none");
                        args.fail();
                    }
                },
                _ if arg.starts_with('-') => {
                    eprintln!("Unknown flag: {}", arg);
                    args.fail();
                }
                _ => positional.push(arg.into()),
            }
        }

        let mut positional = positional.into_iter();
        args.command = match (sub.as_str(), positional.next(), positional.next()) {
            ("info", Some(input), None) => Some(CliCommand::Info { input, json }),
            ("render", Some(input), None) => {
                render.input = input;
                Some(CliCommand::Render(render))
            }
            ("check", Some(input), Some(capture)) => Some(CliCommand::Check { input, capture }),
            ("--help" | "-h" | "help", _, _) => None,
            (other, _, _) => {
                eprintln!("Unknown command or wrong arguments: {}", other);
                args.fail();
                None
            }
        };
        if args.command.is_none() {
            args.show_help = true;
        }

        args
    }

    /// Print help text to stderr.
    pub fn print_help() {
        eprintln!(
            "Usage:\n\
             \x20 sn76489 info   <song.vgm> [--json]\n\
             \x20 sn76489 render <song.vgm> [options]\n\
             \x20 sn76489 check  <song.vgm> <capture.bin>\n\n\
             Render options:\n\
             \x20 --out DIR            Output directory (default: next to the song)\n\
             \x20 --sample-rate HZ     Output sample rate (default 44100)\n\
             \x20 --max-seconds S      Stop after S seconds (checked between frames)\n\
             \x20 --loops N            Play the song N times\n\
             \x20 --divider MODE       16, 128 or none (default: from header flags)\n\
             \x20 --config FILE        JSON render configuration; flags override it\n\
             \x20 --raw FILE           Cross-check against this raw capture\n\
             \x20 --no-check           Skip the cross-check\n\
             \x20 --lenient            Report cross-check divergence instead of failing\n\
             \x20 --trace FILE         Write a per-frame CSV trace\n\
             \x20 -h, --help           Show this help\n\n\
             Outputs:\n\
             \x20 <stem>.master.wav <stem>.tone0.wav <stem>.tone1.wav <stem>.tone2.wav <stem>.noise.wav\n\n\
             Examples:\n\
             \x20 sn76489 info music/song.vgz --json\n\
             \x20 sn76489 render music/song.vgm --out wav --max-seconds 10\n"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> CliArgs {
        CliArgs::parse_from(line.split_whitespace().map(String::from))
    }

    #[test]
    fn test_info() {
        let args = parse("info song.vgm --json");
        assert!(!args.show_help);
        assert_eq!(
            args.command,
            Some(CliCommand::Info {
                input: "song.vgm".into(),
                json: true
            })
        );
    }

    #[test]
    fn test_render_flags() {
        let args = parse(
            "render song.vgm --out wav --sample-rate 22050 --max-seconds 2.5 --loops 2 \
             --divider none --raw song.bin --lenient --trace t.csv",
        );
        assert!(!args.show_help);
        let Some(CliCommand::Render(render)) = args.command else {
            panic!("expected render");
        };
        assert_eq!(render.input, PathBuf::from("song.vgm"));
        assert_eq!(render.out_dir, Some("wav".into()));
        assert_eq!(render.sample_rate, Some(22_050));
        assert_eq!(render.max_seconds, Some(2.5));
        assert_eq!(render.loops, Some(2));
        assert_eq!(render.divider, Some(ClockDivider::None));
        assert_eq!(render.capture, CaptureSource::File("song.bin".into()));
        assert!(render.lenient);
        assert_eq!(render.trace, Some("t.csv".into()));
    }

    #[test]
    fn test_check_needs_two_files() {
        assert!(parse("check song.vgm").invalid);
        assert!(!parse("check song.vgm song.bin").show_help);
    }

    #[test]
    fn test_bad_input_shows_help() {
        let empty = parse("");
        assert!(empty.show_help && !empty.invalid);
        assert!(!parse("--help").invalid);
        assert!(parse("render song.vgm --sample-rate fast").invalid);
        assert!(parse("render song.vgm --divider 7").invalid);
        assert!(parse("render song.vgm --bogus").invalid);
        assert!(parse("play song.vgm").invalid);
    }
}
