// Chorale Generator: CLI entry point.
//
// Validates the request, composes a chorale, and writes it to MIDI.
// The pipeline: parse and validate input -> build song -> generate beats ->
// MIDI output (plus optional JSON dump and text summary).
//
// Usage:
//   cargo run -p chorale_music -- [output.mid] [--key C] [--minor] [--tempo BPM]
//     [--min-length MIN:SEC] [--seed N] [--config FILE] [--dump-json FILE] [--print]
//
// Logging goes to stderr; set RUST_LOG (e.g. `chorale_music=debug`) for
// search and progression detail.

use chorale_music::config::EngineConfig;
use chorale_music::error::InputError;
use chorale_music::key::Mode;
use chorale_music::midi::{check_extension, write_midi};
use chorale_music::pitch::PitchClass;
use chorale_music::song::{Song, SongRequest};
use chorale_prng::ChoraleRng;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Compose a four-voice chorale and write it as a MIDI file.
#[derive(Parser, Debug)]
#[command(name = "generate", version, about, long_about = None)]
struct Cli {
    /// Output file (must end in .mid or .midi)
    #[arg(default_value = "chorale.mid")]
    output: PathBuf,

    /// Starting key tonic (C, C#, Db, ... B)
    #[arg(long, default_value = "C")]
    key: PitchClass,

    /// Start in the minor key instead of major
    #[arg(long)]
    minor: bool,

    /// Tempo in beats per minute
    #[arg(long, default_value_t = 90)]
    tempo: u32,

    /// Minimum length, as MIN:SEC or whole seconds
    #[arg(long, default_value = "0:30")]
    min_length: String,

    /// RNG seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file overriding engine settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write the beat timeline as JSON
    #[arg(long)]
    dump_json: Option<PathBuf>,

    /// Print a text score to stdout
    #[arg(long)]
    print: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chorale_music=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // Validate everything before composing anything.
    check_extension(&cli.output)?;
    if cli.tempo == 0 {
        return Err(InputError::NonPositiveTempo.into());
    }
    let min_duration_secs = parse_duration(&cli.min_length)?;
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    let (rng, seed) = match cli.seed {
        Some(seed) => (ChoraleRng::new(seed), seed),
        None => ChoraleRng::from_entropy(),
    };

    let request = SongRequest {
        tonic: cli.key,
        mode: if cli.minor { Mode::Minor } else { Mode::Major },
        tempo_bpm: cli.tempo,
        min_duration_secs,
    };

    println!("=== Chorale Generator ===");
    println!("Output: {}", cli.output.display());
    println!(
        "Key: {} {}",
        request.tonic,
        if cli.minor { "minor" } else { "major" }
    );
    println!("Tempo: {} BPM", request.tempo_bpm);
    println!("Minimum length: {}s", request.min_duration_secs);
    println!("Seed: {seed}");

    let mut song = Song::new(request, config, rng)?;
    song.generate()?;

    write_midi(&song, &cli.output)?;
    println!(
        "Wrote {} beats ({:.0}s, ending in {}) to {}",
        song.beats().len(),
        song.duration_secs(),
        song.current_key(),
        cli.output.display()
    );

    if let Some(path) = &cli.dump_json {
        let json = serde_json::to_string_pretty(&song.timeline())?;
        std::fs::write(path, json)?;
        println!("Wrote timeline to {}", path.display());
    }

    if cli.print {
        println!();
        print!("{}", song.summary());
    }

    Ok(())
}

/// Parse `MIN:SEC` (seconds below 60) or a bare number of seconds.
fn parse_duration(text: &str) -> Result<u32, InputError> {
    let bad = || InputError::BadDuration(text.to_string());
    let text = text.trim();
    match text.split_once(':') {
        Some((min, sec)) => {
            let min: u32 = min.trim().parse().map_err(|_| bad())?;
            let sec: u32 = sec.trim().parse().map_err(|_| bad())?;
            if sec >= 60 {
                return Err(bad());
            }
            min.checked_mul(60)
                .and_then(|m| m.checked_add(sec))
                .ok_or_else(bad)
        }
        None => text.parse().map_err(|_| bad()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("0:30"), Ok(30));
        assert_eq!(parse_duration("2:05"), Ok(125));
        assert_eq!(parse_duration("45"), Ok(45));
        assert_eq!(parse_duration(" 1:00 "), Ok(60));
    }

    #[test]
    fn test_parse_duration_rejects_malformed() {
        for bad in ["", "1:", ":30", "1:60", "a:10", "1:2:3", "-5", "1.5"] {
            assert_eq!(
                parse_duration(bad),
                Err(InputError::BadDuration(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["generate"]).unwrap();
        assert_eq!(cli.output, PathBuf::from("chorale.mid"));
        assert_eq!(cli.key, PitchClass::C);
        assert_eq!(cli.tempo, 90);
        assert!(!cli.minor);
        assert_eq!(parse_duration(&cli.min_length), Ok(30));
    }

    #[test]
    fn test_cli_parses_key_names() {
        let cli = Cli::try_parse_from(["generate", "out.midi", "--key", "Bb", "--minor", "--seed", "4"]).unwrap();
        assert_eq!(cli.key, PitchClass::ASharp);
        assert!(cli.minor);
        assert_eq!(cli.seed, Some(4));
        assert!(Cli::try_parse_from(["generate", "--key", "H"]).is_err());
    }
}
