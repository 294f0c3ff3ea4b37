// Error types for the composition engine and its input/output edges.
//
// Recovery is local wherever the engine can recover: `SearchError` is
// absorbed by the song loop (it redraws the chord), and
// `TheoryError::NoPassingTone` is absorbed by the embellishment pass (it
// skips the passing tone). The remaining variants reach the caller.

use thiserror::Error;

use crate::pitch::Pitch;
use crate::voice::Voice;

/// Failures of scale and chord lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TheoryError {
    #[error("no passing tone between {low} and {high}: not two scale degrees apart")]
    NoPassingTone { low: Pitch, high: Pitch },
    #[error("{0} is not in the scale")]
    NotInScale(Pitch),
    #[error("no chord tone above {0}")]
    NoHigherTone(Pitch),
}

/// The voice search could not realize a chord after the given predecessor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("cannot voice {chord} after the previous beat ({attempts} attempts)")]
    Exhausted { chord: String, attempts: usize },
    #[error("no chord tone fits the {voice} corridor")]
    EmptyCorridor { voice: Voice },
}

/// Failures that stop a song from being built or finished.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SongError {
    #[error("tempo must be positive, got {0} BPM")]
    InvalidTempo(u32),
    #[error("meter needs at least one beat per measure and one measure per phrase (got {beats_per_measure}x{measures_per_phrase})")]
    InvalidMeter {
        beats_per_measure: usize,
        measures_per_phrase: usize,
    },
    #[error("beat {beat}: no workable chord after {draws} draws")]
    SlotExhausted { beat: usize, draws: usize },
}

/// Failures writing a finished song out.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("output file names must end in .mid or .midi: {0}")]
    UnsupportedExtension(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures loading an engine configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Malformed construction input from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("unknown pitch name '{0}' (expected C, C#, Db, ... B)")]
    UnknownPitch(String),
    #[error("the min:sec format was not followed: '{0}'")]
    BadDuration(String),
    #[error("you must enter a positive number for the tempo")]
    NonPositiveTempo,
}
