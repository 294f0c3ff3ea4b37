// Chorale Generator
//
// Composes four-voice chorales one beat at a time. A harmonic-function state
// machine chooses each chord (with phrase-end cadences and occasional
// common-chord modulations), and a randomized constrained search voices it
// against the previous beat under classical voice-leading rules. Passing and
// neighbor tones are then written into the previous beat's second half.
//
// Architecture:
// - pitch.rs: Pitch, PitchClass, and inclusive Range value types
// - voice.rs: The four voices (bass, tenor, alto, soprano) and their ranges
// - scale.rs: Scale recipes, diatonic neighbors, and passing tones
// - chord.rs: Triads exploded into octave pools with range queries
// - key.rs: Major/minor chord catalogs bucketed by harmonic function
// - rules.rs: Leap legality, chord-tone coverage, parallel fifths
// - beat.rs: The per-beat voice search and embellishment pass
// - progression.rs: Next-chord state machine and modulation bookkeeping
// - song.rs: The append-only beat log and song termination
// - config.rs: Retry caps, probabilities, and meter (JSON-loadable)
// - midi.rs: MIDI file output from finished songs
// - error.rs: Error types
//
// The generator is deterministic given a seed, supporting reproducible output.

pub mod beat;
pub mod chord;
pub mod config;
pub mod error;
pub mod key;
pub mod midi;
pub mod pitch;
pub mod progression;
pub mod rules;
pub mod scale;
pub mod song;
pub mod voice;
