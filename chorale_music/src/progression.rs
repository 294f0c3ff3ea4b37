// Harmonic progression: choosing the chord for the next beat.
//
// The driver is a state machine over the previous chord's harmonic function
// and the position inside the phrase. Let `r` be the number of beats left
// before the phrase's last measure (negative once inside it):
//
// - no previous chord: the key's tonic
// - r < 0: hold the previous chord (cadential freeze)
// - after tonic or subdominant: r = 0 gives the tonic, r = 1 a dominant,
//   otherwise a random chord from a random bucket (subdominant, dominant,
//   secondary dominant)
// - after a secondary dominant: the chord it resolves to
// - after a dominant: r = 0 gives the authentic resolution, otherwise any
//   chord in the resolution set
//
// Every move except one off a dominant first rolls for a modulation. While
// one is pending, candidates must also belong to the target key; after
// `max_modulation_attempts` misses the modulation is dropped. Each chord
// chosen during a modulation counts it down, and at zero the target becomes
// the current key.
//
// `next_chord` never touches the song. It returns the chord together with
// the key state that results from choosing it, and the song commits that
// state only if the chord can actually be voiced.

use chorale_prng::ChoraleRng;
use tracing::debug;

use crate::chord::{Chord, HarmonicFunction};
use crate::config::{MeterConfig, ProgressionConfig};
use crate::key::Key;

/// A key change in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingModulation {
    pub target: Key,
    pub beats_remaining: u32,
}

/// The active key and any modulation under way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    current: Key,
    pending: Option<PendingModulation>,
}

impl KeyState {
    pub fn new(key: Key) -> Self {
        KeyState {
            current: key,
            pending: None,
        }
    }

    pub fn current(&self) -> &Key {
        &self.current
    }

    pub fn pending(&self) -> Option<&PendingModulation> {
        self.pending.as_ref()
    }

    /// A candidate is acceptable if no modulation is pending or the target
    /// key also holds it.
    fn admits(&self, chord: &Chord) -> bool {
        self.pending
            .as_ref()
            .is_none_or(|m| m.target.contains_chord(chord))
    }

    fn maybe_start_modulation(&mut self, config: &ProgressionConfig, rng: &mut ChoraleRng) {
        if self.pending.is_some() || !rng.random_bool(config.modulation_chance) {
            return;
        }
        let targets = self.current.modulations();
        if let Some(target) = rng.choose(&targets) {
            debug!(from = %self.current, to = %target, "modulation started");
            self.pending = Some(PendingModulation {
                target: target.clone(),
                beats_remaining: config.modulation_beats,
            });
        }
    }

    /// Count a chosen chord against the pending modulation.
    fn advance(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        pending.beats_remaining = pending.beats_remaining.saturating_sub(1);
        if pending.beats_remaining > 0 {
            return;
        }
        if let Some(done) = self.pending.take() {
            debug!(from = %self.current, to = %done.target, "modulation complete");
            self.current = done.target;
        }
    }
}

/// Where the next beat falls in its phrase.
#[derive(Debug, Clone, Copy)]
pub struct PhrasePosition {
    pub beat_in_phrase: usize,
    pub meter: MeterConfig,
}

impl PhrasePosition {
    /// Beats left before the phrase's last measure begins, minus one.
    /// Zero on the beat right before it; negative inside it.
    pub fn beats_until_last_measure(&self) -> i64 {
        self.meter.beats_per_phrase() as i64
            - 1
            - self.meter.beats_per_measure as i64
            - self.beat_in_phrase as i64
    }
}

/// The chosen chord and the key state after choosing it.
#[derive(Debug, Clone)]
pub struct ChordChoice {
    pub chord: Chord,
    pub keys: KeyState,
}

/// Pick the chord for the next beat.
pub fn next_chord(
    previous: Option<&Chord>,
    position: PhrasePosition,
    keys: &KeyState,
    config: &ProgressionConfig,
    rng: &mut ChoraleRng,
) -> ChordChoice {
    let Some(previous) = previous else {
        return ChordChoice {
            chord: keys.current.tonic().clone(),
            keys: keys.clone(),
        };
    };

    let remaining = position.beats_until_last_measure();
    if remaining < 0 {
        return ChordChoice {
            chord: previous.clone(),
            keys: keys.clone(),
        };
    }

    let mut keys = keys.clone();
    let rolls = previous.function() != HarmonicFunction::Dominant;
    let mut attempts = 0;
    let chord = loop {
        if rolls {
            keys.maybe_start_modulation(config, rng);
        }
        let candidate = successor(previous, remaining, &keys.current, rng);
        attempts += 1;
        if attempts >= config.max_modulation_attempts {
            if let Some(dropped) = keys.pending.take() {
                debug!(target_key = %dropped.target, attempts, "modulation abandoned");
            }
        }
        if keys.admits(&candidate) {
            break candidate;
        }
    };

    keys.advance();
    ChordChoice { chord, keys }
}

/// The chord that follows `previous` in `key`, ignoring modulation.
fn successor(previous: &Chord, remaining: i64, key: &Key, rng: &mut ChoraleRng) -> Chord {
    match previous.function() {
        HarmonicFunction::SecondaryDominant => previous
            .resolves_to()
            .cloned()
            .unwrap_or_else(|| key.tonic().clone()),
        HarmonicFunction::Dominant => {
            let resolutions = key.chords(HarmonicFunction::Resolution);
            if remaining == 0 {
                first_or_tonic(resolutions, key)
            } else {
                pick(resolutions, key, rng)
            }
        }
        HarmonicFunction::Tonic | HarmonicFunction::Subdominant | HarmonicFunction::Resolution => {
            match remaining {
                0 => key.tonic().clone(),
                1 => pick(key.chords(HarmonicFunction::Dominant), key, rng),
                _ => {
                    let buckets = [
                        HarmonicFunction::Subdominant,
                        HarmonicFunction::Dominant,
                        HarmonicFunction::SecondaryDominant,
                    ];
                    let bucket = rng
                        .choose(&buckets)
                        .copied()
                        .unwrap_or(HarmonicFunction::Subdominant);
                    pick(key.chords(bucket), key, rng)
                }
            }
        }
    }
}

// Every built-in catalog bucket is non-empty; the tonic fallback only
// matters for an empty bucket.

fn pick(chords: &[Chord], key: &Key, rng: &mut ChoraleRng) -> Chord {
    match rng.choose(chords) {
        Some(chord) => chord.clone(),
        None => tonic_fallback(key),
    }
}

fn first_or_tonic(chords: &[Chord], key: &Key) -> Chord {
    match chords.first() {
        Some(chord) => chord.clone(),
        None => tonic_fallback(key),
    }
}

fn tonic_fallback(key: &Key) -> Chord {
    debug!(%key, "empty chord bucket, using the tonic");
    key.tonic().clone()
}
