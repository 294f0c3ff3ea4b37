// One rhythmic slot: the randomized voice search and the embellishment pass.
//
// `Beat::generate` realizes a chord in four voices against the previous beat
// (or from scratch for the opening beat). The search is a bounded
// resampling loop:
//
// 1. For each voice bottom-up, compute a corridor from the voice range, the
//    voice just placed beneath it, and the same voice's previous pitch.
// 2. Draw chord tones from the corridor at random, discarding each one that
//    makes an illegal leap, until one passes or the corridor runs dry.
// 3. Once all four voices are placed, check chord-tone coverage and
//    parallel fifths against the previous beat.
//
// Any failure discards the whole attempt. After `max_beat_attempts` attempts
// the chord is reported unworkable and the song picks another.
//
// A successful search is followed by the embellishment pass, which may put a
// passing or neighbor tone into the *previous* beat's second half. Generation
// never mutates the previous beat: it returns the new beat together with a
// list of `Embellishment` commands, and the song's beat log applies them
// (see song.rs). The opening beat has no predecessor and is never
// embellished.

use chorale_prng::ChoraleRng;
use serde::Serialize;
use tracing::trace;

use crate::chord::Chord;
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::pitch::{OCTAVE, Pitch, Range};
use crate::rules::{chord_tone_coverage, is_leap, no_parallel_fifths, valid_leap};
use crate::voice::{NUM_VOICES, Voice};

#[derive(Debug, Clone, Serialize)]
pub struct Beat {
    chord: Chord,
    /// The chord tone each voice landed on.
    chord_tones: [Pitch; NUM_VOICES],
    first_half: [Pitch; NUM_VOICES],
    /// Starts equal to the chord tones; the next beat may overwrite entries
    /// with passing or neighbor tones.
    second_half: [Pitch; NUM_VOICES],
    /// Whether each voice leapt into its chord tone.
    leaped: [bool; NUM_VOICES],
    /// Set once any embellishment is attached to or sounds in this beat.
    non_chord_tone: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EmbellishmentKind {
    Passing,
    Neighbor,
}

/// A pending rewrite of one voice in the previous beat's second half.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Embellishment {
    pub voice: Voice,
    pub pitch: Pitch,
    pub kind: EmbellishmentKind,
}

/// A successful search: the new beat plus the edits it makes to its
/// predecessor.
#[derive(Debug, Clone)]
pub struct GeneratedBeat {
    pub beat: Beat,
    pub embellishments: Vec<Embellishment>,
}

impl Beat {
    /// Voice `chord` after `prev`, or as the opening beat if `prev` is None.
    pub fn generate(
        chord: &Chord,
        prev: Option<&Beat>,
        config: &SearchConfig,
        rng: &mut ChoraleRng,
    ) -> Result<GeneratedBeat, SearchError> {
        let Some(prev) = prev else {
            let tones = first_voicing(chord, config, rng)?;
            return Ok(GeneratedBeat {
                beat: Beat::from_tones(chord.clone(), tones, [false; NUM_VOICES]),
                embellishments: Vec::new(),
            });
        };

        for attempt in 0..config.max_beat_attempts {
            let Some((tones, leaped)) = voice_after(chord, prev, rng) else {
                trace!(attempt, chord = %chord, "voice search ran out of candidates");
                continue;
            };
            if !chord_tone_coverage(&tones, chord) {
                trace!(attempt, chord = %chord, "missing a chord member");
                continue;
            }
            if !no_parallel_fifths(&tones, &prev.chord_tones) {
                trace!(attempt, chord = %chord, "parallel fifths");
                continue;
            }

            let pass = embellish(&tones, leaped, prev, config, rng);
            let mut beat = Beat::from_tones(chord.clone(), tones, pass.leaped);
            beat.non_chord_tone = pass.non_chord_tone;
            return Ok(GeneratedBeat {
                beat,
                embellishments: pass.embellishments,
            });
        }

        Err(SearchError::Exhausted {
            chord: chord.to_string(),
            attempts: config.max_beat_attempts,
        })
    }

    fn from_tones(chord: Chord, tones: [Pitch; NUM_VOICES], leaped: [bool; NUM_VOICES]) -> Self {
        Beat {
            chord,
            chord_tones: tones,
            first_half: tones,
            second_half: tones,
            leaped,
            non_chord_tone: false,
        }
    }

    pub fn chord(&self) -> &Chord {
        &self.chord
    }

    pub fn chord_tones(&self) -> &[Pitch; NUM_VOICES] {
        &self.chord_tones
    }

    pub fn first_half(&self) -> &[Pitch; NUM_VOICES] {
        &self.first_half
    }

    pub fn second_half(&self) -> &[Pitch; NUM_VOICES] {
        &self.second_half
    }

    pub fn leaped(&self) -> &[bool; NUM_VOICES] {
        &self.leaped
    }

    pub fn has_non_chord_tone(&self) -> bool {
        self.non_chord_tone
    }

    /// Overwrite one voice's second half. Marks the beat as carrying a
    /// non-chord tone if the new pitch is outside the chord.
    pub fn apply_embellishment(&mut self, embellishment: &Embellishment) {
        let v = embellishment.voice.index();
        self.second_half[v] = embellishment.pitch;
        if !self.chord.contains(embellishment.pitch) {
            self.non_chord_tone = true;
        }
    }
}

// ── Search ──

/// Opening voicing: the bass takes a root, every voice above stays within
/// an octave of the one below. No leap or whole-beat checks apply.
fn first_voicing(
    chord: &Chord,
    config: &SearchConfig,
    rng: &mut ChoraleRng,
) -> Result<[Pitch; NUM_VOICES], SearchError> {
    let mut failed_voice = Voice::Bass;
    for _ in 0..config.max_beat_attempts.max(1) {
        let Some(&bass) = rng.choose(chord.roots_in_range(Voice::Bass.range())) else {
            return Err(SearchError::EmptyCorridor { voice: Voice::Bass });
        };
        let mut tones = [bass; NUM_VOICES];
        let mut complete = true;
        for voice in &Voice::ALL[1..] {
            let below = tones[voice.index() - 1];
            let range = voice.range();
            let corridor = Range::new(
                range.low.max(below.offset(1)),
                range.high.min(below.offset(OCTAVE)),
            );
            match rng.choose(chord.notes_in_range(corridor)) {
                Some(&pitch) => tones[voice.index()] = pitch,
                None => {
                    failed_voice = *voice;
                    complete = false;
                    break;
                }
            }
        }
        if complete {
            return Ok(tones);
        }
    }
    Err(SearchError::EmptyCorridor {
        voice: failed_voice,
    })
}

/// One whole-beat attempt after `prev`. None if some voice had no legal
/// candidate.
fn voice_after(
    chord: &Chord,
    prev: &Beat,
    rng: &mut ChoraleRng,
) -> Option<([Pitch; NUM_VOICES], [bool; NUM_VOICES])> {
    let mut tones = prev.chord_tones;
    let mut leaped = [false; NUM_VOICES];
    for voice in Voice::ALL {
        let v = voice.index();
        let below = voice.below().map(|b| tones[b.index()]);
        let corridor = corridor(voice, prev.chord_tones[v], below);
        let mut candidates = match voice {
            Voice::Bass => chord.bass_notes_in_range(corridor),
            _ => chord.notes_in_range(corridor).to_vec(),
        };
        let previous = prev.chord_tones[v];
        let pitch = loop {
            let i = rng.index(candidates.len())?;
            if valid_leap(candidates[i], previous, prev.leaped[v]) {
                break candidates[i];
            }
            candidates.swap_remove(i);
        };
        tones[v] = pitch;
        leaped[v] = is_leap(pitch, previous);
    }
    Some((tones, leaped))
}

/// The band a voice may move into: inside its range, within an octave of its
/// previous pitch, and above (but no more than an octave above) the voice
/// beneath it.
fn corridor(voice: Voice, previous: Pitch, below: Option<Pitch>) -> Range {
    let range = voice.range();
    let mut low = range.low.max(previous.offset(-OCTAVE));
    let mut high = range.high.min(previous.offset(OCTAVE));
    if let Some(below) = below {
        low = low.max(below.offset(1));
        high = high.min(below.offset(OCTAVE));
    }
    Range::new(low, high)
}

// ── Embellishment ──

struct EmbellishmentPass {
    embellishments: Vec<Embellishment>,
    leaped: [bool; NUM_VOICES],
    non_chord_tone: bool,
}

/// Decide the passing and neighbor tones leading into `tones` from `prev`.
///
/// A voice moving by a third gets a passing tone from the previous beat's
/// scale. Otherwise, a voice that steps into the previous beat and leaps into
/// this one may get a neighbor of its new pitch, at most once per beat. An
/// embellished voice no longer counts as having leapt.
///
/// A non-chord tone that would leave its voice's range, or sit outside 1-12
/// semitones from the adjacent voices still sounding in the previous beat's
/// second half, is skipped.
fn embellish(
    tones: &[Pitch; NUM_VOICES],
    mut leaped: [bool; NUM_VOICES],
    prev: &Beat,
    config: &SearchConfig,
    rng: &mut ChoraleRng,
) -> EmbellishmentPass {
    let scale = prev.chord.scale();
    let mut sounding = prev.second_half;
    let mut embellishments = Vec::new();
    let mut non_chord_tone = false;

    for voice in Voice::ALL {
        let v = voice.index();
        let current = tones[v];
        let previous = prev.chord_tones[v];

        if matches!(current.distance(previous), 3 | 4) {
            match scale.passing_tone(current.min(previous), current.max(previous)) {
                Ok(pitch) if !fits_between(voice, pitch, &sounding) => {
                    trace!(%voice, %pitch, "passing tone crowds its neighbors");
                }
                Ok(pitch) => {
                    sounding[v] = pitch;
                    embellishments.push(Embellishment {
                        voice,
                        pitch,
                        kind: EmbellishmentKind::Passing,
                    });
                    leaped[v] = false;
                    non_chord_tone = true;
                }
                Err(err) => trace!(%voice, %err, "no passing tone"),
            }
        }

        if !non_chord_tone
            && !prev.leaped[v]
            && leaped[v]
            && rng.random_bool(config.neighbor_chance(v))
        {
            let pitch = if rng.random_bool(0.5) {
                scale.neighbor_below(current)
            } else {
                scale.neighbor_above(current)
            };
            if fits_between(voice, pitch, &sounding) {
                sounding[v] = pitch;
                embellishments.push(Embellishment {
                    voice,
                    pitch,
                    kind: EmbellishmentKind::Neighbor,
                });
                leaped[v] = false;
                non_chord_tone = true;
            } else {
                trace!(%voice, %pitch, "neighbor tone crowds its neighbors");
            }
        }
    }

    EmbellishmentPass {
        embellishments,
        leaped,
        non_chord_tone,
    }
}

/// Whether `pitch` can sound in `voice` against the other voices' current
/// pitches: in range, and 1-12 semitones from each adjacent voice.
fn fits_between(voice: Voice, pitch: Pitch, sounding: &[Pitch; NUM_VOICES]) -> bool {
    let v = voice.index();
    let spaced = |low: Pitch, high: Pitch| (1..=OCTAVE).contains(&high.interval(low));
    voice.range().contains(pitch)
        && (v == 0 || spaced(sounding[v - 1], pitch))
        && (v + 1 == NUM_VOICES || spaced(pitch, sounding[v + 1]))
}
