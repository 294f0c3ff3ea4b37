// Voice-leading rules as pure predicates.
//
// These are the checks the beat search runs against every candidate: melodic
// leap legality per voice, and two whole-beat checks (every chord member is
// present, no pair of voices moves in parallel perfect fifths). None of them
// hold state or touch the RNG.

use crate::chord::{Chord, ChordRole};
use crate::pitch::{OCTAVE, Pitch};

/// Melodic intervals no voice may leap by: tritone, minor and major seventh.
const FORBIDDEN_LEAPS: [u8; 3] = [6, 10, 11];

const PERFECT_FIFTH: i16 = 7;

/// Whether a voice may move from `prev` to `new`.
///
/// The move must stay within an octave and must not be a forbidden interval.
/// `_prev_was_leap` is threaded through from the search but does not tighten
/// the check.
pub fn valid_leap(new: Pitch, prev: Pitch, _prev_was_leap: bool) -> bool {
    let distance = new.distance(prev);
    distance as i16 <= OCTAVE && !FORBIDDEN_LEAPS.contains(&distance)
}

/// Any motion wider than a whole step.
pub fn is_leap(new: Pitch, prev: Pitch) -> bool {
    new.distance(prev) > 2
}

/// True if every chord member (root, third, fifth) sounds in `pitches`.
pub fn chord_tone_coverage(pitches: &[Pitch], chord: &Chord) -> bool {
    [ChordRole::Root, ChordRole::Third, ChordRole::Fifth]
        .into_iter()
        .all(|role| {
            let pool = chord.role_pool(role);
            pitches.iter().any(|p| pool.contains(p))
        })
}

/// False if any voice pair forms a perfect fifth (exactly 7 semitones, either
/// direction) in both beats.
pub fn no_parallel_fifths(current: &[Pitch], previous: &[Pitch]) -> bool {
    let n = current.len().min(previous.len());
    for i in 0..n {
        for j in (i + 1)..n {
            let now = current[j].interval(current[i]).abs();
            let before = previous[j].interval(previous[i]).abs();
            if now == PERFECT_FIFTH && before == PERFECT_FIFTH {
                return false;
            }
        }
    }
    true
}
