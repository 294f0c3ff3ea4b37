// Chords: triads exploded into every playable octave.
//
// On construction a chord computes, for each of its root, third, and fifth,
// every octave of that pitch class inside `INSTRUMENT_RANGE`. Because the
// instrument range spans a whole number of octaves, each role gets the same
// number of occurrences. The three role pools are merged into one ascending
// pool. Pools are computed once and never change, so every range query
// returns a borrowed sub-slice.
//
// A chord also records its harmonic function within the key that produced
// it, the scale its embellishments should use, an optional inversion (which
// restricts the bass), and, for secondary dominants, the chord it resolves
// to.
//
// Identity for key membership is (root, quality) only: see `same_harmony`.

use serde::Serialize;
use std::fmt;

use crate::error::TheoryError;
use crate::pitch::{INSTRUMENT_RANGE, OCTAVE, Pitch, PitchClass, Range};
use crate::scale::Scale;

/// Triad quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quality {
    Major,
    Minor,
    Augmented,
    Diminished,
}

impl Quality {
    /// Semitones from the root to the third and to the fifth.
    pub fn intervals(self) -> (i16, i16) {
        match self {
            Quality::Major => (4, 7),
            Quality::Minor => (3, 7),
            Quality::Augmented => (4, 8),
            Quality::Diminished => (3, 6),
        }
    }
}

/// Structural role of a chord within its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
    SecondaryDominant,
    /// Bucket of chords a dominant may move to. Chords placed in it keep
    /// their own function label (tonic, or subdominant for deceptive moves).
    Resolution,
}

/// Which chord member the bass must take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Inversion {
    /// No requirement: the bass may take the root or the third.
    #[default]
    Unset,
    Root,
    First,
    Second,
}

/// Root, third, or fifth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChordRole {
    Root,
    Third,
    Fifth,
}

#[derive(Debug, Clone, Serialize)]
pub struct Chord {
    root: PitchClass,
    quality: Quality,
    function: HarmonicFunction,
    scale: Scale,
    inversion: Inversion,
    #[serde(skip)]
    roots: Vec<Pitch>,
    #[serde(skip)]
    thirds: Vec<Pitch>,
    #[serde(skip)]
    fifths: Vec<Pitch>,
    #[serde(skip)]
    pool: Vec<Pitch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolves_to: Option<Box<Chord>>,
}

impl Chord {
    pub fn new(root: PitchClass, quality: Quality, function: HarmonicFunction, scale: Scale) -> Self {
        let (third_iv, fifth_iv) = quality.intervals();
        let roots = octaves_in_range(root);
        let thirds = octaves_in_range(root.transpose(third_iv));
        let fifths = octaves_in_range(root.transpose(fifth_iv));
        let pool = merge_sorted(&merge_sorted(&roots, &thirds), &fifths);
        Chord {
            root,
            quality,
            function,
            scale,
            inversion: Inversion::Unset,
            roots,
            thirds,
            fifths,
            pool,
            resolves_to: None,
        }
    }

    /// A major triad tagged as a secondary dominant of `target`.
    pub fn secondary_dominant(root: PitchClass, scale: Scale, target: Chord) -> Self {
        let mut chord = Chord::new(
            root,
            Quality::Major,
            HarmonicFunction::SecondaryDominant,
            scale,
        );
        chord.resolves_to = Some(Box::new(target));
        chord
    }

    pub fn with_inversion(mut self, inversion: Inversion) -> Self {
        self.inversion = inversion;
        self
    }

    pub fn root(&self) -> PitchClass {
        self.root
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn function(&self) -> HarmonicFunction {
        self.function
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    pub fn inversion(&self) -> Inversion {
        self.inversion
    }

    /// The chord a secondary dominant leads to. None for every other chord.
    pub fn resolves_to(&self) -> Option<&Chord> {
        self.resolves_to.as_deref()
    }

    /// Every chord tone in the instrument range, ascending.
    pub fn pool(&self) -> &[Pitch] {
        &self.pool
    }

    pub fn role_pool(&self, role: ChordRole) -> &[Pitch] {
        match role {
            ChordRole::Root => &self.roots,
            ChordRole::Third => &self.thirds,
            ChordRole::Fifth => &self.fifths,
        }
    }

    /// Which member of the chord `pitch` is, if any.
    pub fn role_of(&self, pitch: Pitch) -> Option<ChordRole> {
        [ChordRole::Root, ChordRole::Third, ChordRole::Fifth]
            .into_iter()
            .find(|&role| self.role_pool(role).contains(&pitch))
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        self.role_of(pitch).is_some()
    }

    /// Two chords are the same harmony if root and quality match. Function,
    /// scale, and inversion depend on context and are ignored.
    pub fn same_harmony(&self, other: &Chord) -> bool {
        self.root == other.root && self.quality == other.quality
    }

    /// Chord tones within `range`, endpoints included.
    pub fn notes_in_range(&self, range: Range) -> &[Pitch] {
        notes_in_range(range, &self.pool)
    }

    pub fn roots_in_range(&self, range: Range) -> &[Pitch] {
        notes_in_range(range, &self.roots)
    }

    /// Candidate bass notes within `range`, honoring the inversion.
    pub fn bass_notes_in_range(&self, range: Range) -> Vec<Pitch> {
        match self.inversion {
            Inversion::Unset => merge_sorted(
                notes_in_range(range, &self.roots),
                notes_in_range(range, &self.thirds),
            ),
            Inversion::Root => notes_in_range(range, &self.roots).to_vec(),
            Inversion::First => notes_in_range(range, &self.thirds).to_vec(),
            Inversion::Second => notes_in_range(range, &self.fifths).to_vec(),
        }
    }

    /// First chord tone strictly above `pitch`.
    pub fn next_highest_tone(&self, pitch: Pitch) -> Result<Pitch, TheoryError> {
        self.pool
            .iter()
            .copied()
            .find(|&p| p > pitch)
            .ok_or(TheoryError::NoHigherTone(pitch))
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let quality = match self.quality {
            Quality::Major => "major",
            Quality::Minor => "minor",
            Quality::Augmented => "augmented",
            Quality::Diminished => "diminished",
        };
        write!(f, "{} {} ({:?})", self.root, quality, self.function)
    }
}

/// The contiguous run of `pool` inside `range`. `pool` must be ascending.
fn notes_in_range(range: Range, pool: &[Pitch]) -> &[Pitch] {
    let start = pool.iter().position(|&p| p >= range.low).unwrap_or(pool.len());
    let len = pool[start..].iter().take_while(|&&p| p <= range.high).count();
    &pool[start..start + len]
}

/// Every octave of `pc` inside the instrument range, ascending.
fn octaves_in_range(pc: PitchClass) -> Vec<Pitch> {
    let low = INSTRUMENT_RANGE.low;
    let lowest = low.offset((pc.index() as i16 - low.pitch_class().index() as i16).rem_euclid(OCTAVE));
    let count = (INSTRUMENT_RANGE.high.interval(low) + 1) / OCTAVE;
    (0..count).map(|octave| lowest.offset(octave * OCTAVE)).collect()
}

fn merge_sorted(a: &[Pitch], b: &[Pitch]) -> Vec<Pitch> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            merged.push(a[i]);
            i += 1;
        } else {
            merged.push(b[j]);
            j += 1;
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}
