// Keys: a fixed catalog of chords bucketed by harmonic function.
//
// Major and minor keys differ only in data. Each `Mode` maps to a static
// `KeyRecipe` table (which scale degrees carry which triads, in which scale,
// and where the secondary dominants resolve), and `Key::new` is the single
// builder that turns a recipe plus a tonic into concrete chords.
//
// Major key:  I | ii IV vi | V vii° | resolves to I or vi | V/ii V/V V/vi
// Minor key:  i | ii° iv v VI VII | V vii° | resolves to i, VI, or the
//             Picardy I | V/iv V/V V/VII
//
// Degree numbers in the tables index the key's own degree list: the seven
// major degrees, or the nine-entry minor composite (natural minor plus the
// raised 6th and 7th).
//
// Modulation targets are built on demand rather than stored, because each
// target key would in turn own its own targets.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chord::{Chord, HarmonicFunction, Quality};
use crate::pitch::PitchClass;
use crate::scale::{Scale, ScaleRecipe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl Mode {
    fn recipe(self) -> &'static KeyRecipe {
        match self {
            Mode::Major => &MAJOR_KEY,
            Mode::Minor => &MINOR_KEY,
        }
    }
}

// ── Recipe tables ──

/// A diatonic triad on one of the key's degrees, using a scale rooted on
/// the key's tonic.
struct ChordRecipe {
    degree: usize,
    quality: Quality,
    function: HarmonicFunction,
    scale: ScaleRecipe,
}

/// Where a dominant may resolve.
enum ResolutionRecipe {
    Tonic,
    Subdominant(usize),
    /// A chord that appears only as a resolution.
    Extra(ChordRecipe),
}

enum Target {
    Subdominant(usize),
    Dominant(usize),
}

/// A major triad on `degree` whose embellishments use `scale` rooted on
/// `scale_degree`, resolving to `target`.
struct SecondaryRecipe {
    degree: usize,
    scale: ScaleRecipe,
    scale_degree: usize,
    target: Target,
}

struct KeyRecipe {
    degrees: ScaleRecipe,
    tonic: ChordRecipe,
    subdominant: &'static [ChordRecipe],
    dominant: &'static [ChordRecipe],
    resolution: &'static [ResolutionRecipe],
    secondary: &'static [SecondaryRecipe],
    /// Subdominant side, dominant side, relative key.
    modulations: &'static [(Mode, usize)],
}

const fn triad(
    degree: usize,
    quality: Quality,
    function: HarmonicFunction,
    scale: ScaleRecipe,
) -> ChordRecipe {
    ChordRecipe {
        degree,
        quality,
        function,
        scale,
    }
}

use HarmonicFunction::{Dominant, Subdominant, Tonic};
use Quality::{Diminished, Major, Minor};

static MAJOR_KEY: KeyRecipe = KeyRecipe {
    degrees: ScaleRecipe::Major,
    tonic: triad(0, Major, Tonic, ScaleRecipe::Major),
    subdominant: &[
        triad(1, Minor, Subdominant, ScaleRecipe::Major), // ii
        triad(3, Major, Subdominant, ScaleRecipe::Major), // IV
        triad(5, Minor, Subdominant, ScaleRecipe::Major), // vi
    ],
    dominant: &[
        triad(4, Major, Dominant, ScaleRecipe::Major),      // V
        triad(6, Diminished, Dominant, ScaleRecipe::Major), // vii°
    ],
    resolution: &[
        ResolutionRecipe::Tonic,
        ResolutionRecipe::Subdominant(2), // deceptive
    ],
    secondary: &[
        // V/ii
        SecondaryRecipe {
            degree: 5,
            scale: ScaleRecipe::MelodicMinor,
            scale_degree: 1,
            target: Target::Subdominant(0),
        },
        // V/V
        SecondaryRecipe {
            degree: 1,
            scale: ScaleRecipe::Major,
            scale_degree: 4,
            target: Target::Dominant(0),
        },
        // V/vi
        SecondaryRecipe {
            degree: 2,
            scale: ScaleRecipe::MelodicMinor,
            scale_degree: 5,
            target: Target::Subdominant(2),
        },
    ],
    modulations: &[(Mode::Major, 3), (Mode::Major, 4), (Mode::Minor, 5)],
};

static MINOR_KEY: KeyRecipe = KeyRecipe {
    degrees: ScaleRecipe::MinorComposite,
    tonic: triad(0, Minor, Tonic, ScaleRecipe::MelodicMinor),
    subdominant: &[
        triad(1, Diminished, Subdominant, ScaleRecipe::NaturalMinor), // ii°
        triad(3, Minor, Subdominant, ScaleRecipe::NaturalMinor),      // iv
        triad(4, Minor, Subdominant, ScaleRecipe::NaturalMinor),      // v
        triad(5, Major, Subdominant, ScaleRecipe::NaturalMinor),      // VI
        triad(7, Major, Subdominant, ScaleRecipe::NaturalMinor),      // VII
    ],
    dominant: &[
        triad(4, Major, Dominant, ScaleRecipe::MelodicMinor),      // V
        triad(8, Diminished, Dominant, ScaleRecipe::MelodicMinor), // vii°
    ],
    resolution: &[
        ResolutionRecipe::Tonic,
        ResolutionRecipe::Subdominant(3), // deceptive
        ResolutionRecipe::Extra(triad(0, Major, Tonic, ScaleRecipe::Major)), // Picardy third
    ],
    secondary: &[
        // V/iv
        SecondaryRecipe {
            degree: 0,
            scale: ScaleRecipe::MelodicMinor,
            scale_degree: 3,
            target: Target::Subdominant(1),
        },
        // V/V
        SecondaryRecipe {
            degree: 1,
            scale: ScaleRecipe::Major,
            scale_degree: 4,
            target: Target::Dominant(0),
        },
        // V/VII
        SecondaryRecipe {
            degree: 3,
            scale: ScaleRecipe::Major,
            scale_degree: 7,
            target: Target::Subdominant(4),
        },
    ],
    modulations: &[(Mode::Minor, 3), (Mode::Minor, 4), (Mode::Major, 2)],
};

// ── Key ──

#[derive(Debug, Clone, Serialize)]
pub struct Key {
    mode: Mode,
    degrees: Scale,
    tonic: Chord,
    subdominant: Vec<Chord>,
    dominant: Vec<Chord>,
    resolution: Vec<Chord>,
    secondary_dominant: Vec<Chord>,
}

impl Key {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        let recipe = mode.recipe();
        let degrees = Scale::new(recipe.degrees, tonic);
        let build = |r: &ChordRecipe| {
            Chord::new(
                degrees.degrees()[r.degree],
                r.quality,
                r.function,
                Scale::new(r.scale, tonic),
            )
        };

        let tonic_chord = build(&recipe.tonic);
        let subdominant: Vec<Chord> = recipe.subdominant.iter().map(build).collect();
        let dominant: Vec<Chord> = recipe.dominant.iter().map(build).collect();
        let resolution = recipe
            .resolution
            .iter()
            .map(|r| match r {
                ResolutionRecipe::Tonic => tonic_chord.clone(),
                ResolutionRecipe::Subdominant(i) => subdominant[*i].clone(),
                ResolutionRecipe::Extra(extra) => build(extra),
            })
            .collect();
        let secondary_dominant = recipe
            .secondary
            .iter()
            .map(|s| {
                let target = match s.target {
                    Target::Subdominant(i) => subdominant[i].clone(),
                    Target::Dominant(i) => dominant[i].clone(),
                };
                Chord::secondary_dominant(
                    degrees.degrees()[s.degree],
                    Scale::new(s.scale, degrees.degrees()[s.scale_degree]),
                    target,
                )
            })
            .collect();

        Key {
            mode,
            degrees,
            tonic: tonic_chord,
            subdominant,
            dominant,
            resolution,
            secondary_dominant,
        }
    }

    pub fn major(tonic: PitchClass) -> Self {
        Key::new(tonic, Mode::Major)
    }

    pub fn minor(tonic: PitchClass) -> Self {
        Key::new(tonic, Mode::Minor)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn tonic_pitch(&self) -> PitchClass {
        self.degrees.tonic()
    }

    pub fn tonic(&self) -> &Chord {
        &self.tonic
    }

    /// Every pitch class the key's chords are drawn from.
    pub fn degrees(&self) -> &[PitchClass] {
        self.degrees.degrees()
    }

    /// The chords filling `function`. Tonic is a single-element slice.
    pub fn chords(&self, function: HarmonicFunction) -> &[Chord] {
        match function {
            HarmonicFunction::Tonic => std::slice::from_ref(&self.tonic),
            HarmonicFunction::Subdominant => &self.subdominant,
            HarmonicFunction::Dominant => &self.dominant,
            HarmonicFunction::SecondaryDominant => &self.secondary_dominant,
            HarmonicFunction::Resolution => &self.resolution,
        }
    }

    /// True if `chord` matches the tonic or a subdominant or dominant entry
    /// by root and quality.
    pub fn contains_chord(&self, chord: &Chord) -> bool {
        std::iter::once(&self.tonic)
            .chain(&self.subdominant)
            .chain(&self.dominant)
            .any(|c| c.same_harmony(chord))
    }

    /// Keys this one may modulate to.
    pub fn modulations(&self) -> Vec<Key> {
        self.mode
            .recipe()
            .modulations
            .iter()
            .map(|&(mode, degree)| Key::new(self.degrees()[degree], mode))
            .collect()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.mode == other.mode && self.tonic_pitch() == other.tonic_pitch()
    }
}

impl Eq for Key {}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self.mode {
            Mode::Major => "major",
            Mode::Minor => "minor",
        };
        write!(f, "{} {}", self.tonic_pitch(), mode)
    }
}
