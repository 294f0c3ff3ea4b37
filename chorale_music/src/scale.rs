// Diatonic scales: ordered pitch-class collections built from interval
// recipes.
//
// Each `ScaleRecipe` is a pure table of semitone offsets from the tonic, and
// `Scale::new` is the one builder that turns a recipe plus a tonic into the
// ordered degree list. The 9-entry minor composite (natural minor with both
// raised 6th and 7th added) is only used by minor keys to list every pitch
// class their chords draw on.
//
// The scale queries are the ones the embellishment pass needs:
// - diatonic neighbors above/below an arbitrary pitch (chromatic walk)
// - the passing tone between two pitches a third apart
//
// Used by chord.rs (every chord carries the scale it was built in) and
// beat.rs (embellishments are drawn from the previous beat's scale).

use serde::{Deserialize, Serialize};

use crate::error::TheoryError;
use crate::pitch::{OCTAVE, Pitch, PitchClass};

/// The closed set of scale shapes the keys use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScaleRecipe {
    /// 1 2 3 4 5 6 7
    Major,
    /// 1 2 b3 4 5 b6 b7
    NaturalMinor,
    /// 1 2 b3 4 5 6 7 (ascending form)
    MelodicMinor,
    /// 1 2 b3 4 5 b6 6 b7 7: natural minor plus the raised 6th and 7th.
    MinorComposite,
}

impl ScaleRecipe {
    /// Semitone offsets from the tonic, ascending, one per scale entry.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleRecipe::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleRecipe::NaturalMinor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleRecipe::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleRecipe::MinorComposite => &[0, 2, 3, 5, 7, 8, 9, 10, 11],
        }
    }
}

/// An ordered set of distinct pitch classes rooted on a tonic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scale {
    recipe: ScaleRecipe,
    degrees: Vec<PitchClass>,
}

impl Scale {
    pub fn new(recipe: ScaleRecipe, tonic: PitchClass) -> Self {
        let degrees = recipe
            .intervals()
            .iter()
            .map(|&iv| tonic.transpose(iv as i16))
            .collect();
        Scale { recipe, degrees }
    }

    pub fn major(tonic: PitchClass) -> Self {
        Scale::new(ScaleRecipe::Major, tonic)
    }

    pub fn natural_minor(tonic: PitchClass) -> Self {
        Scale::new(ScaleRecipe::NaturalMinor, tonic)
    }

    pub fn melodic_minor(tonic: PitchClass) -> Self {
        Scale::new(ScaleRecipe::MelodicMinor, tonic)
    }

    pub fn recipe(&self) -> ScaleRecipe {
        self.recipe
    }

    pub fn tonic(&self) -> PitchClass {
        self.degrees[0]
    }

    pub fn degrees(&self) -> &[PitchClass] {
        &self.degrees
    }

    pub fn contains(&self, pc: PitchClass) -> bool {
        self.degrees.contains(&pc)
    }

    /// Index of the pitch's class in the degree list, or None if chromatic.
    pub fn degree_of(&self, pitch: Pitch) -> Option<usize> {
        let pc = pitch.pitch_class();
        self.degrees.iter().position(|&d| d == pc)
    }

    /// Nearest scale member strictly above `pitch`.
    ///
    /// Walks up one semitone at a time; the query pitch itself need not be
    /// in the scale. Terminates within an octave because the walk reaches
    /// every pitch class.
    pub fn neighbor_above(&self, pitch: Pitch) -> Pitch {
        self.walk(pitch, 1)
    }

    /// Nearest scale member strictly below `pitch`.
    pub fn neighbor_below(&self, pitch: Pitch) -> Pitch {
        self.walk(pitch, -1)
    }

    fn walk(&self, pitch: Pitch, step: i16) -> Pitch {
        (1..=OCTAVE)
            .map(|n| pitch.offset(n * step))
            .find(|p| self.contains(p.pitch_class()))
            .unwrap_or(pitch)
    }

    /// The scale tone between two pitches exactly two degrees apart.
    ///
    /// Degrees are indexed from the tonic and never wrap, so a third that
    /// straddles the tonic (A up to C in C major) has no passing tone. Fails
    /// if either pitch is chromatic to the scale.
    pub fn passing_tone(&self, low: Pitch, high: Pitch) -> Result<Pitch, TheoryError> {
        let low_degree = self.degree_of(low).ok_or(TheoryError::NotInScale(low))?;
        let high_degree = self.degree_of(high).ok_or(TheoryError::NotInScale(high))?;
        if high_degree.checked_sub(low_degree) != Some(2)
            || high <= low
            || high.interval(low) >= OCTAVE
        {
            return Err(TheoryError::NoPassingTone { low, high });
        }
        Ok(self.neighbor_above(low))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(midi: u8) -> Pitch {
        Pitch::new(midi)
    }

    #[test]
    fn test_recipes_have_distinct_ascending_entries() {
        for recipe in [
            ScaleRecipe::Major,
            ScaleRecipe::NaturalMinor,
            ScaleRecipe::MelodicMinor,
            ScaleRecipe::MinorComposite,
        ] {
            let ivs = recipe.intervals();
            assert_eq!(ivs[0], 0, "{recipe:?} must start on the tonic");
            assert!(ivs.windows(2).all(|w| w[0] < w[1]), "{recipe:?} not ascending");
            assert!(ivs.iter().all(|&iv| iv < 12));
        }
        assert_eq!(ScaleRecipe::MinorComposite.intervals().len(), 9);
    }

    #[test]
    fn test_g_major_degrees() {
        let scale = Scale::major(PitchClass::G);
        assert_eq!(
            scale.degrees(),
            &[
                PitchClass::G,
                PitchClass::A,
                PitchClass::B,
                PitchClass::C,
                PitchClass::D,
                PitchClass::E,
                PitchClass::FSharp,
            ]
        );
        assert!(scale.contains(PitchClass::FSharp));
        assert!(!scale.contains(PitchClass::F));
    }

    #[test]
    fn test_neighbors_in_c_major() {
        let scale = Scale::major(PitchClass::C);
        assert_eq!(scale.neighbor_above(p(60)), p(62));
        assert_eq!(scale.neighbor_below(p(60)), p(59));
        // E up to F is a half step.
        assert_eq!(scale.neighbor_above(p(64)), p(65));
        // A chromatic query pitch walks to the nearest member.
        assert_eq!(scale.neighbor_above(p(61)), p(62));
        assert_eq!(scale.neighbor_below(p(61)), p(60));
    }

    #[test]
    fn test_passing_tone_major() {
        let scale = Scale::major(PitchClass::C);
        assert_eq!(scale.passing_tone(p(60), p(64)), Ok(p(62)));
    }

    #[test]
    fn test_passing_tone_rejects_a_second() {
        let scale = Scale::major(PitchClass::C);
        assert_eq!(
            scale.passing_tone(p(60), p(62)),
            Err(TheoryError::NoPassingTone { low: p(60), high: p(62) })
        );
    }

    #[test]
    fn test_passing_tone_melodic_minor() {
        let scale = Scale::melodic_minor(PitchClass::C);
        assert_eq!(scale.passing_tone(p(60), p(63)), Ok(p(62)));
        assert_eq!(scale.passing_tone(p(67), p(71)), Ok(p(69)));
    }

    #[test]
    fn test_passing_tone_rejects_a_third_across_the_tonic() {
        let scale = Scale::major(PitchClass::C);
        // A3 up to C4.
        assert_eq!(
            scale.passing_tone(p(57), p(60)),
            Err(TheoryError::NoPassingTone { low: p(57), high: p(60) })
        );
        // B3 up to D4.
        assert_eq!(
            scale.passing_tone(p(59), p(62)),
            Err(TheoryError::NoPassingTone { low: p(59), high: p(62) })
        );
    }

    #[test]
    fn test_passing_tone_chromatic_endpoint() {
        let scale = Scale::major(PitchClass::C);
        assert_eq!(scale.passing_tone(p(61), p(64)), Err(TheoryError::NotInScale(p(61))));
    }
}
