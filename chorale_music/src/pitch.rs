// Pitches, pitch classes, and ranges: the value types the rest of the
// engine is built on.
//
// A `Pitch` is an absolute chromatic position stored as a MIDI note number,
// so the rendering side can emit it unchanged. A `PitchClass` is the pitch
// modulo the octave, named with sharps (the twelve names the CLI accepts).
// A `Range` is an inclusive low..=high band; voice ranges and the global
// instrument range are both expressed with it.
//
// Intervals are plain signed semitone counts (`i16`), the same convention
// the counterpoint rules and the scale walks use.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::InputError;

/// Semitones per octave.
pub const OCTAVE: i16 = 12;

/// The band every chord pool is exploded into: G2 (43) through F#5 (78).
///
/// The width is a whole number of octaves, so each chord role gets the same
/// number of occurrences.
pub const INSTRUMENT_RANGE: Range = Range::new(Pitch::new(43), Pitch::new(78));

/// One of the twelve chromatic pitch classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PitchClass {
    C = 0,
    CSharp = 1,
    D = 2,
    DSharp = 3,
    E = 4,
    F = 5,
    FSharp = 6,
    G = 7,
    GSharp = 8,
    A = 9,
    ASharp = 10,
    B = 11,
}

impl PitchClass {
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::CSharp,
        PitchClass::D,
        PitchClass::DSharp,
        PitchClass::E,
        PitchClass::F,
        PitchClass::FSharp,
        PitchClass::G,
        PitchClass::GSharp,
        PitchClass::A,
        PitchClass::ASharp,
        PitchClass::B,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Pitch class for any integer, wrapping negatives into 0-11.
    pub fn from_index(index: i16) -> Self {
        Self::ALL[index.rem_euclid(OCTAVE) as usize]
    }

    /// The pitch class `semitones` above (or below, if negative) this one.
    pub fn transpose(self, semitones: i16) -> Self {
        Self::from_index(self.index() as i16 + semitones)
    }

    pub fn name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::CSharp => "C#",
            PitchClass::D => "D",
            PitchClass::DSharp => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::FSharp => "F#",
            PitchClass::G => "G",
            PitchClass::GSharp => "G#",
            PitchClass::A => "A",
            PitchClass::ASharp => "A#",
            PitchClass::B => "B",
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PitchClass {
    type Err = InputError;

    /// Accepts a letter A-G (either case) optionally followed by `#`, `s`,
    /// `sharp`, `b`, or `flat`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        let natural = match chars.next().map(|c| c.to_ascii_uppercase()) {
            Some('C') => 0,
            Some('D') => 2,
            Some('E') => 4,
            Some('F') => 5,
            Some('G') => 7,
            Some('A') => 9,
            Some('B') => 11,
            _ => return Err(InputError::UnknownPitch(s.to_string())),
        };
        let accidental = match chars.as_str().to_ascii_lowercase().as_str() {
            "" => 0,
            "#" | "s" | "sharp" => 1,
            "b" | "flat" => -1,
            _ => return Err(InputError::UnknownPitch(s.to_string())),
        };
        Ok(PitchClass::from_index(natural + accidental))
    }
}

/// An absolute pitch, stored as a MIDI note number.
///
/// Equality and ordering are by note number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pitch(u8);

impl Pitch {
    pub const fn new(midi: u8) -> Self {
        Pitch(midi)
    }

    pub fn midi(self) -> u8 {
        self.0
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::from_index(self.0 as i16)
    }

    /// Scientific-pitch octave number (middle C, 60, is octave 4).
    pub fn octave(self) -> i8 {
        (self.0 / 12) as i8 - 1
    }

    /// Signed distance in semitones from `other` to `self`.
    /// Positive means `self` is higher.
    pub fn interval(self, other: Pitch) -> i16 {
        self.0 as i16 - other.0 as i16
    }

    /// Unsigned semitone distance between the two pitches.
    pub fn distance(self, other: Pitch) -> u8 {
        self.interval(other).unsigned_abs() as u8
    }

    /// The pitch `semitones` away, clamped to the MIDI range 0-127.
    pub fn offset(self, semitones: i16) -> Pitch {
        Pitch((self.0 as i16 + semitones).clamp(0, 127) as u8)
    }

    /// Compact note name such as "C4" or "F#3".
    pub fn name(self) -> String {
        format!("{}{}", self.pitch_class(), self.octave())
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

/// Inclusive pitch band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub low: Pitch,
    pub high: Pitch,
}

impl Range {
    pub const fn new(low: Pitch, high: Pitch) -> Self {
        Range { low, high }
    }

    /// True if `pitch` lies within the band, endpoints included.
    pub fn contains(&self, pitch: Pitch) -> bool {
        self.low <= pitch && pitch <= self.high
    }

    /// A corridor whose bounds crossed holds no pitches at all.
    pub fn is_empty(&self) -> bool {
        self.low > self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_and_octave() {
        let middle_c = Pitch::new(60);
        assert_eq!(middle_c.pitch_class(), PitchClass::C);
        assert_eq!(middle_c.octave(), 4);
        assert_eq!(Pitch::new(43).pitch_class(), PitchClass::G);
        assert_eq!(Pitch::new(43).name(), "G2");
        assert_eq!(Pitch::new(78).to_string(), "F#5");
    }

    #[test]
    fn test_interval_is_signed() {
        let c4 = Pitch::new(60);
        let g4 = Pitch::new(67);
        assert_eq!(g4.interval(c4), 7);
        assert_eq!(c4.interval(g4), -7);
        assert_eq!(c4.distance(g4), 7);
    }

    #[test]
    fn test_offset_clamps_to_midi() {
        assert_eq!(Pitch::new(60).offset(-12), Pitch::new(48));
        assert_eq!(Pitch::new(5).offset(-12), Pitch::new(0));
        assert_eq!(Pitch::new(120).offset(12), Pitch::new(127));
    }

    #[test]
    fn test_pitch_class_transpose_wraps() {
        assert_eq!(PitchClass::A.transpose(3), PitchClass::C);
        assert_eq!(PitchClass::C.transpose(-1), PitchClass::B);
        assert_eq!(PitchClass::from_index(-13), PitchClass::B);
    }

    #[test]
    fn test_parse_pitch_names() {
        assert_eq!("C".parse::<PitchClass>().unwrap(), PitchClass::C);
        assert_eq!("f#".parse::<PitchClass>().unwrap(), PitchClass::FSharp);
        assert_eq!("Bb".parse::<PitchClass>().unwrap(), PitchClass::ASharp);
        assert_eq!("Cb".parse::<PitchClass>().unwrap(), PitchClass::B);
        assert_eq!("Gsharp".parse::<PitchClass>().unwrap(), PitchClass::GSharp);
        assert!("H".parse::<PitchClass>().is_err());
        assert!("C##".parse::<PitchClass>().is_err());
        assert!("".parse::<PitchClass>().is_err());
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = Range::new(Pitch::new(43), Pitch::new(57));
        assert!(range.contains(Pitch::new(43)));
        assert!(range.contains(Pitch::new(57)));
        assert!(!range.contains(Pitch::new(58)));
        assert!(!range.is_empty());
        assert!(Range::new(Pitch::new(60), Pitch::new(59)).is_empty());
    }
}
