// The four chorale voices and their fixed ranges.
//
// Voices are ordered bottom-up (bass first) because the beat search fills
// them in ascending register order: each voice's corridor is bounded below
// by the pitch the voice beneath it just took. Adjacent ranges overlap at
// the edges, so neighboring voices may share a pitch region.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pitch::{Pitch, Range};

/// Number of voices in every beat.
pub const NUM_VOICES: usize = 4;

/// Voice index in ascending register order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Voice {
    Bass = 0,
    Tenor = 1,
    Alto = 2,
    Soprano = 3,
}

impl Voice {
    pub const ALL: [Voice; NUM_VOICES] = [Voice::Bass, Voice::Tenor, Voice::Alto, Voice::Soprano];

    pub fn index(self) -> usize {
        self as usize
    }

    /// The voice directly beneath this one, if any.
    pub fn below(self) -> Option<Voice> {
        match self {
            Voice::Bass => None,
            Voice::Tenor => Some(Voice::Bass),
            Voice::Alto => Some(Voice::Tenor),
            Voice::Soprano => Some(Voice::Alto),
        }
    }

    /// Playable band for the voice. These are hard limits for the search.
    pub fn range(self) -> Range {
        match self {
            Voice::Bass => Range::new(Pitch::new(43), Pitch::new(57)), // G2-A3
            Voice::Tenor => Range::new(Pitch::new(52), Pitch::new(63)), // E3-D#4
            Voice::Alto => Range::new(Pitch::new(58), Pitch::new(72)), // A#3-C5
            Voice::Soprano => Range::new(Pitch::new(64), Pitch::new(78)), // E4-F#5
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Voice::Bass => "Bass",
            Voice::Tenor => "Tenor",
            Voice::Alto => "Alto",
            Voice::Soprano => "Soprano",
        }
    }
}

impl fmt::Display for Voice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
