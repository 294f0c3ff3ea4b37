// The song: an append-only beat log plus the progression state.
//
// `Song::generate` adds beats until the song may end: a phrase has just
// finished, its last chord is a tonic, and the requested minimum length has
// been reached. Each beat is added in two steps:
//
// 1. `progression::next_chord` proposes a chord and the key state that
//    choosing it would produce.
// 2. `Beat::generate` tries to voice it against the last beat.
//
// If the voicing fails the proposal is thrown away (key state included) and
// a new chord is drawn. On success the proposed key state is committed, the
// beat's embellishments are written into the previous beat's second half,
// and the beat is appended. Nothing else ever modifies a stored beat.
//
// The song owns its RNG, so a fixed seed reproduces the whole piece.

use chorale_prng::ChoraleRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::beat::{Beat, GeneratedBeat};
use crate::chord::{Chord, HarmonicFunction, Quality};
use crate::config::EngineConfig;
use crate::error::{SearchError, SongError};
use crate::key::{Key, Mode};
use crate::pitch::PitchClass;
use crate::progression::{KeyState, PhrasePosition, next_chord};
use crate::voice::{NUM_VOICES, Voice};

/// The four parameters a song is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SongRequest {
    pub tonic: PitchClass,
    pub mode: Mode,
    pub tempo_bpm: u32,
    /// The song keeps going until at least this long.
    pub min_duration_secs: u32,
}

pub struct Song {
    request: SongRequest,
    config: EngineConfig,
    rng: ChoraleRng,
    beats: Vec<Beat>,
    keys: KeyState,
    beat_in_phrase: usize,
    /// Goes negative once the minimum length is passed.
    beats_until_end: i64,
}

/// Serializable view of a finished song.
#[derive(Debug, Serialize)]
pub struct Timeline<'a> {
    pub request: &'a SongRequest,
    pub final_key: String,
    pub beats: &'a [Beat],
}

impl Song {
    pub fn new(request: SongRequest, config: EngineConfig, rng: ChoraleRng) -> Result<Self, SongError> {
        if request.tempo_bpm == 0 {
            return Err(SongError::InvalidTempo(request.tempo_bpm));
        }
        let meter = config.meter;
        if meter.beats_per_measure == 0 || meter.measures_per_phrase == 0 {
            return Err(SongError::InvalidMeter {
                beats_per_measure: meter.beats_per_measure,
                measures_per_phrase: meter.measures_per_phrase,
            });
        }
        Ok(Song {
            request,
            config,
            rng,
            beats: Vec::new(),
            keys: KeyState::new(Key::new(request.tonic, request.mode)),
            beat_in_phrase: 0,
            beats_until_end: seconds_to_beats(request.min_duration_secs, request.tempo_bpm) as i64,
        })
    }

    /// Add beats until the song can end.
    pub fn generate(&mut self) -> Result<(), SongError> {
        loop {
            self.add_beat()?;
            if self.end_of_song() {
                break;
            }
        }
        info!(
            beats = self.beats.len(),
            seconds = self.duration_secs(),
            key = %self.keys.current(),
            "song complete"
        );
        Ok(())
    }

    /// Append one beat, redrawing the chord until one can be voiced.
    pub fn add_beat(&mut self) -> Result<(), SongError> {
        let slot = self.beats.len();
        let position = PhrasePosition {
            beat_in_phrase: self.beat_in_phrase,
            meter: self.config.meter,
        };
        for draw in 0..self.config.max_chord_draws {
            let previous = self.beats.last();
            let choice = next_chord(
                previous.map(Beat::chord),
                position,
                &self.keys,
                &self.config.progression,
                &mut self.rng,
            );
            match Beat::generate(&choice.chord, previous, &self.config.search, &mut self.rng) {
                Ok(generated) => {
                    if choice.keys.current() != self.keys.current() {
                        info!(beat = slot, key = %choice.keys.current(), "key change");
                    }
                    self.keys = choice.keys;
                    self.push(generated);
                    return Ok(());
                }
                Err(err) => debug!(beat = slot, draw, %err, "redrawing chord"),
            }
        }
        Err(SongError::SlotExhausted {
            beat: slot,
            draws: self.config.max_chord_draws,
        })
    }

    /// Append one beat voicing `chord`. The key state is left alone.
    pub fn add_beat_with(&mut self, chord: &Chord) -> Result<(), SearchError> {
        let generated = Beat::generate(chord, self.beats.last(), &self.config.search, &mut self.rng)?;
        self.push(generated);
        Ok(())
    }

    fn push(&mut self, generated: GeneratedBeat) {
        if let Some(previous) = self.beats.last_mut() {
            for embellishment in &generated.embellishments {
                previous.apply_embellishment(embellishment);
            }
        }
        self.beats.push(generated.beat);
        self.beat_in_phrase = (self.beat_in_phrase + 1) % self.config.meter.beats_per_phrase();
        self.beats_until_end -= 1;
        if self.beat_in_phrase == 0 {
            debug!(beats = self.beats.len(), "phrase complete");
        }
    }

    /// A phrase just ended on a tonic and the minimum length is met.
    pub fn end_of_song(&self) -> bool {
        let Some(last) = self.beats.last() else {
            return false;
        };
        self.beat_in_phrase == 0
            && last.chord().function() == HarmonicFunction::Tonic
            && self.beats_until_end <= 0
    }

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn voice_count(&self) -> usize {
        NUM_VOICES
    }

    pub fn tempo_bpm(&self) -> u32 {
        self.request.tempo_bpm
    }

    pub fn request(&self) -> &SongRequest {
        &self.request
    }

    pub fn current_key(&self) -> &Key {
        self.keys.current()
    }

    pub fn duration_secs(&self) -> f64 {
        self.beats.len() as f64 * 60.0 / self.request.tempo_bpm as f64
    }

    pub fn timeline(&self) -> Timeline<'_> {
        Timeline {
            request: &self.request,
            final_key: self.keys.current().to_string(),
            beats: &self.beats,
        }
    }

    /// Plain-text score: one row per voice, soprano on top, with bar lines.
    /// Beats whose halves differ print as `first/second`.
    pub fn summary(&self) -> String {
        let per_measure = self.config.meter.beats_per_measure;
        let start = Key::new(self.request.tonic, self.request.mode);
        let mut out = format!(
            "{} -> {}, {} BPM, {} beats ({:.1}s)\n",
            start,
            self.keys.current(),
            self.request.tempo_bpm,
            self.beats.len(),
            self.duration_secs()
        );

        let mut rows: Vec<(String, Vec<String>)> = Voice::ALL
            .iter()
            .rev()
            .map(|&voice| {
                let cells = self
                    .beats
                    .iter()
                    .map(|beat| {
                        let (a, b) = (beat.first_half()[voice.index()], beat.second_half()[voice.index()]);
                        if a == b { a.to_string() } else { format!("{a}/{b}") }
                    })
                    .collect();
                (voice.name().to_string(), cells)
            })
            .collect();
        rows.push((
            "Chord".to_string(),
            self.beats.iter().map(|beat| chord_symbol(beat.chord())).collect(),
        ));

        for (label, cells) in rows {
            out.push_str(&format!("{label:<8}|"));
            for (i, cell) in cells.iter().enumerate() {
                out.push_str(&format!(" {cell:<7}"));
                if (i + 1) % per_measure == 0 {
                    out.push('|');
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Whole beats covering `secs` at `bpm`, rounded up.
pub fn seconds_to_beats(secs: u32, bpm: u32) -> u64 {
    (secs as u64 * bpm as u64).div_ceil(60)
}

fn chord_symbol(chord: &Chord) -> String {
    let suffix = match chord.quality() {
        Quality::Major => "",
        Quality::Minor => "m",
        Quality::Augmented => "+",
        Quality::Diminished => "dim",
    };
    format!("{}{}", chord.root(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfig;
    use pretty_assertions::assert_eq;

    fn request(min_duration_secs: u32) -> SongRequest {
        SongRequest {
            tonic: PitchClass::C,
            mode: Mode::Major,
            tempo_bpm: 120,
            min_duration_secs,
        }
    }

    fn song(min_duration_secs: u32, seed: u64) -> Song {
        Song::new(request(min_duration_secs), EngineConfig::default(), ChoraleRng::new(seed)).unwrap()
    }

    #[test]
    fn test_seconds_to_beats_rounds_up() {
        assert_eq!(seconds_to_beats(30, 90), 45);
        assert_eq!(seconds_to_beats(0, 90), 0);
        assert_eq!(seconds_to_beats(1, 100), 2);
        assert_eq!(seconds_to_beats(60, 60), 60);
    }

    #[test]
    fn test_rejects_zero_tempo() {
        let mut req = request(0);
        req.tempo_bpm = 0;
        let err = Song::new(req, EngineConfig::default(), ChoraleRng::new(0)).err();
        assert_eq!(err, Some(SongError::InvalidTempo(0)));
    }

    #[test]
    fn test_rejects_empty_meter() {
        let mut config = EngineConfig::default();
        config.meter.measures_per_phrase = 0;
        let err = Song::new(request(0), config, ChoraleRng::new(0)).err();
        assert_eq!(
            err,
            Some(SongError::InvalidMeter {
                beats_per_measure: 4,
                measures_per_phrase: 0
            })
        );
    }

    #[test]
    fn test_empty_song_cannot_end() {
        assert!(!song(0, 1).end_of_song());
    }

    #[test]
    fn test_short_song_ends_at_first_tonic_phrase_end() {
        for seed in 0..10 {
            let mut song = song(0, seed);
            song.generate().unwrap();
            let beats = song.beats();
            assert_eq!(beats.len() % 16, 0, "seed {seed}");
            assert_eq!(beats[0].chord().function(), HarmonicFunction::Tonic);
            assert_eq!(beats[beats.len() - 1].chord().function(), HarmonicFunction::Tonic);
            for boundary in (16..beats.len()).step_by(16) {
                assert_ne!(
                    beats[boundary - 1].chord().function(),
                    HarmonicFunction::Tonic,
                    "seed {seed}: could have ended at beat {boundary}"
                );
            }
        }
    }

    #[test]
    fn test_minimum_length_is_respected() {
        let mut song = song(20, 4);
        song.generate().unwrap();
        assert!(song.beats().len() >= 40);
        assert!(song.duration_secs() >= 20.0);
    }

    #[test]
    fn test_longer_minimum_extends_the_same_song() {
        let mut short = song(0, 21);
        short.generate().unwrap();
        let mut long = song(30, 21);
        long.generate().unwrap();
        assert!(long.beats().len() >= short.beats().len());
        for (a, b) in short.beats().iter().zip(long.beats()) {
            assert_eq!(a.chord_tones(), b.chord_tones());
        }
    }

    #[test]
    fn test_embellishments_land_in_previous_beats() {
        let mut song = song(60, 5);
        song.generate().unwrap();
        let mut embellished = 0;
        for beat in song.beats() {
            assert_eq!(beat.first_half(), beat.chord_tones());
            let off_chord = beat
                .second_half()
                .iter()
                .any(|&p| !beat.chord().contains(p));
            if off_chord {
                assert!(beat.has_non_chord_tone());
            }
            if beat.second_half() != beat.chord_tones() {
                embellished += 1;
            }
        }
        assert!(embellished > 0, "a minute of music had no embellishments");
        // The last beat has no successor to embellish it.
        let last = &song.beats()[song.beats().len() - 1];
        assert_eq!(last.second_half(), last.chord_tones());
    }

    #[test]
    fn test_exhausted_slot_leaves_song_untouched() {
        let config = EngineConfig {
            search: SearchConfig {
                max_beat_attempts: 0,
                ..SearchConfig::default()
            },
            max_chord_draws: 5,
            ..EngineConfig::default()
        };
        let mut song = Song::new(request(0), config, ChoraleRng::new(2)).unwrap();
        song.add_beat().unwrap();
        let err = song.add_beat().unwrap_err();
        assert_eq!(err, SongError::SlotExhausted { beat: 1, draws: 5 });
        assert_eq!(song.beats().len(), 1);
        assert_eq!(song.current_key(), &Key::major(PitchClass::C));
    }

    #[test]
    fn test_add_beat_with_explicit_chord() {
        let mut song = song(0, 6);
        let key = Key::major(PitchClass::C);
        song.add_beat_with(key.tonic()).unwrap();
        let dominant = &key.chords(HarmonicFunction::Dominant)[0];
        let mut added = 0;
        for _ in 0..5 {
            if song.add_beat_with(dominant).is_ok() {
                added += 1;
            }
        }
        assert_eq!(song.beats().len(), 1 + added);
        assert!(song.beats()[1..].iter().all(|b| b.chord().same_harmony(dominant)));
    }

    #[test]
    fn test_summary_has_a_row_per_voice() {
        let mut song = song(0, 7);
        song.generate().unwrap();
        let summary = song.summary();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 1 + NUM_VOICES + 1);
        assert!(lines[0].starts_with("C major"));
        assert!(lines[0].ends_with("120 BPM, 16 beats (8.0s)"), "{}", lines[0]);
        assert!(lines[1].starts_with("Soprano"));
        assert!(lines[4].starts_with("Bass"));
        assert!(lines[5].starts_with("Chord"));
        assert_eq!(lines[1].matches('|').count(), 1 + song.beats().len() / 4);
    }

    #[test]
    fn test_timeline_serializes() {
        let mut song = song(0, 8);
        song.generate().unwrap();
        let json = serde_json::to_value(song.timeline()).unwrap();
        assert_eq!(json["beats"].as_array().map(Vec::len), Some(song.beats().len()));
        assert_eq!(json["request"]["tempo_bpm"], 120);
    }
}
