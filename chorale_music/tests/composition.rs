// End-to-end properties of generated songs: termination, length, voice
// spacing, reproducibility, and MIDI output.

use chorale_music::chord::HarmonicFunction;
use chorale_music::config::EngineConfig;
use chorale_music::key::Mode;
use chorale_music::midi::{song_to_smf, write_midi};
use chorale_music::pitch::{Pitch, PitchClass};
use chorale_music::rules::{chord_tone_coverage, no_parallel_fifths, valid_leap};
use chorale_music::song::{Song, SongRequest};
use chorale_music::voice::{NUM_VOICES, Voice};
use chorale_prng::ChoraleRng;
use pretty_assertions::assert_eq;

fn compose(tonic: PitchClass, mode: Mode, min_duration_secs: u32, seed: u64) -> Song {
    let request = SongRequest {
        tonic,
        mode,
        tempo_bpm: 100,
        min_duration_secs,
    };
    let mut song = Song::new(request, EngineConfig::default(), ChoraleRng::new(seed)).unwrap();
    song.generate().unwrap();
    song
}

#[test]
fn zero_length_song_is_one_phrase_ending_on_tonic() {
    for seed in 0..5 {
        for mode in [Mode::Major, Mode::Minor] {
            let song = compose(PitchClass::G, mode, 0, seed);
            assert_eq!(song.beats().len(), 16, "seed {seed} {mode:?}");
            let last = &song.beats()[15];
            assert_eq!(last.chord().function(), HarmonicFunction::Tonic);
            assert!(song.end_of_song());
        }
    }
}

#[test]
fn longer_minimum_never_shortens_the_song() {
    for seed in 0..4 {
        let lengths: Vec<usize> = [0, 15, 30, 45]
            .into_iter()
            .map(|secs| compose(PitchClass::D, Mode::Major, secs, seed).beats().len())
            .collect();
        assert!(lengths.windows(2).all(|w| w[0] <= w[1]), "seed {seed}: {lengths:?}");
        // 45 seconds at 100 BPM is 75 beats.
        assert!(lengths[3] >= 75);
        assert_eq!(lengths[3] % 16, 0);
    }
}

fn assert_spaced(pitches: &[Pitch; NUM_VOICES], beat: usize) {
    for pair in pitches.windows(2) {
        let gap = pair[1].interval(pair[0]);
        assert!((1..=12).contains(&gap), "beat {beat}: {pair:?} in {pitches:?}");
    }
    for voice in Voice::ALL {
        assert!(voice.range().contains(pitches[voice.index()]), "beat {beat}: {voice} in {pitches:?}");
    }
}

#[test]
fn every_beat_is_spaced_and_voiced_legally() {
    let cases = [
        (PitchClass::E, Mode::Major, 1),
        (PitchClass::E, Mode::Minor, 2),
        (PitchClass::E, Mode::Minor, 3),
        (PitchClass::C, Mode::Major, 0),
        (PitchClass::F, Mode::Major, 4),
        (PitchClass::A, Mode::Minor, 6),
    ];
    for (tonic, mode, seed) in cases {
        let song = compose(tonic, mode, 40, seed);
        let beats = song.beats();
        for (i, beat) in beats.iter().enumerate() {
            let tones = beat.chord_tones();
            for sounding in [tones, beat.first_half(), beat.second_half()] {
                assert_spaced(sounding, i);
            }
            assert!(tones.iter().all(|&t| beat.chord().contains(t)));
            if i == 0 {
                continue;
            }
            let prev = beats[i - 1].chord_tones();
            assert!(chord_tone_coverage(tones, beat.chord()), "beat {i}");
            assert!(no_parallel_fifths(tones, prev), "beat {i}");
            for v in 0..NUM_VOICES {
                assert!(valid_leap(tones[v], prev[v], false), "beat {i} voice {v}");
            }
        }
    }
}

#[test]
fn same_seed_same_song() {
    let a = compose(PitchClass::ASharp, Mode::Major, 30, 99);
    let b = compose(PitchClass::ASharp, Mode::Major, 30, 99);
    assert_eq!(a.beats().len(), b.beats().len());
    for (x, y) in a.beats().iter().zip(b.beats()) {
        assert_eq!(x.first_half(), y.first_half());
        assert_eq!(x.second_half(), y.second_half());
    }
    assert_eq!(a.summary(), b.summary());
}

#[test]
fn midi_file_round_trips() {
    let song = compose(PitchClass::C, Mode::Minor, 10, 5);
    let path = std::env::temp_dir().join(format!("chorale_roundtrip_{}.mid", std::process::id()));
    write_midi(&song, &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    let parsed = midly::Smf::parse(&bytes).unwrap();
    let expected = song_to_smf(&song);
    assert_eq!(parsed.header, expected.header);
    assert_eq!(parsed.tracks.len(), 1 + NUM_VOICES);
    for (read, built) in parsed.tracks.iter().zip(&expected.tracks) {
        assert_eq!(read.len(), built.len());
    }
}
