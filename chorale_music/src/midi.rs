// MIDI output for finished songs.
//
// Converts a Song into a Standard MIDI File (format 1): a tempo track
// followed by one track per voice, bass first. Every beat is a quarter note
// split into two eighth-note slices. A voice whose two halves match sounds
// one quarter note; an embellished voice sounds two eighths. Repeated pitches
// across beats are re-attacked.
//
// Uses the `midly` crate for MIDI writing. Output paths must end in `.mid`
// or `.midi`.

use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use std::path::Path;

use crate::error::ExportError;
use crate::pitch::Pitch;
use crate::song::Song;
use crate::voice::Voice;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per half beat.
const TICKS_PER_EIGHTH: u32 = TICKS_PER_QUARTER as u32 / 2;

/// General MIDI "Choir Aahs".
const CHOIR_PROGRAM: u8 = 52;

const VELOCITY: u8 = 80;

/// Largest value a tempo meta event can carry.
const MAX_TEMPO_MICROS: u32 = 0xFF_FFFF;

/// Fail unless `path` names a `.mid` or `.midi` file.
pub fn check_extension(path: &Path) -> Result<(), ExportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("mid") | Some("midi") => Ok(()),
        _ => Err(ExportError::UnsupportedExtension(path.display().to_string())),
    }
}

/// Convert a Song to MIDI and write it to a file.
pub fn write_midi(song: &Song, path: &Path) -> Result<(), ExportError> {
    check_extension(path)?;
    let smf = song_to_smf(song);
    let mut buf = Vec::new();
    smf.write_std(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Convert a Song to an in-memory SMF.
pub fn song_to_smf(song: &Song) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo
    let tempo_micros = (60_000_000 / song.tempo_bpm().max(1)).min(MAX_TEMPO_MICROS);
    smf.tracks.push(vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_micros))),
        },
        end_of_track(),
    ]);

    for voice in Voice::ALL {
        smf.tracks.push(voice_track(song, voice));
    }
    smf
}

/// The (pitch, length in ticks) notes one voice sounds across the song.
fn voice_notes(song: &Song, voice: Voice) -> Vec<(Pitch, u32)> {
    let v = voice.index();
    let mut notes = Vec::with_capacity(song.beats().len() * 2);
    for beat in song.beats() {
        let (first, second) = (beat.first_half()[v], beat.second_half()[v]);
        if first == second {
            notes.push((first, 2 * TICKS_PER_EIGHTH));
        } else {
            notes.push((first, TICKS_PER_EIGHTH));
            notes.push((second, TICKS_PER_EIGHTH));
        }
    }
    notes
}

fn voice_track(song: &Song, voice: Voice) -> Track<'static> {
    let channel = u4::new(voice.index() as u8);
    let mut track: Track<'static> = vec![
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Meta(MetaMessage::TrackName(voice.name().as_bytes())),
        },
        TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::ProgramChange {
                    program: u7::new(CHOIR_PROGRAM),
                },
            },
        },
    ];

    for (pitch, ticks) in voice_notes(song, voice) {
        let key = u7::new(pitch.midi());
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOn {
                    key,
                    vel: u7::new(VELOCITY),
                },
            },
        });
        track.push(TrackEvent {
            delta: u28::new(ticks),
            kind: TrackEventKind::Midi {
                channel,
                message: MidiMessage::NoteOff {
                    key,
                    vel: u7::new(0),
                },
            },
        });
    }

    track.push(end_of_track());
    track
}

fn end_of_track() -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    }
}
