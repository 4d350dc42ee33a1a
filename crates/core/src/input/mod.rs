use std::fmt;
use std::str::FromStr;

use crate::{SequencerError, TriggerId};

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Human readable note name, with C3 = 48 and C4 = 60.
pub fn note_name(note: TriggerId) -> String {
    let octave = i64::from(note / 12) - 1;
    format!("{}{octave}", NOTE_NAMES[(note % 12) as usize])
}

/// One line of controller input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    NoteOn { note: TriggerId, velocity: u8 },
    NoteOff { note: TriggerId },
}

impl TriggerEvent {
    /// The trigger to dispatch, or `None` for releases and silent presses.
    pub fn trigger(&self) -> Option<TriggerId> {
        match *self {
            TriggerEvent::NoteOn { note, velocity } if velocity > 0 => Some(note),
            _ => None,
        }
    }

    pub fn note(&self) -> TriggerId {
        match *self {
            TriggerEvent::NoteOn { note, .. } | TriggerEvent::NoteOff { note } => note,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerEvent::NoteOn { note, velocity } => {
                write!(f, "note_on note={note} velocity={velocity}")
            }
            TriggerEvent::NoteOff { note } => write!(f, "note_off note={note}"),
        }
    }
}

/// Accepts `36`, `note_on 36 [velocity]` and `note_off 36`.
impl FromStr for TriggerEvent {
    type Err = SequencerError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let first = words
            .next()
            .ok_or_else(|| SequencerError::msg("empty input line"))?;

        let event = match first {
            "note_on" => TriggerEvent::NoteOn {
                note: parse_number(words.next(), line)?,
                velocity: match words.next() {
                    Some(v) => parse_number(Some(v), line)?,
                    None => 127,
                },
            },
            "note_off" => TriggerEvent::NoteOff {
                note: parse_number(words.next(), line)?,
            },
            bare => TriggerEvent::NoteOn {
                note: parse_number(Some(bare), line)?,
                velocity: 127,
            },
        };

        if words.next().is_some() {
            return Err(SequencerError::msg(format!("trailing input in `{line}`")));
        }
        Ok(event)
    }
}

fn parse_number<T: FromStr>(word: Option<&str>, line: &str) -> Result<T, SequencerError> {
    word.and_then(|w| w.parse().ok())
        .ok_or_else(|| SequencerError::msg(format!("cannot read trigger from `{line}`")))
}
