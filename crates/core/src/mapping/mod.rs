use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Identifier of an external trigger, a MIDI note number in practice.
pub type TriggerId = u32;

/// Trigger id to action routing table.
pub type ActionMap = BTreeMap<TriggerId, Action>;

/// Traversal policy used to pick successive scenes from a playback list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Style {
    #[default]
    Cycle,
    Bounce,
    Reverse,
    Once,
    Random,
    RandomNoRepeat,
    Strobe,
    Shuffle,
}

impl Style {
    pub fn as_str(self) -> &'static str {
        match self {
            Style::Cycle => "cycle",
            Style::Bounce => "bounce",
            Style::Reverse => "reverse",
            Style::Once => "once",
            Style::Random => "random",
            Style::RandomNoRepeat => "random_no_repeat",
            Style::Strobe => "strobe",
            Style::Shuffle => "shuffle",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts a tempo and a beat count into seconds per scene switch.
pub fn calc_tick(bpm: f64, steps: f64) -> f64 {
    (60.0 / bpm) * steps
}

/// How often a loop switches scenes.
///
/// Either given directly in seconds or derived from a tempo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timing {
    Tick { tick: f64 },
    Tempo { bpm: f64, steps: f64 },
}

impl Timing {
    pub fn seconds(&self) -> f64 {
        match *self {
            Timing::Tick { tick } => tick,
            Timing::Tempo { bpm, steps } => calc_tick(bpm, steps),
        }
    }
}

/// A repeating loop over every scene whose name starts with `prefix`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLoop", into = "RawLoop")]
pub struct LoopSpec {
    pub prefix: String,
    pub style: Style,
    pub repeats: Option<u32>,
    timing: Timing,
    tick: Duration,
}

impl LoopSpec {
    /// Validates `timing` and builds an unbounded loop.
    pub fn new(prefix: impl Into<String>, style: Style, timing: Timing) -> Result<Self, String> {
        let prefix = prefix.into();
        let tick = interval(&prefix, &timing)?;
        Ok(Self {
            prefix,
            style,
            repeats: None,
            timing,
            tick,
        })
    }

    /// Loop switching scenes every `tick`.
    pub fn every(prefix: impl Into<String>, style: Style, tick: Duration) -> Self {
        Self {
            prefix: prefix.into(),
            style,
            repeats: None,
            timing: Timing::Tick {
                tick: tick.as_secs_f64(),
            },
            tick,
        }
    }

    pub fn with_repeats(mut self, repeats: u32) -> Self {
        self.repeats = Some(repeats);
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }
}

fn interval(prefix: &str, timing: &Timing) -> Result<Duration, String> {
    let seconds = timing.seconds();
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!(
            "loop `{prefix}` must switch scenes after a positive interval, got {seconds}s"
        ));
    }
    Duration::try_from_secs_f64(seconds)
        .map_err(|err| format!("loop `{prefix}` interval of {seconds}s is out of range: {err}"))
}

#[derive(Serialize, Deserialize)]
struct RawLoop {
    prefix: String,
    #[serde(default)]
    style: Style,
    #[serde(flatten)]
    timing: Timing,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    repeats: Option<u32>,
}

impl TryFrom<RawLoop> for LoopSpec {
    type Error = String;

    fn try_from(raw: RawLoop) -> Result<Self, Self::Error> {
        if raw.repeats == Some(0) {
            return Err(format!("loop `{}` must repeat at least once", raw.prefix));
        }
        let mut spec = Self::new(raw.prefix, raw.style, raw.timing)?;
        spec.repeats = raw.repeats;
        Ok(spec)
    }
}

impl From<LoopSpec> for RawLoop {
    fn from(spec: LoopSpec) -> Self {
        Self {
            prefix: spec.prefix,
            style: spec.style,
            timing: spec.timing,
            repeats: spec.repeats,
        }
    }
}

/// One entry of a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Loop(LoopSpec),
    Pause {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_note: Option<TriggerId>,
    },
    #[serde(alias = "kill")]
    Static { scene: String },
    Stop,
}

/// What a trigger does when it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Loop(LoopSpec),
    #[serde(alias = "kill")]
    Static { scene: String },
    Sequence { steps: Vec<Step> },
    /// Halts whatever is running and leaves the current scene in place.
    Stop,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Loop(_) => "loop",
            Action::Static { .. } => "static",
            Action::Sequence { .. } => "sequence",
            Action::Stop => "stop",
        }
    }
}
