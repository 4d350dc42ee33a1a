//! Core library for the Scene Sequencer.
//!
//! A trigger (a controller key press) selects an [`Action`] from the
//! [`ActionMap`]. Loops and sequences run on a single background task that
//! switches scenes on a [`SceneClient`] at a fixed tick, and every new trigger
//! fully stops the previous task before starting its own.

pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod mapping;
pub mod scene;
pub mod sequence;
pub mod signal;
pub mod timeline;

pub use config::{
    default_action_map, find_config_files, load_action_map, pick_config_file, DEFAULT_CONFIG_FILE,
};
pub use engine::{Dispatch, Engine};
pub use error::{Result, SequencerError};
pub use input::{note_name, TriggerEvent};
pub use mapping::{calc_tick, Action, ActionMap, LoopSpec, Step, Style, Timing, TriggerId};
pub use scene::{natural_cmp, scenes_with_prefix, MemorySceneHost, SceneClient};
pub use sequence::{run_sequence, SequenceExit};
pub use signal::{EngineState, PauseEnd, Signal};
pub use timeline::{build_playback, build_playback_with, run_loop, LoopExit, LoopRun};
