use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{Action, ActionMap, LoopSpec, Result, SequencerError, Step, Style};

/// File name conventionally used for the action map.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Template shipped next to real configs; never picked up by discovery.
pub const EXAMPLE_CONFIG_FILE: &str = "config.example.json";

/// Loads the action map stored at `path`.
///
/// A missing file yields [`default_action_map`]. A file that exists but does
/// not parse is an error; defaults are never substituted for a broken map.
pub fn load_action_map(path: &Path) -> Result<ActionMap> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "no config file, using built-in mappings");
        return Ok(default_action_map());
    }

    let raw = std::fs::read_to_string(path)?;
    let map = parse_action_map(&raw).map_err(|source| SequencerError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), mappings = map.len(), "loaded config");
    Ok(map)
}

/// Parses the flat `{"<trigger>": {action...}}` JSON shape.
pub fn parse_action_map(raw: &str) -> std::result::Result<ActionMap, serde_json::Error> {
    serde_json::from_str(raw)
}

/// JSON files in `dir` that look like configs, sorted, as absolute paths.
pub fn find_config_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = std::fs::canonicalize(dir)?;
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        let is_example = path.file_name().is_some_and(|name| name == EXAMPLE_CONFIG_FILE);
        if is_json && !is_example && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Chooses among discovered config files.
///
/// No candidates means defaults, one is taken as is, and several need an
/// explicit choice from the caller.
pub fn pick_config_file(files: &[PathBuf]) -> Result<Option<PathBuf>> {
    match files {
        [] => Ok(None),
        [only] => Ok(Some(only.clone())),
        many => Err(SequencerError::AmbiguousConfig(many.to_vec())),
    }
}

/// `steps` beats at `bpm`; callers pass non-zero constants.
fn tempo(prefix: &str, style: Style, bpm: u32, steps: u32) -> LoopSpec {
    LoopSpec::every(prefix, style, Duration::from_secs(60) * steps / bpm)
}

/// Built-in show layout used when no config file exists. Notes count from
/// C2 = 36.
pub fn default_action_map() -> ActionMap {
    let mut map = ActionMap::new();
    map.insert(
        36,
        Action::Sequence {
            steps: vec![
                Step::Loop(tempo("LOOP_A_", Style::Cycle, 120, 4).with_repeats(3)),
                Step::Loop(tempo("LOOP_A_", Style::Bounce, 120, 2).with_repeats(2)),
                Step::Static {
                    scene: "STATIC_1".to_string(),
                },
            ],
        },
    );

    let styled = [
        (37, Style::Bounce, 4),
        (38, Style::Reverse, 4),
        (39, Style::Once, 4),
        (40, Style::Random, 2),
        (41, Style::RandomNoRepeat, 2),
        (42, Style::Strobe, 1),
        (43, Style::Shuffle, 4),
    ];
    for (note, style, steps) in styled {
        map.insert(note, Action::Loop(tempo("LOOP_A_", style, 120, steps)));
    }

    for (note, letter) in (44..).zip(['H', 'I', 'J', 'K', 'L']) {
        let prefix = format!("LOOP_{letter}_");
        map.insert(note, Action::Loop(tempo(&prefix, Style::Cycle, 120, 4)));
    }
    map.insert(49, Action::Loop(tempo("LOOP_M_", Style::Bounce, 124, 1)));
    map.insert(50, Action::Loop(tempo("LOOP_N_", Style::Cycle, 120, 4)));
    map.insert(
        51,
        Action::Static {
            scene: "STATIC_2".to_string(),
        },
    );
    map
}
