use crate::signal::PauseEnd;
use crate::timeline::{build_playback, run_loop};
use crate::{scenes_with_prefix, EngineState, SceneClient, Step, TriggerId};

/// Why a sequence returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceExit {
    /// The stop signal fired between steps or during a pause.
    Cancelled,
    /// A `stop` step was reached.
    StopStep,
    /// A `static` step switched to this scene and ended the sequence.
    StaticStep(String),
    /// The step list is empty.
    Empty,
    /// A full pass over the steps neither switched a scene nor paused.
    NothingToPlay,
}

/// Runs `steps` in order, wrapping back to the first step after the last one,
/// until a terminal step is reached or the stop signal fires.
///
/// `trigger` is the trigger that started the sequence; a pause without its
/// own resume note is resumed by pressing that trigger again.
///
/// A sequence whose loop steps never switch a scene would spin without ever
/// waiting, so a full pass that neither activated nor paused anything ends
/// the run with [`SequenceExit::NothingToPlay`].
pub fn run_sequence<C: SceneClient + ?Sized>(
    client: &C,
    state: &EngineState,
    steps: &[Step],
    trigger: Option<TriggerId>,
) -> SequenceExit {
    if steps.is_empty() {
        tracing::warn!("sequence has no steps");
        return SequenceExit::Empty;
    }

    let total = steps.len();
    let mut pass: u64 = 0;
    let exit = 'outer: loop {
        pass += 1;
        let mut progressed = false;

        for (i, step) in steps.iter().enumerate() {
            if state.stop.is_set() {
                break 'outer SequenceExit::Cancelled;
            }
            let position = i + 1;

            match step {
                Step::Stop => {
                    tracing::info!(position, total, "stop step");
                    break 'outer SequenceExit::StopStep;
                }
                Step::Static { scene } => {
                    tracing::info!(position, total, scene = scene.as_str(), "static step");
                    if let Err(err) = client.activate_scene(scene) {
                        tracing::warn!(scene = scene.as_str(), error = %err, "scene switch failed");
                    }
                    break 'outer SequenceExit::StaticStep(scene.clone());
                }
                Step::Pause { resume_note } => {
                    let resume = resume_note.or(trigger);
                    tracing::info!(position, total, ?resume, "paused");
                    progressed = true;
                    match state.pause(resume) {
                        PauseEnd::Resumed => tracing::info!(position, total, "resumed"),
                        PauseEnd::Stopped => break 'outer SequenceExit::Cancelled,
                    }
                }
                Step::Loop(spec) => {
                    let scenes = match scenes_with_prefix(client, &spec.prefix) {
                        Ok(scenes) => scenes,
                        Err(err) => {
                            tracing::warn!(prefix = spec.prefix.as_str(), error = %err, "scene list failed, skipping step");
                            continue;
                        }
                    };
                    if scenes.is_empty() {
                        tracing::warn!(position, total, prefix = spec.prefix.as_str(), "no scenes, skipping step");
                        continue;
                    }

                    let playback = build_playback(&scenes, spec.style);
                    let repeats = spec.repeats.unwrap_or(1);
                    tracing::info!(
                        position,
                        total,
                        pass,
                        style = %spec.style,
                        prefix = spec.prefix.as_str(),
                        repeats,
                        "loop step"
                    );
                    let run = run_loop(client, state, &playback, spec.tick(), spec.style, Some(repeats));
                    progressed |= run.activations > 0;
                }
            }
        }

        if !progressed {
            break SequenceExit::NothingToPlay;
        }
    };

    match &exit {
        SequenceExit::Cancelled => tracing::info!(pass, "sequence cancelled"),
        SequenceExit::NothingToPlay => {
            tracing::warn!(pass, "sequence pass switched no scene and never paused, giving up")
        }
        other => tracing::info!(pass, exit = ?other, "sequence complete"),
    }
    exit
}
