use std::sync::Arc;

use crate::sequence::run_sequence;
use crate::timeline::{build_playback, run_loop};
use crate::{scenes_with_prefix, Action, ActionMap, EngineState, LoopSpec, Result, SceneClient, Step, TriggerId};

/// What [`Engine::on_trigger`] did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// No action is mapped to the trigger.
    Unmapped,
    /// The trigger released a paused sequence.
    Resumed,
    /// A loop or sequence now runs in the background.
    Started,
    /// Playback stopped and the scene was switched directly.
    Switched(String),
    /// Playback stopped; the current scene stays up.
    Stopped,
    /// The loop has no matching scenes, so nothing was started.
    NoScenes(String),
}

/// Routes triggers to actions and owns the single background playback task.
pub struct Engine<C: SceneClient> {
    client: Arc<C>,
    actions: ActionMap,
    state: Arc<EngineState>,
}

impl<C: SceneClient> Engine<C> {
    pub fn new(client: Arc<C>, actions: ActionMap) -> Self {
        Self {
            client,
            actions,
            state: Arc::new(EngineState::new()),
        }
    }

    pub fn state(&self) -> &Arc<EngineState> {
        &self.state
    }

    /// Handles one trigger event.
    ///
    /// A trigger that matches the pending resume note of a paused sequence
    /// only resumes it. Every other mapped trigger supersedes whatever is
    /// running: the old task is stopped and joined before anything new
    /// happens.
    pub fn on_trigger(&self, id: TriggerId) -> Result<Dispatch> {
        if self.state.try_resume(id) {
            tracing::info!(trigger = id, "resuming paused sequence");
            return Ok(Dispatch::Resumed);
        }

        let Some(action) = self.actions.get(&id) else {
            tracing::debug!(trigger = id, "unmapped trigger, ignoring");
            return Ok(Dispatch::Unmapped);
        };

        tracing::info!(trigger = id, action = action.kind(), "trigger");
        match action {
            Action::Loop(spec) => self.start_loop(spec),
            Action::Static { scene } => Ok(self.switch_to(scene)),
            Action::Sequence { steps } => {
                self.start_sequence(steps.clone(), Some(id))?;
                Ok(Dispatch::Started)
            }
            Action::Stop => {
                self.state.stop_active();
                Ok(Dispatch::Stopped)
            }
        }
    }

    /// Stops any running task and starts a bare loop.
    ///
    /// The scene list is resolved after the old task has exited; an empty
    /// list leaves nothing running.
    pub fn start_loop(&self, spec: &LoopSpec) -> Result<Dispatch> {
        self.state.stop_active();

        let scenes = scenes_with_prefix(self.client.as_ref(), &spec.prefix)?;
        if scenes.is_empty() {
            tracing::warn!(prefix = spec.prefix.as_str(), "no scenes found, loop not started");
            return Ok(Dispatch::NoScenes(spec.prefix.clone()));
        }
        let playback = build_playback(&scenes, spec.style);
        tracing::info!(?scenes, style = %spec.style, tick = ?spec.tick(), "found scenes");

        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let (tick, style, repeats) = (spec.tick(), spec.style, spec.repeats);
        self.state.supersede(move || {
            run_loop(client.as_ref(), &state, &playback, tick, style, repeats);
        })?;
        Ok(Dispatch::Started)
    }

    /// Stops any running task and starts `steps` as a sequence.
    pub fn start_sequence(&self, steps: Vec<Step>, trigger: Option<TriggerId>) -> Result<()> {
        tracing::info!(steps = steps.len(), "starting sequence");
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        self.state.supersede(move || {
            run_sequence(client.as_ref(), &state, &steps, trigger);
        })?;
        Ok(())
    }

    /// Stops any running task and switches straight to `scene`.
    ///
    /// A rejected switch is logged rather than returned.
    pub fn switch_to(&self, scene: &str) -> Dispatch {
        self.state.stop_active();
        tracing::info!(scene, "switching to static scene");
        if let Err(err) = self.client.activate_scene(scene) {
            tracing::warn!(scene, error = %err, "static scene switch failed");
        }
        Dispatch::Switched(scene.to_string())
    }

    /// Starts the first loop in the map, if there is one.
    pub fn start_first_loop(&self) -> Result<Option<Dispatch>> {
        let first = self.actions.values().find_map(|action| match action {
            Action::Loop(spec) => Some(spec),
            _ => None,
        });
        match first {
            Some(spec) => {
                tracing::info!(prefix = spec.prefix.as_str(), "test mode, starting first loop");
                self.start_loop(spec).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Whether a loop or sequence is currently playing.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Stops and joins the background task.
    pub fn shutdown(&self) {
        self.state.stop_active();
    }
}

impl<C: SceneClient> Drop for Engine<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<C: SceneClient> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("actions", &self.actions.len())
            .field("running", &self.is_running())
            .finish()
    }
}
