//! Playback order and paced scene switching for a single loop.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::{EngineState, SceneClient, Style};

/// Builds the playback list for `style` using the thread-local RNG.
pub fn build_playback(scenes: &[String], style: Style) -> Vec<String> {
    build_playback_with(scenes, style, &mut rand::thread_rng())
}

/// Builds the playback list for `style`.
///
/// Only `shuffle` consumes randomness; the permutation it returns is meant to
/// be kept for the whole loop invocation.
pub fn build_playback_with<R: Rng + ?Sized>(
    scenes: &[String],
    style: Style,
    rng: &mut R,
) -> Vec<String> {
    match style {
        Style::Bounce if scenes.len() > 2 => {
            let mut playback = scenes.to_vec();
            playback.extend(scenes[1..scenes.len() - 1].iter().rev().cloned());
            playback
        }
        Style::Reverse => scenes.iter().rev().cloned().collect(),
        Style::Strobe if scenes.len() >= 2 => {
            vec![scenes[0].clone(), scenes[scenes.len() - 1].clone()]
        }
        Style::Shuffle => {
            let mut playback = scenes.to_vec();
            playback.shuffle(rng);
            playback
        }
        _ => scenes.to_vec(),
    }
}

/// Why a loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Stopped,
    RepeatsExhausted,
    OnceFinished,
    /// The playback list was empty; nothing was activated.
    Empty,
}

/// Outcome of [`run_loop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopRun {
    pub exit: LoopExit,
    /// Scene switches attempted, including rejected ones.
    pub activations: usize,
}

/// Drives one playback list until stopped or out of budget.
///
/// Each iteration activates one scene and then waits `tick` on the stop
/// signal, so a stop request takes effect at the next tick boundary at the
/// latest. `max_repeats` counts activations in multiples of the playback
/// length and is ignored by `once`.
pub fn run_loop<C: SceneClient + ?Sized>(
    client: &C,
    state: &EngineState,
    playback: &[String],
    tick: Duration,
    style: Style,
    max_repeats: Option<u32>,
) -> LoopRun {
    let len = playback.len();
    if len == 0 {
        tracing::warn!(%style, "empty playback list, loop not started");
        return LoopRun {
            exit: LoopExit::Empty,
            activations: 0,
        };
    }

    tracing::info!(%style, steps = len, ?tick, ?max_repeats, "starting loop");

    let mut rng = rand::thread_rng();
    let mut idx: usize = 0;
    let mut last_scene: Option<&str> = None;

    let exit = loop {
        if state.stop.is_set() {
            break LoopExit::Stopped;
        }

        if let Some(repeats) = max_repeats {
            if style != Style::Once && idx / len >= repeats as usize {
                break LoopExit::RepeatsExhausted;
            }
        }

        let scene: &str = match style {
            Style::Random => pick(playback, &mut rng),
            Style::RandomNoRepeat => {
                let candidates: Vec<&String> = playback
                    .iter()
                    .filter(|scene| Some(scene.as_str()) != last_scene)
                    .collect();
                match candidates.choose(&mut rng) {
                    Some(&scene) => scene.as_str(),
                    None => pick(playback, &mut rng),
                }
            }
            Style::Once => match playback.get(idx) {
                Some(scene) => scene,
                None => break LoopExit::OnceFinished,
            },
            _ => &playback[idx % len],
        };
        idx += 1;

        tracing::debug!(scene, "switching scene");
        if let Err(err) = client.activate_scene(scene) {
            tracing::warn!(scene, error = %err, "scene switch failed");
        }
        last_scene = Some(scene);

        state.stop.wait_timeout(tick);
    };

    match exit {
        LoopExit::Stopped => tracing::info!(%style, "loop stopped"),
        LoopExit::RepeatsExhausted => {
            tracing::info!(%style, ?max_repeats, "loop completed its repeats")
        }
        LoopExit::OnceFinished => tracing::info!(held = ?last_scene, "once loop finished"),
        LoopExit::Empty => {}
    }
    LoopRun {
        exit,
        activations: idx,
    }
}

fn pick<'a, R: Rng + ?Sized>(playback: &'a [String], rng: &mut R) -> &'a str {
    let i = rng.gen_range(0..playback.len());
    &playback[i]
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::{Result, SequencerError};

    /// Scene host that records every activation and raises the stop signal
    /// after a fixed number of them.
    pub(crate) struct RecordingClient {
        scenes: Vec<String>,
        state: Arc<EngineState>,
        stop_after: Option<usize>,
        fail_on: Option<String>,
        played: Mutex<Vec<String>>,
    }

    impl RecordingClient {
        pub(crate) fn new(state: Arc<EngineState>, scenes: &[&str]) -> Self {
            Self {
                scenes: scenes.iter().map(|s| s.to_string()).collect(),
                state,
                stop_after: None,
                fail_on: None,
                played: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn stop_after(mut self, activations: usize) -> Self {
            self.stop_after = Some(activations);
            self
        }

        pub(crate) fn fail_on(mut self, scene: &str) -> Self {
            self.fail_on = Some(scene.to_string());
            self
        }

        pub(crate) fn played(&self) -> Vec<String> {
            self.played.lock().clone()
        }
    }

    impl SceneClient for RecordingClient {
        fn scene_names(&self) -> Result<Vec<String>> {
            Ok(self.scenes.clone())
        }

        fn activate_scene(&self, name: &str) -> Result<()> {
            let mut played = self.played.lock();
            played.push(name.to_string());
            if self.stop_after.is_some_and(|n| played.len() >= n) {
                self.state.stop.set();
            }
            if self.fail_on.as_deref() == Some(name) {
                return Err(SequencerError::scene(name, "rejected"));
            }
            Ok(())
        }
    }

    const FAST: Duration = Duration::from_millis(1);

    fn scenes() -> Vec<String> {
        ["S_1", "S_2", "S_3", "S_4"].map(String::from).to_vec()
    }

    fn run(style: Style, ticks: Option<usize>, max_repeats: Option<u32>) -> Vec<String> {
        let state = Arc::new(EngineState::new());
        let mut client = RecordingClient::new(Arc::clone(&state), &[]);
        if let Some(ticks) = ticks {
            client = client.stop_after(ticks);
        }
        let playback = build_playback(&scenes(), style);
        run_loop(&client, &state, &playback, FAST, style, max_repeats);
        client.played()
    }

    #[test]
    fn builds_playback_per_style() {
        let s = scenes();
        assert_eq!(build_playback(&s, Style::Cycle), ["S_1", "S_2", "S_3", "S_4"]);
        assert_eq!(
            build_playback(&s, Style::Bounce),
            ["S_1", "S_2", "S_3", "S_4", "S_3", "S_2"]
        );
        assert_eq!(build_playback(&s, Style::Reverse), ["S_4", "S_3", "S_2", "S_1"]);
        assert_eq!(build_playback(&s, Style::Strobe), ["S_1", "S_4"]);
        for style in [Style::Once, Style::Random, Style::RandomNoRepeat] {
            assert_eq!(build_playback(&s, style), s);
        }
    }

    #[test]
    fn short_lists_pass_through() {
        let two = ["S_1", "S_2"].map(String::from).to_vec();
        assert_eq!(build_playback(&two, Style::Bounce), two);
        let one = vec!["S_1".to_string()];
        assert_eq!(build_playback(&one, Style::Strobe), one);
        assert!(build_playback(&[], Style::Bounce).is_empty());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut shuffled = build_playback_with(&scenes(), Style::Shuffle, &mut rng);
        shuffled.sort();
        assert_eq!(shuffled, scenes());
    }

    #[test]
    fn cycle_wraps_around() {
        assert_eq!(
            run(Style::Cycle, Some(6), None),
            ["S_1", "S_2", "S_3", "S_4", "S_1", "S_2"]
        );
    }

    #[test]
    fn bounce_ping_pongs() {
        assert_eq!(
            run(Style::Bounce, Some(8), None),
            ["S_1", "S_2", "S_3", "S_4", "S_3", "S_2", "S_1", "S_2"]
        );
    }

    #[test]
    fn reverse_and_strobe_follow_their_playback() {
        assert_eq!(
            run(Style::Reverse, Some(6), None),
            ["S_4", "S_3", "S_2", "S_1", "S_4", "S_3"]
        );
        assert_eq!(
            run(Style::Strobe, Some(6), None),
            ["S_1", "S_4", "S_1", "S_4", "S_1", "S_4"]
        );
    }

    #[test]
    fn shuffle_repeats_the_same_order() {
        let played = run(Style::Shuffle, Some(8), None);
        assert_eq!(played[..4], played[4..]);
        let mut first_pass = played[..4].to_vec();
        first_pass.sort();
        assert_eq!(first_pass, scenes());
    }

    #[test]
    fn once_plays_through_and_holds() {
        let state = EngineState::new();
        let client = RecordingClient::new(Arc::new(EngineState::new()), &[]);
        let exit = run_loop(&client, &state, &scenes(), FAST, Style::Once, Some(5)).exit;
        assert_eq!(exit, LoopExit::OnceFinished);
        assert_eq!(client.played(), scenes());
    }

    #[test]
    fn random_stays_within_playback() {
        let played = run(Style::Random, Some(6), None);
        assert_eq!(played.len(), 6);
        assert!(played.iter().all(|s| scenes().contains(s)));
    }

    #[test]
    fn random_no_repeat_never_repeats_back_to_back() {
        let played = run(Style::RandomNoRepeat, Some(20), None);
        assert_eq!(played.len(), 20);
        for pair in played.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn random_no_repeat_falls_back_on_single_scene() {
        let state = EngineState::new();
        let client = RecordingClient::new(Arc::new(EngineState::new()), &[]);
        let playback = vec!["ONLY".to_string()];
        run_loop(&client, &state, &playback, FAST, Style::RandomNoRepeat, Some(3));
        assert_eq!(client.played(), ["ONLY", "ONLY", "ONLY"]);
    }

    #[test]
    fn stops_after_repeat_budget() {
        let state = EngineState::new();
        let client = RecordingClient::new(Arc::new(EngineState::new()), &[]);
        let run = run_loop(&client, &state, &scenes(), FAST, Style::Cycle, Some(2));
        assert_eq!(run.exit, LoopExit::RepeatsExhausted);
        assert_eq!(run.activations, 8);
        assert_eq!(
            client.played(),
            ["S_1", "S_2", "S_3", "S_4", "S_1", "S_2", "S_3", "S_4"]
        );

        let bounce = build_playback(&scenes(), Style::Bounce);
        assert_eq!(self::run(Style::Bounce, None, Some(1)), bounce);
    }

    #[test]
    fn zero_budget_plays_nothing() {
        let state = EngineState::new();
        let client = RecordingClient::new(Arc::new(EngineState::new()), &[]);
        let run = run_loop(&client, &state, &scenes(), FAST, Style::Cycle, Some(0));
        assert_eq!(run.exit, LoopExit::RepeatsExhausted);
        assert_eq!(run.activations, 0);
        assert!(client.played().is_empty());
    }

    #[test]
    fn random_budget_counts_picks() {
        let played = run(Style::Random, None, Some(2));
        assert_eq!(played.len(), 8);
    }

    #[test]
    fn failed_switch_does_not_break_the_loop() {
        let state = Arc::new(EngineState::new());
        let client = RecordingClient::new(Arc::clone(&state), &[]).fail_on("S_2");
        let exit = run_loop(&client, &state, &scenes(), FAST, Style::Cycle, Some(1)).exit;
        assert_eq!(exit, LoopExit::RepeatsExhausted);
        assert_eq!(client.played(), scenes());
    }

    #[test]
    fn stop_signal_cuts_a_long_tick_short() {
        let state = Arc::new(EngineState::new());
        let client = RecordingClient::new(Arc::clone(&state), &[]).stop_after(1);
        let started = std::time::Instant::now();
        let exit = run_loop(
            &client,
            &state,
            &scenes(),
            Duration::from_secs(30),
            Style::Cycle,
            None,
        )
        .exit;
        assert_eq!(exit, LoopExit::Stopped);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(client.played(), ["S_1"]);
    }

    #[test]
    fn empty_playback_is_refused() {
        let state = EngineState::new();
        let client = RecordingClient::new(Arc::new(EngineState::new()), &[]);
        let run = run_loop(&client, &state, &[], FAST, Style::Cycle, None);
        assert_eq!(run.exit, LoopExit::Empty);
        assert_eq!(run.activations, 0);
        assert!(client.played().is_empty());
    }
}
