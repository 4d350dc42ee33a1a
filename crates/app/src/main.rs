use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use scene_sequencer_core::{
    find_config_files, load_action_map, note_name, pick_config_file, Action, ActionMap, Engine,
    MemorySceneHost, TriggerEvent, DEFAULT_CONFIG_FILE,
};
use tracing_subscriber::EnvFilter;

fn main() -> scene_sequencer_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            scenes,
            test_mode,
        } => run_show(&config, scenes, test_mode),
        Commands::Debug => run_debug(),
        Commands::Check { config } => run_check(&config),
    }
}

fn run_show(config: &ConfigArgs, scenes: Vec<String>, test_mode: bool) -> scene_sequencer_core::Result<()> {
    let actions = load_actions(config)?;
    tracing::info!(mapped = ?actions.keys().collect::<Vec<_>>(), scenes = scenes.len(), "starting show");

    let host = Arc::new(MemorySceneHost::new(scenes));
    let engine = Engine::new(host, actions);

    if test_mode && engine.start_first_loop()?.is_none() {
        tracing::warn!("test mode requested but no loop is mapped");
    }

    tracing::info!("listening for triggers on stdin (EOF to quit)");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let event = match line.parse::<TriggerEvent>() {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring input");
                continue;
            }
        };
        let Some(trigger) = event.trigger() else {
            continue;
        };
        match engine.on_trigger(trigger) {
            Ok(outcome) => tracing::debug!(trigger, note = %note_name(trigger), ?outcome, "dispatched"),
            Err(err) => tracing::error!(trigger, error = %err, "trigger failed"),
        }
    }

    tracing::info!("shutting down");
    engine.shutdown();
    Ok(())
}

fn run_debug() -> scene_sequencer_core::Result<()> {
    tracing::info!("debug mode, echoing input events (EOF to quit)");
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match line.parse::<TriggerEvent>() {
            Ok(event) => println!("{event}  (note_name={})", note_name(event.note())),
            Err(_) if line.trim().is_empty() => {}
            Err(err) => println!("{line}  ({err})"),
        }
    }
    Ok(())
}

fn run_check(config: &ConfigArgs) -> scene_sequencer_core::Result<()> {
    let actions = load_actions(config)?;
    for (trigger, action) in &actions {
        println!("{trigger:>3} {:<4} {}", note_name(*trigger), describe(action));
    }
    println!("{} mappings", actions.len());
    Ok(())
}

fn describe(action: &Action) -> String {
    match action {
        Action::Loop(spec) => format!(
            "loop {} {} every {:.3}s",
            spec.prefix,
            spec.style,
            spec.tick().as_secs_f64()
        ),
        Action::Static { scene } => format!("static {scene}"),
        Action::Sequence { steps } => format!("sequence of {} steps", steps.len()),
        Action::Stop => "stop".to_string(),
    }
}

fn load_actions(config: &ConfigArgs) -> scene_sequencer_core::Result<ActionMap> {
    let path = resolve_config(config.config.as_deref(), &config.config_dir)?;
    load_action_map(&path)
}

fn resolve_config(explicit: Option<&Path>, dir: &Path) -> scene_sequencer_core::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let found = find_config_files(dir)?;
    Ok(pick_config_file(&found)?.unwrap_or_else(|| dir.join(DEFAULT_CONFIG_FILE)))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        // `debug` and `check` print their results on stdout.
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Trigger-driven scene sequencer", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct ConfigArgs {
    /// Action map to load. Defaults to the only JSON file in --config-dir.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory searched for action maps when --config is not given.
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play the show, reading trigger lines (`36`, `note_on 36 100`) from stdin.
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        /// Scene names known to the in-memory host.
        #[arg(short, long, value_delimiter = ',')]
        scenes: Vec<String>,
        /// Start the first mapped loop immediately.
        #[arg(long)]
        test_mode: bool,
    },
    /// Print every input event with its note name without switching scenes.
    Debug,
    /// Validate the action map and list its mappings.
    Check {
        #[command(flatten)]
        config: ConfigArgs,
    },
}
