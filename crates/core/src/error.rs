use std::path::PathBuf;

/// Result alias that carries the custom [`SequencerError`] type.
pub type Result<T> = std::result::Result<T, SequencerError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum SequencerError {
    /// Free-form failure reported by a collaborator.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The action map at `path` exists but is not well-formed.
    #[error("invalid action map `{}`: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Config discovery found more than one candidate file.
    #[error("several config files found ({}); choose one with --config", list_paths(.0))]
    AmbiguousConfig(Vec<PathBuf>),
    /// The scene host rejected a request.
    #[error("scene `{scene}`: {reason}")]
    Scene { scene: String, reason: String },
}

impl SequencerError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    pub fn scene(scene: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Scene {
            scene: scene.into(),
            reason: reason.into(),
        }
    }
}

impl From<&str> for SequencerError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for SequencerError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

fn list_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
