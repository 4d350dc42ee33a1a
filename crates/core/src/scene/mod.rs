use std::cmp::Ordering;

use parking_lot::Mutex;

use crate::{Result, SequencerError};

/// Capability the engine needs from the scene rendering host.
pub trait SceneClient: Send + Sync + 'static {
    /// Names of every scene the host currently knows about.
    fn scene_names(&self) -> Result<Vec<String>>;

    /// Makes `name` the live program scene.
    fn activate_scene(&self, name: &str) -> Result<()>;
}

/// Scenes whose name starts with `prefix`, in natural order.
pub fn scenes_with_prefix<C: SceneClient + ?Sized>(client: &C, prefix: &str) -> Result<Vec<String>> {
    let mut scenes: Vec<String> = client
        .scene_names()?
        .into_iter()
        .filter(|name| name.starts_with(prefix))
        .collect();
    scenes.sort_by(|a, b| natural_cmp(a, b));
    Ok(scenes)
}

/// Orders names so that embedded numbers compare by value (`A_2` < `A_10`)
/// and text compares case-insensitively.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Chunks::new(a);
    let mut right = Chunks::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_chunks(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn compare_chunks(l: &str, r: &str) -> Ordering {
    let l_digits = l.as_bytes()[0].is_ascii_digit();
    let r_digits = r.as_bytes()[0].is_ascii_digit();
    match (l_digits, r_digits) {
        (true, true) => {
            let l = l.trim_start_matches('0');
            let r = r.trim_start_matches('0');
            l.len().cmp(&r.len()).then_with(|| l.cmp(r))
        }
        (false, false) => l
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(r.chars().flat_map(char::to_lowercase)),
        // Numbers sort ahead of text at the same position.
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
    }
}

/// Splits a string into alternating runs of ASCII digits and everything else.
struct Chunks<'a> {
    rest: &'a str,
}

impl<'a> Chunks<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let first = self.rest.as_bytes().first()?;
        let digits = first.is_ascii_digit();
        let end = self
            .rest
            .bytes()
            .position(|b| b.is_ascii_digit() != digits)
            .unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(chunk)
    }
}

/// Scene host that lives entirely in memory.
///
/// Used when no rendering host is attached: activations are logged and the
/// current program scene is tracked so the CLI can run a show dry.
#[derive(Debug, Default)]
pub struct MemorySceneHost {
    scenes: Vec<String>,
    current: Mutex<Option<String>>,
}

impl MemorySceneHost {
    pub fn new<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scenes: scenes.into_iter().map(Into::into).collect(),
            current: Mutex::new(None),
        }
    }

    pub fn current_scene(&self) -> Option<String> {
        self.current.lock().clone()
    }
}

impl SceneClient for MemorySceneHost {
    fn scene_names(&self) -> Result<Vec<String>> {
        Ok(self.scenes.clone())
    }

    fn activate_scene(&self, name: &str) -> Result<()> {
        if !self.scenes.iter().any(|scene| scene == name) {
            return Err(SequencerError::scene(name, "no such scene"));
        }
        tracing::info!(scene = name, "program scene");
        *self.current.lock() = Some(name.to_string());
        Ok(())
    }
}
