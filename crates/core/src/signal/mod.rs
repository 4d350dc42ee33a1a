//! Cooperative cancellation and pause/resume rendezvous.
//!
//! A [`Signal`] is a latched boolean guarded by a condition variable so that
//! waiters wake the instant it is set instead of polling. [`EngineState`]
//! bundles the two signals the runners share with the dispatcher.

use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::mapping::TriggerId;

/// How often a paused sequence re-checks the stop signal while it waits for
/// the resume signal.
pub const PAUSE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Idempotent binary signal with an interruptible timed wait.
#[derive(Debug, Default)]
pub struct Signal {
    flag: Mutex<bool>,
    cond: Condvar,
}

impl Signal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latches the signal and wakes every waiter.
    pub fn set(&self) {
        let mut flag = self.flag.lock();
        *flag = true;
        self.cond.notify_all();
    }

    pub fn clear(&self) {
        *self.flag.lock() = false;
    }

    pub fn is_set(&self) -> bool {
        *self.flag.lock()
    }

    /// Blocks until the signal is set or `timeout` elapses.
    ///
    /// Returns `true` when the signal was observed set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut flag = self.flag.lock();
        if !*flag {
            self.cond
                .wait_while_for(&mut flag, |set| !*set, timeout);
        }
        *flag
    }
}

/// Which signal ended a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseEnd {
    Resumed,
    Stopped,
}

/// Shared state of one engine instance.
///
/// The runners only ever see this through a shared reference; the active
/// task slot is touched exclusively by the dispatcher's start sequence.
#[derive(Debug, Default)]
pub struct EngineState {
    pub stop: Signal,
    pub resume: Signal,
    pending_resume: Mutex<Option<TriggerId>>,
    active: Mutex<Option<JoinHandle<()>>>,
}

impl EngineState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger id that is currently allowed to resume a paused sequence.
    pub fn pending_resume(&self) -> Option<TriggerId> {
        *self.pending_resume.lock()
    }

    /// Blocks a pause step until either signal fires.
    ///
    /// The resume signal is cleared before `resume_id` is published so a
    /// resume arriving right after publication is never lost. The pending id
    /// is withdrawn on every exit path.
    pub fn pause(&self, resume_id: Option<TriggerId>) -> PauseEnd {
        self.resume.clear();
        let _pending = PendingResume::publish(&self.pending_resume, resume_id);

        loop {
            if self.stop.is_set() {
                return PauseEnd::Stopped;
            }
            if self.resume.wait_timeout(PAUSE_POLL_INTERVAL) {
                // Stop wins when both are set.
                if self.stop.is_set() {
                    return PauseEnd::Stopped;
                }
                return PauseEnd::Resumed;
            }
        }
    }

    /// Sets the resume signal when `id` matches the pending resume trigger.
    pub fn try_resume(&self, id: TriggerId) -> bool {
        let pending = self.pending_resume.lock();
        if *pending == Some(id) {
            self.resume.set();
            true
        } else {
            false
        }
    }

    /// Signals stop and joins the running task, if any.
    ///
    /// A task that panicked is logged and its slot released all the same.
    pub fn stop_active(&self) {
        let mut active = self.active.lock();
        self.halt(&mut active);
    }

    /// Stops the current task, then launches `task` as the new one.
    ///
    /// The whole stop-join-launch sequence runs under the slot lock, so two
    /// callers can never interleave and no activation from the superseded
    /// run can follow the new run's first one.
    pub fn supersede<F>(&self, task: F) -> std::io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut active = self.active.lock();
        self.halt(&mut active);
        self.stop.clear();
        let handle = std::thread::Builder::new()
            .name("scene-playback".to_string())
            .spawn(task)?;
        *active = Some(handle);
        Ok(())
    }

    /// Whether a background task exists and has not yet returned.
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    fn halt(&self, active: &mut Option<JoinHandle<()>>) {
        self.stop.set();
        if let Some(handle) = active.take() {
            if handle.join().is_err() {
                tracing::error!("playback task panicked; slot released");
            }
        }
    }
}

/// Publishes a resume id for the lifetime of a pause.
struct PendingResume<'a> {
    slot: &'a Mutex<Option<TriggerId>>,
}

impl<'a> PendingResume<'a> {
    fn publish(slot: &'a Mutex<Option<TriggerId>>, id: Option<TriggerId>) -> Self {
        *slot.lock() = id;
        Self { slot }
    }
}

impl Drop for PendingResume<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}
