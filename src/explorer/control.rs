use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplorationState {
    Idle,
    Running,
    /// Paused through [`ExplorationHandle::pause`]
    Paused,
    /// Waiting for a user to log in by hand
    PausedForLogin,
    Completed,
    Failed,
    Stopped,
}

impl ExplorationState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExplorationState::Completed | ExplorationState::Failed | ExplorationState::Stopped
        )
    }
}

impl fmt::Display for ExplorationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExplorationState::Idle => "idle",
            ExplorationState::Running => "running",
            ExplorationState::Paused => "paused",
            ExplorationState::PausedForLogin => "paused_for_login",
            ExplorationState::Completed => "completed",
            ExplorationState::Failed => "failed",
            ExplorationState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Signals from the outside world, read by the engine between clicks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ControlFlags {
    pub paused: bool,
    pub stopped: bool,
    /// Bumped on every `login_completed` call
    pub login_signals: u64,
}

struct Channels {
    flags: watch::Sender<ControlFlags>,
    state: watch::Sender<ExplorationState>,
}

/// Cloneable remote control for a running exploration.
///
/// All signals are cooperative: the engine acts on them at its next
/// checkpoint, never in the middle of a click.
#[derive(Clone)]
pub struct ExplorationHandle {
    channels: Arc<Channels>,
}

impl ExplorationHandle {
    pub(crate) fn new() -> Self {
        let (flags, _) = watch::channel(ControlFlags::default());
        let (state, _) = watch::channel(ExplorationState::Idle);
        Self {
            channels: Arc::new(Channels { flags, state }),
        }
    }

    pub fn state(&self) -> ExplorationState {
        *self.channels.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ExplorationState> {
        self.channels.state.subscribe()
    }

    /// Request a pause at the next checkpoint. Ignored once finished.
    pub fn pause(&self) -> bool {
        if self.state().is_terminal() {
            return false;
        }
        self.channels.flags.send_modify(|f| f.paused = true);
        true
    }

    pub fn resume(&self) -> bool {
        let mut changed = false;
        self.channels.flags.send_modify(|f| {
            changed = f.paused;
            f.paused = false;
        });
        changed
    }

    /// Stop the session; the partial graph is kept.
    pub fn stop(&self) {
        self.channels.flags.send_modify(|f| f.stopped = true);
    }

    /// Tell a session waiting on a login screen that the user is done.
    pub fn login_completed(&self) {
        self.channels.flags.send_modify(|f| f.login_signals += 1);
    }

    pub(crate) fn flags(&self) -> watch::Receiver<ControlFlags> {
        self.channels.flags.subscribe()
    }

    pub(crate) fn set_state(&self, state: ExplorationState) {
        let previous = self.channels.state.send_replace(state);
        if previous != state {
            tracing::info!(from = %previous, to = %state, "exploration state changed");
        }
    }
}

impl fmt::Debug for ExplorationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplorationHandle")
            .field("state", &self.state())
            .finish()
    }
}
