//! Worker lifecycle states.

use std::fmt;

use barstock_core::Error;

/// Lifecycle of one worker version.
///
/// `Parsed -> Installing -> Installed -> Activating -> Activated`, with
/// `Redundant` when install fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    #[default]
    Parsed,
    Installing,
    Installed,
    Activating,
    /// Controlling clients; fetches are intercepted.
    Activated,
    /// Install failed; a new install attempt may start over.
    Redundant,
}

impl WorkerState {
    /// Only the controlling worker sees fetches.
    pub fn can_intercept_fetch(&self) -> bool {
        matches!(self, WorkerState::Activated)
    }

    /// Transition into `Installing`.
    pub fn begin_install(&mut self) -> Result<(), Error> {
        match *self {
            WorkerState::Parsed | WorkerState::Installed | WorkerState::Redundant => {
                *self = WorkerState::Installing;
                Ok(())
            }
            other => Err(Error::InvalidState(format!("cannot install while {other}"))),
        }
    }

    /// Transition into `Activating`.
    pub fn begin_activate(&mut self) -> Result<(), Error> {
        match *self {
            WorkerState::Installed => {
                *self = WorkerState::Activating;
                Ok(())
            }
            other => Err(Error::InvalidState(format!("cannot activate while {other}"))),
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}
