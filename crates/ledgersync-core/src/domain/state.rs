//! Reconciliation engine state machine
//!
//! One explicit finite-state enum replaces the scattered boolean flags
//! (`isOffline`, `isLoading`, `dataLoaded`) of the original design, so
//! invalid combinations cannot be represented.
//!
//! ```text
//!     ┌───────────────┐  begin load  ┌─────────┐  loaded   ┌─────────────────┐
//!     │ Uninitialized │ ───────────► │ Loading │ ────────► │ Ready{conn,act} │
//!     └───────────────┘              └─────────┘           └─────────────────┘
//!             ▲                                                     │
//!             └──────────────────── reset ──────────────────────────┘
//! ```
//!
//! `Ready` carries two orthogonal sub-modes that change independently:
//! connectivity (`Online | Offline`) and activity (`Idle | Syncing`).

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Connectivity sub-mode of a ready engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Mutations are attempted against the remote service
    Online,
    /// Mutations are queued durably for later replay
    Offline,
}

/// Activity sub-mode of a ready engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    /// No replay in progress
    Idle,
    /// Queue replay / authoritative refetch in progress
    Syncing,
}

/// Lifecycle state of the reconciliation engine for one user session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No user data loaded; the engine has not started
    Uninitialized,
    /// Startup protocol in progress (remote fetch or snapshot fallback)
    Loading,
    /// Serving reads and mutations
    Ready {
        connectivity: Connectivity,
        activity: Activity,
    },
}

impl EngineState {
    /// Short state name used in errors and log fields
    pub fn name(&self) -> &'static str {
        match self {
            EngineState::Uninitialized => "Uninitialized",
            EngineState::Loading => "Loading",
            EngineState::Ready { .. } => "Ready",
        }
    }

    /// Returns true if the engine can accept mutations
    pub fn is_ready(&self) -> bool {
        matches!(self, EngineState::Ready { .. })
    }

    /// Returns the connectivity sub-mode, if ready
    pub fn connectivity(&self) -> Option<Connectivity> {
        match self {
            EngineState::Ready { connectivity, .. } => Some(*connectivity),
            _ => None,
        }
    }

    /// Returns the activity sub-mode, if ready
    pub fn activity(&self) -> Option<Activity> {
        match self {
            EngineState::Ready { activity, .. } => Some(*activity),
            _ => None,
        }
    }

    /// Checks whether a transition to `target` is legal
    ///
    /// Legal transitions:
    /// - Uninitialized -> Loading
    /// - Loading -> Ready
    /// - Ready -> Ready (sub-mode changes)
    /// - any state -> Uninitialized (reset / logout)
    pub fn can_transition_to(&self, target: &EngineState) -> bool {
        if matches!(target, EngineState::Uninitialized) {
            return true;
        }
        match (self, target) {
            (EngineState::Uninitialized, EngineState::Loading) => true,
            (EngineState::Loading, EngineState::Ready { .. }) => true,
            (EngineState::Ready { .. }, EngineState::Ready { .. }) => true,
            _ => false,
        }
    }

    /// Attempts to transition to a new state
    ///
    /// # Errors
    /// Returns `DomainError::InvalidState` if the transition is not allowed.
    pub fn transition_to(&mut self, target: EngineState) -> Result<(), DomainError> {
        if !self.can_transition_to(&target) {
            return Err(DomainError::InvalidState {
                from: self.name().to_string(),
                to: target.name().to_string(),
            });
        }
        *self = target;
        Ok(())
    }
}

impl Default for EngineState {
    fn default() -> Self {
        EngineState::Uninitialized
    }
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Uninitialized => write!(f, "uninitialized"),
            EngineState::Loading => write!(f, "loading"),
            EngineState::Ready {
                connectivity,
                activity,
            } => {
                let conn = match connectivity {
                    Connectivity::Online => "online",
                    Connectivity::Offline => "offline",
                };
                let act = match activity {
                    Activity::Idle => "idle",
                    Activity::Syncing => "syncing",
                };
                write!(f, "ready ({conn}, {act})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(connectivity: Connectivity, activity: Activity) -> EngineState {
        EngineState::Ready {
            connectivity,
            activity,
        }
    }

    #[test]
    fn test_default_is_uninitialized() {
        assert_eq!(EngineState::default(), EngineState::Uninitialized);
    }

    #[test]
    fn test_happy_path() {
        let mut state = EngineState::Uninitialized;
        state.transition_to(EngineState::Loading).unwrap();
        state
            .transition_to(ready(Connectivity::Online, Activity::Idle))
            .unwrap();
        assert!(state.is_ready());
        assert_eq!(state.connectivity(), Some(Connectivity::Online));
        assert_eq!(state.activity(), Some(Activity::Idle));
    }

    #[test]
    fn test_sub_modes_change_independently() {
        let mut state = ready(Connectivity::Offline, Activity::Idle);
        state
            .transition_to(ready(Connectivity::Online, Activity::Idle))
            .unwrap();
        state
            .transition_to(ready(Connectivity::Online, Activity::Syncing))
            .unwrap();
        assert_eq!(state.activity(), Some(Activity::Syncing));
    }

    #[test]
    fn test_cannot_skip_loading() {
        let mut state = EngineState::Uninitialized;
        let result = state.transition_to(ready(Connectivity::Online, Activity::Idle));
        assert!(matches!(result, Err(DomainError::InvalidState { .. })));
    }

    #[test]
    fn test_cannot_return_to_loading_from_ready() {
        let mut state = ready(Connectivity::Online, Activity::Idle);
        assert!(state.transition_to(EngineState::Loading).is_err());
    }

    #[test]
    fn test_reset_is_always_legal() {
        for mut state in [
            EngineState::Uninitialized,
            EngineState::Loading,
            ready(Connectivity::Offline, Activity::Syncing),
        ] {
            state.transition_to(EngineState::Uninitialized).unwrap();
            assert_eq!(state, EngineState::Uninitialized);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            ready(Connectivity::Offline, Activity::Syncing).to_string(),
            "ready (offline, syncing)"
        );
        assert_eq!(EngineState::Loading.to_string(), "loading");
    }
}
