use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

/// Where the interface stands with respect to its daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
  Unconfigured,
  ConfiguringViaInstaller,
  Connecting,
  Connected,
  ConnectionFailed,
}

impl ConnectionState {
  pub fn can_advance_to(self, next: ConnectionState) -> bool {
    use ConnectionState::*;
    matches!(
      (self, next),
      (Unconfigured, ConfiguringViaInstaller)
        | (Unconfigured, Connecting)
        | (ConfiguringViaInstaller, Connecting)
        | (ConfiguringViaInstaller, ConnectionFailed)
        | (Connecting, Connected)
        | (Connecting, ConnectionFailed)
        | (ConnectionFailed, Connecting)
    )
  }
}

/// Tracks the connection state of one interface session.
#[derive(Debug, Clone)]
pub struct Session {
  state: ConnectionState,
  history: Vec<ConnectionState>,
}

impl Default for Session {
  fn default() -> Self {
    Self {
      state: ConnectionState::Unconfigured,
      history: vec![ConnectionState::Unconfigured],
    }
  }
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> ConnectionState {
    self.state
  }

  pub fn history(&self) -> &[ConnectionState] {
    &self.history
  }

  pub fn advance(&mut self, next: ConnectionState) {
    debug_assert!(
      self.state.can_advance_to(next),
      "illegal connection transition {:?} -> {:?}",
      self.state,
      next
    );
    info!(event = "connection_state", from = ?self.state, to = ?next, "connection state changed");
    self.state = next;
    self.history.push(next);
  }
}

/// One step of the locate/launch state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum LaunchPhase {
  NotAttempted,
  Attempting { attempt: u32 },
  Reachable,
  Unreachable { reason: String },
  Launching,
  Failed { reason: String },
}

impl LaunchPhase {
  pub fn can_advance_to(&self, next: &LaunchPhase) -> bool {
    use LaunchPhase::*;
    match (self, next) {
      (NotAttempted, Attempting { attempt }) => *attempt == 1,
      (Attempting { .. }, Reachable | Unreachable { .. } | Failed { .. }) => true,
      (Attempting { attempt: a }, Attempting { attempt: b }) => *a > 1 && *b == a + 1,
      (Unreachable { .. }, Launching | Failed { .. }) => true,
      (Launching, Attempting { .. } | Failed { .. }) => true,
      _ => false,
    }
  }
}

impl fmt::Display for LaunchPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      LaunchPhase::NotAttempted => f.write_str("not attempted"),
      LaunchPhase::Attempting { attempt } => write!(f, "attempt {attempt}"),
      LaunchPhase::Reachable => f.write_str("reachable"),
      LaunchPhase::Unreachable { reason } => write!(f, "unreachable ({reason})"),
      LaunchPhase::Launching => f.write_str("launching"),
      LaunchPhase::Failed { reason } => write!(f, "failed ({reason})"),
    }
  }
}

/// Ordered record of launch phases, starting at `NotAttempted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseLog {
  phases: Vec<LaunchPhase>,
}

impl Default for PhaseLog {
  fn default() -> Self {
    Self {
      phases: vec![LaunchPhase::NotAttempted],
    }
  }
}

impl PhaseLog {
  pub fn current(&self) -> &LaunchPhase {
    // Never empty: constructed with NotAttempted.
    &self.phases[self.phases.len() - 1]
  }

  pub fn advance(&mut self, next: LaunchPhase) {
    debug_assert!(
      self.current().can_advance_to(&next),
      "illegal launch transition {} -> {}",
      self.current(),
      next
    );
    debug!(event = "launch_phase", from = %self.current(), to = %next, "launch phase changed");
    self.phases.push(next);
  }

  pub fn launched(&self) -> bool {
    self.phases.contains(&LaunchPhase::Launching)
  }

  pub fn into_vec(self) -> Vec<LaunchPhase> {
    self.phases
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn launch_only_follows_unreachable() {
    assert!(
      LaunchPhase::Unreachable {
        reason: "gone".into()
      }
      .can_advance_to(&LaunchPhase::Launching)
    );
    assert!(!LaunchPhase::Attempting { attempt: 1 }.can_advance_to(&LaunchPhase::Launching));
    assert!(!LaunchPhase::NotAttempted.can_advance_to(&LaunchPhase::Launching));
    assert!(!LaunchPhase::Reachable.can_advance_to(&LaunchPhase::Launching));
  }

  #[test]
  fn retry_loop_counts_up_after_launch() {
    let mut log = PhaseLog::default();
    log.advance(LaunchPhase::Attempting { attempt: 1 });
    log.advance(LaunchPhase::Unreachable {
      reason: "refused".into(),
    });
    log.advance(LaunchPhase::Launching);
    log.advance(LaunchPhase::Attempting { attempt: 2 });
    log.advance(LaunchPhase::Attempting { attempt: 3 });
    log.advance(LaunchPhase::Reachable);
    assert!(log.launched());
    assert_eq!(log.current(), &LaunchPhase::Reachable);
    assert!(
      !LaunchPhase::Attempting { attempt: 1 }.can_advance_to(&LaunchPhase::Attempting { attempt: 2 })
    );
  }

  #[test]
  fn session_walks_through_installer() {
    let mut s = Session::new();
    s.advance(ConnectionState::ConfiguringViaInstaller);
    s.advance(ConnectionState::Connecting);
    s.advance(ConnectionState::Connected);
    assert_eq!(s.state(), ConnectionState::Connected);
    assert_eq!(s.history().len(), 4);
    assert!(!ConnectionState::Connected.can_advance_to(ConnectionState::Unconfigured));
  }
}
