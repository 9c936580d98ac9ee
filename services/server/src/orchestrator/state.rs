//! Deployment State Machine
//!
//! Closed status enumeration and the single transition table every status
//! change is checked against. STOPPED and FAILED are terminal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Represents the possible states of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    /// Deployment record created, no work started yet
    Pending,
    /// Compiling configuration and building the image
    Building,
    /// Creating and starting the container
    Starting,
    /// Container up and reachable at its endpoint
    Running,
    /// Teardown in progress
    Stopping,
    /// Stopped cleanly
    Stopped,
    /// Lifecycle aborted by an error
    Failed,
}

impl DeploymentStatus {
    /// Terminal states permit no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, DeploymentStatus::Stopped | DeploymentStatus::Failed)
    }

    /// Check if a transition from `self` to `to` is permitted
    pub fn can_transition(self, to: DeploymentStatus) -> bool {
        use DeploymentStatus::*;

        matches!(
            (self, to),
            // Happy path
            (Pending, Building)
                | (Building, Starting)
                | (Starting, Running)
                | (Running, Stopping)
                | (Stopping, Stopped)
                // Failure edges
                | (Building, Failed)
                | (Starting, Failed)
                | (Running, Failed)
                | (Stopping, Failed)
        )
    }
}

impl std::fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Building => "building",
            DeploymentStatus::Starting => "starting",
            DeploymentStatus::Running => "running",
            DeploymentStatus::Stopping => "stopping",
            DeploymentStatus::Stopped => "stopped",
            DeploymentStatus::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeploymentStatus::Pending),
            "building" => Ok(DeploymentStatus::Building),
            "starting" => Ok(DeploymentStatus::Starting),
            "running" => Ok(DeploymentStatus::Running),
            "stopping" => Ok(DeploymentStatus::Stopping),
            "stopped" => Ok(DeploymentStatus::Stopped),
            "failed" => Ok(DeploymentStatus::Failed),
            other => Err(format!("unknown deployment status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeploymentStatus::*;

    const ALL: [DeploymentStatus; 7] =
        [Pending, Building, Starting, Running, Stopping, Stopped, Failed];

    #[test]
    fn test_happy_path() {
        assert!(Pending.can_transition(Building));
        assert!(Building.can_transition(Starting));
        assert!(Starting.can_transition(Running));
        assert!(Running.can_transition(Stopping));
        assert!(Stopping.can_transition(Stopped));
    }

    #[test]
    fn test_failure_edges() {
        assert!(Building.can_transition(Failed));
        assert!(Starting.can_transition(Failed));
        assert!(Running.can_transition(Failed));
        assert!(Stopping.can_transition(Failed));
        // Nothing has failed before work starts
        assert!(!Pending.can_transition(Failed));
    }

    #[test]
    fn test_terminal_states_have_no_successors() {
        for terminal in [Stopped, Failed] {
            assert!(terminal.is_terminal());
            for to in ALL {
                assert!(
                    !terminal.can_transition(to),
                    "{} -> {} must be rejected",
                    terminal,
                    to
                );
            }
        }
    }

    #[test]
    fn test_no_self_transitions() {
        for status in ALL {
            assert!(!status.can_transition(status));
        }
    }

    #[test]
    fn test_roundtrip_display_parse() {
        for status in ALL {
            let parsed: DeploymentStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("bogus".parse::<DeploymentStatus>().is_err());
    }
}
