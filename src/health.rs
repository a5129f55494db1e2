use serde::{Deserialize, Serialize};

/// The health status of a single individual.
///
/// Every individual starts `Susceptible`. Growing the exposure pool moves individuals to
/// `Exposed`; those drawn for infection become `Infected` until severity assignment places them in
/// one of the three symptomatic buckets, each of which ends in exactly one terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    #[default]
    Susceptible,
    Exposed,
    Infected,
    Mild,
    SevereRecovering,
    SevereDying,
    Recovered,
    Dead,
}

impl HealthStatus {
    /// Infected individuals that have not yet reached a terminal status.
    #[must_use]
    pub fn is_infected(self) -> bool {
        matches!(
            self,
            Self::Infected | Self::Mild | Self::SevereRecovering | Self::SevereDying
        )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Recovered | Self::Dead)
    }
}

/// Severity assigned at infection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    SevereRecovering,
    SevereDying,
}

impl Severity {
    /// The terminal event this severity resolves with.
    #[must_use]
    pub fn outcome(self) -> TransitionKind {
        match self {
            Severity::Mild | Severity::SevereRecovering => TransitionKind::Recover,
            Severity::SevereDying => TransitionKind::Die,
        }
    }
}

impl From<Severity> for HealthStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Mild => HealthStatus::Mild,
            Severity::SevereRecovering => HealthStatus::SevereRecovering,
            Severity::SevereDying => HealthStatus::SevereDying,
        }
    }
}

/// A terminal transition held in the event schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Recover,
    Die,
}

impl From<TransitionKind> for HealthStatus {
    fn from(kind: TransitionKind) -> Self {
        match kind {
            TransitionKind::Recover => HealthStatus::Recovered,
            TransitionKind::Die => HealthStatus::Dead,
        }
    }
}
