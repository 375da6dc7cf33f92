use crate::Error;
use crate::migrate::Direction;
use chrono::{DateTime, Utc};
use std::fmt::{Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutcomeStatus {
    Success,
    Error,
}

/// The result of one migration step executed during a run.
#[derive(Clone, Debug)]
pub struct MigrationOutcome {
    pub name: String,
    pub direction: Direction,
    pub status: OutcomeStatus,
    pub error_detail: Option<String>,
    /// Milliseconds spent executing the step.
    pub execution_time: u64,
}

impl MigrationOutcome {
    pub(super) fn success(name: &str, direction: Direction, execution_time: u64) -> Self {
        Self {
            name: name.to_string(),
            direction,
            status: OutcomeStatus::Success,
            error_detail: None,
            execution_time,
        }
    }

    pub(super) fn error(
        name: &str,
        direction: Direction,
        error: &Error,
        execution_time: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            direction,
            status: OutcomeStatus::Error,
            error_detail: Some(error.to_string()),
            execution_time,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == OutcomeStatus::Success
    }
}

impl Display for MigrationOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = match self.direction {
            Direction::Up => "executed",
            Direction::Down => "reverted",
        };

        match self.status {
            OutcomeStatus::Success => write!(
                f,
                "Migration \"{}\" was {} successfully ({}ms)",
                self.name, verb, self.execution_time
            ),
            OutcomeStatus::Error => write!(
                f,
                "Failed to execute migration \"{}\": {}",
                self.name,
                self.error_detail.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Aggregate result of a migrator invocation.
///
/// `outcomes` only lists the steps attempted by this invocation. When a step
/// fails, it is the last outcome and `error` references it.
#[derive(Debug, Default)]
pub struct MigrationRun {
    pub outcomes: Vec<MigrationOutcome>,
    pub error: Option<Error>,
}

impl MigrationRun {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Name of the step that stopped the run, if any.
    pub fn failed_migration(&self) -> Option<&str> {
        self.error.as_ref()?;
        self.outcomes
            .iter()
            .rev()
            .find(|o| o.status == OutcomeStatus::Error)
            .map(|o| o.name.as_str())
    }

    /// Names of the steps successfully executed by this run, in order.
    pub fn completed(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.is_success())
            .map(|o| o.name.as_str())
            .collect()
    }
}

/// State of an available migration against the history store.
#[derive(Clone, Debug, PartialEq)]
pub struct MigrationStatus {
    pub name: String,
    pub applied_at: Option<DateTime<Utc>>,
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        self.applied_at.is_some()
    }
}
