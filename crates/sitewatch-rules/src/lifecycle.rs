//! Alert status state machine.
//!
//! ```text
//! ACTIVE -------> ACKNOWLEDGED <-----> ESCALATED
//!    \                 |                  |
//!     \                v                  v
//!      +----------> RESOLVED (terminal)
//! ```
//!
//! Every edge taken appends one immutable response record; the storage
//! layer calls [`check_transition`] inside the same transaction that
//! writes the record, so no illegal edge can be persisted.

use sitewatch_common::types::AlertStatus;

/// Rejected status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("alert is already {0}")]
    SameStatus(AlertStatus),
    #[error("alert is RESOLVED and cannot change status")]
    Terminal,
    #[error("cannot move alert from {from} to {to}")]
    NotAllowed { from: AlertStatus, to: AlertStatus },
}

/// Statuses reachable from `from` in one step.
pub fn allowed_targets(from: AlertStatus) -> &'static [AlertStatus] {
    match from {
        AlertStatus::Active => &[
            AlertStatus::Acknowledged,
            AlertStatus::Escalated,
            AlertStatus::Resolved,
        ],
        AlertStatus::Acknowledged => &[AlertStatus::Resolved, AlertStatus::Escalated],
        AlertStatus::Escalated => &[AlertStatus::Acknowledged, AlertStatus::Resolved],
        AlertStatus::Resolved => &[],
    }
}

/// Check one edge of the state machine.
///
/// A transition to the current status is rejected: a no-op write would
/// still append a response record and forge the audit trail.
pub fn check_transition(from: AlertStatus, to: AlertStatus) -> Result<(), TransitionError> {
    if from == to {
        return Err(TransitionError::SameStatus(from));
    }
    if from == AlertStatus::Resolved {
        return Err(TransitionError::Terminal);
    }
    if allowed_targets(from).contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed { from, to })
    }
}
