//! Status transition rules for complaints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AppError, ErrorKind, ErrorSeverity};
use crate::model::{Complaint, ComplaintId, Status};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Transition {
    pub from: Status,
    pub to: Status,
}

/// Which status changes an admin may request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransitionPolicy {
    /// pending → in-progress → resolved, plus the pending → resolved skip.
    #[default]
    ForwardOnly,
    /// Any status to any other, including reopening resolved complaints.
    AdminOverride,
    Custom { allowed: Vec<Transition> },
}

impl TransitionPolicy {
    #[must_use]
    pub fn forward_only() -> Self {
        Self::ForwardOnly
    }

    #[must_use]
    pub fn admin_override() -> Self {
        Self::AdminOverride
    }

    #[must_use]
    pub fn allows(&self, from: Status, to: Status) -> bool {
        if from == to {
            return false;
        }
        match self {
            Self::ForwardOnly => to.stage() > from.stage(),
            Self::AdminOverride => true,
            Self::Custom { allowed } => allowed.contains(&Transition { from, to }),
        }
    }

    /// Targets the admin UI should offer for a complaint in `from`.
    #[must_use]
    pub fn allowed_targets(&self, from: Status) -> Vec<Status> {
        Status::ALL
            .into_iter()
            .filter(|to| self.allows(from, *to))
            .collect()
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("complaint {0} not found")]
    NotFound(ComplaintId),

    #[error("cannot move complaint from {from} to {to}")]
    NotAllowed { from: Status, to: Status },

    #[error("complaint {0} already has a status change in flight")]
    InFlight(ComplaintId),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match &err {
            TransitionError::NotFound(id) => AppError::new(ErrorKind::NotFound, err.to_string())
                .with_context("complaint_id", id.as_str()),
            TransitionError::NotAllowed { from, to } => AppError::new(
                ErrorKind::Validation,
                format!(
                    "A {} complaint cannot be moved to {}.",
                    from.display_name(),
                    to.display_name()
                ),
            )
            .with_internal(err.to_string()),
            TransitionError::InFlight(id) => AppError::new(
                ErrorKind::Conflict,
                "Please wait for the previous status change to finish.",
            )
            .with_severity(ErrorSeverity::Transient)
            .with_context("complaint_id", id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied { from: Status, to: Status },
    Unchanged,
}

/// Moves `complaint` to `target`, stamping lifecycle times with `now`.
///
/// Stamps that are already set are never overwritten. Moving back (only
/// possible under a permissive policy) clears the stamps that no longer
/// apply to the new status.
pub fn apply_transition(
    complaint: &mut Complaint,
    target: Status,
    now: DateTime<Utc>,
    policy: &TransitionPolicy,
) -> Result<TransitionOutcome, TransitionError> {
    let from = complaint.status;
    if from == target {
        return Ok(TransitionOutcome::Unchanged);
    }
    if !policy.allows(from, target) {
        return Err(TransitionError::NotAllowed { from, to: target });
    }

    let stamps = &mut complaint.timestamps;
    match target {
        Status::Pending => {
            stamps.in_progress = None;
            stamps.resolved = None;
        }
        Status::InProgress => {
            stamps.in_progress.get_or_insert(now);
            stamps.resolved = None;
        }
        Status::Resolved => {
            stamps.in_progress.get_or_insert(now);
            stamps.resolved.get_or_insert(now);
        }
    }
    complaint.status = target;

    Ok(TransitionOutcome::Applied { from, to: target })
}
