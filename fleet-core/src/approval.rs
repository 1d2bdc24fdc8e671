//! Approval lifecycle for entries that need counter-party sign-off.
//!
//! `PENDING` is the only non-terminal state:
//!
//! ```text
//! PENDING ──► APPROVED
//!    └──────► REJECTED
//! ```
//!
//! Aggregation never validates transitions; it reads whatever status an entry
//! carries. [`apply_action`] is what the action layer uses to refuse invalid ones.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::ledger::{LedgerContext, LedgerEntry};

/// Sub-types raised by a driver against the owner that need sign-off.
const APPROVAL_SUBTYPES: [&str; 2] = ["ADVANCE", "SETTLEMENT"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    #[serde(rename = "PENDING")]
    Pending,
    #[default]
    #[serde(rename = "APPROVED")]
    Approved,
    #[serde(rename = "REJECTED")]
    Rejected,
}

impl ApprovalStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "APPROVED" => Some(Self::Approved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn can_transition_to(&self, target: ApprovalStatus) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Approved) | (Self::Pending, Self::Rejected)
        )
    }

    pub fn transition(self, target: ApprovalStatus) -> Result<ApprovalStatus, ApprovalError> {
        if self.can_transition_to(target) {
            return Ok(target);
        }
        if self.is_terminal() {
            return Err(ApprovalError::NotPending(self));
        }
        Err(ApprovalError::InvalidTransition {
            from: self,
            to: target,
        })
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("entry is already {0}")]
    NotPending(ApprovalStatus),
    #[error("cannot move entry from {from} to {to}")]
    InvalidTransition {
        from: ApprovalStatus,
        to: ApprovalStatus,
    },
    #[error("\"{0}\" entry not found")]
    EntryNotFound(String),
}

/// An approve/reject decision for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalAction {
    pub entry_id: String,
    pub target: ApprovalStatus,
}

impl ApprovalAction {
    pub fn approve(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            target: ApprovalStatus::Approved,
        }
    }

    pub fn reject(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            target: ApprovalStatus::Rejected,
        }
    }
}

/// Driver-ledger advances and settlements go through sign-off.
pub fn requires_approval(entry: &LedgerEntry) -> bool {
    if entry.context() != LedgerContext::DriverLedger {
        return false;
    }
    let category = entry.normalized_category();
    entry
        .subtype()
        .iter()
        .chain(std::iter::once(&category))
        .any(|label| APPROVAL_SUBTYPES.contains(&label.as_str()))
}

/// Status a freshly created entry starts in.
pub fn initial_status(entry: &LedgerEntry) -> ApprovalStatus {
    if requires_approval(entry) {
        ApprovalStatus::Pending
    } else {
        ApprovalStatus::Approved
    }
}

/// Return a new entry set with `action` applied to its target entry.
pub fn apply_action(
    entries: &[LedgerEntry],
    action: &ApprovalAction,
) -> Result<Vec<LedgerEntry>, ApprovalError> {
    let current = entries
        .iter()
        .find(|e| e.id == action.entry_id)
        .ok_or_else(|| ApprovalError::EntryNotFound(action.entry_id.clone()))?;

    let next = current.approval_status.transition(action.target)?;
    tracing::debug!(entry = %action.entry_id, from = %current.approval_status, to = %next, "approval transition");

    Ok(entries
        .iter()
        .map(|e| {
            if e.id == action.entry_id {
                e.clone().with_status(next)
            } else {
                e.clone()
            }
        })
        .collect())
}
