use crate::error::{DomainError, DomainResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle shared by leave applications and essentials orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    #[serde(alias = "Cancelled")]
    Canceled,
}

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Submitter,
    Reviewer,
}

impl ApprovalStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            "canceled" | "cancelled" => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Canceled => "Canceled",
        }
    }

    /// Returns the new status, or `InvalidTransition` with `self` unchanged.
    pub fn transition(self, to: ApprovalStatus, actor: Actor) -> DomainResult<ApprovalStatus> {
        let allowed = match (self, to, actor) {
            (Self::Pending, Self::Approved | Self::Rejected, Actor::Reviewer) => true,
            (Self::Pending, Self::Canceled, Actor::Submitter) => true,
            _ => false,
        };
        if !allowed {
            return Err(DomainError::InvalidTransition {
                from: self.to_string(),
                to: to.to_string(),
            });
        }
        Ok(to)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
