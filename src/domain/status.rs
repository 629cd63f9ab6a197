use serde::{Deserialize, Serialize};
use std::fmt;

/// Rejected status write
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("'{0}' is not a valid status")]
    UnknownStatus(String),
    #[error("Cannot change status from '{from}' to '{to}'")]
    NotAllowed {
        from: String,
        to: String,
        allowed: Vec<&'static str>,
    },
}

/// Lifecycle of a workflow entity, as a declared transition table
pub trait StatusMachine: Sized + Copy + PartialEq + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    /// Statuses reachable in one step
    fn next(&self) -> &'static [Self];

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|s| s.as_str() == value)
    }

    fn is_terminal(&self) -> bool {
        self.next().is_empty()
    }

    /// Same-status writes are no-ops and always pass
    fn can_transition_to(&self, target: Self) -> bool {
        *self == target || self.next().contains(&target)
    }

    fn check(from: &str, to: &str) -> Result<Self, TransitionError> {
        let from_status = Self::parse(from).ok_or_else(|| TransitionError::UnknownStatus(from.to_string()))?;
        let to_status = Self::parse(to).ok_or_else(|| TransitionError::UnknownStatus(to.to_string()))?;
        if from_status.can_transition_to(to_status) {
            Ok(to_status)
        } else {
            Err(TransitionError::NotAllowed {
                from: from.to_string(),
                to: to.to_string(),
                allowed: from_status.next().iter().map(|s| s.as_str()).collect(),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    InProgress,
    Approved,
    Rejected,
    Completed,
}

impl StatusMachine for RequestStatus {
    const ALL: &'static [Self] = &[
        RequestStatus::Pending,
        RequestStatus::InProgress,
        RequestStatus::Approved,
        RequestStatus::Rejected,
        RequestStatus::Completed,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }

    fn next(&self) -> &'static [Self] {
        use RequestStatus::*;
        match self {
            Pending => &[InProgress, Approved, Rejected],
            InProgress => &[Pending, Approved, Rejected, Completed],
            Approved => &[InProgress, Completed],
            Rejected | Completed => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermitStatus {
    Pending,
    UnderReview,
    Approved,
    Rejected,
    Expired,
}

impl StatusMachine for PermitStatus {
    const ALL: &'static [Self] = &[
        PermitStatus::Pending,
        PermitStatus::UnderReview,
        PermitStatus::Approved,
        PermitStatus::Rejected,
        PermitStatus::Expired,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PermitStatus::Pending => "pending",
            PermitStatus::UnderReview => "under_review",
            PermitStatus::Approved => "approved",
            PermitStatus::Rejected => "rejected",
            PermitStatus::Expired => "expired",
        }
    }

    fn next(&self) -> &'static [Self] {
        use PermitStatus::*;
        match self {
            Pending => &[UnderReview, Approved, Rejected],
            UnderReview => &[Pending, Approved, Rejected],
            Approved => &[Expired],
            Rejected | Expired => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Statuses a citizen may pay from
    pub const PAYABLE: &'static [PaymentStatus] = &[PaymentStatus::Pending, PaymentStatus::Failed];
}

impl StatusMachine for PaymentStatus {
    const ALL: &'static [Self] = &[
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
        PaymentStatus::Refunded,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    fn next(&self) -> &'static [Self] {
        use PaymentStatus::*;
        match self {
            Pending => &[Completed, Failed],
            Failed => &[Pending, Completed],
            Completed => &[Refunded],
            Refunded => &[],
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(RequestStatus, PermitStatus, PaymentStatus);

/// Checks a status write on `table`. Tables without a declared
/// transition table accept any value their column allows.
pub fn check_transition(table: &str, from: &str, to: &str) -> Result<(), TransitionError> {
    match table {
        "requests" => RequestStatus::check(from, to).map(|_| ()),
        "permits" => PermitStatus::check(from, to).map(|_| ()),
        "payments" => PaymentStatus::check(from, to).map(|_| ()),
        _ => Ok(()),
    }
}

pub fn has_transition_table(table: &str) -> bool {
    matches!(table, "requests" | "permits" | "payments")
}
