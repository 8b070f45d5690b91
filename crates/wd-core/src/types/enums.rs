use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ProjectStatus {
    Ongoing,
    Paused,
    Completed,
}

/// `Submitted` is what the review surface shows as "in review".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TaskStatus {
    Ongoing,
    Submitted,
    Approved,
    Rejected,
}

/// Only milestone-invoiced projects participate in rating-prompt
/// notifications on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum InvoicingMethod {
    Milestone,
    Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ParticipantRole {
    Freelancer,
    Commissioner,
}

impl ParticipantRole {
    pub fn other(self) -> Self {
        match self {
            Self::Freelancer => Self::Commissioner,
            Self::Commissioner => Self::Freelancer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReviewAction {
    Approve,
    Reject,
}
