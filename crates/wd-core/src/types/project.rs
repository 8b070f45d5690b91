use crate::types::enums::{InvoicingMethod, ProjectStatus};
use crate::types::ids::{OrganizationId, ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub organization_id: OrganizationId,
    pub title: String,
    pub freelancer_id: UserId,
    pub commissioner_id: UserId,
    pub status: ProjectStatus,
    pub invoicing_method: InvoicingMethod,
    pub due_date: Option<DateTime<Utc>>,
    /// Set exactly once, when the project transitions to `Completed`.
    pub completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Task-derived completion snapshot for a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub total: u32,
    pub approved: u32,
    pub submitted: u32,
    pub rejected: u32,
    pub ongoing: u32,
    pub percent: u8,
}

impl ProjectProgress {
    pub fn all_approved(&self) -> bool {
        self.total > 0 && self.approved == self.total
    }
}
