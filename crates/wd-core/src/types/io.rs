use crate::types::enums::{InvoicingMethod, ParticipantRole, ProjectStatus};
use crate::types::ids::{OrganizationId, ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub organization_id: OrganizationId,
    pub title: String,
    pub freelancer_id: UserId,
    pub commissioner_id: UserId,
    pub invoicing_method: InvoicingMethod,
    pub due_date: Option<DateTime<Utc>>,
}

/// Task shape seeded from the matched gig at activation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSeed {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTaskInput {
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectFilter {
    pub organization_id: Option<OrganizationId>,
    pub participant_id: Option<UserId>,
    pub status: Option<Vec<ProjectStatus>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingRequest {
    pub project_id: ProjectId,
    pub rater_user_id: UserId,
    pub rater_role: ParticipantRole,
    pub subject_user_id: UserId,
    pub subject_role: ParticipantRole,
    pub rating: u8,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterUserInput {
    pub display_name: String,
}
