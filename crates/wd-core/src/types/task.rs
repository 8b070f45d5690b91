use crate::types::enums::TaskStatus;
use crate::types::ids::{ProjectId, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Always equals `status == Approved`; stored for listing surfaces.
    pub completed: bool,
    /// Starts at 1, incremented on each resubmission after rejection.
    pub version: u32,
    /// Incremented each time a reviewer leaves a rejection comment.
    pub feedback_count: u32,
    pub reference_url: Option<String>,
    /// Non-empty whenever `status == Rejected`.
    pub rejection_reason: Option<String>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
