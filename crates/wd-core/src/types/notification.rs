use crate::types::enums::ParticipantRole;
use crate::types::ids::{NotificationId, ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One half of the rating-prompt pair issued on the completion edge of a
/// milestone-invoiced project. Delivery and formatting happen elsewhere;
/// this record is the core's whole contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingPrompt {
    pub id: NotificationId,
    pub project_id: ProjectId,
    pub recipient_user_id: UserId,
    pub recipient_role: ParticipantRole,
    pub subject_user_id: UserId,
    pub subject_role: ParticipantRole,
    pub created_at: DateTime<Utc>,
}
