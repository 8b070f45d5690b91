use crate::types::enums::ParticipantRole;
use crate::types::ids::{ProjectId, RatingId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable once created. At most one exists per
/// `(project_id, rater_user_id, subject_role)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRating {
    pub id: RatingId,
    pub project_id: ProjectId,
    pub rater_user_id: UserId,
    pub rater_role: ParticipantRole,
    pub subject_user_id: UserId,
    pub subject_role: ParticipantRole,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum RatingDenial {
    ProjectNotFound,
    ProjectNotCompleted,
    NotParticipant,
    SelfRating,
    AlreadyRated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingGuardResult {
    pub can_rate: bool,
    pub reason: Option<RatingDenial>,
}

impl RatingGuardResult {
    pub fn allowed() -> Self {
        Self {
            can_rate: true,
            reason: None,
        }
    }

    pub fn denied(reason: RatingDenial) -> Self {
        Self {
            can_rate: false,
            reason: Some(reason),
        }
    }
}
