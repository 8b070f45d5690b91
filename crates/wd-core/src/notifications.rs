use crate::error::ProjectError;
use crate::types::{ParticipantRole, ProjectId, RatingPrompt, UserId};

pub trait NotificationRepository {
    fn create_rating_prompt(
        &self,
        project_id: &ProjectId,
        recipient_user_id: &UserId,
        recipient_role: ParticipantRole,
        subject_user_id: &UserId,
    ) -> Result<RatingPrompt, ProjectError>;
    fn list_for_user(&self, user_id: &UserId) -> Result<Vec<RatingPrompt>, ProjectError>;
    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<RatingPrompt>, ProjectError>;
}
