use crate::error::RatingError;
use crate::types::{ParticipantRole, ProjectId, ProjectRating, UserId};

pub trait RatingRepository {
    /// Atomic create-or-fail: a second insert for the same
    /// `(project_id, rater_user_id, subject_role)` key must fail with
    /// `AlreadyRated`, never overwrite.
    fn insert(&self, rating: ProjectRating) -> Result<ProjectRating, RatingError>;
    fn exists(
        &self,
        project_id: &ProjectId,
        rater_user_id: &UserId,
        subject_role: ParticipantRole,
    ) -> Result<bool, RatingError>;
    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<ProjectRating>, RatingError>;
    fn list_for_subject(&self, subject_user_id: &UserId)
    -> Result<Vec<ProjectRating>, RatingError>;
}
