use crate::error::ProjectError;
use crate::types::{CreateProjectInput, Project, ProjectFilter, ProjectId, ProjectStatus};
use chrono::{DateTime, Utc};

pub trait ProjectRepository {
    fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectError>;
    fn get(&self, id: &ProjectId) -> Result<Option<Project>, ProjectError>;
    fn list(&self, filter: ProjectFilter) -> Result<Vec<Project>, ProjectError>;
    /// Low-level status write. Transition legality is the facade's job;
    /// `completion_date` is only ever supplied on the completion edge.
    fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        completion_date: Option<DateTime<Utc>>,
    ) -> Result<Project, ProjectError>;
}
