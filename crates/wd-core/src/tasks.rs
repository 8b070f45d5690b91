use crate::error::TaskError;
use crate::types::{CreateTaskInput, ProjectId, Task, TaskId};

pub trait TaskRepository {
    fn create(&self, input: CreateTaskInput) -> Result<Task, TaskError>;
    fn get(&self, id: &TaskId) -> Result<Option<Task>, TaskError>;
    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<Task>, TaskError>;
    /// Moves a task to `Submitted`, recording the deliverable URL and the
    /// submission timestamp. `version` is the caller-computed value (bumped
    /// when this is a resubmission of a rejected task).
    fn submit(&self, id: &TaskId, reference_url: &str, version: u32) -> Result<Task, TaskError>;
    /// Moves a task to `Approved` and marks it completed.
    fn approve(&self, id: &TaskId) -> Result<Task, TaskError>;
    /// Moves a task to `Rejected` with the reviewer's reason;
    /// `feedback_count` is the caller-computed incremented value.
    fn reject(&self, id: &TaskId, reason: &str, feedback_count: u32) -> Result<Task, TaskError>;
}
