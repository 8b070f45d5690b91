use crate::types::notification::RatingPrompt;
use crate::types::project::{Project, ProjectProgress};
use crate::types::rating::ProjectRating;
use crate::types::task::Task;
use crate::types::user::User;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum EventBody {
    ProjectActivated {
        project: Project,
        tasks: Vec<Task>,
    },
    ProjectPaused {
        project: Project,
    },
    ProjectResumed {
        project: Project,
    },
    ProjectCompleted {
        project: Project,
        progress: ProjectProgress,
    },

    TaskAdded {
        task: Task,
    },
    TaskSubmitted {
        task: Task,
    },
    TaskApproved {
        task: Task,
        progress: ProjectProgress,
    },
    TaskRejected {
        task: Task,
    },

    RatingPromptIssued {
        prompt: RatingPrompt,
    },
    RatingSubmitted {
        rating: ProjectRating,
    },

    UserRegistered {
        user: User,
    },
}
