pub mod enums;
pub mod event;
pub mod ids;
pub mod io;
pub mod notification;
pub mod project;
pub mod rating;
pub mod task;
pub mod user;

pub use enums::{InvoicingMethod, ParticipantRole, ProjectStatus, ReviewAction, TaskStatus};
pub use event::EventBody;
pub use ids::{NotificationId, OrganizationId, ProjectId, RatingId, TaskId, UserId};
pub use io::{
    CreateProjectInput, CreateTaskInput, ProjectFilter, RatingRequest, RegisterUserInput, TaskSeed,
};
pub use notification::RatingPrompt;
pub use project::{Project, ProjectProgress};
pub use rating::{ProjectRating, RatingDenial, RatingGuardResult};
pub use task::Task;
pub use user::User;
