use crate::types::enums::{ProjectStatus, TaskStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task not found")]
    NotFound,
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
    #[error("conflict: {message}")]
    Conflict { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("project not found")]
    NotFound,
    #[error("invalid transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ProjectStatus,
        to: ProjectStatus,
    },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum RatingError {
    #[error("project not found")]
    ProjectNotFound,
    #[error("project not completed")]
    ProjectNotCompleted,
    #[error("rater or subject is not a project participant")]
    NotParticipant,
    #[error("participants cannot rate themselves")]
    SelfRating,
    #[error("rating already submitted for this project")]
    AlreadyRated,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Rating(#[from] RatingError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error("internal error: {message}")]
    Internal { message: String },
}
