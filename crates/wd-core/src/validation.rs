use crate::error::{ProjectError, RatingError, TaskError};
use crate::types::enums::{ProjectStatus, TaskStatus};

/// `Rejected -> Submitted` is the resubmission collapse: addressing the
/// feedback and resubmitting happen in one call, so the task never passes
/// through `Ongoing` again.
pub fn validate_task_status_transition(from: TaskStatus, to: TaskStatus) -> Result<(), TaskError> {
    use TaskStatus::{Approved, Ongoing, Rejected, Submitted};

    let valid = matches!(
        (from, to),
        (Ongoing | Rejected, Submitted) | (Submitted, Approved | Rejected)
    );

    if valid {
        Ok(())
    } else {
        Err(TaskError::InvalidTransition { from, to })
    }
}

pub fn validate_project_status_transition(
    from: ProjectStatus,
    to: ProjectStatus,
) -> Result<(), ProjectError> {
    use ProjectStatus::{Completed, Ongoing, Paused};

    // Re-issuing pause/resume is a no-op, not an error.
    if from == to && from != Completed {
        return Ok(());
    }

    let valid = matches!(
        (from, to),
        (Ongoing, Paused) | (Paused, Ongoing) | (Ongoing, Completed) | (Paused, Completed)
    );

    if valid {
        Ok(())
    } else {
        Err(ProjectError::InvalidTransition { from, to })
    }
}

/// Submission-eligibility pre-check. A paused project blocks submissions,
/// except for rejected tasks: the freelancer must be able to address
/// reviewer feedback while the project is paused.
pub fn can_submit(project_status: ProjectStatus, task_status: TaskStatus) -> bool {
    project_status != ProjectStatus::Paused || task_status == TaskStatus::Rejected
}

pub fn validate_reference_url(url: &str) -> Result<(), TaskError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(TaskError::InvalidInput {
            message: "reference url required".to_string(),
        });
    }
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"));
    let valid = match rest {
        Some(rest) => !rest.is_empty() && !rest.chars().any(char::is_whitespace),
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(TaskError::InvalidInput {
            message: format!("malformed reference url: {trimmed}"),
        })
    }
}

pub fn validate_rejection_comment(comment: Option<&str>) -> Result<String, TaskError> {
    match comment.map(str::trim) {
        Some(trimmed) if !trimmed.is_empty() => Ok(trimmed.to_string()),
        _ => Err(TaskError::InvalidInput {
            message: "comment required".to_string(),
        }),
    }
}

/// Range check plus the low-score rule: 1 and 2 star ratings must carry an
/// explanation.
pub fn validate_rating(rating: u8, comment: Option<&str>) -> Result<(), RatingError> {
    if !(1..=5).contains(&rating) {
        return Err(RatingError::InvalidInput {
            message: format!("rating must be between 1 and 5, got {rating}"),
        });
    }
    if rating <= 2 {
        let has_comment = comment.is_some_and(|value| !value.trim().is_empty());
        if !has_comment {
            return Err(RatingError::InvalidInput {
                message: "comment required for ratings of 2 or below".to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_transitions_follow_review_cycle() {
        use TaskStatus::{Approved, Ongoing, Rejected, Submitted};

        assert!(validate_task_status_transition(Ongoing, Submitted).is_ok());
        assert!(validate_task_status_transition(Submitted, Approved).is_ok());
        assert!(validate_task_status_transition(Submitted, Rejected).is_ok());
        // Resubmission goes straight back to review.
        assert!(validate_task_status_transition(Rejected, Submitted).is_ok());

        assert!(validate_task_status_transition(Approved, Submitted).is_err());
        assert!(validate_task_status_transition(Approved, Ongoing).is_err());
        assert!(validate_task_status_transition(Ongoing, Approved).is_err());
        assert!(validate_task_status_transition(Ongoing, Rejected).is_err());
        assert!(validate_task_status_transition(Submitted, Submitted).is_err());
        assert!(validate_task_status_transition(Rejected, Approved).is_err());
        assert!(validate_task_status_transition(Rejected, Ongoing).is_err());
    }

    #[test]
    fn approved_is_terminal() {
        use TaskStatus::{Approved, Ongoing, Rejected, Submitted};

        for to in [Ongoing, Submitted, Rejected, Approved] {
            assert!(validate_task_status_transition(Approved, to).is_err());
        }
    }

    #[test]
    fn project_transitions() {
        use ProjectStatus::{Completed, Ongoing, Paused};

        assert!(validate_project_status_transition(Ongoing, Paused).is_ok());
        assert!(validate_project_status_transition(Paused, Ongoing).is_ok());
        assert!(validate_project_status_transition(Ongoing, Completed).is_ok());
        assert!(validate_project_status_transition(Paused, Completed).is_ok());
        assert!(validate_project_status_transition(Paused, Paused).is_ok());
        assert!(validate_project_status_transition(Ongoing, Ongoing).is_ok());

        assert!(validate_project_status_transition(Completed, Ongoing).is_err());
        assert!(validate_project_status_transition(Completed, Paused).is_err());
        assert!(validate_project_status_transition(Completed, Completed).is_err());
    }

    #[test]
    fn paused_project_blocks_submission_except_rejected_tasks() {
        use ProjectStatus::{Ongoing, Paused};

        assert!(can_submit(Ongoing, TaskStatus::Ongoing));
        assert!(can_submit(Ongoing, TaskStatus::Rejected));
        assert!(can_submit(Paused, TaskStatus::Rejected));
        assert!(!can_submit(Paused, TaskStatus::Ongoing));
        assert!(!can_submit(Paused, TaskStatus::Submitted));
    }

    #[test]
    fn reference_url_rules() {
        assert!(validate_reference_url("https://example.com/work.zip").is_ok());
        assert!(validate_reference_url("http://drive.example/f/123").is_ok());
        assert!(validate_reference_url("").is_err());
        assert!(validate_reference_url("   ").is_err());
        assert!(validate_reference_url("ftp://example.com").is_err());
        assert!(validate_reference_url("https://").is_err());
        assert!(validate_reference_url("https://bad host").is_err());
        assert!(validate_reference_url("just some text").is_err());
    }

    #[test]
    fn rejection_comment_must_not_be_blank() {
        assert!(validate_rejection_comment(None).is_err());
        assert!(validate_rejection_comment(Some("")).is_err());
        assert!(validate_rejection_comment(Some("  ")).is_err());
        assert_eq!(
            validate_rejection_comment(Some(" too sparse ")).unwrap(),
            "too sparse"
        );
    }

    #[test]
    fn low_ratings_require_comment() {
        assert!(validate_rating(0, None).is_err());
        assert!(validate_rating(6, Some("x")).is_err());
        assert!(validate_rating(2, None).is_err());
        assert!(validate_rating(2, Some("   ")).is_err());
        assert!(validate_rating(2, Some("needs more communication")).is_ok());
        assert!(validate_rating(3, None).is_ok());
        assert!(validate_rating(5, None).is_ok());
    }
}
