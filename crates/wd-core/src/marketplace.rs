use crate::error::{MarketplaceError, ProjectError, RatingError, TaskError, UserError};
use crate::events::EventRepository;
use crate::notifications::NotificationRepository;
use crate::projects::ProjectRepository;
use crate::ratings::RatingRepository;
use crate::store::Store;
use crate::tasks::TaskRepository;
use crate::types::event::EventBody;
use crate::types::{
    CreateProjectInput, CreateTaskInput, InvoicingMethod, ParticipantRole, Project, ProjectFilter,
    ProjectId, ProjectProgress, ProjectRating, ProjectStatus, RatingDenial, RatingGuardResult,
    RatingId, RatingPrompt, RatingRequest, RegisterUserInput, ReviewAction, Task, TaskId, TaskSeed,
    TaskStatus, User, UserId,
};
use crate::users::UserRepository;
use crate::validation::{
    can_submit, validate_project_status_transition, validate_rating, validate_reference_url,
    validate_rejection_comment, validate_task_status_transition,
};
use chrono::Utc;
use wd_events::bus::EventBus;
use wd_events::types::{EventRecord, EventSource};

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub source: EventSource,
    pub correlation_id: Option<String>,
}

impl RequestContext {
    pub fn new(source: EventSource, correlation_id: Option<String>) -> Self {
        Self {
            source,
            correlation_id,
        }
    }
}

/// Facade over the marketplace core. Every mutation runs inside one store
/// transaction together with its event appends; committed events are then
/// re-published on the bus, best-effort.
pub struct Marketplace<S: Store> {
    store: S,
    event_bus: EventBus,
}

impl<S: Store> Marketplace<S> {
    pub fn new(store: S, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    pub fn projects(&self) -> ProjectsApi<'_, S> {
        ProjectsApi { core: self }
    }

    pub fn tasks(&self) -> TasksApi<'_, S> {
        TasksApi { core: self }
    }

    pub fn ratings(&self) -> RatingsApi<'_, S> {
        RatingsApi { core: self }
    }

    pub fn notifications(&self) -> NotificationsApi<'_, S> {
        NotificationsApi { core: self }
    }

    pub fn users(&self) -> UsersApi<'_, S> {
        UsersApi { core: self }
    }

    pub fn events(&self) -> EventsApi<'_, S> {
        EventsApi { core: self }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn with_events<T, F>(&self, ctx: &RequestContext, f: F) -> Result<T, MarketplaceError>
    where
        F: FnOnce(&S) -> Result<(T, Vec<EventBody>), MarketplaceError>,
    {
        let (value, records) = self.store.with_tx(|store| {
            let (value, bodies) = f(store)?;
            let mut records = Vec::new();
            for body in bodies {
                let record = build_event_record(ctx, body)?;
                let record = store.events().append(record)?;
                records.push(record);
            }
            Ok((value, records))
        })?;
        for record in records {
            let _ = self.event_bus.publish(record);
        }
        Ok(value)
    }
}

pub struct ProjectsApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> ProjectsApi<'a, S> {
    /// Creates a project plus its seeded tasks, as triggered by gig
    /// matching. Both participants must already be registered.
    pub fn activate(
        &self,
        ctx: &RequestContext,
        input: CreateProjectInput,
        seeds: Vec<TaskSeed>,
    ) -> Result<(Project, Vec<Task>), MarketplaceError> {
        self.core.with_events(ctx, |store| {
            if input.title.trim().is_empty() {
                return Err(MarketplaceError::Project(ProjectError::InvalidInput {
                    message: "title required".to_string(),
                }));
            }
            if input.freelancer_id == input.commissioner_id {
                return Err(MarketplaceError::Project(ProjectError::InvalidInput {
                    message: "freelancer and commissioner must differ".to_string(),
                }));
            }
            for user_id in [&input.freelancer_id, &input.commissioner_id] {
                if store.users().get(user_id)?.is_none() {
                    return Err(MarketplaceError::User(UserError::NotFound));
                }
            }

            let project = store.projects().create(input)?;
            let mut tasks = Vec::new();
            for seed in seeds {
                if seed.title.trim().is_empty() {
                    return Err(MarketplaceError::Task(TaskError::InvalidInput {
                        message: "task title required".to_string(),
                    }));
                }
                tasks.push(store.tasks().create(CreateTaskInput {
                    project_id: project.id.clone(),
                    title: seed.title,
                    description: seed.description,
                })?);
            }

            let events = vec![EventBody::ProjectActivated {
                project: project.clone(),
                tasks: tasks.clone(),
            }];
            Ok(((project, tasks), events))
        })
    }

    pub fn get(&self, id: &ProjectId) -> Result<Option<Project>, MarketplaceError> {
        self.core
            .store
            .projects()
            .get(id)
            .map_err(MarketplaceError::from)
    }

    pub fn list(&self, filter: ProjectFilter) -> Result<Vec<Project>, MarketplaceError> {
        self.core
            .store
            .projects()
            .list(filter)
            .map_err(MarketplaceError::from)
    }

    pub fn progress(&self, id: &ProjectId) -> Result<ProjectProgress, MarketplaceError> {
        let project = self
            .core
            .store
            .projects()
            .get(id)?
            .ok_or(ProjectError::NotFound)?;
        let tasks = self.core.store.tasks().list_for_project(&project.id)?;
        Ok(compute_progress(&tasks))
    }

    pub fn pause(&self, ctx: &RequestContext, id: &ProjectId) -> Result<Project, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let project = store.projects().get(id)?.ok_or(ProjectError::NotFound)?;
            validate_project_status_transition(project.status, ProjectStatus::Paused)?;
            if project.status == ProjectStatus::Paused {
                return Ok((project, Vec::new()));
            }
            let updated = store.projects().set_status(id, ProjectStatus::Paused, None)?;
            Ok((
                updated.clone(),
                vec![EventBody::ProjectPaused { project: updated }],
            ))
        })
    }

    pub fn resume(
        &self,
        ctx: &RequestContext,
        id: &ProjectId,
    ) -> Result<Project, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let project = store.projects().get(id)?.ok_or(ProjectError::NotFound)?;
            validate_project_status_transition(project.status, ProjectStatus::Ongoing)?;
            if project.status == ProjectStatus::Ongoing {
                return Ok((project, Vec::new()));
            }
            let updated = store
                .projects()
                .set_status(id, ProjectStatus::Ongoing, None)?;
            Ok((
                updated.clone(),
                vec![EventBody::ProjectResumed { project: updated }],
            ))
        })
    }

    /// Re-derives completion from the task set. Safe to call repeatedly:
    /// the completed transition (and its notification pair) only fires on
    /// the edge where the status actually changes.
    pub fn recompute_completion(
        &self,
        ctx: &RequestContext,
        id: &ProjectId,
    ) -> Result<ProjectProgress, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let project = store.projects().get(id)?.ok_or(ProjectError::NotFound)?;
            settle_completion(store, &project)
        })
    }
}

pub struct TasksApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> TasksApi<'a, S> {
    /// Commissioner adds a task to a live project.
    pub fn add(&self, ctx: &RequestContext, input: CreateTaskInput) -> Result<Task, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let project = store
                .projects()
                .get(&input.project_id)?
                .ok_or(ProjectError::NotFound)?;
            if project.status == ProjectStatus::Completed {
                return Err(MarketplaceError::Task(TaskError::Conflict {
                    message: "project is completed".to_string(),
                }));
            }
            if input.title.trim().is_empty() {
                return Err(MarketplaceError::Task(TaskError::InvalidInput {
                    message: "task title required".to_string(),
                }));
            }
            let task = store.tasks().create(input)?;
            Ok((task.clone(), vec![EventBody::TaskAdded { task }]))
        })
    }

    pub fn get(&self, id: &TaskId) -> Result<Option<Task>, MarketplaceError> {
        self.core
            .store
            .tasks()
            .get(id)
            .map_err(MarketplaceError::from)
    }

    pub fn list(&self, project_id: &ProjectId) -> Result<Vec<Task>, MarketplaceError> {
        self.core
            .store
            .tasks()
            .list_for_project(project_id)
            .map_err(MarketplaceError::from)
    }

    /// Freelancer submits a deliverable for review. A rejected task is
    /// directly resubmittable (version bump); that path stays open while
    /// the project is paused, plain first submissions do not.
    pub fn submit(
        &self,
        ctx: &RequestContext,
        id: &TaskId,
        reference_url: &str,
    ) -> Result<Task, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let task = store.tasks().get(id)?.ok_or(TaskError::NotFound)?;
            let project = store
                .projects()
                .get(&task.project_id)?
                .ok_or(ProjectError::NotFound)?;

            if !can_submit(project.status, task.status) {
                return Err(MarketplaceError::Task(TaskError::Conflict {
                    message: "project is paused".to_string(),
                }));
            }

            validate_task_status_transition(task.status, TaskStatus::Submitted)?;
            let version = if task.status == TaskStatus::Rejected {
                task.version + 1
            } else {
                task.version
            };
            validate_reference_url(reference_url)?;

            let updated = store.tasks().submit(id, reference_url.trim(), version)?;
            Ok((
                updated.clone(),
                vec![EventBody::TaskSubmitted { task: updated }],
            ))
        })
    }

    /// Commissioner reviews a submitted task. Approval recomputes project
    /// completion synchronously in the same transaction, so the completion
    /// edge (and its rating prompts) fires exactly once.
    pub fn review(
        &self,
        ctx: &RequestContext,
        id: &TaskId,
        action: ReviewAction,
        comment: Option<String>,
    ) -> Result<Task, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let task = store.tasks().get(id)?.ok_or(TaskError::NotFound)?;
            let to = match action {
                ReviewAction::Approve => TaskStatus::Approved,
                ReviewAction::Reject => TaskStatus::Rejected,
            };
            validate_task_status_transition(task.status, to)?;

            match action {
                ReviewAction::Reject => {
                    let reason = validate_rejection_comment(comment.as_deref())?;
                    let updated = store.tasks().reject(id, &reason, task.feedback_count + 1)?;
                    Ok((
                        updated.clone(),
                        vec![EventBody::TaskRejected { task: updated }],
                    ))
                }
                ReviewAction::Approve => {
                    let updated = store.tasks().approve(id)?;
                    let project = store
                        .projects()
                        .get(&updated.project_id)?
                        .ok_or(ProjectError::NotFound)?;
                    let (progress, mut completion_events) = settle_completion(store, &project)?;
                    let mut events = vec![EventBody::TaskApproved {
                        task: updated.clone(),
                        progress,
                    }];
                    events.append(&mut completion_events);
                    Ok((updated, events))
                }
            }
        })
    }
}

pub struct RatingsApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> RatingsApi<'a, S> {
    /// Advisory eligibility check. `submit` re-runs the same guard at write
    /// time; a positive answer here is never trusted across the boundary.
    pub fn can_rate(
        &self,
        project_id: &ProjectId,
        rater_user_id: &UserId,
        rater_role: ParticipantRole,
        subject_user_id: &UserId,
        subject_role: ParticipantRole,
    ) -> Result<RatingGuardResult, MarketplaceError> {
        evaluate_rating_guard(
            &self.core.store,
            project_id,
            rater_user_id,
            rater_role,
            subject_user_id,
            subject_role,
        )
    }

    pub fn submit(
        &self,
        ctx: &RequestContext,
        request: RatingRequest,
    ) -> Result<ProjectRating, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            let guard = evaluate_rating_guard(
                store,
                &request.project_id,
                &request.rater_user_id,
                request.rater_role,
                &request.subject_user_id,
                request.subject_role,
            )?;
            if let Some(denial) = guard.reason {
                return Err(MarketplaceError::Rating(denial_error(denial)));
            }
            validate_rating(request.rating, request.comment.as_deref())?;

            let comment = request
                .comment
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty());
            let rating = ProjectRating {
                id: RatingId::generate(),
                project_id: request.project_id,
                rater_user_id: request.rater_user_id,
                rater_role: request.rater_role,
                subject_user_id: request.subject_user_id,
                subject_role: request.subject_role,
                rating: request.rating,
                comment,
                created_at: Utc::now(),
            };
            // The unique key on (project, rater, subject role) backstops the
            // guard against a concurrent duplicate.
            let inserted = store.ratings().insert(rating)?;
            Ok((
                inserted.clone(),
                vec![EventBody::RatingSubmitted { rating: inserted }],
            ))
        })
    }

    pub fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<ProjectRating>, MarketplaceError> {
        self.core
            .store
            .ratings()
            .list_for_project(project_id)
            .map_err(MarketplaceError::from)
    }

    pub fn list_for_subject(
        &self,
        subject_user_id: &UserId,
    ) -> Result<Vec<ProjectRating>, MarketplaceError> {
        self.core
            .store
            .ratings()
            .list_for_subject(subject_user_id)
            .map_err(MarketplaceError::from)
    }
}

pub struct NotificationsApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> NotificationsApi<'a, S> {
    pub fn list_for_user(&self, user_id: &UserId) -> Result<Vec<RatingPrompt>, MarketplaceError> {
        self.core
            .store
            .notifications()
            .list_for_user(user_id)
            .map_err(MarketplaceError::from)
    }

    pub fn list_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<RatingPrompt>, MarketplaceError> {
        self.core
            .store
            .notifications()
            .list_for_project(project_id)
            .map_err(MarketplaceError::from)
    }
}

pub struct UsersApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> UsersApi<'a, S> {
    pub fn register(
        &self,
        ctx: &RequestContext,
        input: RegisterUserInput,
    ) -> Result<User, MarketplaceError> {
        self.core.with_events(ctx, |store| {
            if input.display_name.trim().is_empty() {
                return Err(MarketplaceError::User(UserError::InvalidInput {
                    message: "display name required".to_string(),
                }));
            }
            let user = store.users().create(input)?;
            Ok((user.clone(), vec![EventBody::UserRegistered { user }]))
        })
    }

    pub fn get(&self, id: &UserId) -> Result<Option<User>, MarketplaceError> {
        self.core
            .store
            .users()
            .get(id)
            .map_err(MarketplaceError::from)
    }
}

pub struct EventsApi<'a, S: Store> {
    core: &'a Marketplace<S>,
}

impl<'a, S: Store> EventsApi<'a, S> {
    pub fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError> {
        self.core.store.events().list(after, limit)
    }

    pub fn replay(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError> {
        self.core.store.events().replay(after, limit)
    }
}

fn build_event_record(
    ctx: &RequestContext,
    body: EventBody,
) -> Result<EventRecord, MarketplaceError> {
    let value = serde_json::to_value(body).map_err(|err| MarketplaceError::Internal {
        message: err.to_string(),
    })?;
    Ok(EventRecord {
        id: String::new(),
        seq: 0,
        at: Utc::now(),
        correlation_id: ctx.correlation_id.clone(),
        source: ctx.source,
        body: value,
    })
}

/// Re-derives project completion from its tasks and, on the edge where the
/// status flips to `Completed`, stamps the completion date and issues the
/// rating-prompt pair for milestone-invoiced projects. The caller supplies
/// the transaction; the old-vs-new status comparison here is the only
/// exactly-once guard the prompts have.
fn settle_completion<S: Store>(
    store: &S,
    project: &Project,
) -> Result<(ProjectProgress, Vec<EventBody>), MarketplaceError> {
    let tasks = store.tasks().list_for_project(&project.id)?;
    let progress = compute_progress(&tasks);

    if project.status == ProjectStatus::Completed || !progress.all_approved() {
        return Ok((progress, Vec::new()));
    }

    let completed = store
        .projects()
        .set_status(&project.id, ProjectStatus::Completed, Some(Utc::now()))?;
    let mut events = vec![EventBody::ProjectCompleted {
        project: completed.clone(),
        progress: progress.clone(),
    }];

    if completed.invoicing_method == InvoicingMethod::Milestone {
        let pairs = [
            (
                &completed.freelancer_id,
                ParticipantRole::Freelancer,
                &completed.commissioner_id,
            ),
            (
                &completed.commissioner_id,
                ParticipantRole::Commissioner,
                &completed.freelancer_id,
            ),
        ];
        for (recipient, recipient_role, subject) in pairs {
            let prompt = store.notifications().create_rating_prompt(
                &completed.id,
                recipient,
                recipient_role,
                subject,
            )?;
            events.push(EventBody::RatingPromptIssued { prompt });
        }
    }

    Ok((progress, events))
}

fn compute_progress(tasks: &[Task]) -> ProjectProgress {
    let mut progress = ProjectProgress {
        total: 0,
        approved: 0,
        submitted: 0,
        rejected: 0,
        ongoing: 0,
        percent: 0,
    };
    for task in tasks {
        progress.total += 1;
        match task.status {
            TaskStatus::Approved => progress.approved += 1,
            TaskStatus::Submitted => progress.submitted += 1,
            TaskStatus::Rejected => progress.rejected += 1,
            TaskStatus::Ongoing => progress.ongoing += 1,
        }
    }
    if progress.total > 0 {
        let ratio = 100.0 * f64::from(progress.approved) / f64::from(progress.total);
        progress.percent = ratio.round() as u8;
    }
    progress
}

fn denial_error(denial: RatingDenial) -> RatingError {
    match denial {
        RatingDenial::ProjectNotFound => RatingError::ProjectNotFound,
        RatingDenial::ProjectNotCompleted => RatingError::ProjectNotCompleted,
        RatingDenial::NotParticipant => RatingError::NotParticipant,
        RatingDenial::SelfRating => RatingError::SelfRating,
        RatingDenial::AlreadyRated => RatingError::AlreadyRated,
    }
}

fn participant_id(project: &Project, role: ParticipantRole) -> &UserId {
    match role {
        ParticipantRole::Freelancer => &project.freelancer_id,
        ParticipantRole::Commissioner => &project.commissioner_id,
    }
}

/// The eligibility checks, in fixed order. Completion is re-derived from
/// the task set rather than trusted from the cached status flag, and the
/// already-rated probe goes to storage rather than any in-memory cache.
fn evaluate_rating_guard<S: Store>(
    store: &S,
    project_id: &ProjectId,
    rater_user_id: &UserId,
    rater_role: ParticipantRole,
    subject_user_id: &UserId,
    subject_role: ParticipantRole,
) -> Result<RatingGuardResult, MarketplaceError> {
    let Some(project) = store.projects().get(project_id)? else {
        return Ok(RatingGuardResult::denied(RatingDenial::ProjectNotFound));
    };

    if project.status != ProjectStatus::Completed {
        return Ok(RatingGuardResult::denied(RatingDenial::ProjectNotCompleted));
    }
    let tasks = store.tasks().list_for_project(&project.id)?;
    let all_approved =
        !tasks.is_empty() && tasks.iter().all(|task| task.status == TaskStatus::Approved);
    if !all_approved {
        return Ok(RatingGuardResult::denied(RatingDenial::ProjectNotCompleted));
    }

    let participant = subject_role == rater_role.other()
        && rater_user_id == participant_id(&project, rater_role)
        && subject_user_id == participant_id(&project, subject_role);
    if !participant {
        return Ok(RatingGuardResult::denied(RatingDenial::NotParticipant));
    }

    if rater_user_id == subject_user_id {
        return Ok(RatingGuardResult::denied(RatingDenial::SelfRating));
    }

    if store
        .ratings()
        .exists(project_id, rater_user_id, subject_role)?
    {
        return Ok(RatingGuardResult::denied(RatingDenial::AlreadyRated));
    }

    Ok(RatingGuardResult::allowed())
}
