use wd_core::error::{RatingError, TaskError};
use wd_core::types::{
    CreateProjectInput, CreateTaskInput, InvoicingMethod, ParticipantRole, ProjectFilter,
    ProjectStatus, RatingDenial, RatingRequest, RegisterUserInput, ReviewAction, TaskSeed,
    TaskStatus,
};
use wd_core::{Marketplace, MarketplaceError, RequestContext};
use wd_db::{DbStore, with_test_db};
use wd_events::bus::EventBus;
use wd_events::types::EventSource;

fn marketplace() -> Marketplace<DbStore> {
    let conn = with_test_db().expect("in-memory db");
    Marketplace::new(DbStore::new(conn), EventBus::new(64))
}

fn ctx() -> RequestContext {
    RequestContext::new(EventSource::System, None)
}

struct Fixture {
    core: Marketplace<DbStore>,
    freelancer: wd_core::types::UserId,
    commissioner: wd_core::types::UserId,
    project: wd_core::types::ProjectId,
    tasks: Vec<wd_core::types::TaskId>,
}

fn seeded(invoicing: InvoicingMethod, task_count: usize) -> Fixture {
    let core = marketplace();
    let freelancer = core
        .users()
        .register(
            &ctx(),
            RegisterUserInput {
                display_name: "Mika".to_string(),
            },
        )
        .expect("register freelancer")
        .id;
    let commissioner = core
        .users()
        .register(
            &ctx(),
            RegisterUserInput {
                display_name: "Studio North".to_string(),
            },
        )
        .expect("register commissioner")
        .id;

    let seeds = (1..=task_count)
        .map(|n| TaskSeed {
            title: format!("Deliverable {n}"),
            description: String::new(),
        })
        .collect();
    let (project, tasks) = core
        .projects()
        .activate(
            &ctx(),
            CreateProjectInput {
                organization_id: wd_core::types::OrganizationId::generate(),
                title: "Logo refresh".to_string(),
                freelancer_id: freelancer.clone(),
                commissioner_id: commissioner.clone(),
                invoicing_method: invoicing,
                due_date: None,
            },
            seeds,
        )
        .expect("activate project");

    Fixture {
        core,
        freelancer,
        commissioner,
        project: project.id,
        tasks: tasks.into_iter().map(|task| task.id).collect(),
    }
}

fn submit_and_approve(fx: &Fixture, index: usize) {
    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[index], "https://example.com/work")
        .expect("submit");
    fx.core
        .tasks()
        .review(&ctx(), &fx.tasks[index], ReviewAction::Approve, None)
        .expect("approve");
}

#[test]
fn approvals_drive_percent_and_completion_date() {
    let fx = seeded(InvoicingMethod::Milestone, 3);

    submit_and_approve(&fx, 0);
    assert_eq!(fx.core.projects().progress(&fx.project).unwrap().percent, 33);
    let project = fx.core.projects().get(&fx.project).unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Ongoing);
    assert!(project.completion_date.is_none());

    submit_and_approve(&fx, 1);
    assert_eq!(fx.core.projects().progress(&fx.project).unwrap().percent, 67);

    submit_and_approve(&fx, 2);
    let progress = fx.core.projects().progress(&fx.project).unwrap();
    assert_eq!(progress.percent, 100);
    assert!(progress.all_approved());

    let project = fx.core.projects().get(&fx.project).unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Completed);
    assert!(project.completion_date.is_some());
}

#[test]
fn completion_issues_one_prompt_per_participant() {
    let fx = seeded(InvoicingMethod::Milestone, 2);
    submit_and_approve(&fx, 0);
    assert!(
        fx.core
            .notifications()
            .list_for_project(&fx.project)
            .unwrap()
            .is_empty()
    );

    submit_and_approve(&fx, 1);
    let prompts = fx
        .core
        .notifications()
        .list_for_project(&fx.project)
        .unwrap();
    assert_eq!(prompts.len(), 2);

    let recipients: Vec<_> = prompts
        .iter()
        .map(|prompt| prompt.recipient_user_id.clone())
        .collect();
    assert!(recipients.contains(&fx.freelancer));
    assert!(recipients.contains(&fx.commissioner));
    for prompt in &prompts {
        assert_eq!(prompt.subject_role, prompt.recipient_role.other());
    }
}

#[test]
fn non_milestone_completion_issues_no_prompts() {
    let fx = seeded(InvoicingMethod::Completion, 1);
    submit_and_approve(&fx, 0);

    let project = fx.core.projects().get(&fx.project).unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Completed);
    assert!(
        fx.core
            .notifications()
            .list_for_project(&fx.project)
            .unwrap()
            .is_empty()
    );
}

#[test]
fn recompute_after_completion_adds_nothing() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    for _ in 0..3 {
        fx.core
            .projects()
            .recompute_completion(&ctx(), &fx.project)
            .expect("recompute");
    }

    let prompts = fx
        .core
        .notifications()
        .list_for_project(&fx.project)
        .unwrap();
    assert_eq!(prompts.len(), 2);
}

#[test]
fn rejection_requires_a_comment() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v1")
        .unwrap();

    for comment in [None, Some("   ".to_string())] {
        let err = fx
            .core
            .tasks()
            .review(&ctx(), &fx.tasks[0], ReviewAction::Reject, comment)
            .unwrap_err();
        assert!(matches!(
            err,
            MarketplaceError::Task(TaskError::InvalidInput { .. })
        ));
    }

    fx.core
        .tasks()
        .review(
            &ctx(),
            &fx.tasks[0],
            ReviewAction::Reject,
            Some("wrong palette".to_string()),
        )
        .unwrap();
    let task = fx.core.tasks().get(&fx.tasks[0]).unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Rejected);
    assert_eq!(task.feedback_count, 1);
    assert_eq!(task.rejection_reason.as_deref(), Some("wrong palette"));
}

#[test]
fn paused_project_blocks_first_submission_but_not_resubmission() {
    let fx = seeded(InvoicingMethod::Milestone, 2);

    // Get one task rejected before pausing.
    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v1")
        .unwrap();
    fx.core
        .tasks()
        .review(
            &ctx(),
            &fx.tasks[0],
            ReviewAction::Reject,
            Some("needs revision".to_string()),
        )
        .unwrap();

    fx.core.projects().pause(&ctx(), &fx.project).unwrap();

    let err = fx
        .core
        .tasks()
        .submit(&ctx(), &fx.tasks[1], "https://example.com/other")
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskError::Conflict { .. })
    ));

    let task = fx
        .core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v2")
        .expect("resubmission stays open while paused");
    assert_eq!(task.status, TaskStatus::Submitted);
    assert_eq!(task.version, 2);

    fx.core.projects().resume(&ctx(), &fx.project).unwrap();
    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[1], "https://example.com/other")
        .expect("submission after resume");
}

#[test]
fn out_of_order_review_calls_are_invalid_transitions() {
    let fx = seeded(InvoicingMethod::Milestone, 1);

    let err = fx
        .core
        .tasks()
        .review(&ctx(), &fx.tasks[0], ReviewAction::Approve, None)
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskError::InvalidTransition { .. })
    ));

    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v1")
        .unwrap();
    let err = fx
        .core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v1")
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskError::InvalidTransition { .. })
    ));

    fx.core
        .tasks()
        .review(&ctx(), &fx.tasks[0], ReviewAction::Approve, None)
        .unwrap();
    let err = fx
        .core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "https://example.com/v2")
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskError::InvalidTransition { .. })
    ));
}

#[test]
fn rating_blocked_until_project_completes() {
    let fx = seeded(InvoicingMethod::Milestone, 1);

    let guard = fx
        .core
        .ratings()
        .can_rate(
            &fx.project,
            &fx.freelancer,
            ParticipantRole::Freelancer,
            &fx.commissioner,
            ParticipantRole::Commissioner,
        )
        .unwrap();
    assert!(!guard.can_rate);
    assert_eq!(guard.reason, Some(RatingDenial::ProjectNotCompleted));

    submit_and_approve(&fx, 0);

    let guard = fx
        .core
        .ratings()
        .can_rate(
            &fx.project,
            &fx.freelancer,
            ParticipantRole::Freelancer,
            &fx.commissioner,
            ParticipantRole::Commissioner,
        )
        .unwrap();
    assert!(guard.can_rate);
}

#[test]
fn duplicate_rating_is_rejected() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    let request = RatingRequest {
        project_id: fx.project.clone(),
        rater_user_id: fx.freelancer.clone(),
        rater_role: ParticipantRole::Freelancer,
        subject_user_id: fx.commissioner.clone(),
        subject_role: ParticipantRole::Commissioner,
        rating: 5,
        comment: Some("great brief".to_string()),
    };
    fx.core.ratings().submit(&ctx(), request.clone()).unwrap();

    let err = fx.core.ratings().submit(&ctx(), request).unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Rating(RatingError::AlreadyRated)
    ));

    // The counterpart direction is still open.
    fx.core
        .ratings()
        .submit(
            &ctx(),
            RatingRequest {
                project_id: fx.project.clone(),
                rater_user_id: fx.commissioner.clone(),
                rater_role: ParticipantRole::Commissioner,
                subject_user_id: fx.freelancer.clone(),
                subject_role: ParticipantRole::Freelancer,
                rating: 4,
                comment: None,
            },
        )
        .unwrap();
    assert_eq!(
        fx.core.ratings().list_for_project(&fx.project).unwrap().len(),
        2
    );
}

#[test]
fn low_rating_requires_comment() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    let mut request = RatingRequest {
        project_id: fx.project.clone(),
        rater_user_id: fx.freelancer.clone(),
        rater_role: ParticipantRole::Freelancer,
        subject_user_id: fx.commissioner.clone(),
        subject_role: ParticipantRole::Commissioner,
        rating: 2,
        comment: None,
    };
    let err = fx.core.ratings().submit(&ctx(), request.clone()).unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Rating(RatingError::InvalidInput { .. })
    ));

    request.comment = Some("communication gaps".to_string());
    let rating = fx.core.ratings().submit(&ctx(), request).unwrap();
    assert_eq!(rating.rating, 2);
}

#[test]
fn guard_rejects_outsiders_and_self_rating() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    let outsider = fx
        .core
        .users()
        .register(
            &ctx(),
            RegisterUserInput {
                display_name: "Bystander".to_string(),
            },
        )
        .unwrap()
        .id;

    let guard = fx
        .core
        .ratings()
        .can_rate(
            &fx.project,
            &outsider,
            ParticipantRole::Freelancer,
            &fx.commissioner,
            ParticipantRole::Commissioner,
        )
        .unwrap();
    assert_eq!(guard.reason, Some(RatingDenial::NotParticipant));

    // Roles that line up but rater == subject is impossible for a valid
    // project; a request naming the same user on both ends fails the
    // participant check first.
    let guard = fx
        .core
        .ratings()
        .can_rate(
            &fx.project,
            &fx.freelancer,
            ParticipantRole::Freelancer,
            &fx.freelancer,
            ParticipantRole::Commissioner,
        )
        .unwrap();
    assert!(!guard.can_rate);
}

#[test]
fn tasks_cannot_be_added_to_completed_projects() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    let err = fx
        .core
        .tasks()
        .add(
            &ctx(),
            CreateTaskInput {
                project_id: fx.project.clone(),
                title: "Afterthought".to_string(),
                description: String::new(),
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        MarketplaceError::Task(TaskError::Conflict { .. })
    ));
}

#[test]
fn added_task_reopens_nothing_but_counts_toward_progress() {
    let fx = seeded(InvoicingMethod::Milestone, 1);

    fx.core
        .tasks()
        .add(
            &ctx(),
            CreateTaskInput {
                project_id: fx.project.clone(),
                title: "Extra asset".to_string(),
                description: "Secondary mark".to_string(),
            },
        )
        .unwrap();

    submit_and_approve(&fx, 0);
    let progress = fx.core.projects().progress(&fx.project).unwrap();
    assert_eq!(progress.total, 2);
    assert_eq!(progress.percent, 50);
    let project = fx.core.projects().get(&fx.project).unwrap().unwrap();
    assert_eq!(project.status, ProjectStatus::Ongoing);
}

#[test]
fn events_log_the_full_lifecycle_in_order() {
    let fx = seeded(InvoicingMethod::Milestone, 1);
    submit_and_approve(&fx, 0);

    let records = fx.core.events().list(None, None).unwrap();
    let kinds: Vec<_> = records
        .iter()
        .map(|record| {
            record.body["type"]
                .as_str()
                .expect("tagged body")
                .to_string()
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "UserRegistered",
            "UserRegistered",
            "ProjectActivated",
            "TaskSubmitted",
            "TaskApproved",
            "ProjectCompleted",
            "RatingPromptIssued",
            "RatingPromptIssued",
        ]
    );

    let seqs: Vec<_> = records.iter().map(|record| record.seq).collect();
    assert_eq!(seqs, (1..=records.len() as i64).collect::<Vec<_>>());
}

#[test]
fn project_listing_honors_filters() {
    let core = marketplace();
    let names = ["Mika", "Studio North", "Atlas Press"];
    let users: Vec<_> = names
        .iter()
        .map(|name| {
            core.users()
                .register(
                    &ctx(),
                    RegisterUserInput {
                        display_name: (*name).to_string(),
                    },
                )
                .unwrap()
                .id
        })
        .collect();

    let activate = |org: &wd_core::types::OrganizationId, freelancer: usize, title: &str| {
        core.projects()
            .activate(
                &ctx(),
                CreateProjectInput {
                    organization_id: org.clone(),
                    title: title.to_string(),
                    freelancer_id: users[freelancer].clone(),
                    commissioner_id: users[1].clone(),
                    invoicing_method: InvoicingMethod::Milestone,
                    due_date: None,
                },
                vec![],
            )
            .unwrap()
            .0
            .id
    };
    let org_a = wd_core::types::OrganizationId::generate();
    let org_b = wd_core::types::OrganizationId::generate();
    let first = activate(&org_a, 0, "Logo refresh");
    let second = activate(&org_b, 2, "Print layout");

    core.projects().pause(&ctx(), &second).unwrap();

    let by_participant = core
        .projects()
        .list(ProjectFilter {
            organization_id: None,
            participant_id: Some(users[0].clone()),
            status: None,
        })
        .unwrap();
    assert_eq!(by_participant.len(), 1);
    assert_eq!(by_participant[0].id, first);

    let by_org = core
        .projects()
        .list(ProjectFilter {
            organization_id: Some(org_b.clone()),
            participant_id: None,
            status: None,
        })
        .unwrap();
    assert_eq!(by_org.len(), 1);
    assert_eq!(by_org[0].id, second);

    let paused = core
        .projects()
        .list(ProjectFilter {
            organization_id: None,
            participant_id: Some(users[1].clone()),
            status: Some(vec![ProjectStatus::Paused]),
        })
        .unwrap();
    assert_eq!(paused.len(), 1);
    assert_eq!(paused[0].id, second);

    let none = core
        .projects()
        .list(ProjectFilter {
            organization_id: None,
            participant_id: None,
            status: Some(vec![]),
        })
        .unwrap();
    assert!(none.is_empty());
}

#[test]
fn duplicate_rating_across_connections_hits_unique_key() {
    use wd_core::ratings::RatingRepository;
    use wd_core::types::{ProjectRating, RatingId};
    use wd_core::Store;

    let path = std::env::temp_dir().join(format!("wd-workflow-{}.db", ulid::Ulid::new()));
    let path = path.to_string_lossy().into_owned();

    let core = Marketplace::new(DbStore::open(&path).expect("open db"), EventBus::new(64));
    let freelancer = core
        .users()
        .register(
            &ctx(),
            RegisterUserInput {
                display_name: "Mika".to_string(),
            },
        )
        .unwrap()
        .id;
    let commissioner = core
        .users()
        .register(
            &ctx(),
            RegisterUserInput {
                display_name: "Studio North".to_string(),
            },
        )
        .unwrap()
        .id;
    let (project, tasks) = core
        .projects()
        .activate(
            &ctx(),
            CreateProjectInput {
                organization_id: wd_core::types::OrganizationId::generate(),
                title: "Logo refresh".to_string(),
                freelancer_id: freelancer.clone(),
                commissioner_id: commissioner.clone(),
                invoicing_method: InvoicingMethod::Milestone,
                due_date: None,
            },
            vec![TaskSeed {
                title: "Deliverable".to_string(),
                description: String::new(),
            }],
        )
        .unwrap();
    core.tasks()
        .submit(&ctx(), &tasks[0].id, "https://example.com/work")
        .unwrap();
    core.tasks()
        .review(&ctx(), &tasks[0].id, ReviewAction::Approve, None)
        .unwrap();

    // Two writers that both passed the advisory guard race the insert;
    // the loser must fail on the key, not overwrite.
    let rival = DbStore::open(&path).expect("second connection");
    let rating = || ProjectRating {
        id: RatingId::generate(),
        project_id: project.id.clone(),
        rater_user_id: freelancer.clone(),
        rater_role: ParticipantRole::Freelancer,
        subject_user_id: commissioner.clone(),
        subject_role: ParticipantRole::Commissioner,
        rating: 5,
        comment: None,
        created_at: chrono::Utc::now(),
    };
    core.store().ratings().insert(rating()).unwrap();
    let err = rival.ratings().insert(rating()).unwrap_err();
    assert!(matches!(err, RatingError::AlreadyRated));

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{path}{suffix}"));
    }
}

#[test]
fn submission_requires_http_reference_url() {
    let fx = seeded(InvoicingMethod::Milestone, 1);

    for url in ["", "ftp://example.com/work", "https://", "https://a b"] {
        let err = fx.core.tasks().submit(&ctx(), &fx.tasks[0], url).unwrap_err();
        assert!(matches!(
            err,
            MarketplaceError::Task(TaskError::InvalidInput { .. })
        ));
    }

    fx.core
        .tasks()
        .submit(&ctx(), &fx.tasks[0], "  https://example.com/final  ")
        .expect("surrounding whitespace is trimmed");
}
