use clap::{Args, Parser, Subcommand};
use owo_colors::OwoColorize;
use serde_json::json;
use std::path::Path;
use std::str::FromStr;
use wd_core::types::{
    CreateProjectInput, CreateTaskInput, InvoicingMethod, OrganizationId, ParticipantRole,
    ProjectFilter, ProjectId, ProjectStatus, RatingRequest, RegisterUserInput, ReviewAction,
    TaskId, TaskSeed, UserId,
};
use wd_core::{Marketplace, RequestContext};
use wd_db::DbStore;
use wd_events::bus::EventBus;
use wd_events::types::EventSource;

#[derive(Parser)]
#[command(name = "wd", about = "Freelance marketplace project core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(subcommand)]
    User(UserCommand),
    #[command(subcommand)]
    Project(ProjectCommand),
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Rating(RatingCommand),
    /// Pending rating prompts for a user
    Notifications(NotificationsArgs),
    /// The committed event log
    Events(EventsArgs),
}

#[derive(Subcommand)]
enum UserCommand {
    Register { display_name: String },
    Get { id: String },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project with its gig-seeded tasks
    Activate(ActivateArgs),
    Get { id: String },
    List(ListArgs),
    Progress { id: String },
    Pause { id: String },
    Resume { id: String },
    /// Re-derive completion from the task set
    Recompute { id: String },
}

#[derive(Args)]
struct ActivateArgs {
    #[arg(long)]
    organization: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    freelancer: String,
    #[arg(long)]
    commissioner: String,
    /// "milestone" or "completion"
    #[arg(long, default_value = "milestone")]
    invoicing: String,
    /// RFC 3339 timestamp
    #[arg(long)]
    due: Option<String>,
    /// Repeatable; "title" or "title:description"
    #[arg(long = "task")]
    tasks: Vec<String>,
}

#[derive(Args)]
struct ListArgs {
    #[arg(long)]
    organization: Option<String>,
    #[arg(long)]
    participant: Option<String>,
    /// Repeatable; "ongoing", "paused" or "completed"
    #[arg(long = "status")]
    statuses: Vec<String>,
}

#[derive(Subcommand)]
enum TaskCommand {
    Add {
        #[arg(long)]
        project: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    Get {
        id: String,
    },
    List {
        project: String,
    },
    /// Submit a deliverable for review
    Submit {
        id: String,
        #[arg(long)]
        url: String,
    },
    Approve {
        id: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        comment: String,
    },
}

#[derive(Subcommand)]
enum RatingCommand {
    /// Eligibility check without writing anything
    Check(RatingTarget),
    Submit(SubmitRatingArgs),
    ListProject { project: String },
    ListSubject { user: String },
}

#[derive(Args)]
struct RatingTarget {
    #[arg(long)]
    project: String,
    #[arg(long)]
    rater: String,
    /// "freelancer" or "commissioner"
    #[arg(long)]
    rater_role: String,
    #[arg(long)]
    subject: String,
}

#[derive(Args)]
struct SubmitRatingArgs {
    #[command(flatten)]
    target: RatingTarget,
    #[arg(long)]
    rating: u8,
    #[arg(long)]
    comment: Option<String>,
}

#[derive(Args)]
struct NotificationsArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args)]
struct EventsArgs {
    #[arg(long)]
    after: Option<i64>,
    #[arg(long)]
    limit: Option<u32>,
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("{} {err}", "error:".red());
        std::process::exit(1);
    }
}

fn open_marketplace() -> CliResult<Marketplace<DbStore>> {
    let db_path =
        std::env::var("WORKDESK_DB_PATH").unwrap_or_else(|_| ".workdesk/marketplace.db".to_string());
    // parent() yields "" for a bare filename; nothing to create then.
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = DbStore::open(&db_path)?;
    Ok(Marketplace::new(store, EventBus::new(1024)))
}

fn ctx() -> RequestContext {
    RequestContext::new(EventSource::Cli, None)
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_invoicing(value: &str) -> CliResult<InvoicingMethod> {
    match value.to_ascii_lowercase().as_str() {
        "milestone" => Ok(InvoicingMethod::Milestone),
        "completion" => Ok(InvoicingMethod::Completion),
        other => Err(format!("unknown invoicing method: {other}").into()),
    }
}

fn parse_status(value: &str) -> CliResult<ProjectStatus> {
    match value.to_ascii_lowercase().as_str() {
        "ongoing" => Ok(ProjectStatus::Ongoing),
        "paused" => Ok(ProjectStatus::Paused),
        "completed" => Ok(ProjectStatus::Completed),
        other => Err(format!("unknown project status: {other}").into()),
    }
}

fn parse_role(value: &str) -> CliResult<ParticipantRole> {
    match value.to_ascii_lowercase().as_str() {
        "freelancer" => Ok(ParticipantRole::Freelancer),
        "commissioner" => Ok(ParticipantRole::Commissioner),
        other => Err(format!("unknown participant role: {other}").into()),
    }
}

fn parse_seed(value: &str) -> TaskSeed {
    match value.split_once(':') {
        Some((title, description)) => TaskSeed {
            title: title.to_string(),
            description: description.to_string(),
        },
        None => TaskSeed {
            title: value.to_string(),
            description: String::new(),
        },
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let core = open_marketplace()?;
    match cli.command {
        Command::User(command) => run_user(&core, command),
        Command::Project(command) => run_project(&core, command),
        Command::Task(command) => run_task(&core, command),
        Command::Rating(command) => run_rating(&core, command),
        Command::Notifications(args) => {
            let user = UserId::from_str(&args.user)?;
            print_json(&core.notifications().list_for_user(&user)?)
        }
        Command::Events(args) => print_json(&core.events().list(args.after, args.limit)?),
    }
}

fn run_user(core: &Marketplace<DbStore>, command: UserCommand) -> CliResult<()> {
    match command {
        UserCommand::Register { display_name } => {
            let user = core
                .users()
                .register(&ctx(), RegisterUserInput { display_name })?;
            print_json(&user)
        }
        UserCommand::Get { id } => {
            let id = UserId::from_str(&id)?;
            print_json(&core.users().get(&id)?)
        }
    }
}

fn run_project(core: &Marketplace<DbStore>, command: ProjectCommand) -> CliResult<()> {
    match command {
        ProjectCommand::Activate(args) => {
            let due_date = args
                .due
                .as_deref()
                .map(chrono::DateTime::parse_from_rfc3339)
                .transpose()?
                .map(|value| value.with_timezone(&chrono::Utc));
            let input = CreateProjectInput {
                organization_id: OrganizationId::from_str(&args.organization)?,
                title: args.title,
                freelancer_id: UserId::from_str(&args.freelancer)?,
                commissioner_id: UserId::from_str(&args.commissioner)?,
                invoicing_method: parse_invoicing(&args.invoicing)?,
                due_date,
            };
            let seeds = args.tasks.iter().map(|value| parse_seed(value)).collect();
            let (project, tasks) = core.projects().activate(&ctx(), input, seeds)?;
            print_json(&json!({ "project": project, "tasks": tasks }))
        }
        ProjectCommand::Get { id } => {
            let id = ProjectId::from_str(&id)?;
            print_json(&core.projects().get(&id)?)
        }
        ProjectCommand::List(args) => {
            let filter = ProjectFilter {
                organization_id: args
                    .organization
                    .as_deref()
                    .map(OrganizationId::from_str)
                    .transpose()?,
                participant_id: args
                    .participant
                    .as_deref()
                    .map(UserId::from_str)
                    .transpose()?,
                status: if args.statuses.is_empty() {
                    None
                } else {
                    Some(
                        args.statuses
                            .iter()
                            .map(|value| parse_status(value))
                            .collect::<CliResult<Vec<_>>>()?,
                    )
                },
            };
            print_json(&core.projects().list(filter)?)
        }
        ProjectCommand::Progress { id } => {
            let id = ProjectId::from_str(&id)?;
            print_json(&core.projects().progress(&id)?)
        }
        ProjectCommand::Pause { id } => {
            let id = ProjectId::from_str(&id)?;
            print_json(&core.projects().pause(&ctx(), &id)?)
        }
        ProjectCommand::Resume { id } => {
            let id = ProjectId::from_str(&id)?;
            print_json(&core.projects().resume(&ctx(), &id)?)
        }
        ProjectCommand::Recompute { id } => {
            let id = ProjectId::from_str(&id)?;
            print_json(&core.projects().recompute_completion(&ctx(), &id)?)
        }
    }
}

fn run_task(core: &Marketplace<DbStore>, command: TaskCommand) -> CliResult<()> {
    match command {
        TaskCommand::Add {
            project,
            title,
            description,
        } => {
            let input = CreateTaskInput {
                project_id: ProjectId::from_str(&project)?,
                title,
                description,
            };
            print_json(&core.tasks().add(&ctx(), input)?)
        }
        TaskCommand::Get { id } => {
            let id = TaskId::from_str(&id)?;
            print_json(&core.tasks().get(&id)?)
        }
        TaskCommand::List { project } => {
            let project = ProjectId::from_str(&project)?;
            print_json(&core.tasks().list(&project)?)
        }
        TaskCommand::Submit { id, url } => {
            let id = TaskId::from_str(&id)?;
            print_json(&core.tasks().submit(&ctx(), &id, &url)?)
        }
        TaskCommand::Approve { id } => {
            let id = TaskId::from_str(&id)?;
            print_json(&core.tasks().review(&ctx(), &id, ReviewAction::Approve, None)?)
        }
        TaskCommand::Reject { id, comment } => {
            let id = TaskId::from_str(&id)?;
            print_json(&core
                .tasks()
                .review(&ctx(), &id, ReviewAction::Reject, Some(comment))?)
        }
    }
}

fn run_rating(core: &Marketplace<DbStore>, command: RatingCommand) -> CliResult<()> {
    match command {
        RatingCommand::Check(target) => {
            let rater_role = parse_role(&target.rater_role)?;
            let guard = core.ratings().can_rate(
                &ProjectId::from_str(&target.project)?,
                &UserId::from_str(&target.rater)?,
                rater_role,
                &UserId::from_str(&target.subject)?,
                rater_role.other(),
            )?;
            if guard.can_rate {
                println!("{}", "eligible".green());
            } else {
                print_json(&guard)?;
            }
            Ok(())
        }
        RatingCommand::Submit(args) => {
            let rater_role = parse_role(&args.target.rater_role)?;
            let request = RatingRequest {
                project_id: ProjectId::from_str(&args.target.project)?,
                rater_user_id: UserId::from_str(&args.target.rater)?,
                rater_role,
                subject_user_id: UserId::from_str(&args.target.subject)?,
                subject_role: rater_role.other(),
                rating: args.rating,
                comment: args.comment,
            };
            print_json(&core.ratings().submit(&ctx(), request)?)
        }
        RatingCommand::ListProject { project } => {
            let project = ProjectId::from_str(&project)?;
            print_json(&core.ratings().list_for_project(&project)?)
        }
        RatingCommand::ListSubject { user } => {
            let user = UserId::from_str(&user)?;
            print_json(&core.ratings().list_for_subject(&user)?)
        }
    }
}
