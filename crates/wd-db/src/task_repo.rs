use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use wd_core::error::TaskError;
use wd_core::tasks::TaskRepository;
use wd_core::types::enums::TaskStatus;
use wd_core::types::ids::{ProjectId, TaskId};
use wd_core::types::io::CreateTaskInput;
use wd_core::types::task::Task;

pub struct TaskRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> TaskRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn require(&self, id: &TaskId) -> Result<Task, TaskError> {
        self.get(id)?.ok_or(TaskError::NotFound)
    }

    fn persist(&self, task: &Task) -> Result<(), TaskError> {
        let sql = "UPDATE tasks SET status = ?1, completed = ?2, version = ?3, feedback_count = ?4, reference_url = ?5, rejection_reason = ?6, submitted_at = ?7, approved_at = ?8, updated_at = ?9 WHERE id = ?10";
        let params = (
            encode_enum(&task.status).map_err(db_err)?,
            task.completed as i64,
            task.version,
            task.feedback_count,
            task.reference_url.clone(),
            task.rejection_reason.clone(),
            task.submitted_at.map(|value| to_rfc3339(&value)),
            task.approved_at.map(|value| to_rfc3339(&value)),
            to_rfc3339(&task.updated_at),
            task.id.as_str(),
        );
        self.conn.execute(sql, params).map_err(db_err)?;
        Ok(())
    }
}

fn db_err(err: impl ToString) -> TaskError {
    TaskError::InvalidInput {
        message: err.to_string(),
    }
}

const TASK_COLUMNS: &str = "id, project_id, title, description, status, completed, version, feedback_count, reference_url, rejection_reason, submitted_at, approved_at, created_at, updated_at";

impl<'a> TaskRepository for TaskRepo<'a> {
    fn create(&self, input: CreateTaskInput) -> Result<Task, TaskError> {
        let now = chrono::Utc::now();
        let task = Task {
            id: TaskId::generate(),
            project_id: input.project_id,
            title: input.title,
            description: input.description,
            status: TaskStatus::Ongoing,
            completed: false,
            version: 1,
            feedback_count: 0,
            reference_url: None,
            rejection_reason: None,
            submitted_at: None,
            approved_at: None,
            created_at: now,
            updated_at: now,
        };

        let sql = "INSERT INTO tasks (id, project_id, title, description, status, completed, version, feedback_count, reference_url, rejection_reason, submitted_at, approved_at, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";
        let params = (
            task.id.as_str(),
            task.project_id.as_str(),
            task.title.clone(),
            task.description.clone(),
            encode_enum(&task.status).map_err(db_err)?,
            task.completed as i64,
            task.version,
            task.feedback_count,
            task.reference_url.clone(),
            task.rejection_reason.clone(),
            task.submitted_at.map(|value| to_rfc3339(&value)),
            task.approved_at.map(|value| to_rfc3339(&value)),
            to_rfc3339(&task.created_at),
            to_rfc3339(&task.updated_at),
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(task)
    }

    fn get(&self, id: &TaskId) -> Result<Option<Task>, TaskError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(db_err)?;
        let Some(row) = rows.next().map_err(db_err)? else {
            return Ok(None);
        };
        map_task_row(row).map(Some)
    }

    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<Task>, TaskError> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE project_id = ?1 ORDER BY created_at ASC");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt.query([project_id.as_str()]).map_err(db_err)?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            tasks.push(map_task_row(row)?);
        }
        Ok(tasks)
    }

    fn submit(&self, id: &TaskId, reference_url: &str, version: u32) -> Result<Task, TaskError> {
        let mut task = self.require(id)?;
        let now = chrono::Utc::now();
        task.status = TaskStatus::Submitted;
        task.version = version;
        task.reference_url = Some(reference_url.to_string());
        task.rejection_reason = None;
        task.submitted_at = Some(now);
        task.updated_at = now;
        self.persist(&task)?;
        Ok(task)
    }

    fn approve(&self, id: &TaskId) -> Result<Task, TaskError> {
        let mut task = self.require(id)?;
        let now = chrono::Utc::now();
        task.status = TaskStatus::Approved;
        task.completed = true;
        task.approved_at = Some(now);
        task.updated_at = now;
        self.persist(&task)?;
        Ok(task)
    }

    fn reject(&self, id: &TaskId, reason: &str, feedback_count: u32) -> Result<Task, TaskError> {
        let mut task = self.require(id)?;
        let now = chrono::Utc::now();
        task.status = TaskStatus::Rejected;
        task.feedback_count = feedback_count;
        task.rejection_reason = Some(reason.to_string());
        task.updated_at = now;
        self.persist(&task)?;
        Ok(task)
    }
}

fn map_task_row(row: &rusqlite::Row<'_>) -> Result<Task, TaskError> {
    let id: String = row.get(0).map_err(db_err)?;
    let project_id: String = row.get(1).map_err(db_err)?;
    let title: String = row.get(2).map_err(db_err)?;
    let description: String = row.get(3).map_err(db_err)?;
    let status: String = row.get(4).map_err(db_err)?;
    let completed: i64 = row.get(5).map_err(db_err)?;
    let version: u32 = row.get(6).map_err(db_err)?;
    let feedback_count: u32 = row.get(7).map_err(db_err)?;
    let reference_url: Option<String> = row.get(8).map_err(db_err)?;
    let rejection_reason: Option<String> = row.get(9).map_err(db_err)?;
    let submitted_at: Option<String> = row.get(10).map_err(db_err)?;
    let approved_at: Option<String> = row.get(11).map_err(db_err)?;
    let created_at: String = row.get(12).map_err(db_err)?;
    let updated_at: String = row.get(13).map_err(db_err)?;

    let status: TaskStatus = decode_enum(&status).map_err(db_err)?;

    Ok(Task {
        id: TaskId::new(id).map_err(db_err)?,
        project_id: ProjectId::new(project_id).map_err(db_err)?,
        title,
        description,
        status,
        completed: completed != 0,
        version,
        feedback_count,
        reference_url,
        rejection_reason,
        submitted_at: submitted_at
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(db_err)?,
        approved_at: approved_at
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(db_err)?,
        created_at: from_rfc3339(&created_at).map_err(db_err)?,
        updated_at: from_rfc3339(&updated_at).map_err(db_err)?,
    })
}
