use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use wd_core::error::ProjectError;
use wd_core::projects::ProjectRepository;
use wd_core::types::enums::{InvoicingMethod, ProjectStatus};
use wd_core::types::ids::{OrganizationId, ProjectId, UserId};
use wd_core::types::io::{CreateProjectInput, ProjectFilter};
use wd_core::types::project::Project;

pub struct ProjectRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> ProjectRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn db_err(err: impl ToString) -> ProjectError {
    ProjectError::InvalidInput {
        message: err.to_string(),
    }
}

const PROJECT_COLUMNS: &str = "id, organization_id, title, freelancer_id, commissioner_id, status, invoicing_method, due_date, completion_date, created_at, updated_at";

impl<'a> ProjectRepository for ProjectRepo<'a> {
    fn create(&self, input: CreateProjectInput) -> Result<Project, ProjectError> {
        let now = chrono::Utc::now();
        let project = Project {
            id: ProjectId::generate(),
            organization_id: input.organization_id,
            title: input.title,
            freelancer_id: input.freelancer_id,
            commissioner_id: input.commissioner_id,
            status: ProjectStatus::Ongoing,
            invoicing_method: input.invoicing_method,
            due_date: input.due_date,
            completion_date: None,
            created_at: now,
            updated_at: now,
        };

        let sql = "INSERT INTO projects (id, organization_id, title, freelancer_id, commissioner_id, status, invoicing_method, due_date, completion_date, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";
        let params = (
            project.id.as_str(),
            project.organization_id.as_str(),
            project.title.clone(),
            project.freelancer_id.as_str(),
            project.commissioner_id.as_str(),
            encode_enum(&project.status).map_err(db_err)?,
            encode_enum(&project.invoicing_method).map_err(db_err)?,
            project.due_date.map(|value| to_rfc3339(&value)),
            project.completion_date.map(|value| to_rfc3339(&value)),
            to_rfc3339(&project.created_at),
            to_rfc3339(&project.updated_at),
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(project)
    }

    fn get(&self, id: &ProjectId) -> Result<Option<Project>, ProjectError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1");
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(db_err)?;
        let Some(row) = rows.next().map_err(db_err)? else {
            return Ok(None);
        };
        map_project_row(row).map(Some)
    }

    fn list(&self, filter: ProjectFilter) -> Result<Vec<Project>, ProjectError> {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(org) = &filter.organization_id {
            params.push(Box::new(org.as_str().to_string()));
            clauses.push(format!("organization_id = ?{}", params.len()));
        }
        if let Some(user) = &filter.participant_id {
            params.push(Box::new(user.as_str().to_string()));
            let n = params.len();
            clauses.push(format!("(freelancer_id = ?{n} OR commissioner_id = ?{n})"));
        }
        if let Some(statuses) = &filter.status {
            if statuses.is_empty() {
                return Ok(Vec::new());
            }
            let mut placeholders = Vec::new();
            for status in statuses {
                params.push(Box::new(encode_enum(status).map_err(db_err)?));
                placeholders.push(format!("?{}", params.len()));
            }
            clauses.push(format!("status IN ({})", placeholders.join(", ")));
        }

        let mut sql = format!("SELECT {PROJECT_COLUMNS} FROM projects");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at ASC");

        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let mut rows = stmt
            .query(rusqlite::params_from_iter(params))
            .map_err(db_err)?;
        let mut projects = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            projects.push(map_project_row(row)?);
        }
        Ok(projects)
    }

    fn set_status(
        &self,
        id: &ProjectId,
        status: ProjectStatus,
        completion_date: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<Project, ProjectError> {
        let mut project = self.get(id)?.ok_or(ProjectError::NotFound)?;
        project.status = status;
        if let Some(value) = completion_date {
            project.completion_date = Some(value);
        }
        project.updated_at = chrono::Utc::now();

        let sql =
            "UPDATE projects SET status = ?1, completion_date = ?2, updated_at = ?3 WHERE id = ?4";
        let params = (
            encode_enum(&project.status).map_err(db_err)?,
            project.completion_date.map(|value| to_rfc3339(&value)),
            to_rfc3339(&project.updated_at),
            project.id.as_str(),
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(project)
    }
}

fn map_project_row(row: &rusqlite::Row<'_>) -> Result<Project, ProjectError> {
    let id: String = row.get(0).map_err(db_err)?;
    let organization_id: String = row.get(1).map_err(db_err)?;
    let title: String = row.get(2).map_err(db_err)?;
    let freelancer_id: String = row.get(3).map_err(db_err)?;
    let commissioner_id: String = row.get(4).map_err(db_err)?;
    let status: String = row.get(5).map_err(db_err)?;
    let invoicing_method: String = row.get(6).map_err(db_err)?;
    let due_date: Option<String> = row.get(7).map_err(db_err)?;
    let completion_date: Option<String> = row.get(8).map_err(db_err)?;
    let created_at: String = row.get(9).map_err(db_err)?;
    let updated_at: String = row.get(10).map_err(db_err)?;

    let status: ProjectStatus = decode_enum(&status).map_err(db_err)?;
    let invoicing_method: InvoicingMethod = decode_enum(&invoicing_method).map_err(db_err)?;

    Ok(Project {
        id: ProjectId::new(id).map_err(db_err)?,
        organization_id: OrganizationId::new(organization_id).map_err(db_err)?,
        title,
        freelancer_id: UserId::new(freelancer_id).map_err(db_err)?,
        commissioner_id: UserId::new(commissioner_id).map_err(db_err)?,
        status,
        invoicing_method,
        due_date: due_date
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(db_err)?,
        completion_date: completion_date
            .map(|value| from_rfc3339(&value))
            .transpose()
            .map_err(db_err)?,
        created_at: from_rfc3339(&created_at).map_err(db_err)?,
        updated_at: from_rfc3339(&updated_at).map_err(db_err)?,
    })
}
