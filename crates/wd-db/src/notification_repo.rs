use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use wd_core::error::ProjectError;
use wd_core::notifications::NotificationRepository;
use wd_core::types::enums::ParticipantRole;
use wd_core::types::ids::{NotificationId, ProjectId, UserId};
use wd_core::types::notification::RatingPrompt;

pub struct NotificationRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> NotificationRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, key: &str) -> Result<Vec<RatingPrompt>, ProjectError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let mut rows = stmt.query([key]).map_err(db_err)?;
        let mut prompts = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            prompts.push(map_prompt_row(row)?);
        }
        Ok(prompts)
    }
}

fn db_err(err: impl ToString) -> ProjectError {
    ProjectError::InvalidInput {
        message: err.to_string(),
    }
}

const PROMPT_COLUMNS: &str =
    "id, project_id, recipient_user_id, recipient_role, subject_user_id, subject_role, created_at";

impl<'a> NotificationRepository for NotificationRepo<'a> {
    fn create_rating_prompt(
        &self,
        project_id: &ProjectId,
        recipient_user_id: &UserId,
        recipient_role: ParticipantRole,
        subject_user_id: &UserId,
    ) -> Result<RatingPrompt, ProjectError> {
        let prompt = RatingPrompt {
            id: NotificationId::generate(),
            project_id: project_id.clone(),
            recipient_user_id: recipient_user_id.clone(),
            recipient_role,
            subject_user_id: subject_user_id.clone(),
            subject_role: recipient_role.other(),
            created_at: chrono::Utc::now(),
        };

        let sql = "INSERT INTO notifications (id, project_id, recipient_user_id, recipient_role, subject_user_id, subject_role, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
        let params = (
            prompt.id.as_str(),
            prompt.project_id.as_str(),
            prompt.recipient_user_id.as_str(),
            encode_enum(&prompt.recipient_role).map_err(db_err)?,
            prompt.subject_user_id.as_str(),
            encode_enum(&prompt.subject_role).map_err(db_err)?,
            to_rfc3339(&prompt.created_at),
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(prompt)
    }

    fn list_for_user(&self, user_id: &UserId) -> Result<Vec<RatingPrompt>, ProjectError> {
        let sql = format!(
            "SELECT {PROMPT_COLUMNS} FROM notifications WHERE recipient_user_id = ?1 ORDER BY created_at ASC"
        );
        self.query(&sql, user_id.as_str())
    }

    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<RatingPrompt>, ProjectError> {
        let sql = format!(
            "SELECT {PROMPT_COLUMNS} FROM notifications WHERE project_id = ?1 ORDER BY created_at ASC"
        );
        self.query(&sql, project_id.as_str())
    }
}

fn map_prompt_row(row: &rusqlite::Row<'_>) -> Result<RatingPrompt, ProjectError> {
    let id: String = row.get(0).map_err(db_err)?;
    let project_id: String = row.get(1).map_err(db_err)?;
    let recipient_user_id: String = row.get(2).map_err(db_err)?;
    let recipient_role: String = row.get(3).map_err(db_err)?;
    let subject_user_id: String = row.get(4).map_err(db_err)?;
    let subject_role: String = row.get(5).map_err(db_err)?;
    let created_at: String = row.get(6).map_err(db_err)?;

    Ok(RatingPrompt {
        id: NotificationId::new(id).map_err(db_err)?,
        project_id: ProjectId::new(project_id).map_err(db_err)?,
        recipient_user_id: UserId::new(recipient_user_id).map_err(db_err)?,
        recipient_role: decode_enum(&recipient_role).map_err(db_err)?,
        subject_user_id: UserId::new(subject_user_id).map_err(db_err)?,
        subject_role: decode_enum(&subject_role).map_err(db_err)?,
        created_at: from_rfc3339(&created_at).map_err(db_err)?,
    })
}
