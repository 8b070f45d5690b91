use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use rusqlite::ErrorCode;
use wd_core::error::RatingError;
use wd_core::ratings::RatingRepository;
use wd_core::types::enums::ParticipantRole;
use wd_core::types::ids::{ProjectId, RatingId, UserId};
use wd_core::types::rating::ProjectRating;

pub struct RatingRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> RatingRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, key: &str) -> Result<Vec<ProjectRating>, RatingError> {
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let mut rows = stmt.query([key]).map_err(db_err)?;
        let mut ratings = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            ratings.push(map_rating_row(row)?);
        }
        Ok(ratings)
    }
}

fn db_err(err: impl ToString) -> RatingError {
    RatingError::InvalidInput {
        message: err.to_string(),
    }
}

const RATING_COLUMNS: &str = "id, project_id, rater_user_id, rater_role, subject_user_id, subject_role, rating, comment, created_at";

impl<'a> RatingRepository for RatingRepo<'a> {
    fn insert(&self, rating: ProjectRating) -> Result<ProjectRating, RatingError> {
        let sql = "INSERT INTO ratings (id, project_id, rater_user_id, rater_role, subject_user_id, subject_role, rating, comment, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
        let params = (
            rating.id.as_str(),
            rating.project_id.as_str(),
            rating.rater_user_id.as_str(),
            encode_enum(&rating.rater_role).map_err(db_err)?,
            rating.subject_user_id.as_str(),
            encode_enum(&rating.subject_role).map_err(db_err)?,
            rating.rating,
            rating.comment.clone(),
            to_rfc3339(&rating.created_at),
        );
        // The UNIQUE key on (project_id, rater_user_id, subject_role) is the
        // real duplicate check; a lost race surfaces here, not in the guard.
        match self.conn.execute(sql, params) {
            Ok(_) => Ok(rating),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RatingError::AlreadyRated)
            }
            Err(err) => Err(db_err(err)),
        }
    }

    fn exists(
        &self,
        project_id: &ProjectId,
        rater_user_id: &UserId,
        subject_role: ParticipantRole,
    ) -> Result<bool, RatingError> {
        let sql = "SELECT COUNT(*) FROM ratings WHERE project_id = ?1 AND rater_user_id = ?2 AND subject_role = ?3";
        let count: i64 = self
            .conn
            .query_row(
                sql,
                (
                    project_id.as_str(),
                    rater_user_id.as_str(),
                    encode_enum(&subject_role).map_err(db_err)?,
                ),
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    fn list_for_project(&self, project_id: &ProjectId) -> Result<Vec<ProjectRating>, RatingError> {
        let sql = format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE project_id = ?1 ORDER BY created_at ASC"
        );
        self.query(&sql, project_id.as_str())
    }

    fn list_for_subject(
        &self,
        subject_user_id: &UserId,
    ) -> Result<Vec<ProjectRating>, RatingError> {
        let sql = format!(
            "SELECT {RATING_COLUMNS} FROM ratings WHERE subject_user_id = ?1 ORDER BY created_at ASC"
        );
        self.query(&sql, subject_user_id.as_str())
    }
}

fn map_rating_row(row: &rusqlite::Row<'_>) -> Result<ProjectRating, RatingError> {
    let id: String = row.get(0).map_err(db_err)?;
    let project_id: String = row.get(1).map_err(db_err)?;
    let rater_user_id: String = row.get(2).map_err(db_err)?;
    let rater_role: String = row.get(3).map_err(db_err)?;
    let subject_user_id: String = row.get(4).map_err(db_err)?;
    let subject_role: String = row.get(5).map_err(db_err)?;
    let rating: u8 = row.get(6).map_err(db_err)?;
    let comment: Option<String> = row.get(7).map_err(db_err)?;
    let created_at: String = row.get(8).map_err(db_err)?;

    Ok(ProjectRating {
        id: RatingId::new(id).map_err(db_err)?,
        project_id: ProjectId::new(project_id).map_err(db_err)?,
        rater_user_id: UserId::new(rater_user_id).map_err(db_err)?,
        rater_role: decode_enum(&rater_role).map_err(db_err)?,
        subject_user_id: UserId::new(subject_user_id).map_err(db_err)?,
        subject_role: decode_enum(&subject_role).map_err(db_err)?,
        rating,
        comment,
        created_at: from_rfc3339(&created_at).map_err(db_err)?,
    })
}
