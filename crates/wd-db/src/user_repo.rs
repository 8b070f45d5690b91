use crate::util::{from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use wd_core::error::UserError;
use wd_core::types::ids::UserId;
use wd_core::types::io::RegisterUserInput;
use wd_core::types::user::User;
use wd_core::users::UserRepository;

pub struct UserRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> UserRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

fn db_err(err: impl ToString) -> UserError {
    UserError::InvalidInput {
        message: err.to_string(),
    }
}

impl<'a> UserRepository for UserRepo<'a> {
    fn create(&self, input: RegisterUserInput) -> Result<User, UserError> {
        let user = User {
            id: UserId::generate(),
            display_name: input.display_name,
            created_at: chrono::Utc::now(),
        };

        let sql = "INSERT INTO users (id, display_name, created_at) VALUES (?1, ?2, ?3)";
        let params = (
            user.id.as_str(),
            user.display_name.clone(),
            to_rfc3339(&user.created_at),
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(user)
    }

    fn get(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let sql = "SELECT id, display_name, created_at FROM users WHERE id = ?1";
        let mut stmt = self.conn.prepare(sql).map_err(db_err)?;
        let mut rows = stmt.query([id.as_str()]).map_err(db_err)?;
        let Some(row) = rows.next().map_err(db_err)? else {
            return Ok(None);
        };

        let id: String = row.get(0).map_err(db_err)?;
        let display_name: String = row.get(1).map_err(db_err)?;
        let created_at: String = row.get(2).map_err(db_err)?;

        Ok(Some(User {
            id: UserId::new(id).map_err(db_err)?,
            display_name,
            created_at: from_rfc3339(&created_at).map_err(db_err)?,
        }))
    }
}
