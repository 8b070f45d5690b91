use crate::event_repo::EventRepo;
use crate::notification_repo::NotificationRepo;
use crate::project_repo::ProjectRepo;
use crate::rating_repo::RatingRepo;
use crate::task_repo::TaskRepo;
use crate::user_repo::UserRepo;
use rusqlite::Connection;
use wd_core::MarketplaceError;
use wd_core::Store;

/// SQLite-backed [`Store`]. One connection, exclusive transactions via
/// `with_tx`; repositories are cheap borrows of the connection.
pub struct DbStore {
    conn: Connection,
}

impl DbStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn open(path: &str) -> Result<Self, MarketplaceError> {
        let conn = crate::schema::open_and_migrate(path).map_err(internal)?;
        Ok(Self::new(conn))
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn internal(err: impl ToString) -> MarketplaceError {
    MarketplaceError::Internal {
        message: err.to_string(),
    }
}

impl Store for DbStore {
    type Projects<'a> = ProjectRepo<'a>;
    type Tasks<'a> = TaskRepo<'a>;
    type Ratings<'a> = RatingRepo<'a>;
    type Notifications<'a> = NotificationRepo<'a>;
    type Users<'a> = UserRepo<'a>;
    type Events<'a> = EventRepo<'a>;

    fn projects(&self) -> Self::Projects<'_> {
        ProjectRepo::new(&self.conn)
    }

    fn tasks(&self) -> Self::Tasks<'_> {
        TaskRepo::new(&self.conn)
    }

    fn ratings(&self) -> Self::Ratings<'_> {
        RatingRepo::new(&self.conn)
    }

    fn notifications(&self) -> Self::Notifications<'_> {
        NotificationRepo::new(&self.conn)
    }

    fn users(&self) -> Self::Users<'_> {
        UserRepo::new(&self.conn)
    }

    fn events(&self) -> Self::Events<'_> {
        EventRepo::new(&self.conn)
    }

    fn with_tx<F, T>(&self, f: F) -> Result<T, MarketplaceError>
    where
        F: FnOnce(&Self) -> Result<T, MarketplaceError>,
    {
        self.conn
            .execute_batch("BEGIN IMMEDIATE")
            .map_err(internal)?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT").map_err(internal)?;
                Ok(value)
            }
            Err(err) => {
                // Best effort; the original error is the one worth surfacing.
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(err)
            }
        }
    }
}
