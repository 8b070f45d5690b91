pub mod event_repo;
pub mod notification_repo;
pub mod project_repo;
pub mod rating_repo;
pub mod schema;
pub mod store;
pub mod task_repo;
pub mod user_repo;
pub mod util;

pub use schema::{migrate, open, open_and_migrate, with_test_db};
pub use store::DbStore;
