use crate::error::UserError;
use crate::types::{RegisterUserInput, User, UserId};

pub trait UserRepository {
    fn create(&self, input: RegisterUserInput) -> Result<User, UserError>;
    fn get(&self, id: &UserId) -> Result<Option<User>, UserError>;
}
