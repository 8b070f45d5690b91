pub mod error;
pub mod events;
pub mod marketplace;
pub mod notifications;
pub mod projects;
pub mod ratings;
pub mod store;
pub mod tasks;
pub mod users;
pub mod validation;

pub mod types;

pub use crate::error::MarketplaceError;
pub use crate::marketplace::{Marketplace, RequestContext};
pub use crate::store::Store;
