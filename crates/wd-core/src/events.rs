use crate::error::MarketplaceError;
use wd_events::types::EventRecord;

pub trait EventRepository {
    /// Assigns `id` and `seq` and appends to the log.
    fn append(&self, record: EventRecord) -> Result<EventRecord, MarketplaceError>;
    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError>;
    fn replay(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError>;
}
