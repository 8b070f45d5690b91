use crate::util::{decode_enum, encode_enum, from_rfc3339, to_rfc3339};
use rusqlite::Connection;
use wd_core::MarketplaceError;
use wd_core::events::EventRepository;
use wd_events::types::EventRecord;

pub struct EventRepo<'a> {
    pub conn: &'a Connection,
}

impl<'a> EventRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn query(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE seq > ?1 ORDER BY seq ASC LIMIT ?2"
        );
        let mut stmt = self.conn.prepare(&sql).map_err(db_err)?;
        let after = after.unwrap_or(0);
        let limit = limit.map_or(-1_i64, i64::from);
        let mut rows = stmt.query((after, limit)).map_err(db_err)?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(db_err)? {
            records.push(map_event_row(row)?);
        }
        Ok(records)
    }
}

fn db_err(err: impl ToString) -> MarketplaceError {
    MarketplaceError::Internal {
        message: err.to_string(),
    }
}

const EVENT_COLUMNS: &str = "id, seq, at, correlation_id, source, body_json";

impl<'a> EventRepository for EventRepo<'a> {
    fn append(&self, record: EventRecord) -> Result<EventRecord, MarketplaceError> {
        let mut record = record;
        // Seq is read-then-write; callers run this inside with_tx, so the
        // MAX(seq) we see is still current at insert time.
        let next: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(seq), 0) + 1 FROM events", [], |row| {
                row.get(0)
            })
            .map_err(db_err)?;
        record.seq = next;
        record.id = format!("evt_{}", ulid::Ulid::new());

        let sql = "INSERT INTO events (id, seq, at, correlation_id, source, body_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
        let params = (
            record.id.clone(),
            record.seq,
            to_rfc3339(&record.at),
            record.correlation_id.clone(),
            encode_enum(&record.source).map_err(db_err)?,
            serde_json::to_string(&record.body).map_err(db_err)?,
        );
        self.conn.execute(sql, params).map_err(db_err)?;

        Ok(record)
    }

    fn list(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError> {
        self.query(after, limit)
    }

    fn replay(
        &self,
        after: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<EventRecord>, MarketplaceError> {
        self.query(after, limit)
    }
}

fn map_event_row(row: &rusqlite::Row<'_>) -> Result<EventRecord, MarketplaceError> {
    let id: String = row.get(0).map_err(db_err)?;
    let seq: i64 = row.get(1).map_err(db_err)?;
    let at: String = row.get(2).map_err(db_err)?;
    let correlation_id: Option<String> = row.get(3).map_err(db_err)?;
    let source: String = row.get(4).map_err(db_err)?;
    let body_json: String = row.get(5).map_err(db_err)?;

    Ok(EventRecord {
        id,
        seq,
        at: from_rfc3339(&at).map_err(db_err)?,
        correlation_id,
        source: decode_enum(&source).map_err(db_err)?,
        body: serde_json::from_str(&body_json).map_err(db_err)?,
    })
}
