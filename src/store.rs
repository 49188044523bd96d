use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::ConnectionManager;

use crate::errors::ServerError;
use crate::models::{NewNote, Note};
use crate::schema::notes::dsl::{id, notes, timestamp};

pub type Pool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Durable note storage. Notes are append-only: the only operations are a
/// validated insert and an ordered, bounded read of the newest rows.
pub trait NoteStore: Send + Sync {
    /// Persists a note and returns the stored row with its assigned id and
    /// timestamp. Fails with `ServerError::EmptyContent` before touching
    /// storage when `content` is empty.
    fn insert(&self, content: &str, server_name: &str) -> Result<Note, ServerError>;

    /// Up to `limit` notes, newest first. Ties in timestamp are broken by
    /// id descending so the ordering is deterministic.
    fn recent(&self, limit: i64) -> Result<Vec<Note>, ServerError>;
}

pub struct PgNoteStore {
    pool: Pool,
}

impl PgNoteStore {
    pub fn new(pool: Pool) -> PgNoteStore {
        PgNoteStore { pool }
    }
}

impl NoteStore for PgNoteStore {
    fn insert(&self, content: &str, server_name: &str) -> Result<Note, ServerError> {
        if content.is_empty() {
            return Err(ServerError::EmptyContent);
        }

        let mut connection = self.pool.get()?;
        let note = diesel::insert_into(notes)
            .values(NewNote::now(content.to_string(), server_name.to_string()))
            .get_result::<Note>(&mut connection)?;
        Ok(note)
    }

    fn recent(&self, limit: i64) -> Result<Vec<Note>, ServerError> {
        let mut connection = self.pool.get()?;
        let results = notes
            .order((timestamp.desc(), id.desc()))
            .limit(limit)
            .get_results::<Note>(&mut connection)?;
        Ok(results)
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use chrono::NaiveDateTime;

    use super::*;

    /// In-memory stand-in for `PgNoteStore`, same contract without a
    /// database. Ids are assigned monotonically like a serial column.
    #[derive(Default)]
    pub struct MemoryNoteStore {
        rows: Mutex<Vec<Note>>,
    }

    impl MemoryNoteStore {
        pub fn new() -> MemoryNoteStore {
            MemoryNoteStore::default()
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        /// Inserts a row with an explicit timestamp, for exercising the
        /// timestamp tie-break.
        pub fn insert_at(&self, content: &str, server_name: &str, at: NaiveDateTime) -> Note {
            let mut rows = self.rows.lock().unwrap();
            let note = Note {
                id: rows.len() as i32 + 1,
                content: content.to_string(),
                timestamp: at,
                server_name: server_name.to_string(),
            };
            rows.push(note.clone());
            note
        }
    }

    impl NoteStore for MemoryNoteStore {
        fn insert(&self, content: &str, server_name: &str) -> Result<Note, ServerError> {
            if content.is_empty() {
                return Err(ServerError::EmptyContent);
            }
            Ok(self.insert_at(content, server_name, chrono::Utc::now().naive_utc()))
        }

        fn recent(&self, limit: i64) -> Result<Vec<Note>, ServerError> {
            let rows = self.rows.lock().unwrap();
            let mut results = rows.clone();
            results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
            results.truncate(limit.max(0) as usize);
            Ok(results)
        }
    }
}
