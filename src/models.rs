use chrono::NaiveDateTime;
use diesel::{Insertable, Queryable};
use serde::{Deserialize, Serialize};

use crate::schema::notes;

/// A stored note. Notes are immutable once written, there is no update or
/// delete path anywhere in the application.
#[derive(Clone, Debug, PartialEq, Queryable, Serialize, Deserialize)]
pub struct Note {
    pub id: i32,
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub server_name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notes)]
pub struct NewNote {
    pub content: String,
    pub timestamp: NaiveDateTime,
    pub server_name: String,
}

impl NewNote {
    pub fn now(content: String, server_name: String) -> NewNote {
        NewNote {
            content,
            timestamp: chrono::Utc::now().naive_utc(),
            server_name,
        }
    }
}
