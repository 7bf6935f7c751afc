// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::session::StudySession;
use crate::srs::Scheduling;
use crate::types::activity::ActivityType;
use crate::types::timestamp::Timestamp;

pub type DocumentId = i64;
pub type CardId = i64;
pub type SessionId = i64;
pub type MessageId = i64;

/// A document known to the system. The file itself lives elsewhere; the
/// store only tracks its identity and metadata.
#[derive(Clone, Debug, Serialize)]
pub struct Document {
    pub id: DocumentId,
    pub filename: String,
    pub category: String,
    pub summary: Option<String>,
    pub uploaded_at: Timestamp,
}

/// A flashcard with its current scheduling state.
#[derive(Clone, Debug, Serialize)]
pub struct Flashcard {
    pub id: CardId,
    pub document_id: DocumentId,
    pub question: String,
    pub answer: String,
    pub scheduling: Scheduling,
}

/// One entry in a document's chat log.
#[derive(Clone, Debug, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub document_id: DocumentId,
    pub role: String,
    pub content: String,
    pub sent_at: Timestamp,
}

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !probe_schema_exists(&tx)? {
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn in_memory() -> Fallible<Self> {
        Self::new(":memory:")
    }

    // Documents.

    pub fn add_document(
        &self,
        filename: &str,
        category: &str,
        summary: Option<&str>,
        now: Timestamp,
    ) -> Fallible<DocumentId> {
        let conn = self.acquire();
        let sql = "insert into documents (filename, category, summary, uploaded_at) values (?, ?, ?, ?) returning document_id;";
        let id: DocumentId =
            conn.query_row(sql, (filename, category, summary, now), |row| row.get(0))?;
        Ok(id)
    }

    pub fn get_document(&self, id: DocumentId) -> Fallible<Document> {
        let conn = self.acquire();
        let sql = "select document_id, filename, category, summary, uploaded_at from documents where document_id = ?;";
        let doc = conn
            .query_row(sql, [id], |row| {
                Ok(Document {
                    id: row.get(0)?,
                    filename: row.get(1)?,
                    category: row.get(2)?,
                    summary: row.get(3)?,
                    uploaded_at: row.get(4)?,
                })
            })
            .optional()?;
        doc.ok_or_else(|| ErrorReport::not_found(format!("no such document: {id}")))
    }

    pub fn list_documents(&self) -> Fallible<Vec<Document>> {
        let mut documents = Vec::new();
        let conn = self.acquire();
        let sql = "select document_id, filename, category, summary, uploaded_at from documents order by document_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            documents.push(Document {
                id: row.get(0)?,
                filename: row.get(1)?,
                category: row.get(2)?,
                summary: row.get(3)?,
                uploaded_at: row.get(4)?,
            });
        }
        Ok(documents)
    }

    /// Delete a document and everything hanging off it. One transaction:
    /// dependents go first, then the owner, or nothing happens at all.
    pub fn delete_document(&self, id: DocumentId) -> Fallible<()> {
        let mut conn = self.acquire();
        let tx = conn.transaction()?;
        tx.execute("delete from chat_messages where document_id = ?;", [id])?;
        tx.execute("delete from study_sessions where document_id = ?;", [id])?;
        tx.execute("delete from flashcards where document_id = ?;", [id])?;
        let deleted = tx.execute("delete from documents where document_id = ?;", [id])?;
        if deleted == 0 {
            return Err(ErrorReport::not_found(format!("no such document: {id}")));
        }
        tx.commit()?;
        log::debug!("Deleted document {id} and its dependents");
        Ok(())
    }

    /// Change a document's category.
    pub fn update_document_category(&self, id: DocumentId, category: &str) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "update documents set category = ? where document_id = ?;";
        let updated = conn.execute(sql, (category, id))?;
        if updated == 0 {
            return Err(ErrorReport::not_found(format!("no such document: {id}")));
        }
        Ok(())
    }

    // Flashcards.

    pub fn add_card(
        &self,
        document_id: DocumentId,
        question: &str,
        answer: &str,
        scheduling: &Scheduling,
    ) -> Fallible<CardId> {
        let conn = self.acquire();
        let sql = "insert into flashcards (document_id, question, answer, repetitions, ease_factor, interval_days, next_review) values (?, ?, ?, ?, ?, ?, ?) returning card_id;";
        let id: CardId = conn.query_row(
            sql,
            (
                document_id,
                question,
                answer,
                scheduling.repetitions,
                scheduling.ease_factor,
                scheduling.interval_days,
                scheduling.next_review,
            ),
            |row| row.get(0),
        )?;
        Ok(id)
    }

    pub fn get_card(&self, id: CardId) -> Fallible<Flashcard> {
        let conn = self.acquire();
        let sql = "select card_id, document_id, question, answer, repetitions, ease_factor, interval_days, next_review from flashcards where card_id = ?;";
        let card = conn
            .query_row(sql, [id], |row| {
                Ok(Flashcard {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    question: row.get(2)?,
                    answer: row.get(3)?,
                    scheduling: Scheduling {
                        repetitions: row.get(4)?,
                        ease_factor: row.get(5)?,
                        interval_days: row.get(6)?,
                        next_review: row.get(7)?,
                    },
                })
            })
            .optional()?;
        card.ok_or_else(|| ErrorReport::not_found(format!("no such card: {id}")))
    }

    /// Persist a reviewed card's scheduling state. The four fields move as
    /// one unit; there is no partial update.
    pub fn update_card_scheduling(&self, id: CardId, scheduling: &Scheduling) -> Fallible<()> {
        let conn = self.acquire();
        let sql = "update flashcards set repetitions = ?, ease_factor = ?, interval_days = ?, next_review = ? where card_id = ?;";
        let updated = conn.execute(
            sql,
            (
                scheduling.repetitions,
                scheduling.ease_factor,
                scheduling.interval_days,
                scheduling.next_review,
                id,
            ),
        )?;
        if updated == 0 {
            return Err(ErrorReport::not_found(format!("no such card: {id}")));
        }
        Ok(())
    }

    /// The set of cards due at `now`.
    pub fn due_cards(&self, now: Timestamp) -> Fallible<HashSet<CardId>> {
        let mut due = HashSet::new();
        let conn = self.acquire();
        let mut stmt = conn.prepare("select card_id, next_review from flashcards;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let id: CardId = row.get(0)?;
            let next_review: Timestamp = row.get(1)?;
            if next_review <= now {
                due.insert(id);
            }
        }
        Ok(due)
    }

    // Study sessions.

    pub fn insert_session(
        &self,
        document_id: DocumentId,
        activity_type: ActivityType,
        started_at: Timestamp,
    ) -> Fallible<SessionId> {
        let conn = self.acquire();
        let sql = "insert into study_sessions (document_id, activity_type, started_at) values (?, ?, ?) returning session_id;";
        let id: SessionId =
            conn.query_row(sql, (document_id, activity_type, started_at), |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    pub fn get_session(&self, id: SessionId) -> Fallible<StudySession> {
        let conn = self.acquire();
        let sql = "select session_id, document_id, activity_type, started_at, ended_at, duration_seconds from study_sessions where session_id = ?;";
        let session = conn
            .query_row(sql, [id], |row| {
                Ok(StudySession {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    activity_type: row.get(2)?,
                    start_time: row.get(3)?,
                    end_time: row.get(4)?,
                    duration_seconds: row.get(5)?,
                })
            })
            .optional()?;
        session.ok_or_else(|| ErrorReport::not_found(format!("no such session: {id}")))
    }

    /// Persist a session's end state. Guarded so a concurrent close that
    /// lost the race leaves the winner's row untouched; returns whether
    /// this call was the one that wrote.
    pub fn close_session(&self, session: &StudySession) -> Fallible<bool> {
        let conn = self.acquire();
        let sql = "update study_sessions set ended_at = ?, duration_seconds = ? where session_id = ? and ended_at is null;";
        let updated = conn.execute(
            sql,
            (session.end_time, session.duration_seconds, session.id),
        )?;
        Ok(updated > 0)
    }

    /// Every recorded session, oldest first. The analytics engine works
    /// over this snapshot.
    pub fn all_sessions(&self) -> Fallible<Vec<StudySession>> {
        let mut sessions = Vec::new();
        let conn = self.acquire();
        let sql = "select session_id, document_id, activity_type, started_at, ended_at, duration_seconds from study_sessions order by started_at;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            sessions.push(StudySession {
                id: row.get(0)?,
                document_id: row.get(1)?,
                activity_type: row.get(2)?,
                start_time: row.get(3)?,
                end_time: row.get(4)?,
                duration_seconds: row.get(5)?,
            });
        }
        Ok(sessions)
    }

    // Chat log.

    pub fn add_chat_message(
        &self,
        document_id: DocumentId,
        role: &str,
        content: &str,
        now: Timestamp,
    ) -> Fallible<MessageId> {
        let conn = self.acquire();
        let sql = "insert into chat_messages (document_id, role, content, sent_at) values (?, ?, ?, ?) returning message_id;";
        let id: MessageId = conn.query_row(sql, (document_id, role, content, now), |row| {
            row.get(0)
        })?;
        Ok(id)
    }

    pub fn chat_log(&self, document_id: DocumentId) -> Fallible<Vec<ChatMessage>> {
        let mut messages = Vec::new();
        let conn = self.acquire();
        let sql = "select message_id, document_id, role, content, sent_at from chat_messages where document_id = ? order by sent_at, message_id;";
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([document_id])?;
        while let Some(row) = rows.next()? {
            messages.push(ChatMessage {
                id: row.get(0)?,
                document_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                sent_at: row.get(4)?,
            });
        }
        Ok(messages)
    }

    fn acquire(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }
}

fn probe_schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["documents"], |row| row.get(0))?;
    Ok(count > 0)
}
