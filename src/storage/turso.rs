use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use libsql::{params, params_from_iter, Builder, Connection, Database, Row, Value};

use super::{
    model::{
        Abilities, FaqEntry, FaqField, ModeratorStat, NewQuestion, Question, QuestionStats, QuestionStatus, Recipient,
        Role, UserRecord,
    },
    RecordStore, StorageError,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    name TEXT PRIMARY KEY,
    level INTEGER NOT NULL,
    receives_messages INTEGER NOT NULL DEFAULT 0,
    users_handle INTEGER NOT NULL DEFAULT 0,
    users_view INTEGER NOT NULL DEFAULT 0,
    faq_handle INTEGER NOT NULL DEFAULT 0,
    faq_view INTEGER NOT NULL DEFAULT 0,
    questions_handle INTEGER NOT NULL DEFAULT 0,
    questions_view INTEGER NOT NULL DEFAULT 0,
    ask INTEGER NOT NULL DEFAULT 0,
    answer INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    role TEXT NOT NULL REFERENCES roles(name),
    chat_id INTEGER,
    language TEXT,
    context TEXT
);

CREATE TABLE IF NOT EXISTS questions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    chat_id INTEGER NOT NULL,
    message_id INTEGER NOT NULL,
    username TEXT,
    first_name TEXT NOT NULL,
    last_name TEXT,
    text TEXT NOT NULL,
    asked_at INTEGER NOT NULL,
    reserved_at INTEGER,
    answered_at INTEGER,
    status TEXT NOT NULL DEFAULT 'unprocessed',
    reserved_by TEXT
);

CREATE TABLE IF NOT EXISTS faq (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    question TEXT NOT NULL,
    answer TEXT NOT NULL,
    view_count INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO roles VALUES ('developer', 3, 1, 1, 1, 1, 1, 1, 1, 1, 1);
INSERT OR IGNORE INTO roles VALUES ('administrator', 2, 1, 1, 1, 1, 1, 1, 1, 1, 1);
INSERT OR IGNORE INTO roles VALUES ('moderator', 1, 1, 0, 0, 0, 1, 0, 1, 1, 1);
INSERT OR IGNORE INTO roles VALUES ('user', 0, 0, 0, 0, 0, 1, 0, 0, 1, 0);
"#;

const ROLE_COLUMNS: &str = "name, level, receives_messages, users_handle, users_view, faq_handle, faq_view, \
                            questions_handle, questions_view, ask, answer";

const QUESTION_COLUMNS: &str =
    "id, user_id, chat_id, message_id, username, text, asked_at, reserved_at, answered_at, status, reserved_by";

/// libsql-backed record store. One connection is shared by every caller.
#[derive(Clone)]
pub struct TursoStore {
    _db: Arc<Database>,
    conn: Connection,
}

impl TursoStore {
    pub async fn open_remote(url: &str, token: &str) -> Result<Self, StorageError> {
        info!("Connecting to Turso...");
        let db = Builder::new_remote(url.to_string(), token.to_string()).build().await?;
        Self::from_database(db).await
    }

    /// Local database file, or `:memory:`.
    pub async fn open_local(path: &str) -> Result<Self, StorageError> {
        let db = Builder::new_local(path).build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self, StorageError> {
        let conn = db.connect()?;
        let store = Self {
            _db: Arc::new(db),
            conn,
        };
        store.migrate().await?;
        info!("TursoStore ready");
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(SCHEMA).await?;
        Ok(())
    }

    async fn query_all<T>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: impl Fn(&Row) -> Result<T, StorageError>,
    ) -> Result<Vec<T>, StorageError> {
        let mut rows = self.conn.query(sql, params).await?;
        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(map(&row)?);
        }
        Ok(items)
    }

    async fn query_one<T>(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
        map: impl Fn(&Row) -> Result<T, StorageError>,
    ) -> Result<Option<T>, StorageError> {
        let mut rows = self.conn.query(sql, params).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(map(&row)?)),
            None => Ok(None),
        }
    }

    async fn reset_sequence(&self, table: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM sqlite_sequence WHERE name = ?1", [table])
            .await?;
        Ok(())
    }
}

fn flag(row: &Row, idx: i32) -> Result<bool, StorageError> {
    Ok(row.get::<i64>(idx)? != 0)
}

fn role_from_row(row: &Row) -> Result<Role, StorageError> {
    Ok(Role {
        name: row.get::<String>(0)?,
        level: row.get::<i64>(1)?,
        abilities: Abilities {
            receives_messages: flag(row, 2)?,
            users_handle: flag(row, 3)?,
            users_view: flag(row, 4)?,
            faq_handle: flag(row, 5)?,
            faq_view: flag(row, 6)?,
            questions_handle: flag(row, 7)?,
            questions_view: flag(row, 8)?,
            ask: flag(row, 9)?,
            answer: flag(row, 10)?,
        },
    })
}

fn question_from_row(row: &Row) -> Result<Question, StorageError> {
    let status = row.get::<String>(9)?;
    Ok(Question {
        id: row.get::<i64>(0)?,
        user_id: row.get::<i64>(1)?,
        chat_id: row.get::<i64>(2)?,
        message_id: row.get::<i64>(3)? as i32,
        username: row.get::<Option<String>>(4)?,
        text: row.get::<String>(5)?,
        asked_at: row.get::<i64>(6)?,
        reserved_at: row.get::<Option<i64>>(7)?,
        answered_at: row.get::<Option<i64>>(8)?,
        status: QuestionStatus::from_str(&status).map_err(StorageError::Other)?,
        reserved_by: row.get::<Option<String>>(10)?,
    })
}

fn faq_from_row(row: &Row) -> Result<FaqEntry, StorageError> {
    Ok(FaqEntry {
        id: row.get::<i64>(0)?,
        question: row.get::<String>(1)?,
        answer: row.get::<String>(2)?,
        view_count: row.get::<i64>(3)?,
    })
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

#[async_trait]
impl RecordStore for TursoStore {
    async fn find_role(&self, name: &str) -> Result<Option<Role>, StorageError> {
        let sql = format!("SELECT {} FROM roles WHERE name = ?1", ROLE_COLUMNS);
        self.query_one(&sql, [name], role_from_row).await
    }

    async fn list_roles(&self) -> Result<Vec<Role>, StorageError> {
        let sql = format!("SELECT {} FROM roles ORDER BY level DESC", ROLE_COLUMNS);
        self.query_all(&sql, (), role_from_row).await
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserRecord>, StorageError> {
        self.query_one(
            "SELECT username, role, chat_id, language, context FROM users WHERE username = ?1",
            [username],
            |row| {
                Ok(UserRecord {
                    username: row.get::<String>(0)?,
                    role: row.get::<String>(1)?,
                    chat_id: row.get::<Option<i64>>(2)?,
                    language: row.get::<Option<String>>(3)?,
                    context: row.get::<Option<String>>(4)?,
                })
            },
        )
        .await
    }

    async fn upsert_user_role(&self, username: &str, role: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "INSERT INTO users (username, role) VALUES (?1, ?2) \
                 ON CONFLICT(username) DO UPDATE SET role = excluded.role",
                [username, role],
            )
            .await?;
        Ok(())
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM users WHERE username = ?1", [username])
            .await?;
        Ok(affected > 0)
    }

    async fn set_user_chat(&self, username: &str, chat_id: i64) -> Result<(), StorageError> {
        self.conn
            .execute(
                "UPDATE users SET chat_id = ?2 WHERE username = ?1 AND chat_id IS NULL",
                params![username, chat_id],
            )
            .await?;
        Ok(())
    }

    async fn set_user_language(&self, username: &str, language: &str) -> Result<(), StorageError> {
        self.conn
            .execute("UPDATE users SET language = ?2 WHERE username = ?1", [username, language])
            .await?;
        Ok(())
    }

    async fn save_user_context(&self, username: &str, context: &str) -> Result<(), StorageError> {
        self.conn
            .execute("UPDATE users SET context = ?2 WHERE username = ?1", [username, context])
            .await?;
        Ok(())
    }

    async fn list_users(&self) -> Result<Vec<(String, String)>, StorageError> {
        self.query_all(
            "SELECT u.username, u.role FROM users u JOIN roles r ON r.name = u.role \
             ORDER BY r.level DESC, u.username",
            (),
            |row| Ok((row.get::<String>(0)?, row.get::<String>(1)?)),
        )
        .await
    }

    async fn broadcast_recipients(&self) -> Result<Vec<Recipient>, StorageError> {
        self.query_all(
            "SELECT u.username, u.chat_id, u.language FROM users u JOIN roles r ON r.name = u.role \
             WHERE r.receives_messages = 1 AND u.chat_id IS NOT NULL",
            (),
            |row| {
                Ok(Recipient {
                    username: row.get::<String>(0)?,
                    chat_id: row.get::<i64>(1)?,
                    language: row.get::<Option<String>>(2)?,
                })
            },
        )
        .await
    }

    async fn insert_question(&self, question: &NewQuestion) -> Result<i64, StorageError> {
        self.query_one(
            "INSERT INTO questions (user_id, chat_id, message_id, username, first_name, last_name, text, asked_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) RETURNING id",
            params![
                question.user_id,
                question.chat_id,
                question.message_id as i64,
                optional_text(&question.username),
                question.first_name.clone(),
                optional_text(&question.last_name),
                question.text.clone(),
                question.asked_at
            ],
            |row| Ok(row.get::<i64>(0)?),
        )
        .await?
        .ok_or_else(|| StorageError::Other("Question insert returned no id".into()))
    }

    async fn reserve_next_question(
        &self,
        moderator: &str,
        now: i64,
        lease_secs: i64,
        excluded: &[i64],
    ) -> Result<Option<Question>, StorageError> {
        let exclusion = if excluded.is_empty() {
            String::new()
        } else {
            let placeholders = (0..excluded.len())
                .map(|i| format!("?{}", i + 4))
                .collect::<Vec<_>>()
                .join(", ");
            format!("AND id NOT IN ({})", placeholders)
        };

        let sql = format!(
            "UPDATE questions SET status = 'reserved', reserved_by = ?1, reserved_at = ?2 \
             WHERE id = (SELECT id FROM questions \
                 WHERE (status = 'unprocessed' \
                     OR (status = 'reserved' AND (reserved_at <= ?3 OR reserved_by = ?1))) \
                 {} ORDER BY id LIMIT 1) \
             RETURNING {}",
            exclusion, QUESTION_COLUMNS
        );

        let mut values = vec![
            Value::Text(moderator.to_string()),
            Value::Integer(now),
            Value::Integer(now - lease_secs),
        ];
        values.extend(excluded.iter().map(|id| Value::Integer(*id)));

        self.query_one(&sql, params_from_iter(values), question_from_row).await
    }

    async fn release_question(&self, id: i64, moderator: &str) -> Result<(), StorageError> {
        self.conn
            .execute(
                "UPDATE questions SET status = 'unprocessed', reserved_by = NULL, reserved_at = NULL \
                 WHERE id = ?1 AND status = 'reserved' AND reserved_by = ?2",
                params![id, moderator],
            )
            .await?;
        Ok(())
    }

    async fn find_reserved_question(&self, id: i64, moderator: &str) -> Result<Option<Question>, StorageError> {
        let sql = format!(
            "SELECT {} FROM questions WHERE id = ?1 AND status = 'reserved' AND reserved_by = ?2",
            QUESTION_COLUMNS
        );
        self.query_one(&sql, params![id, moderator], question_from_row).await
    }

    async fn mark_answered(&self, id: i64, moderator: &str, now: i64) -> Result<bool, StorageError> {
        let affected = self
            .conn
            .execute(
                "UPDATE questions SET status = 'answered', answered_at = ?3 \
                 WHERE id = ?1 AND status = 'reserved' AND reserved_by = ?2",
                params![id, moderator, now],
            )
            .await?;
        Ok(affected > 0)
    }

    async fn reset_reservations(&self) -> Result<u64, StorageError> {
        let affected = self
            .conn
            .execute(
                "UPDATE questions SET status = 'unprocessed', reserved_by = NULL, reserved_at = NULL \
                 WHERE status = 'reserved'",
                (),
            )
            .await?;
        Ok(affected)
    }

    async fn question_stats(&self, now: i64, lease_secs: i64) -> Result<QuestionStats, StorageError> {
        let stats = self
            .query_one(
                "SELECT COUNT(*), \
                     SUM(CASE WHEN status = 'unprocessed' OR (status = 'reserved' AND reserved_at <= ?1) \
                         THEN 1 ELSE 0 END), \
                     SUM(CASE WHEN status = 'reserved' AND reserved_at > ?1 THEN 1 ELSE 0 END), \
                     SUM(CASE WHEN status = 'answered' THEN 1 ELSE 0 END), \
                     AVG(CASE WHEN status = 'answered' THEN CAST(answered_at - asked_at AS REAL) END) \
                 FROM questions",
                [now - lease_secs],
                |row| {
                    Ok(QuestionStats {
                        total: row.get::<i64>(0)?,
                        unanswered: row.get::<Option<i64>>(1)?.unwrap_or(0),
                        reserved: row.get::<Option<i64>>(2)?.unwrap_or(0),
                        answered: row.get::<Option<i64>>(3)?.unwrap_or(0),
                        mean_resolution_secs: row.get::<Option<f64>>(4)?,
                    })
                },
            )
            .await?;
        Ok(stats.unwrap_or_default())
    }

    async fn count_questions(&self) -> Result<i64, StorageError> {
        let count = self
            .query_one("SELECT COUNT(*) FROM questions", (), |row| Ok(row.get::<i64>(0)?))
            .await?;
        Ok(count.unwrap_or(0))
    }

    async fn recent_questions(&self, limit: i64) -> Result<Vec<String>, StorageError> {
        self.query_all(
            "SELECT text FROM questions ORDER BY id DESC LIMIT ?1",
            [limit],
            |row| Ok(row.get::<String>(0)?),
        )
        .await
    }

    async fn clear_questions(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM questions", ()).await?;
        self.reset_sequence("questions").await
    }

    async fn moderator_stats(&self) -> Result<Vec<ModeratorStat>, StorageError> {
        self.query_all(
            "SELECT reserved_by, COUNT(*) AS answered FROM questions \
             WHERE status = 'answered' AND reserved_by IS NOT NULL \
             GROUP BY reserved_by ORDER BY answered DESC, reserved_by",
            (),
            |row| {
                Ok(ModeratorStat {
                    username: row.get::<String>(0)?,
                    answered: row.get::<i64>(1)?,
                })
            },
        )
        .await
    }

    async fn insert_faq(&self, question: &str, answer: &str) -> Result<i64, StorageError> {
        self.query_one(
            "INSERT INTO faq (question, answer) VALUES (?1, ?2) RETURNING id",
            [question, answer],
            |row| Ok(row.get::<i64>(0)?),
        )
        .await?
        .ok_or_else(|| StorageError::Other("FAQ insert returned no id".into()))
    }

    async fn count_faq(&self) -> Result<i64, StorageError> {
        let count = self
            .query_one("SELECT COUNT(*) FROM faq", (), |row| Ok(row.get::<i64>(0)?))
            .await?;
        Ok(count.unwrap_or(0))
    }

    async fn faq_page(&self, page: i64, page_size: i64) -> Result<Vec<FaqEntry>, StorageError> {
        self.query_all(
            "SELECT id, question, answer, view_count FROM faq ORDER BY id LIMIT ?1 OFFSET ?2",
            [page_size, page * page_size],
            faq_from_row,
        )
        .await
    }

    async fn find_faq(&self, id: i64) -> Result<Option<FaqEntry>, StorageError> {
        self.query_one(
            "SELECT id, question, answer, view_count FROM faq WHERE id = ?1",
            [id],
            faq_from_row,
        )
        .await
    }

    async fn view_faq(&self, id: i64) -> Result<Option<FaqEntry>, StorageError> {
        self.query_one(
            "UPDATE faq SET view_count = view_count + 1 WHERE id = ?1 \
             RETURNING id, question, answer, view_count",
            [id],
            faq_from_row,
        )
        .await
    }

    async fn update_faq(&self, id: i64, field: FaqField, value: &str) -> Result<bool, StorageError> {
        let sql = match field {
            FaqField::Question => "UPDATE faq SET question = ?2 WHERE id = ?1",
            FaqField::Answer => "UPDATE faq SET answer = ?2 WHERE id = ?1",
        };
        let affected = self.conn.execute(sql, params![id, value]).await?;
        Ok(affected > 0)
    }

    async fn delete_faq(&self, id: i64) -> Result<bool, StorageError> {
        let affected = self.conn.execute("DELETE FROM faq WHERE id = ?1", [id]).await?;
        Ok(affected > 0)
    }

    async fn clear_faq(&self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM faq", ()).await?;
        self.reset_sequence("faq").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> TursoStore {
        TursoStore::open_local(":memory:").await.expect("in-memory database")
    }

    fn question(text: &str) -> NewQuestion {
        NewQuestion {
            user_id: 7,
            chat_id: 70,
            message_id: 700,
            username: Some("asker".to_string()),
            first_name: "Ann".to_string(),
            last_name: None,
            text: text.to_string(),
            asked_at: 1_000,
        }
    }

    #[tokio::test]
    async fn test_roles_are_seeded_once() {
        let store = store().await;
        store.migrate().await.expect("second migration is a no-op");

        let roles = store.list_roles().await.unwrap();
        let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["developer", "administrator", "moderator", "user"]);
        assert!(roles[2].abilities.answer);
        assert!(!roles[3].abilities.receives_messages);
    }

    #[tokio::test]
    async fn test_lease_expiry_makes_question_eligible_again() {
        let store = store().await;
        let id = store.insert_question(&question("What is X?")).await.unwrap();

        let first = store.reserve_next_question("mod_a", 2_000, 120, &[]).await.unwrap();
        assert_eq!(first.map(|q| q.id), Some(id));

        // still leased to mod_a
        assert!(store.reserve_next_question("mod_b", 2_119, 120, &[]).await.unwrap().is_none());

        let taken = store.reserve_next_question("mod_b", 2_120, 120, &[]).await.unwrap().unwrap();
        assert_eq!(taken.reserved_by.as_deref(), Some("mod_b"));

        assert!(store.find_reserved_question(id, "mod_a").await.unwrap().is_none());
        assert!(!store.mark_answered(id, "mod_a", 2_200).await.unwrap());
        assert!(store.mark_answered(id, "mod_b", 2_200).await.unwrap());
    }

    #[tokio::test]
    async fn test_declined_questions_are_skipped() {
        let store = store().await;
        let first = store.insert_question(&question("one")).await.unwrap();
        let second = store.insert_question(&question("two")).await.unwrap();

        let picked = store.reserve_next_question("mod", 10, 120, &[first]).await.unwrap().unwrap();
        assert_eq!(picked.id, second);
        assert!(store.reserve_next_question("mod", 10, 120, &[first, second]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_split_live_and_expired_reservations() {
        let store = store().await;
        for text in ["a", "b", "c", "d"] {
            store.insert_question(&question(text)).await.unwrap();
        }
        store.reserve_next_question("m1", 1_100, 120, &[]).await.unwrap();
        let q2 = store.reserve_next_question("m2", 1_500, 120, &[1]).await.unwrap().unwrap();
        store.mark_answered(q2.id, "m2", 1_600).await.unwrap();
        store.reserve_next_question("m3", 1_550, 120, &[1, 2]).await.unwrap();

        let stats = store.question_stats(1_560, 120).await.unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.answered, 1);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.unanswered, 2);
        assert_eq!(stats.mean_resolution_secs, Some(600.0));

        let moderators = store.moderator_stats().await.unwrap();
        assert_eq!(
            moderators,
            vec![ModeratorStat {
                username: "m2".to_string(),
                answered: 1
            }]
        );
    }

    #[tokio::test]
    async fn test_view_faq_increments_once_per_call() {
        let store = store().await;
        let id = store.insert_faq("q", "a").await.unwrap();
        for _ in 0..3 {
            store.view_faq(id).await.unwrap();
        }
        assert_eq!(store.find_faq(id).await.unwrap().unwrap().view_count, 3);
        assert!(store.view_faq(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_faq_keeps_other_ids_stable() {
        let store = store().await;
        let first = store.insert_faq("q1", "a1").await.unwrap();
        let second = store.insert_faq("q2", "a2").await.unwrap();

        assert!(store.delete_faq(first).await.unwrap());
        assert!(!store.delete_faq(first).await.unwrap());
        assert_eq!(store.find_faq(second).await.unwrap().unwrap().question, "q2");
    }

    #[tokio::test]
    async fn test_clear_resets_identifier_sequence() {
        let store = store().await;
        store.insert_faq("q1", "a1").await.unwrap();
        store.insert_faq("q2", "a2").await.unwrap();
        store.clear_faq().await.unwrap();
        assert_eq!(store.insert_faq("q3", "a3").await.unwrap(), 1);

        store.insert_question(&question("x")).await.unwrap();
        store.clear_questions().await.unwrap();
        assert_eq!(store.count_questions().await.unwrap(), 0);
        assert_eq!(store.insert_question(&question("y")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_interleaved_inserts_return_their_own_rows() {
        let store = store().await;
        let asked = question("asked");
        let (first, question_id, second) = tokio::join!(
            store.insert_faq("q1", "a1"),
            store.insert_question(&asked),
            store.insert_faq("q2", "a2"),
        );

        assert_eq!(store.find_faq(first.unwrap()).await.unwrap().unwrap().question, "q1");
        assert_eq!(store.find_faq(second.unwrap()).await.unwrap().unwrap().question, "q2");

        let reserved = store.reserve_next_question("mod", 2_000, 120, &[]).await.unwrap().unwrap();
        assert_eq!(reserved.id, question_id.unwrap());
        assert_eq!(reserved.text, "asked");
    }

    #[tokio::test]
    async fn test_chat_address_written_once() {
        let store = store().await;
        store.upsert_user_role("mod", "moderator").await.unwrap();
        store.set_user_chat("mod", 11).await.unwrap();
        store.set_user_chat("mod", 22).await.unwrap();

        let user = store.find_user("mod").await.unwrap().unwrap();
        assert_eq!(user.chat_id, Some(11));

        let recipients = store.broadcast_recipients().await.unwrap();
        assert_eq!(recipients.len(), 1);
        assert_eq!(recipients[0].chat_id, 11);
    }
}
