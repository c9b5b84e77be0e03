//! SQLite-Implementierung des SessionRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::models::SessionRecord;
use crate::repository::SessionRepository;
use crate::sqlite::pool::SqliteDb;

#[async_trait]
impl SessionRepository for SqliteDb {
    async fn insert(&self, session: &SessionRecord) -> DbResult<()> {
        sqlx::query("INSERT INTO sessions (session_id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(&session.session_id)
            .bind(session.user_id.to_string())
            .bind(session.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE") || msg.contains("unique") {
                    DbError::Eindeutigkeit("Session-ID bereits vergeben".into())
                } else {
                    DbError::Sqlx(e)
                }
            })?;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> DbResult<Option<SessionRecord>> {
        let row = sqlx::query(
            "SELECT session_id, user_id, created_at FROM sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_session(&r)).transpose()
    }

    async fn remove(&self, session_id: &str) -> DbResult<Option<SessionRecord>> {
        // Erst laden, dann loeschen; bei Gleichstand zweier Requests gewinnt
        // der dessen DELETE tatsaechlich eine Zeile entfernt.
        let Some(session) = self.get(session_id).await? else {
            return Ok(None);
        };

        let affected = sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok((affected > 0).then_some(session))
    }

    async fn remove_for_user(&self, user_id: Uuid) -> DbResult<u64> {
        let affected = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }

    async fn remove_created_before(&self, grenze: DateTime<Utc>) -> DbResult<u64> {
        // created_at ist RFC3339 (UTC), damit ist der String-Vergleich
        // chronologisch korrekt.
        let affected = sqlx::query("DELETE FROM sessions WHERE created_at <= ?")
            .bind(grenze.to_rfc3339())
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(affected)
    }
}

fn row_to_session(row: &sqlx::sqlite::SqliteRow) -> DbResult<SessionRecord> {
    use sqlx::Row as _;

    let user_id_str: String = row.try_get("user_id")?;
    let user_id = Uuid::parse_str(&user_id_str)
        .map_err(|e| DbError::intern(format!("Ungueltige UUID '{user_id_str}': {e}")))?;

    let created_at_str: String = row.try_get("created_at")?;
    let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
        .map_err(|e| DbError::intern(format!("Ungueltige created_at '{created_at_str}': {e}")))?
        .with_timezone(&Utc);

    Ok(SessionRecord {
        session_id: row.try_get("session_id")?,
        user_id,
        created_at,
    })
}
