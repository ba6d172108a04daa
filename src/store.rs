use crate::{
    data::{encode_rewards, parse_rewards, CheckinRecord},
    error::Result,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<CheckinRecord>>;
    async fn create(&self, record: &CheckinRecord) -> Result<()>;
    /// `max_streak` is only written when `Some`.
    async fn update(
        &self,
        user_id: &str,
        streak: u32,
        last_checkin: NaiveDate,
        rewards: &[String],
        max_streak: Option<u32>,
    ) -> Result<()>;
}

#[derive(FromRow)]
struct CheckinRow {
    user_id: String,
    username: String,
    streak: i64,
    last_checkin: NaiveDate,
    rewards: String,
    max_streak: i64,
}

impl From<CheckinRow> for CheckinRecord {
    fn from(row: CheckinRow) -> Self {
        let rewards = parse_rewards(&row.user_id, &row.rewards);
        Self {
            user_id: row.user_id,
            username: row.username,
            current_streak: u32::try_from(row.streak).unwrap_or(0),
            last_checkin: row.last_checkin,
            rewards,
            max_streak: u32::try_from(row.max_streak).unwrap_or(0),
        }
    }
}

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS checkins (
                user_id TEXT PRIMARY KEY NOT NULL,
                username TEXT NOT NULL,
                streak INTEGER NOT NULL DEFAULT 0,
                last_checkin TEXT NOT NULL,
                rewards TEXT NOT NULL DEFAULT '[]',
                max_streak INTEGER NOT NULL DEFAULT 0
            )"#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, user_id: &str) -> Result<Option<CheckinRecord>> {
        let row = sqlx::query_as::<_, CheckinRow>(
            r#"SELECT user_id, username, streak, last_checkin, rewards, max_streak
            FROM checkins WHERE user_id = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        debug!("Loaded check-in record for user {}: found={}", user_id, row.is_some());
        Ok(row.map(CheckinRecord::from))
    }

    async fn create(&self, record: &CheckinRecord) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO checkins (user_id, username, streak, last_checkin, rewards, max_streak)
            VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&record.user_id)
        .bind(&record.username)
        .bind(i64::from(record.current_streak))
        .bind(record.last_checkin)
        .bind(encode_rewards(&record.rewards)?)
        .bind(i64::from(record.max_streak))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        streak: u32,
        last_checkin: NaiveDate,
        rewards: &[String],
        max_streak: Option<u32>,
    ) -> Result<()> {
        let rewards = encode_rewards(rewards)?;
        match max_streak {
            Some(max_streak) => {
                sqlx::query(
                    r#"UPDATE checkins
                    SET streak = ?, last_checkin = ?, rewards = ?, max_streak = ?
                    WHERE user_id = ?"#,
                )
                .bind(i64::from(streak))
                .bind(last_checkin)
                .bind(rewards)
                .bind(i64::from(max_streak))
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"UPDATE checkins
                    SET streak = ?, last_checkin = ?, rewards = ?
                    WHERE user_id = ?"#,
                )
                .bind(i64::from(streak))
                .bind(last_checkin)
                .bind(rewards)
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn store() -> SqliteRecordStore {
        let pool = open_pool(":memory:").await.unwrap();
        SqliteRecordStore::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn missing_user_has_no_record() {
        let store = store().await;
        assert!(store.get("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_then_get() {
        let store = store().await;
        let mut record = CheckinRecord::new("42", "alice", date(2024, 1, 1));
        record.rewards = vec!["Gem".to_string()];
        record.max_streak = 1;
        store.create(&record).await.unwrap();

        assert_eq!(store.get("42").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn update_leaves_max_streak_alone_when_none() {
        let store = store().await;
        let mut record = CheckinRecord::new("42", "alice", date(2024, 1, 1));
        record.max_streak = 1;
        store.create(&record).await.unwrap();

        store
            .update("42", 2, date(2024, 1, 2), &["A".to_string()], None)
            .await
            .unwrap();
        let loaded = store.get("42").await.unwrap().unwrap();
        assert_eq!(loaded.current_streak, 2);
        assert_eq!(loaded.last_checkin, date(2024, 1, 2));
        assert_eq!(loaded.rewards, vec!["A".to_string()]);
        assert_eq!(loaded.max_streak, 1);
        assert_eq!(loaded.username, "alice");

        store
            .update("42", 3, date(2024, 1, 3), &[], Some(3))
            .await
            .unwrap();
        let loaded = store.get("42").await.unwrap().unwrap();
        assert_eq!(loaded.max_streak, 3);
        assert!(loaded.rewards.is_empty());
    }

    #[tokio::test]
    async fn malformed_rewards_column_reads_as_empty() {
        let store = store().await;
        sqlx::query(
            "INSERT INTO checkins (user_id, username, streak, last_checkin, rewards, max_streak)
             VALUES ('7', 'bob', 4, '2024-01-01', 'garbage', 2)",
        )
        .execute(&store.pool)
        .await
        .unwrap();

        let loaded = store.get("7").await.unwrap().unwrap();
        assert!(loaded.rewards.is_empty());
        assert_eq!(loaded.current_streak, 4);
        assert_eq!(loaded.max_streak, 2);
    }
}
