use super::{Claim, RewardSource};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Rewards seeded into a local `codes` table. A row is unclaimed while its
/// `discord_id` is empty.
pub struct SqliteRewardSource {
    pool: SqlitePool,
}

impl SqliteRewardSource {
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS codes (
                day TEXT NOT NULL,
                reward TEXT NOT NULL,
                discord_id TEXT NOT NULL DEFAULT ''
            )"#,
        )
        .execute(&pool)
        .await?;
        Ok(Self { pool })
    }

    #[cfg(test)]
    pub async fn add_reward(&self, day: u32, reward: &str) -> Result<()> {
        sqlx::query("INSERT INTO codes (day, reward) VALUES (?, ?)")
            .bind(day.to_string())
            .bind(reward)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl RewardSource for SqliteRewardSource {
    async fn claim_reward(&self, day: u32, claimant: &str) -> Result<Claim> {
        // Select and assign in one statement so two claimants can never
        // receive the same row.
        let reward = sqlx::query_scalar::<_, String>(
            r#"UPDATE codes SET discord_id = ?
            WHERE rowid = (
                SELECT rowid FROM codes WHERE day = ? AND discord_id = '' LIMIT 1
            ) AND discord_id = ''
            RETURNING reward"#,
        )
        .bind(claimant)
        .bind(day.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match reward {
            Some(reward) => {
                info!("Claimed local reward for day {} by user {}", day, claimant);
                Ok(Claim::Granted(reward))
            }
            None => {
                debug!("No local reward left for day {}", day);
                Ok(Claim::NoRewardAvailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_pool;
    use std::sync::Arc;

    async fn source() -> SqliteRewardSource {
        let pool = open_pool(":memory:").await.unwrap();
        SqliteRewardSource::new(pool).await.unwrap()
    }

    #[tokio::test]
    async fn claims_matching_day_once() {
        let source = source().await;
        source.add_reward(1, "WELCOME-1").await.unwrap();
        source.add_reward(2, "DAY2").await.unwrap();

        assert_eq!(
            source.claim_reward(1, "alice").await.unwrap(),
            Claim::Granted("WELCOME-1".to_string())
        );
        assert_eq!(
            source.claim_reward(1, "bob").await.unwrap(),
            Claim::NoRewardAvailable
        );
        assert_eq!(
            source.claim_reward(2, "bob").await.unwrap(),
            Claim::Granted("DAY2".to_string())
        );
    }

    #[tokio::test]
    async fn claimed_row_records_claimant() {
        let source = source().await;
        source.add_reward(3, "GEM").await.unwrap();
        source.claim_reward(3, "carol").await.unwrap();

        let owner: String = sqlx::query_scalar("SELECT discord_id FROM codes WHERE day = '3'")
            .fetch_one(&source.pool)
            .await
            .unwrap();
        assert_eq!(owner, "carol");
    }

    #[tokio::test]
    async fn unknown_day_has_no_reward() {
        let source = source().await;
        assert_eq!(
            source.claim_reward(99, "alice").await.unwrap(),
            Claim::NoRewardAvailable
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_claims_never_share_a_row() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("codes.sqlite");
        let pool = open_pool(db_path.to_str().unwrap()).await.unwrap();
        let source = Arc::new(SqliteRewardSource::new(pool).await.unwrap());
        source.add_reward(4, "FIRST").await.unwrap();
        source.add_reward(4, "SECOND").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..12 {
            let source = source.clone();
            handles.push(tokio::spawn(async move {
                source.claim_reward(4, &format!("user-{}", i)).await.unwrap()
            }));
        }

        let mut granted = Vec::new();
        for handle in handles {
            if let Claim::Granted(reward) = handle.await.unwrap() {
                granted.push(reward);
            }
        }
        granted.sort();
        assert_eq!(granted, vec!["FIRST".to_string(), "SECOND".to_string()]);

        let claimants: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT discord_id FROM codes WHERE day = '4'")
                .fetch_all(&source.pool)
                .await
                .unwrap();
        assert_eq!(claimants.len(), 2);
        assert!(claimants.iter().all(|claimant| !claimant.is_empty()));
    }
}
