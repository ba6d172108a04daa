use chrono::NaiveDate;
use tracing::warn;

/// One row of the `checkins` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinRecord {
    pub user_id: String,
    pub username: String,
    pub current_streak: u32,
    pub last_checkin: NaiveDate,
    /// Reward labels claimed during the current unbroken streak.
    pub rewards: Vec<String>,
    /// Highest streak day a reward has already been issued for.
    pub max_streak: u32,
}

impl CheckinRecord {
    pub fn new(user_id: &str, username: &str, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            current_streak: 1,
            last_checkin: today,
            rewards: Vec::new(),
            max_streak: 0,
        }
    }
}

/// Decodes the stored rewards column. Anything that is not a JSON array of
/// strings is treated as an empty list.
pub fn parse_rewards(user_id: &str, raw: &str) -> Vec<String> {
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(rewards) => rewards,
        Err(e) => {
            warn!("Malformed rewards for user {}, treating as empty: {}", user_id, e);
            Vec::new()
        }
    }
}

pub fn encode_rewards(rewards: &[String]) -> crate::error::Result<String> {
    Ok(serde_json::to_string(rewards)?)
}
