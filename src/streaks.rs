use crate::{
    data::CheckinRecord,
    error::{Error, Result},
    rewards::{Claim, RewardSource},
    store::RecordStore,
};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_GRACE_DAYS: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeKind {
    Created,
    AlreadyCheckedIn,
    Reset { previous_streak: u32 },
    Continued,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckinOutcome {
    pub kind: OutcomeKind,
    pub username: String,
    pub streak: u32,
    pub rewards: Vec<String>,
    /// Reward granted by this check-in, if any.
    pub granted: Option<String>,
}

/// The calendar day `now` falls on in the reference timezone.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

pub struct CheckinEngine {
    store: Arc<dyn RecordStore>,
    rewards: Arc<dyn RewardSource>,
    grace_days: i64,
}

impl CheckinEngine {
    pub fn new(store: Arc<dyn RecordStore>, rewards: Arc<dyn RewardSource>, grace_days: i64) -> Self {
        Self {
            store,
            rewards,
            grace_days,
        }
    }

    /// Records today's check-in for a user and claims any reward it unlocks.
    ///
    /// Nothing is persisted when a reward claim fails; the caller gets
    /// `Error::ClaimFailed` and the user may retry.
    pub async fn process_checkin(
        &self,
        user_id: &str,
        username: &str,
        today: NaiveDate,
    ) -> Result<CheckinOutcome> {
        match self.store.get(user_id).await? {
            None => self.create_checkin(user_id, username, today).await,
            Some(record) => self.update_checkin(record, today).await,
        }
    }

    async fn create_checkin(
        &self,
        user_id: &str,
        username: &str,
        today: NaiveDate,
    ) -> Result<CheckinOutcome> {
        info!("Creating check-in for new user {} on {}", user_id, today);
        let mut record = CheckinRecord::new(user_id, username, today);

        let granted = self.claim(1, user_id).await?;
        if let Some(reward) = &granted {
            record.rewards.push(reward.clone());
            record.max_streak = 1;
        }

        self.store.create(&record).await?;
        Ok(CheckinOutcome {
            kind: OutcomeKind::Created,
            username: record.username,
            streak: record.current_streak,
            rewards: record.rewards,
            granted,
        })
    }

    async fn update_checkin(&self, record: CheckinRecord, today: NaiveDate) -> Result<CheckinOutcome> {
        let gap = today.signed_duration_since(record.last_checkin).num_days();
        debug!(
            "User {} last checked in on {}, today is {} (gap {} days)",
            record.user_id, record.last_checkin, today, gap
        );

        if gap <= 0 {
            if gap < 0 {
                warn!(
                    "Check-in date {} precedes last check-in {} for user {}",
                    today, record.last_checkin, record.user_id
                );
            }
            debug!("User {} has already checked in today", record.user_id);
            return Ok(CheckinOutcome {
                kind: OutcomeKind::AlreadyCheckedIn,
                username: record.username,
                streak: record.current_streak,
                rewards: record.rewards,
                granted: None,
            });
        }

        if gap > self.grace_days {
            self.reset_streak(record, today).await
        } else {
            self.continue_streak(record, today).await
        }
    }

    async fn reset_streak(&self, record: CheckinRecord, today: NaiveDate) -> Result<CheckinOutcome> {
        info!(
            "User {} missed more than {} days, resetting streak of {}",
            record.user_id, self.grace_days, record.current_streak
        );

        let mut max_streak = record.max_streak.max(record.current_streak);
        let mut rewards = Vec::new();

        let granted = if 1 > max_streak {
            self.claim(1, &record.user_id).await?
        } else {
            None
        };
        if let Some(reward) = &granted {
            rewards.push(reward.clone());
            max_streak = 1;
        }

        let new_max = (max_streak != record.max_streak).then_some(max_streak);
        self.store
            .update(&record.user_id, 1, today, &rewards, new_max)
            .await?;

        Ok(CheckinOutcome {
            kind: OutcomeKind::Reset {
                previous_streak: record.current_streak,
            },
            username: record.username,
            streak: 1,
            rewards,
            granted,
        })
    }

    async fn continue_streak(&self, record: CheckinRecord, today: NaiveDate) -> Result<CheckinOutcome> {
        let new_streak = record.current_streak + 1;
        let mut rewards = record.rewards;
        let mut new_max = None;

        let granted = if new_streak > record.max_streak {
            self.claim(new_streak, &record.user_id).await?
        } else {
            debug!(
                "Streak {} for user {} already rewarded up to {}",
                new_streak, record.user_id, record.max_streak
            );
            None
        };
        if let Some(reward) = &granted {
            rewards.push(reward.clone());
            new_max = Some(new_streak);
        }

        self.store
            .update(&record.user_id, new_streak, today, &rewards, new_max)
            .await?;
        info!("User {} checked in! New streak: {} days", record.user_id, new_streak);

        Ok(CheckinOutcome {
            kind: OutcomeKind::Continued,
            username: record.username,
            streak: new_streak,
            rewards,
            granted,
        })
    }

    async fn claim(&self, day: u32, user_id: &str) -> Result<Option<String>> {
        match self.rewards.claim_reward(day, user_id).await {
            Ok(Claim::Granted(reward)) => {
                info!("Reward for day {} granted to user {}: {}", day, user_id, reward);
                Ok(Some(reward))
            }
            Ok(Claim::NoRewardAvailable) => {
                debug!("No reward configured for day {}", day);
                Ok(None)
            }
            Err(e) => {
                error!("Reward claim for day {} by user {} failed: {}", day, user_id, e);
                Err(Error::ClaimFailed {
                    day,
                    source: Box::new(e),
                })
            }
        }
    }
}
