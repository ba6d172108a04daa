pub mod lark;
pub mod local;

use crate::error::Result;
use async_trait::async_trait;

pub use lark::{LarkConfig, LarkRewardSource};
pub use local::SqliteRewardSource;

/// Result of a successful claim attempt. Infrastructure failures are
/// reported through `Err` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    Granted(String),
    /// No unclaimed reward is configured for the requested day.
    NoRewardAvailable,
}

#[async_trait]
pub trait RewardSource: Send + Sync {
    /// Finds one unclaimed reward for streak `day` and assigns it to
    /// `claimant`.
    async fn claim_reward(&self, day: u32, claimant: &str) -> Result<Claim>;
}
