use crate::{config::Config, streaks::CheckinEngine};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

pub type SharedBot = Arc<Bot>;

pub struct Bot {
    pub engine: CheckinEngine,
    pub cooldowns: Cooldowns,
    pub config: Config,
}

impl Bot {
    pub fn new(engine: CheckinEngine, config: Config) -> SharedBot {
        Arc::new(Self {
            engine,
            cooldowns: Cooldowns::new(config.cooldown),
            config,
        })
    }
}

/// Per-user rate limit for check-in triggers.
pub struct Cooldowns {
    window: Duration,
    last_used: Mutex<HashMap<String, Instant>>,
}

impl Cooldowns {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_used: Mutex::new(HashMap::new()),
        }
    }

    /// Marks the user as active now, or returns how long they still have to
    /// wait.
    pub async fn try_acquire(&self, user_id: &str) -> Result<(), Duration> {
        self.try_acquire_at(user_id, Instant::now()).await
    }

    async fn try_acquire_at(&self, user_id: &str, now: Instant) -> Result<(), Duration> {
        let mut last_used = self.last_used.lock().await;
        if let Some(previous) = last_used.get(user_id) {
            let elapsed = now.saturating_duration_since(*previous);
            if elapsed < self.window {
                return Err(self.window - elapsed);
            }
        }
        let window = self.window;
        last_used.retain(|_, used| now.saturating_duration_since(*used) < window);
        last_used.insert(user_id.to_string(), now);
        Ok(())
    }
}
