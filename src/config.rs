use crate::{rewards::LarkConfig, streaks::DEFAULT_GRACE_DAYS};
use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use std::time::Duration;

const DEFAULT_EMBED_COLOR: u32 = 0x5865F2;

#[derive(Debug, Clone)]
pub enum RewardBackend {
    Local { codes_db_path: String },
    Lark(LarkConfig),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub checkins_db_path: String,
    pub reward_backend: RewardBackend,
    pub timezone: Tz,
    pub grace_days: i64,
    pub cooldown: Duration,
    pub embed_color: u32,
    pub presence_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow!("{} environment variable is required", key))
        };

        let discord_token = required("DISCORD_TOKEN")?;

        let reward_backend = match var("REWARD_BACKEND", "local").to_lowercase().as_str() {
            "local" => RewardBackend::Local {
                codes_db_path: var("CODES_DB_PATH", "db/codes.sqlite"),
            },
            "lark" => RewardBackend::Lark(LarkConfig {
                base_url: var("LARK_BASE_URL", "https://open.larksuite.com"),
                app_id: required("LARK_APP_ID")?,
                app_secret: required("LARK_APP_SECRET")?,
                app_token: required("LARK_APP_TOKEN")?,
                table_id: required("LARK_TABLE_ID")?,
            }),
            other => return Err(anyhow!("Unknown REWARD_BACKEND '{}', expected 'local' or 'lark'", other)),
        };

        let timezone_name = var("CHECKIN_TIMEZONE", "Asia/Tokyo");
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|_| anyhow!("Invalid CHECKIN_TIMEZONE '{}'", timezone_name))?;

        let grace_days = match lookup("CHECKIN_GRACE_DAYS") {
            Some(value) => value
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| *days >= 1)
                .ok_or_else(|| anyhow!("CHECKIN_GRACE_DAYS must be a positive integer"))?,
            None => DEFAULT_GRACE_DAYS,
        };

        let cooldown_secs = var("CHECKIN_COOLDOWN_SECS", "3")
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow!("CHECKIN_COOLDOWN_SECS must be a whole number of seconds"))?;

        let embed_color = match lookup("EMBED_COLOR") {
            Some(value) => parse_color(&value)
                .ok_or_else(|| anyhow!("Invalid EMBED_COLOR '{}'", value))?,
            None => DEFAULT_EMBED_COLOR,
        };

        Ok(Self {
            discord_token,
            checkins_db_path: var("CHECKINS_DB_PATH", "db/checkins.sqlite"),
            reward_backend,
            timezone,
            grace_days,
            cooldown: Duration::from_secs(cooldown_secs),
            embed_color,
            presence_name: var("PRESENCE_NAME", "杖と剣の伝説"),
        })
    }
}

/// Accepts `#RRGGBB`, `0xRRGGBB` or a decimal integer.
pub fn parse_color(value: &str) -> Option<u32> {
    let value = value.trim();
    let parsed = if let Some(hex) = value.strip_prefix('#') {
        u32::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        value.parse::<u32>().ok()
    };
    parsed.filter(|color| *color <= 0xFFFFFF)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_local_backend_in_tokyo() {
        let config = config(&[("DISCORD_TOKEN", "token")]).unwrap();
        assert!(matches!(
            config.reward_backend,
            RewardBackend::Local { ref codes_db_path } if codes_db_path == "db/codes.sqlite"
        ));
        assert_eq!(config.timezone, chrono_tz::Asia::Tokyo);
        assert_eq!(config.grace_days, 5);
        assert_eq!(config.cooldown, Duration::from_secs(3));
        assert_eq!(config.embed_color, DEFAULT_EMBED_COLOR);
        assert_eq!(config.checkins_db_path, "db/checkins.sqlite");
    }

    #[test]
    fn token_is_required() {
        assert!(config(&[]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "  ")]).is_err());
    }

    #[test]
    fn lark_backend_needs_credentials() {
        assert!(config(&[("DISCORD_TOKEN", "t"), ("REWARD_BACKEND", "lark")]).is_err());

        let config = config(&[
            ("DISCORD_TOKEN", "t"),
            ("REWARD_BACKEND", "LARK"),
            ("LARK_APP_ID", "id"),
            ("LARK_APP_SECRET", "secret"),
            ("LARK_APP_TOKEN", "app"),
            ("LARK_TABLE_ID", "tbl"),
        ])
        .unwrap();
        match config.reward_backend {
            RewardBackend::Lark(lark) => {
                assert_eq!(lark.table_id, "tbl");
                assert_eq!(lark.base_url, "https://open.larksuite.com");
            }
            other => panic!("expected lark backend, got {:?}", other),
        }
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("DISCORD_TOKEN", "t"), ("REWARD_BACKEND", "csv")]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "t"), ("CHECKIN_TIMEZONE", "Mars/Base")]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "t"), ("CHECKIN_GRACE_DAYS", "0")]).is_err());
        assert!(config(&[("DISCORD_TOKEN", "t"), ("EMBED_COLOR", "blue")]).is_err());
    }

    #[test]
    fn parses_colors() {
        assert_eq!(parse_color("#FF8800"), Some(0xFF8800));
        assert_eq!(parse_color("0x00ff00"), Some(0x00FF00));
        assert_eq!(parse_color("255"), Some(255));
        assert_eq!(parse_color("#1000000"), None);
        assert_eq!(parse_color("red"), None);
    }
}
