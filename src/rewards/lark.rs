use super::{Claim, RewardSource};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info};

const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct LarkConfig {
    pub base_url: String,
    pub app_id: String,
    pub app_secret: String,
    pub app_token: String,
    pub table_id: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    tenant_access_token: Option<String>,
    #[serde(default)]
    expire: u64,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
}

#[derive(Debug, Deserialize)]
struct SearchData {
    items: Option<Vec<RecordItem>>,
}

#[derive(Debug, Deserialize)]
struct RecordItem {
    record_id: String,
    #[serde(default)]
    fields: serde_json::Map<String, Value>,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Rewards stored in a Lark Bitable table with `day`, `reward` and
/// `discord_id` fields.
///
/// The API offers no conditional update, so a claim is a search followed by
/// a write. Two claimants racing for the same record can both succeed; the
/// later write wins the row.
pub struct LarkRewardSource {
    client: reqwest::Client,
    config: LarkConfig,
    token: Mutex<Option<CachedToken>>,
}

impl LarkRewardSource {
    pub fn new(config: LarkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/open-apis/bitable/v1/apps/{}/tables/{}/records",
            self.config.base_url.trim_end_matches('/'),
            self.config.app_token,
            self.config.table_id
        )
    }

    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let url = format!(
            "{}/open-apis/auth/v3/tenant_access_token/internal",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "app_id": self.config.app_id,
                "app_secret": self.config.app_secret,
            }))
            .send()
            .await?;
        let response: TokenResponse = read_reply(response).await?;

        let value = match (response.code, response.tenant_access_token) {
            (0, Some(value)) => value,
            (code, _) => {
                return Err(Error::RewardApi {
                    code,
                    msg: response.msg,
                })
            }
        };

        let lifetime = Duration::from_secs(response.expire).saturating_sub(TOKEN_REFRESH_MARGIN);
        debug!("Fetched Lark tenant token, refreshing in {:?}", lifetime);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(value)
    }

    async fn find_unclaimed(&self, token: &str, day: u32) -> Result<Option<RecordItem>> {
        let url = format!("{}/search?page_size=1", self.records_url());
        let body = json!({
            "filter": {
                "conjunction": "and",
                "conditions": [
                    { "field_name": "day", "operator": "is", "value": [day.to_string()] },
                    { "field_name": "discord_id", "operator": "isEmpty", "value": [] },
                    { "field_name": "reward", "operator": "isNotEmpty", "value": [] }
                ]
            }
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        let response: ApiResponse<SearchData> = read_reply(response).await?;

        if response.code != 0 {
            return Err(Error::RewardApi {
                code: response.code,
                msg: response.msg,
            });
        }

        Ok(response
            .data
            .and_then(|data| data.items)
            .and_then(|items| items.into_iter().next()))
    }

    async fn assign(&self, token: &str, record_id: &str, claimant: &str) -> Result<()> {
        let url = format!("{}/{}", self.records_url(), record_id);
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(&json!({ "fields": { "discord_id": claimant } }))
            .send()
            .await?;
        let response: ApiResponse<Value> = read_reply(response).await?;

        if response.code != 0 {
            return Err(Error::RewardApi {
                code: response.code,
                msg: response.msg,
            });
        }
        Ok(())
    }
}

/// Decodes a Lark reply. On an HTTP error status the body's own `code` and
/// `msg` are kept when present, otherwise the status code and raw body.
async fn read_reply<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let (code, msg) = match serde_json::from_str::<ApiStatus>(&body) {
            Ok(reply) if reply.code != 0 => (reply.code, reply.msg),
            _ => (i64::from(status.as_u16()), body),
        };
        return Err(Error::RewardApi { code, msg });
    }

    Ok(serde_json::from_str(&body)?)
}

/// Bitable text cells arrive either as a plain string or as a list of rich
/// text segments.
fn field_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(segments) => {
            let text: String = segments
                .iter()
                .filter_map(|segment| match segment {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                    _ => None,
                })
                .collect();
            Some(text)
        }
        _ => None,
    };
    text.filter(|text| !text.is_empty())
}

#[async_trait]
impl RewardSource for LarkRewardSource {
    async fn claim_reward(&self, day: u32, claimant: &str) -> Result<Claim> {
        let token = self.access_token().await?;

        let record = match self.find_unclaimed(&token, day).await? {
            Some(record) => record,
            None => {
                debug!("No Lark reward left for day {}", day);
                return Ok(Claim::NoRewardAvailable);
            }
        };

        let reward = match record.fields.get("reward").and_then(field_text) {
            Some(reward) => reward,
            None => {
                error!("Lark record {} for day {} has no reward text", record.record_id, day);
                return Ok(Claim::NoRewardAvailable);
            }
        };

        self.assign(&token, &record.record_id, claimant).await?;
        info!(
            "Claimed Lark reward record {} for day {} by user {}",
            record.record_id, day, claimant
        );
        Ok(Claim::Granted(reward))
    }
}
