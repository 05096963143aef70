//! Raw Bot API calls over `reqwest`: `getMe` and `getUpdates`.
//!
//! Responses are read as loose JSON. An envelope without `"ok": true` and a
//! `result` is an `InvalidResponse`, which the engine treats as a skipped poll.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use archivist_core::{
    config::Config,
    domain::BotIdentity,
    errors::Error,
    updates::{Update, UpdateSource},
    Result,
};

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone, Debug)]
pub struct BotApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl BotApi {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Transport(format!("http client build: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            token: token.into(),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.telegram_api_url.clone(),
            cfg.telegram_bot_token.clone(),
            cfg.http_timeout(),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.base_url, self.token)
    }

    async fn call(&self, method: &str, query: &[(&str, String)]) -> Result<Value> {
        let resp = self
            .http
            .get(self.method_url(method))
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(method, e))?;

        // Telegram reports failures (401, 409, ...) as JSON envelopes too, so the body
        // is parsed regardless of the status code.
        resp.json::<Value>()
            .await
            .map_err(|e| transport_error(method, e))
    }

    /// Who am I. Any failure here means the token cannot be used.
    pub async fn get_me(&self) -> Result<BotIdentity> {
        let body = self
            .call("getMe", &[])
            .await
            .map_err(|e| Error::Auth(e.to_string()))?;
        parse_identity(&body)
    }
}

#[async_trait]
impl UpdateSource for BotApi {
    async fn poll(&self, offset: i64, timeout: Duration, limit: u32) -> Result<Vec<Update>> {
        let body = self
            .call(
                "getUpdates",
                &[
                    ("timeout", timeout.as_secs().to_string()),
                    ("offset", offset.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        let updates = parse_updates(&body)?;
        debug!(offset, count = updates.len(), "getUpdates");
        Ok(updates)
    }
}

/// Drop the request URL from reqwest errors: it contains the bot token.
fn transport_error(method: &str, e: reqwest::Error) -> Error {
    Error::Transport(format!("{method}: {}", e.without_url()))
}

fn open_envelope(body: &Value) -> Result<Value> {
    let env = Envelope::deserialize(body)
        .map_err(|e| Error::InvalidResponse(format!("not a Bot API envelope: {e}")))?;
    if !env.ok {
        return Err(Error::InvalidResponse(
            env.description
                .unwrap_or_else(|| "ok=false".to_string()),
        ));
    }
    env.result
        .ok_or_else(|| Error::InvalidResponse("missing result".to_string()))
}

pub fn parse_identity(body: &Value) -> Result<BotIdentity> {
    let result = open_envelope(body).map_err(|e| Error::Auth(e.to_string()))?;
    let id = result
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| Error::Auth("getMe: missing numeric id".to_string()))?;
    let username = result
        .get("username")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::Auth("getMe: missing username".to_string()))?;
    Ok(BotIdentity::new(id, username))
}

pub fn parse_updates(body: &Value) -> Result<Vec<Update>> {
    let result = open_envelope(body)?;
    let items = result
        .as_array()
        .ok_or_else(|| Error::InvalidResponse("result is not an array".to_string()))?;
    Ok(items.iter().map(Update::from_value).collect())
}
