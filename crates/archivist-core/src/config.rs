use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Telegram rejects `getUpdates` limits above this.
pub const MAX_POLL_LIMIT: u32 = 100;

/// The polling request must not time out before the server gives up on the long poll.
pub const HTTP_TIMEOUT_GRACE: Duration = Duration::from_secs(30);

/// Typed configuration for the archivist.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_api_url: String,

    // Polling
    pub poll_delay: Duration,
    pub long_poll_timeout: Duration,
    pub poll_limit: u32,

    // Storage
    pub archive_dir: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Load configuration from the environment (and `.env`, if present).
    ///
    /// `token_override` is the token given on the command line; it wins over
    /// `TELEGRAM_BOT_TOKEN`.
    pub fn load(token_override: Option<String>) -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        let cfg = Self::from_lookup(token_override, |key| env::var(key).ok())?;

        fs::create_dir_all(&cfg.archive_dir)?;
        fs::create_dir_all(&cfg.export_dir)?;

        Ok(cfg)
    }

    /// Build a config from an arbitrary key lookup. Does not touch the filesystem.
    pub fn from_lookup(
        token_override: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let telegram_bot_token = token_override
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or(Error::MissingToken)?;

        let telegram_api_url = lookup("TELEGRAM_API_URL")
            .and_then(non_empty)
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.telegram.org".to_string());

        let poll_delay = Duration::from_secs(parse_u64(&lookup, "POLL_DELAY_SECS")?.unwrap_or(5));
        let long_poll_timeout =
            Duration::from_secs(parse_u64(&lookup, "LONG_POLL_TIMEOUT_SECS")?.unwrap_or(600));
        let poll_limit = clamp_poll_limit(parse_u64(&lookup, "POLL_LIMIT")?.unwrap_or(100));

        let archive_dir = lookup("ARCHIVE_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("chats"));
        let export_dir = lookup("EXPORT_DIR")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir);

        Ok(Self {
            telegram_bot_token,
            telegram_api_url,
            poll_delay,
            long_poll_timeout,
            poll_limit,
            archive_dir,
            export_dir,
        })
    }

    /// Transport timeout for the long-polling request.
    pub fn http_timeout(&self) -> Duration {
        self.long_poll_timeout + HTTP_TIMEOUT_GRACE
    }
}

fn clamp_poll_limit(v: u64) -> u32 {
    v.clamp(1, MAX_POLL_LIMIT as u64) as u32
}

fn parse_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    let Some(raw) = lookup(key).and_then(non_empty) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<u64>()
        .map(Some)
        .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}")))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
