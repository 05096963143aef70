use std::sync::Arc;

use anyhow::Context;
use teloxide::prelude::*;
use tracing::info;

use archivist_core::{
    archive::{ArchiveStore, FileArchive},
    config::Config,
    dispatch::Dispatcher,
    engine::{PollSettings, PollingEngine},
    messaging::port::MessagingPort,
    updates::UpdateSource,
};

use crate::{api::BotApi, TelegramMessenger};

/// Resolve the bot's identity and assemble the polling engine.
///
/// Fails when the token is rejected or `getMe` is unreachable; nothing has been
/// polled at that point.
pub async fn build_engine(cfg: &Config) -> anyhow::Result<PollingEngine> {
    let api = BotApi::from_config(cfg).context("failed to build Bot API client")?;
    let me = api
        .get_me()
        .await
        .context("token seems to be invalid")?;
    info!(id = me.id.0, username = %me.username, "identity resolved");

    let api_url = reqwest::Url::parse(&cfg.telegram_api_url)
        .with_context(|| format!("invalid TELEGRAM_API_URL {:?}", cfg.telegram_api_url))?;
    let bot = Bot::new(cfg.telegram_bot_token.clone()).set_api_url(api_url);

    let archive: Arc<dyn ArchiveStore> = Arc::new(FileArchive::new(
        cfg.archive_dir.clone(),
        cfg.export_dir.clone(),
    ));
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot));
    let source: Arc<dyn UpdateSource> = Arc::new(api);

    Ok(PollingEngine::new(
        source,
        Dispatcher::new(me, archive, messenger),
        PollSettings::from_config(cfg),
    ))
}

/// Build the engine and poll forever.
pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    info!(
        archive_dir = %cfg.archive_dir.display(),
        export_dir = %cfg.export_dir.display(),
        "archivist starting"
    );
    let mut engine = build_engine(&cfg).await?;
    engine.run().await;
    Ok(())
}
