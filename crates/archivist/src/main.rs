use std::{process::ExitCode, sync::Arc};

use archivist_core::{config::Config, Error};

fn usage(program: &str) -> String {
    format!(
        "No TOKEN set. Get your token by talking to @botfather on Telegram.\n\
Then call this program like this: `{program} <TOKEN>` (or set TELEGRAM_BOT_TOKEN).\n\
Exiting."
    )
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "archivist".to_string());

    let cfg = match Config::load(args.next()) {
        Ok(cfg) => Arc::new(cfg),
        Err(Error::MissingToken) => {
            eprintln!("{}", usage(&program));
            return ExitCode::from(1);
        }
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = archivist_core::logging::init("archivist") {
        eprintln!("{e}");
    }

    if let Err(e) = archivist_telegram::router::run_polling(cfg).await {
        tracing::error!("{e:#}");
        eprintln!("{e:#}. Exiting.");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}
