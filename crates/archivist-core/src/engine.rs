//! The long-polling loop.
//!
//! The engine owns the update offset and the first-run flag. Both live only in
//! memory: after a restart the remote feed re-delivers whatever was not yet
//! acknowledged, and the first page(s) are treated as backlog again.

use std::{sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::{config::Config, dispatch::Dispatcher, updates::UpdateSource};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PollSettings {
    /// Pause between polls once the backlog has been drained.
    pub delay: Duration,
    /// How long the remote side may hold a poll open.
    pub timeout: Duration,
    /// Page size; a shorter page means the backlog is drained.
    pub limit: u32,
}

impl PollSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            delay: cfg.poll_delay,
            timeout: cfg.long_poll_timeout,
            limit: cfg.poll_limit,
        }
    }
}

/// Cursor state of the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineState {
    offset: i64,
    first_run: bool,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            offset: 0,
            first_run: true,
        }
    }
}

impl EngineState {
    pub fn offset(&self) -> i64 {
        self.offset
    }

    pub fn first_run(&self) -> bool {
        self.first_run
    }

    /// Acknowledge `update_id`. The offset never moves backwards.
    pub fn observe(&mut self, update_id: i64) {
        let next = update_id.saturating_add(1);
        if next >= self.offset {
            self.offset = next;
        }
    }

    /// Close a page of `count` updates. A short page ends the first run for good.
    pub fn finish_page(&mut self, count: usize, limit: u32) {
        if count < limit as usize {
            self.first_run = false;
        }
    }
}

pub struct PollingEngine {
    source: Arc<dyn UpdateSource>,
    dispatcher: Dispatcher,
    settings: PollSettings,
    state: EngineState,
}

impl PollingEngine {
    pub fn new(
        source: Arc<dyn UpdateSource>,
        dispatcher: Dispatcher,
        settings: PollSettings,
    ) -> Self {
        Self {
            source,
            dispatcher,
            settings,
            state: EngineState::default(),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Poll forever.
    pub async fn run(&mut self) {
        info!(
            username = %self.dispatcher.identity().username,
            limit = self.settings.limit,
            "polling started"
        );
        loop {
            self.tick().await;
        }
    }

    /// One iteration: optional delay, one poll, dispatch of the page.
    ///
    /// Returns the page size, or `None` when the poll failed and nothing changed.
    pub async fn tick(&mut self) -> Option<usize> {
        if !self.state.first_run && !self.settings.delay.is_zero() {
            sleep(self.settings.delay).await;
        }

        debug!(
            offset = self.state.offset,
            first_run = self.state.first_run,
            "polling"
        );
        let updates = match self
            .source
            .poll(self.state.offset, self.settings.timeout, self.settings.limit)
            .await
        {
            Ok(updates) => updates,
            Err(e) => {
                warn!(offset = self.state.offset, error = %e, "poll failed; retrying");
                return None;
            }
        };

        let count = updates.len();
        if count > 0 {
            info!(count, first_run = self.state.first_run, "got updates");
        }

        for update in &updates {
            if let Some(id) = update.update_id {
                self.state.observe(id);
            }
            if let Some(msg) = &update.message {
                self.dispatcher.handle(msg, self.state.first_run).await;
            }
        }

        let was_first_run = self.state.first_run;
        self.state.finish_page(count, self.settings.limit);
        if was_first_run && !self.state.first_run {
            info!(offset = self.state.offset, "backlog drained");
        }

        Some(count)
    }
}
