// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

//! Daily watch-time limit for one Jellyfin account.
//!
//! Each run resolves the account, sums today's playback from the usage
//! statistics plugin and flips the account's library access when the total
//! crosses the configured limit. Scheduling is left to cron or a systemd timer.

use jellyfin_client::Api;

pub mod clock;
pub mod cmd;
pub mod config;
pub mod error;
pub mod logger;
pub mod policy;
pub mod query;
pub mod resolver;
pub mod usage;
pub mod util;

use clock::Clock;
use config::Config;
use error::Result;
use logger::Logger;
use policy::{Decision, Mode};
use resolver::Account;
use usage::Usage;

/// Everything a run found out and decided.
#[derive(Debug)]
pub struct Outcome {
    pub account: Account,
    pub usage: Usage,
    pub decision: Decision,
}

/// Resolve, aggregate, reconcile. Only a failed usage query is tolerated;
/// every other remote failure ends the run.
pub fn run_once(
    api: &Api,
    config: &Config,
    logger: &Logger,
    clock: &Clock,
    mode: Mode,
) -> Result<Outcome> {
    let account = resolver::resolve(api, logger, &config.user_name)?;
    let usage = usage::fetch_usage(api, logger, clock, &config.usage_plugin_path, &account);
    let desired = policy::desired_from_usage(
        &usage,
        config.max_watch_time_minutes,
        config.on_usage_unavailable,
        logger,
    );
    let decision = policy::reconcile(api, logger, &account, desired, mode)?;
    Ok(Outcome {
        account,
        usage,
        decision,
    })
}
