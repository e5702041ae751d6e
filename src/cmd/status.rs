// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use anyhow::Context;
use std::io;

use super::Session;
use crate::{
    policy::{Decision, Mode},
    usage::Usage,
};

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct Status<'a> {
    user_name: &'a str,
    user_id: &'a str,
    /// `None` when today's usage could not be determined
    total_minutes: Option<f64>,
    threshold_minutes: u32,
    #[serde(flatten)]
    decision: Decision,
}

/// Work out what `enforce` would do, without writing anything.
pub(super) fn run(session: &Session) -> anyhow::Result<()> {
    let outcome = crate::run_once(
        &session.api,
        &session.config,
        &session.logger,
        &session.clock,
        Mode::DryRun,
    )
    .with_context(|| format!("Failed to get status for '{}'", session.config.user_name))?;

    let status = Status {
        user_name: &outcome.account.name,
        user_id: &outcome.account.id,
        total_minutes: match &outcome.usage {
            Usage::Known(usage) => Some(usage.total_minutes()),
            Usage::Unknown(_) => None,
        },
        threshold_minutes: session.config.max_watch_time_minutes,
        decision: outcome.decision,
    };
    serde_json::to_writer_pretty(io::stdout(), &status)?;
    println!();
    Ok(())
}
