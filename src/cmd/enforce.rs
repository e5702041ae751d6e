// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use anyhow::Context;

use super::Session;
use crate::policy::Mode;

pub(super) fn run(session: &Session) -> anyhow::Result<()> {
    crate::run_once(
        &session.api,
        &session.config,
        &session.logger,
        &session.clock,
        Mode::Enforce,
    )
    .with_context(|| format!("Failed to enforce limit for '{}'", session.config.user_name))?;
    Ok(())
}
