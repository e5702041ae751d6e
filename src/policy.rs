// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::BTreeSet;

use jellyfin_client::{
    models::{PolicyUpdate, UserPolicy},
    Api,
};

use crate::{
    config::UsageFallback,
    error::Result,
    logger::Logger,
    resolver::Account,
    usage::Usage,
};

/// The part of a user's policy that controls library access.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    pub enable_all_folders: bool,
    pub enabled_folders: BTreeSet<String>,
}

impl AccessPolicy {
    /// Apply the server defaults: all folders enabled, no explicit folders.
    pub fn from_remote(policy: Option<UserPolicy>) -> Self {
        let policy = policy.unwrap_or_default();
        Self {
            enable_all_folders: policy.enable_all_folders.unwrap_or(true),
            enabled_folders: policy.enabled_folders.unwrap_or_default().into_iter().collect(),
        }
    }

    /// Only `EnableAllFolders` counts; a list of explicit folders does not.
    pub fn is_enabled(&self) -> bool {
        self.enable_all_folders
    }

    pub fn is_disabled(&self) -> bool {
        !self.enable_all_folders && self.enabled_folders.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub desired_enabled: bool,
    pub current_enabled: bool,
    pub needs_update: bool,
}

/// Whether to write the policy when it differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Enforce,
    DryRun,
}

/// Access stays enabled strictly below the threshold.
pub fn desired_enabled(total_seconds: f64, threshold_minutes: u32) -> bool {
    total_seconds / 60.0 < f64::from(threshold_minutes)
}

pub fn decide(desired_enabled: bool, current: &AccessPolicy) -> Decision {
    let needs_update = if desired_enabled {
        !current.is_enabled()
    } else {
        !current.is_disabled()
    };
    Decision {
        desired_enabled,
        current_enabled: current.is_enabled(),
        needs_update,
    }
}

/// Update body for the desired state. Disabling also clears the explicit
/// folder list.
pub fn policy_update(desired_enabled: bool) -> PolicyUpdate {
    let update = PolicyUpdate::new(desired_enabled);
    if desired_enabled {
        update
    } else {
        update.clear_enabled_folders()
    }
}

pub fn desired_from_usage(
    usage: &Usage,
    threshold_minutes: u32,
    fallback: UsageFallback,
    logger: &Logger,
) -> bool {
    match usage {
        Usage::Known(usage) => {
            let enabled = desired_enabled(usage.total_seconds, threshold_minutes);
            if enabled {
                logger.info(format_args!(
                    "Watch time ({:.1} min) is within limit ({} min). Access enabled.",
                    usage.total_minutes(),
                    threshold_minutes
                ));
            } else {
                logger.info(format_args!(
                    "Watch time ({:.1} min) exceeds limit ({} min). Disabling access.",
                    usage.total_minutes(),
                    threshold_minutes
                ));
            }
            enabled
        }
        Usage::Unknown(_) => {
            logger.warn(format_args!(
                "Usage unknown, proceeding with configured default ({})",
                fallback
            ));
            fallback.enabled()
        }
    }
}

pub fn fetch_policy(api: &Api, account: &Account) -> Result<AccessPolicy> {
    let user = api.user(&account.id)?;
    Ok(AccessPolicy::from_remote(user.policy))
}

/// Bring the account's policy in line with `desired_enabled`, writing at most
/// once and only when the current policy differs.
pub fn reconcile(
    api: &Api,
    logger: &Logger,
    account: &Account,
    desired_enabled: bool,
    mode: Mode,
) -> Result<Decision> {
    let current = fetch_policy(api, account)?;
    let decision = decide(desired_enabled, &current);

    match (decision.desired_enabled, decision.needs_update) {
        (true, true) => logger.info("Library access is currently disabled, enabling..."),
        (true, false) => logger.info("Library access is already enabled, no update needed."),
        (false, true) => logger.info("Library access is currently enabled, disabling..."),
        (false, false) => logger.info("Library access is already disabled, no update needed."),
    };

    if !decision.needs_update {
        logger.info(if desired_enabled {
            "Library access remains enabled"
        } else {
            "Library access remains disabled"
        });
        return Ok(decision);
    }

    if mode == Mode::DryRun {
        logger.info("Dry run, policy not updated");
        return Ok(decision);
    }

    api.update_policy(&account.id, &policy_update(desired_enabled))?;
    logger.info(format_args!(
        "Successfully {} library access for user '{}'",
        if desired_enabled { "enabled" } else { "disabled" },
        account.name
    ));
    Ok(decision)
}
