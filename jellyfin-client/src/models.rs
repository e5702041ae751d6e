// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Wire schemas for the handful of endpoints this client speaks.
//!
//! Field names follow the server's PascalCase contract. Anything the server may
//! omit is an `Option`; callers decide on defaults.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_AUTHENTICATION_PROVIDER_ID: &str =
    "Jellyfin.Server.Implementations.Users.DefaultAuthenticationProvider";
pub const DEFAULT_PASSWORD_RESET_PROVIDER_ID: &str =
    "Jellyfin.Server.Implementations.Users.DefaultPasswordResetProvider";

/// Entry of `GET /Users`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
}

/// `GET /Users/{id}`
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDto {
    #[serde(default)]
    pub policy: Option<UserPolicy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPolicy {
    #[serde(default)]
    pub enable_all_folders: Option<bool>,
    #[serde(default)]
    pub enabled_folders: Option<Vec<String>>,
}

/// Body of `POST /Users/{id}/Policy`.
///
/// The provider ids must be present on every update or the server rejects it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyUpdate {
    pub authentication_provider_id: String,
    pub password_reset_provider_id: String,
    pub enable_all_folders: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled_folders: Option<Vec<String>>,
}

impl PolicyUpdate {
    pub fn new(enable_all_folders: bool) -> Self {
        Self {
            authentication_provider_id: DEFAULT_AUTHENTICATION_PROVIDER_ID.to_string(),
            password_reset_provider_id: DEFAULT_PASSWORD_RESET_PROVIDER_ID.to_string(),
            enable_all_folders,
            enabled_folders: None,
        }
    }

    pub fn clear_enabled_folders(mut self) -> Self {
        self.enabled_folders = Some(Vec::new());
        self
    }
}

/// Body of `POST /<plugin>/submit_custom_query`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomQuery {
    pub custom_query_string: String,
    pub replace_user_id: bool,
}

impl CustomQuery {
    pub fn new(sql: String) -> Self {
        Self {
            custom_query_string: sql,
            replace_user_id: false,
        }
    }
}

/// Tabular answer of the usage-statistics plugin.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CustomQueryResponse {
    /// Spelled `colums` by the plugin; that is the contract.
    #[serde(default, rename = "colums")]
    pub columns: Option<Vec<String>>,
    /// Rows are left untyped so one malformed row cannot sink the others.
    #[serde(default)]
    pub results: Option<Vec<Value>>,
    #[serde(default)]
    pub message: Option<String>,
}
