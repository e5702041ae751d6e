// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// Missing or invalid setting; raised before any network call
    Configuration(String),
    /// A call that must succeed did not
    RemoteUnavailable(jellyfin_client::Error),
    UserNotFound(String),
    /// Usage response without the columns list or duration column, or a value
    /// refused by the query template
    DataShape(String),
    /// One row's duration could not be read
    Parse(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Configuration(message) => write!(f, "configuration error: {}", message),
            Self::RemoteUnavailable(err) => write!(f, "remote unavailable: {}", err),
            Self::UserNotFound(name) => write!(f, "user '{}' not found", name),
            Self::DataShape(message) => write!(f, "unexpected response shape: {}", message),
            Self::Parse(message) => write!(f, "parse error: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::RemoteUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<jellyfin_client::Error> for Error {
    fn from(err: jellyfin_client::Error) -> Self {
        Self::RemoteUnavailable(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
