// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: MPL-2.0

use std::fmt;

/// A non-success status returned by the media server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub endpoint: String,
    pub code: u16,
    pub canonical_reason: Option<String>,
    /// Response body, if the server sent one
    pub message: Option<String>,
}

impl ApiError {
    pub(crate) fn from_response(endpoint: &str, response: reqwest::blocking::Response) -> Self {
        let status = response.status();
        let message = response.text().ok().filter(|body| !body.trim().is_empty());
        Self {
            endpoint: endpoint.to_string(),
            code: status.as_u16(),
            canonical_reason: status.canonical_reason().map(str::to_string),
            message,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error = if let Some(reason) = &self.canonical_reason {
            format!("{} {}", self.code, reason)
        } else {
            format!("{}", self.code)
        };
        if let Some(message) = &self.message {
            write!(
                f,
                "'{}' from API endpoint '{}': {}",
                error, self.endpoint, message
            )
        } else {
            write!(f, "'{}' from API endpoint '{}'", error, self.endpoint)
        }
    }
}

impl std::error::Error for ApiError {}

#[derive(Debug)]
pub enum Error {
    Api(ApiError),
    Reqwest(reqwest::Error),
    SerdeJson(serde_json::Error),
}

impl Error {
    /// Status code of the failed call, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(err) => Some(err.code),
            Self::Reqwest(err) => err.status().map(|status| status.as_u16()),
            Self::SerdeJson(_) => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{}", err),
            Self::Reqwest(err) => write!(f, "{}", err),
            Self::SerdeJson(err) => write!(f, "invalid response body: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(err) => Some(err),
            Self::Reqwest(err) => Some(err),
            Self::SerdeJson(err) => Some(err),
        }
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Reqwest(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::SerdeJson(err)
    }
}
