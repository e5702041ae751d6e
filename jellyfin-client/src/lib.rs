// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: MPL-2.0

//! Blocking client for the few Jellyfin endpoints needed to read watch time and
//! toggle a user's library access.

use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    header, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use std::time::Duration;

mod error;
pub mod models;

pub use error::{ApiError, Error};
use models::{CustomQuery, CustomQueryResponse, PolicyUpdate, UserDto, UserSummary};

/// Connection settings for [`Api`].
#[derive(Clone, Debug)]
pub struct Options {
    pub base_url: String,
    pub client_name: String,
    pub token: String,
    /// Skip TLS certificate verification. Only for servers with self-signed
    /// certificates, and only when asked for explicitly.
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

pub struct Api {
    client: Client,
    base_url: String,
    authorization: String,
}

impl Api {
    pub fn new(options: &Options) -> Result<Self, Error> {
        let client = Client::builder()
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .timeout(options.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: options.base_url.trim_end_matches('/').to_string(),
            authorization: format!(
                "MediaBrowser Client=\"{}\", Token=\"{}\"",
                options.client_name, options.token
            ),
        })
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, endpoint))
            .header(header::AUTHORIZATION, &self.authorization)
    }

    fn send(endpoint: &str, request: RequestBuilder) -> Result<Response, Error> {
        let response = request.send()?;
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(endpoint, response).into())
        }
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, Error> {
        let response = Self::send(endpoint, self.request(Method::GET, endpoint))?;
        Ok(serde_json::from_slice(&response.bytes()?)?)
    }

    /// `GET /Users`
    pub fn users(&self) -> Result<Vec<UserSummary>, Error> {
        self.get_json("/Users")
    }

    /// `GET /Users/{id}`
    pub fn user(&self, id: &str) -> Result<UserDto, Error> {
        self.get_json(&format!("/Users/{}", id))
    }

    /// Run a pre-rendered query through the usage statistics plugin mounted at
    /// `plugin_path`. `stamp` is a cache buster in epoch milliseconds.
    pub fn submit_custom_query(
        &self,
        plugin_path: &str,
        query: &CustomQuery,
        stamp: i128,
    ) -> Result<CustomQueryResponse, Error> {
        let endpoint = format!(
            "/{}/submit_custom_query?stamp={}",
            plugin_path.trim_matches('/'),
            stamp
        );
        let request = self
            .request(Method::POST, &endpoint)
            .header(header::ACCEPT, "application/json")
            .json(query);
        let response = Self::send(&endpoint, request)?;
        Ok(serde_json::from_slice(&response.bytes()?)?)
    }

    /// `POST /Users/{id}/Policy`. Only 200 and 204 count as success.
    pub fn update_policy(&self, id: &str, policy: &PolicyUpdate) -> Result<(), Error> {
        let endpoint = format!("/Users/{}/Policy", id);
        let response = self
            .request(Method::POST, &endpoint)
            .json(policy)
            .send()?;
        match response.status() {
            StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
            _ => Err(ApiError::from_response(&endpoint, response).into()),
        }
    }
}
