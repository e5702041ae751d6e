// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

//! Bound SQL templates for the usage statistics plugin.
//!
//! The plugin only accepts a finished query string, so values are rendered
//! into the text. This is a trust boundary: a value is only embedded if it is
//! an opaque server-issued identifier or an ISO date, and it is always quoted.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

const MAX_ID_LEN: usize = 64;

pub const PLAYBACK_ACTIVITY_TODAY: &str = "SELECT ROWID, *
FROM PlaybackActivity
WHERE DATE(DateCreated) = :today
AND UserId = :user_id
ORDER BY rowid DESC";

/// A value that may be rendered into query text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Bind {
    /// Server-issued identifier: ASCII alphanumerics and `-`
    Id(String),
    /// Calendar date, `YYYY-MM-DD`
    Date(String),
}

impl Bind {
    fn validate(&self) -> Result<&str> {
        match self {
            Self::Id(id) => {
                if id.is_empty()
                    || id.len() > MAX_ID_LEN
                    || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                {
                    return Err(Error::DataShape(format!(
                        "refusing to embed identifier {:?} in query",
                        id
                    )));
                }
                Ok(id)
            }
            Self::Date(date) => {
                let b = date.as_bytes();
                let ok = b.len() == 10
                    && b[4] == b'-'
                    && b[7] == b'-'
                    && b.iter()
                        .enumerate()
                        .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
                if !ok {
                    return Err(Error::DataShape(format!(
                        "refusing to embed date {:?} in query",
                        date
                    )));
                }
                Ok(date)
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct QueryTemplate {
    text: &'static str,
    binds: BTreeMap<&'static str, Bind>,
}

impl QueryTemplate {
    pub fn new(text: &'static str) -> Self {
        Self {
            text,
            binds: BTreeMap::new(),
        }
    }

    pub fn bind(mut self, name: &'static str, value: Bind) -> Self {
        self.binds.insert(name, value);
        self
    }

    /// Substitute every `:name` placeholder. Fails on invalid values, unbound
    /// placeholders and binds the text never uses.
    pub fn render(&self) -> Result<String> {
        let mut out = String::with_capacity(self.text.len());
        let mut used = Vec::new();
        let mut rest = self.text;
        while let Some(pos) = rest.find(':') {
            out.push_str(&rest[..pos]);
            let after = &rest[pos + 1..];
            let starts_name = after
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '_');
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            if !starts_name {
                out.push(':');
                rest = after;
                continue;
            }
            let name = &after[..name_len];
            let value = self
                .binds
                .get(name)
                .ok_or_else(|| Error::DataShape(format!("unbound query parameter :{}", name)))?;
            out.push('\'');
            out.push_str(value.validate()?);
            out.push('\'');
            used.push(name);
            rest = &after[name_len..];
        }
        out.push_str(rest);

        if let Some(unused) = self
            .binds
            .keys()
            .find(|name| !used.iter().any(|used| used == *name))
        {
            return Err(Error::DataShape(format!(
                "query parameter :{} is never used",
                unused
            )));
        }
        Ok(out)
    }
}

pub fn playback_activity_today(user_id: &str, today: &str) -> Result<String> {
    QueryTemplate::new(PLAYBACK_ACTIVITY_TODAY)
        .bind("today", Bind::Date(today.to_string()))
        .bind("user_id", Bind::Id(user_id.to_string()))
        .render()
}
