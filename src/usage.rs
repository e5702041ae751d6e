// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use jellyfin_client::{
    models::{CustomQuery, CustomQueryResponse},
    Api,
};
use serde_json::Value;

use crate::{
    clock::{self, Clock},
    error::{Error, Result},
    logger::Logger,
    query,
    resolver::Account,
};

pub const DURATION_COLUMN: &str = "PlayDuration";

/// Today's playback, summed over the rows that could be read.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AggregateUsage {
    pub total_seconds: f64,
    pub sample_count: usize,
    /// Rows dropped because their duration was missing or unreadable
    pub skipped: usize,
}

impl AggregateUsage {
    pub fn total_minutes(&self) -> f64 {
        self.total_seconds / 60.0
    }
}

/// Outcome of asking the server for today's usage.
#[derive(Debug)]
pub enum Usage {
    Known(AggregateUsage),
    /// Query failed or its answer could not be interpreted
    Unknown(Error),
}

/// Read one duration cell. Plugins return numbers as strings or as numbers.
pub fn parse_duration(value: &Value) -> Result<f64> {
    let seconds = match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::Parse(format!("could not parse duration value: {:?}", s)))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| Error::Parse(format!("could not parse duration value: {}", n)))?,
        other => {
            return Err(Error::Parse(format!(
                "could not parse duration value: {}",
                other
            )))
        }
    };
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(Error::Parse(format!("duration out of range: {}", seconds)));
    }
    Ok(seconds)
}

/// Sum the duration column. Bad rows are skipped with a warning; a response
/// without the columns list or the duration column is a `DataShape` error.
pub fn aggregate(response: &CustomQueryResponse, logger: &Logger) -> Result<AggregateUsage> {
    let rows = match response.results.as_deref() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            logger.info("No playback activity found for today");
            return Ok(AggregateUsage::default());
        }
    };

    let columns = match response.columns.as_deref() {
        Some(columns) if !columns.is_empty() => columns,
        _ => return Err(Error::DataShape("no columns found in response".to_string())),
    };
    let index = columns
        .iter()
        .position(|column| column == DURATION_COLUMN)
        .ok_or_else(|| {
            Error::DataShape(format!(
                "{} column not found, available columns: {:?}",
                DURATION_COLUMN, columns
            ))
        })?;

    let mut usage = AggregateUsage::default();
    for (i, row) in rows.iter().enumerate() {
        let row = match row.as_array() {
            Some(row) => row,
            None => {
                logger.warn(format_args!("Warning: row {} is not a list: {}", i, row));
                usage.skipped += 1;
                continue;
            }
        };
        let value = match row.get(index) {
            Some(value) => value,
            None => {
                logger.warn(format_args!(
                    "Warning: row {} has {} values, expected at least {}",
                    i,
                    row.len(),
                    index + 1
                ));
                usage.skipped += 1;
                continue;
            }
        };
        match parse_duration(value) {
            Ok(seconds) => {
                usage.total_seconds += seconds;
                usage.sample_count += 1;
            }
            Err(err) => {
                logger.warn(format_args!("Warning: {}", err));
                usage.skipped += 1;
            }
        }
    }
    Ok(usage)
}

/// Query and sum today's playback for `account`. Never fails: anything that
/// goes wrong comes back as `Usage::Unknown`.
pub fn fetch_usage(
    api: &Api,
    logger: &Logger,
    clock: &Clock,
    plugin_path: &str,
    account: &Account,
) -> Usage {
    let now = clock.now();
    let today = clock::date_string(now);
    logger.info(format_args!("Querying playback activity for date: {}", today));

    let sql = match query::playback_activity_today(&account.id, &today) {
        Ok(sql) => sql,
        Err(err) => {
            logger.warn(format_args!("Warning: {}", err));
            return Usage::Unknown(err);
        }
    };

    let response = match api.submit_custom_query(
        plugin_path,
        &CustomQuery::new(sql),
        clock::epoch_millis(now),
    ) {
        Ok(response) => response,
        Err(err) => {
            match err.status() {
                Some(status) => logger.warn(format_args!(
                    "Warning: Could not fetch activity data: {}",
                    status
                )),
                None => logger.warn("Warning: Could not fetch activity data"),
            };
            logger.warn(format_args!("Response: {}", err));
            return Usage::Unknown(err.into());
        }
    };

    match aggregate(&response, logger) {
        Ok(usage) => {
            logger.info(format_args!(
                "User '{}' total watch time (today): {:.1} minutes ({} seconds)",
                account.name,
                usage.total_minutes(),
                usage.total_seconds
            ));
            Usage::Known(usage)
        }
        Err(err) => {
            logger.warn(format_args!("Warning: {}", err));
            Usage::Unknown(err)
        }
    }
}
