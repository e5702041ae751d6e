// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

use time::{macros::format_description, OffsetDateTime, UtcOffset};

/// Wall clock pinned to the local offset observed at startup.
///
/// The offset must be read before any other thread exists (the blocking HTTP
/// client spawns one), so it is captured once and carried around.
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    offset: UtcOffset,
}

impl Clock {
    /// Falls back to UTC if the local offset cannot be determined.
    pub fn local() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }

    pub fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    /// `YYYY-MM-DD HH:MM:SS`
    pub fn timestamp(&self) -> String {
        self.now()
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

/// Local calendar date as `YYYY-MM-DD`.
pub fn date_string(time: OffsetDateTime) -> String {
    time.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| "unknown".to_string())
}

/// Epoch milliseconds, used as a cache buster.
pub fn epoch_millis(time: OffsetDateTime) -> i128 {
    time.unix_timestamp_nanos() / 1_000_000
}
