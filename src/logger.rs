// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

//! Line logger for cron runs.
//!
//! Every line is `[YYYY-MM-DD HH:MM:SS] LEVEL message`. A message whose text is
//! identical to the previous one is dropped whatever its level, including
//! across runs when logging to a file, so a job firing every few minutes
//! doesn't flood the log.

use std::{
    cell::RefCell,
    fmt,
    fs::{self, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use log::Level;

use crate::{clock::Clock, util::lock};

/// Bytes read from the end of an existing log file to find its last line.
const TAIL_LEN: u64 = 4096;
/// Width of the padded level column plus its separator.
const LEVEL_LEN: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Sink {
    Stderr,
    File(PathBuf),
}

pub struct Logger {
    sink: Sink,
    level: Level,
    clock: Clock,
    last: RefCell<Option<String>>,
}

/// Strip the `[timestamp] LEVEL ` prefix of a written line.
fn message_of(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('[')?;
    let (_, entry) = rest.split_once("] ")?;
    entry.get(LEVEL_LEN..)
}

fn last_entry(path: &Path) -> io::Result<Option<String>> {
    let mut file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err),
    };
    let len = file.metadata()?.len();
    file.seek(SeekFrom::Start(len.saturating_sub(TAIL_LEN)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    let tail = String::from_utf8_lossy(&tail);
    Ok(tail
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .and_then(message_of)
        .map(str::to_string))
}

fn append(path: &Path, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    lock::setlk_wait(&file)?;
    let res = file.write_all(line.as_bytes());
    unlocked(path, res, lock::unlck(&file))
}

/// The write decides the outcome; the line is on disk even if the unlock fails.
fn unlocked(path: &Path, write: io::Result<()>, unlock: nix::Result<()>) -> io::Result<()> {
    if let Err(err) = unlock {
        eprintln!("Failed to unlock `{}`: {}", path.display(), err);
    }
    write
}

impl Logger {
    pub fn new(sink: Sink, level: Level, clock: Clock) -> Self {
        let last = match &sink {
            Sink::File(path) => last_entry(path).unwrap_or_else(|err| {
                eprintln!("Failed to read `{}`: {}", path.display(), err);
                None
            }),
            Sink::Stderr => None,
        };
        Self {
            sink,
            level,
            clock,
            last: RefCell::new(last),
        }
    }

    pub fn stderr(level: Level, clock: Clock) -> Self {
        Self::new(Sink::Stderr, level, clock)
    }

    /// Write `message` unless it is below the configured level or repeats the
    /// previous entry. Returns whether a line was written.
    pub fn log(&self, level: Level, message: impl fmt::Display) -> bool {
        if level > self.level {
            return false;
        }
        let message = message.to_string().replace('\n', " ");
        if self.last.borrow().as_deref() == Some(message.as_str()) {
            return false;
        }
        let line = format!("[{}] {:<5} {}\n", self.clock.timestamp(), level, message);
        match &self.sink {
            Sink::Stderr => eprint!("{}", line),
            Sink::File(path) => {
                if let Err(err) = append(path, &line) {
                    eprintln!("Failed to write `{}`: {}", path.display(), err);
                    eprint!("{}", line);
                }
            }
        }
        *self.last.borrow_mut() = Some(message);
        true
    }

    pub fn error(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Error, message)
    }

    pub fn warn(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Warn, message)
    }

    pub fn info(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Info, message)
    }

    pub fn debug(&self, message: impl fmt::Display) -> bool {
        self.log(Level::Debug, message)
    }
}
