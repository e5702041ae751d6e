// SPDX-FileCopyrightText: 2024 jellyfin-time-limiter contributors
//
// SPDX-License-Identifier: GPL-3.0-only

mod enforce;
mod status;

use anyhow::Context;
use jellyfin_client::Api;
use std::{env, process};

use crate::{
    clock::Clock,
    config::Config,
    logger::{Logger, Sink},
    util::lock::{self, RunLock},
};

/// State shared by every subcommand, built once per process.
pub(crate) struct Session {
    pub config: Config,
    pub logger: Logger,
    pub clock: Clock,
    pub api: Api,
    _lock: Option<RunLock>,
}

fn session(clock: Clock) -> Session {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            Logger::stderr(log::Level::Error, clock).error(format_args!("Error: {}", err));
            process::exit(1);
        }
    };
    let sink = match &config.log_file {
        Some(path) => Sink::File(path.clone()),
        None => Sink::Stderr,
    };
    let logger = Logger::new(sink, config.log_level, clock);

    let _lock = match &config.lock_file {
        Some(path) => match lock::try_lock_file(path)
            .with_context(|| format!("Failed to lock `{}`", path.display()))
        {
            Ok(Some(lock)) => Some(lock),
            Ok(None) => {
                logger.info("Another run is in progress, exiting");
                process::exit(0);
            }
            Err(err) => {
                logger.error(format_args!("Error: {:#}", err));
                process::exit(1);
            }
        },
        None => None,
    };

    let api = match Api::new(&config.api_options()).context("Failed to create HTTP client") {
        Ok(api) => api,
        Err(err) => {
            logger.error(format_args!("Error: {:#}", err));
            process::exit(1);
        }
    };
    if config.accept_invalid_certs {
        logger.debug("TLS certificate verification is disabled");
    }

    Session {
        config,
        logger,
        clock,
        api,
        _lock,
    }
}

enum Command {
    Enforce,
    Status,
}

pub fn run() {
    // Must happen before the HTTP client starts its thread
    let clock = Clock::local();

    let mut args = env::args();
    let _ = args.next();
    let cmd = match args.next().as_deref() {
        None | Some("enforce") => Command::Enforce,
        Some("status") => Command::Status,
        _ => {
            eprintln!("Usage: jellyfin-time-limiter [enforce|status]");
            process::exit(1);
        }
    };

    let session = session(clock);
    let res = match cmd {
        Command::Enforce => enforce::run(&session),
        Command::Status => status::run(&session),
    };
    if let Err(err) = res {
        session.logger.error(format_args!("Error: {:#}", err));
        process::exit(1);
    }
}
