//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

mod config;

use std::io::Write;

use clap::{App, Arg};
use config::{Config, LoggingFileRotation, LoggingFmtStyle};
use crossbeam_channel::Receiver;
use holo_bgpsec::cache::{
    CacheStats, ChannelNotifier, CleanProgress, KeyChange, RegResult,
    SkiCache,
};
use holo_bgpsec::index::CleanStats;
use holo_bgpsec::key::{AlgoId, Ski};
use holo_bgpsec::server;
use holo_bgpsec::update::UpdateId;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

// Recorded SKI cache operation, one per line of the events file.
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case", deny_unknown_fields)]
enum Event {
    RegisterKey {
        asn: u32,
        ski: Ski,
        algo_id: AlgoId,
    },
    UnregisterKey {
        asn: u32,
        ski: Ski,
        algo_id: AlgoId,
    },
    RegisterUpdate {
        update_id: UpdateId,
        #[serde(with = "hex")]
        attr: Vec<u8>,
    },
    UnregisterUpdate {
        update_id: UpdateId,
    },
    Clean,
    CleanStep,
    Stats,
}

// Replay output, one per line.
#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
enum Output {
    Verdict {
        update_id: UpdateId,
        result: RegResult,
    },
    KeyChange(KeyChange),
    Clean(CleanStats),
    CleanStep(CleanProgress),
    Stats(CacheStats),
}

// ===== impl Event =====

impl Event {
    fn apply(self, cache: &mut SkiCache) -> Option<Output> {
        match self {
            Event::RegisterKey { asn, ski, algo_id } => {
                server::register_key_ski(cache, &ski, algo_id, asn);
                None
            }
            Event::UnregisterKey { asn, ski, algo_id } => {
                server::unregister_key_ski(cache, &ski, algo_id, asn);
                None
            }
            Event::RegisterUpdate { update_id, attr } => {
                let result =
                    server::register_update_ski(cache, update_id, &attr);
                Some(Output::Verdict { update_id, result })
            }
            Event::UnregisterUpdate { update_id } => {
                server::unregister_update_ski(cache, update_id);
                None
            }
            Event::Clean => Some(Output::Clean(cache.clean())),
            Event::CleanStep => Some(Output::CleanStep(cache.clean_step())),
            Event::Stats => Some(Output::Stats(cache.stats())),
        }
    }
}

// ===== helper functions =====

fn write_output(
    out: &mut impl Write,
    output: &Output,
) -> std::io::Result<()> {
    serde_json::to_writer(&mut *out, output)?;
    writeln!(out)
}

fn replay(
    cache: &mut SkiCache,
    notifications: &Receiver<KeyChange>,
    events: &str,
    out: &mut impl Write,
) -> std::io::Result<usize> {
    let mut count = 0;

    for (line, event) in events.lines().enumerate() {
        let line = line + 1;
        if event.trim().is_empty() {
            continue;
        }
        let event = match serde_json::from_str::<Event>(event) {
            Ok(event) => event,
            Err(error) => {
                warn!(%line, %error, "skipping invalid event");
                continue;
            }
        };

        let output = event.apply(cache);

        // Notifications are delivered before the operation returns.
        for change in notifications.try_iter() {
            write_output(out, &Output::KeyChange(change))?;
        }
        if let Some(output) = output {
            write_output(out, &output)?;
        }
        count += 1;
    }

    out.flush()?;
    Ok(count)
}

fn init_tracing(config: &config::Logging) {
    // Enable logging to a file.
    let file = config.file.enabled.then(|| {
        let file_appender = match config.file.rotation {
            LoggingFileRotation::Never => {
                rolling::never(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Hourly => {
                rolling::hourly(&config.file.dir, &config.file.name)
            }
            LoggingFileRotation::Daily => {
                rolling::daily(&config.file.dir, &config.file.name)
            }
        };

        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(false)
            .with_thread_ids(config.file.fmt.show_thread_id)
            .with_file(config.file.fmt.show_source)
            .with_line_number(config.file.fmt.show_source)
            .with_ansi(config.file.fmt.colors);
        let layer = match config.file.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    // Enable logging to stderr. Stdout carries the replay output.
    let stderr = config.stderr.enabled.then(|| {
        let log_level_filter = LevelFilter::from_level(tracing::Level::TRACE);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(config.stderr.fmt.show_thread_id)
            .with_file(config.stderr.fmt.show_source)
            .with_line_number(config.stderr.fmt.show_source)
            .with_ansi(config.stderr.fmt.colors);
        let layer = match config.stderr.fmt.style {
            LoggingFmtStyle::Compact => layer.compact().boxed(),
            LoggingFmtStyle::Full => layer.boxed(),
            LoggingFmtStyle::Json => layer.json().boxed(),
            LoggingFmtStyle::Pretty => layer.pretty().boxed(),
        };
        layer.with_filter(log_level_filter)
    });

    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(file)
        .with(stderr)
        .init();
}

// ===== main =====

fn main() {
    // Parse command-line parameters.
    let matches = App::new("Replay SKI cache events")
        .about("Replay SKI cache operations from a record file")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::with_name("FILENAME")
                .help("Events file path, or - for standard input")
                .required(true)
                .index(1),
        )
        .get_matches();
    let config = Config::load(matches.value_of("config"));
    let filename = matches.value_of("FILENAME").unwrap_or("-");

    init_tracing(&config.logging);

    // Read events.
    let events = if filename == "-" {
        std::io::read_to_string(std::io::stdin())
    } else {
        std::fs::read_to_string(filename)
    };
    let events = match events {
        Ok(events) => events,
        Err(error) => {
            error!(%filename, %error, "failed to read events file");
            std::process::exit(1);
        }
    };

    // Replay events.
    let (tx, rx) = crossbeam_channel::unbounded();
    let mut cache = SkiCache::new(config.ski_cache, ChannelNotifier::new(tx));
    let mut stdout = std::io::stdout().lock();
    match replay(&mut cache, &rx, &events, &mut stdout) {
        Ok(count) => info!(%count, "replay finished"),
        Err(error) => {
            error!(%error, "failed to write replay output");
            std::process::exit(1);
        }
    }
    cache.release();
}
