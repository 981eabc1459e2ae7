//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use holo_bgpsec::cache;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub logging: Logging,
    pub ski_cache: cache::Config,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Logging {
    pub file: LoggingFile,
    pub stderr: LoggingStderr,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFile {
    pub enabled: bool,
    pub dir: String,
    pub name: String,
    pub rotation: LoggingFileRotation,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingStderr {
    pub enabled: bool,
    #[serde(flatten)]
    pub fmt: LoggingFmt,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingFmt {
    pub style: LoggingFmtStyle,
    pub colors: bool,
    pub show_thread_id: bool,
    pub show_source: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFileRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoggingFmtStyle {
    Compact,
    Full,
    Json,
    Pretty,
}

// ===== impl Config =====

impl Config {
    // Loads the configuration file, if one was given.
    //
    // A missing or unreadable file falls back to the default configuration.
    // A file that fails to parse is fatal.
    pub(crate) fn load(config_file: Option<&str>) -> Config {
        let Some(config_file) = config_file else {
            return Config::default();
        };

        match std::fs::read_to_string(config_file) {
            Ok(config_str) => match toml::from_str(&config_str) {
                Ok(config) => config,
                Err(error) => {
                    eprintln!("Failed to parse configuration file: {error}");
                    std::process::exit(1);
                }
            },
            Err(error) => {
                eprintln!("Failed to load configuration file: {error}");
                eprintln!("Falling back to default configuration...");
                Config::default()
            }
        }
    }
}

// ===== impl LoggingFile =====

impl Default for LoggingFile {
    fn default() -> LoggingFile {
        // Relative to the working directory of the replay.
        LoggingFile {
            enabled: false,
            dir: ".".to_owned(),
            name: "ski-replay.log".to_owned(),
            rotation: Default::default(),
            fmt: Default::default(),
        }
    }
}

// ===== impl LoggingStderr =====

impl Default for LoggingStderr {
    fn default() -> LoggingStderr {
        LoggingStderr {
            enabled: true,
            fmt: LoggingFmt {
                style: LoggingFmtStyle::Compact,
                ..Default::default()
            },
        }
    }
}

// ===== impl LoggingFmt =====

impl Default for LoggingFmt {
    fn default() -> LoggingFmt {
        LoggingFmt {
            style: LoggingFmtStyle::Full,
            colors: false,
            show_thread_id: false,
            show_source: false,
        }
    }
}
