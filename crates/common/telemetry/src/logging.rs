// Copyright 2025 Crrow
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    env,
    io::IsTerminal,
    sync::{Arc, Mutex, Once},
};

use bon::Builder;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, de};
use smart_default::SmartDefault;
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Layer, Registry, filter, layer::SubscriberExt};

/// Deserializes a string value, using `Default::default()` if the string is
/// empty.
///
/// # Errors
/// Returns an error if deserialization fails.
pub fn empty_string_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let s = String::deserialize(deserializer)?;
    if s.is_empty() {
        Ok(T::default())
    } else {
        T::deserialize(de::value::StrDeserializer::new(&s)).map_err(|e: de::value::Error| {
            de::Error::custom(format!("invalid value, expect empty string, err: {e}"))
        })
    }
}

/// Configuration options for the logging system.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, SmartDefault, Builder)]
#[serde(default)]
pub struct LoggingOptions {
    /// Directory for log files. Empty means stdout only.
    ///
    /// Files rotate hourly; errors are additionally written to a separate
    /// `<app>-err` file.
    #[default = ""]
    #[builder(default, into)]
    pub dir: String,

    /// Log level filter, e.g. `"info"` or `"info,pqueue_common_storage_queue=debug"`.
    ///
    /// Falls back to `RUST_LOG`, then to `info`.
    #[builder(into)]
    pub level: Option<String>,

    #[serde(default, deserialize_with = "empty_string_as_default")]
    #[builder(default)]
    pub log_format: LogFormat,

    /// Maximum number of rotated files kept per log stream.
    #[default = 720]
    #[builder(default = 720)]
    pub max_log_files: usize,

    #[default = true]
    #[builder(default = true)]
    pub append_stdout: bool,
}

/// Available log output formats.
#[derive(
    Clone, Debug, Copy, PartialEq, Eq, Serialize, Deserialize, Default, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per event, for log aggregation.
    Json,

    /// Human-readable lines.
    ///
    /// ```text
    /// 2024-01-01T12:00:00.123Z  INFO pqueue_common_storage_queue::queue: Queue initialized
    /// ```
    #[default]
    Text,
}

/// Initialize logging for tests.
///
/// Logs go to files under `UNITTEST_LOG_DIR` (default
/// `/tmp/__unittest_logs`) at `UNITTEST_LOG_LEVEL` (default `debug`). Safe
/// to call from every test; only the first call has an effect.
pub fn init_default_ut_logging() {
    static START: Once = Once::new();

    START.call_once(|| {
        let mut g = GLOBAL_UT_LOG_GUARD
            .as_ref()
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let dir =
            env::var("UNITTEST_LOG_DIR").unwrap_or_else(|_| "/tmp/__unittest_logs".to_string());
        let level = env::var("UNITTEST_LOG_LEVEL").unwrap_or_else(|_| "debug".to_string());

        let opts = LoggingOptions::builder()
            .dir(dir.clone())
            .level(level)
            .append_stdout(false)
            .build();
        *g = Some(init_global_logging("unittest", &opts));

        tracing::info!("logs dir = {}", dir);
    });
}

/// Keeps the unit test writer guards alive for the whole test binary.
static GLOBAL_UT_LOG_GUARD: Lazy<Arc<Mutex<Option<Vec<WorkerGuard>>>>> =
    Lazy::new(|| Arc::new(Mutex::new(None)));

/// Default log level filter when no specific configuration is provided.
const DEFAULT_LOG_TARGETS: &str = "info";

/// Install the global tracing subscriber.
///
/// Layers, depending on `opts`:
/// - stdout (if `append_stdout`)
/// - `<dir>/<app_name>.*` hourly rotated (if `dir` is set)
/// - `<dir>/<app_name>-err.*` errors only (if `dir` is set)
///
/// Keep the returned guards alive for as long as logs should be flushed.
///
/// Only the first call installs anything; later calls return no guards.
///
/// # Panics
///
/// Panics if the log directory cannot be used, the level string does not
/// parse, or another global subscriber is already installed.
pub fn init_global_logging(app_name: &str, opts: &LoggingOptions) -> Vec<WorkerGuard> {
    static START: Once = Once::new();
    let mut guards = vec![];

    START.call_once(|| {
        LogTracer::init().expect("log tracer must be valid");

        let stdout_logging_layer = if opts.append_stdout {
            let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());
            guards.push(guard);

            let layer = tracing_subscriber::fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(std::io::stdout().is_terminal());
            Some(match opts.log_format {
                LogFormat::Json => layer.json().boxed(),
                LogFormat::Text => layer.boxed(),
            })
        } else {
            None
        };

        let (file_logging_layer, err_file_logging_layer) = if opts.dir.is_empty() {
            (None, None)
        } else {
            let (writer, guard) =
                tracing_appender::non_blocking(rolling_appender(app_name, "", opts));
            guards.push(guard);
            let (err_writer, err_guard) =
                tracing_appender::non_blocking(rolling_appender(app_name, "-err", opts));
            guards.push(err_guard);

            let layer = tracing_subscriber::fmt::Layer::new()
                .with_writer(writer)
                .with_ansi(false);
            let err_layer = tracing_subscriber::fmt::Layer::new()
                .with_writer(err_writer)
                .with_ansi(false);

            match opts.log_format {
                LogFormat::Json => (
                    Some(layer.json().boxed()),
                    Some(
                        err_layer
                            .json()
                            .with_filter(filter::LevelFilter::ERROR)
                            .boxed(),
                    ),
                ),
                LogFormat::Text => (
                    Some(layer.boxed()),
                    Some(err_layer.with_filter(filter::LevelFilter::ERROR).boxed()),
                ),
            }
        };

        let filter = opts
            .level
            .as_deref()
            .or(env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
            .unwrap_or(DEFAULT_LOG_TARGETS)
            .parse::<filter::Targets>()
            .expect("error parsing log level string");

        let subscriber = Registry::default()
            .with(filter)
            .with(stdout_logging_layer)
            .with(file_logging_layer)
            .with(err_file_logging_layer);

        tracing::subscriber::set_global_default(subscriber)
            .expect("error setting global tracing subscriber");
    });

    guards
}

fn rolling_appender(app_name: &str, suffix: &str, opts: &LoggingOptions) -> RollingFileAppender {
    RollingFileAppender::builder()
        .rotation(Rotation::HOURLY)
        .filename_prefix(format!("{app_name}{suffix}"))
        .max_log_files(opts.max_log_files)
        .build(&opts.dir)
        .unwrap_or_else(|e| {
            panic!(
                "initializing rolling file appender at {} failed: {}",
                &opts.dir, e
            )
        })
}
