use chrono::{DateTime, Utc};
use colored::*;
use log::kv::{self, Key, Value, VisitSource};
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Key-value name the logger lifts out of a record's context and renders as
/// `[Nms]`.
pub const DURATION_KEY: &str = "duration_ms";

static LOGGER: Lazy<ConsoleLogger> = Lazy::new(ConsoleLogger::default);

/// Installs the crate logger as the `log` backend.
pub fn init_with_config(config: LoggerConfig) -> Result<(), String> {
    let max_level = LevelFilter::from(config.min_level);
    LOGGER.update_config(config);

    log::set_logger(&*LOGGER).map_err(|e| format!("Failed to set logger: {:?}", e))?;
    log::set_max_level(max_level);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn color(&self) -> Color {
        match self {
            LogLevel::Trace => Color::Cyan,
            LogLevel::Debug => Color::Blue,
            LogLevel::Info => Color::Green,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            LogLevel::Trace => "🔍",
            LogLevel::Debug => "🐛",
            LogLevel::Info => "💡",
            LogLevel::Warn => "⚠️",
            LogLevel::Error => "❌",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// Parses `RUST_LOG`-style level names.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(LogLevel::Trace),
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warn),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }
}

impl From<Level> for LogLevel {
    fn from(level: Level) -> Self {
        match level {
            Level::Trace => LogLevel::Trace,
            Level::Debug => LogLevel::Debug,
            Level::Info => LogLevel::Info,
            Level::Warn => LogLevel::Warn,
            Level::Error => LogLevel::Error,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

/// One rendered log record. Serialized as-is for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub module: String,
    pub location: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub context: BTreeMap<String, serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub duration_ms: Option<u64>,
}

impl LogEntry {
    /// Captures a record, including its structured key-values.
    pub fn from_record(record: &Record) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            level: record.level().into(),
            message: record.args().to_string(),
            module: record
                .module_path()
                .unwrap_or_else(|| record.target())
                .to_string(),
            location: record
                .file()
                .map(|file| format!("{}:{}", file, record.line().unwrap_or(0))),
            context: BTreeMap::new(),
            duration_ms: None,
        };
        // A visitor that never fails cannot make this fail.
        let _ = record.key_values().visit(&mut entry);
        entry
    }
}

impl<'kvs> VisitSource<'kvs> for LogEntry {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        if key.as_str() == DURATION_KEY {
            if let Some(ms) = value.to_u64() {
                self.duration_ms = Some(ms);
                return Ok(());
            }
        }
        let json = match (value.to_bool(), value.to_i64(), value.to_f64()) {
            (Some(b), _, _) => serde_json::Value::from(b),
            (_, Some(n), _) => serde_json::Value::from(n),
            (_, _, Some(f)) => serde_json::Value::from(f),
            _ => serde_json::Value::from(value.to_string()),
        };
        self.context.insert(key.as_str().to_string(), json);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub min_level: LogLevel,
    pub show_colors: bool,
    pub show_emojis: bool,
    pub show_location: bool,
    pub include_timestamp: bool,
    pub timestamp_format: String,
    pub output_json: bool,
    pub log_file: Option<PathBuf>,
    pub prefix: Option<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LogLevel::Info,
            show_colors: true,
            show_emojis: true,
            show_location: false,
            include_timestamp: true,
            timestamp_format: "%Y-%m-%d %H:%M:%S%.3f".to_string(),
            output_json: false,
            log_file: None,
            prefix: None,
        }
    }
}

impl LoggerConfig {
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// JSON lines to stderr and `rinpaint.log`, no colour.
    pub fn production() -> Self {
        Self {
            show_colors: false,
            show_emojis: false,
            output_json: true,
            log_file: Some(PathBuf::from("rinpaint.log")),
            ..Default::default()
        }
    }

    pub fn development() -> Self {
        Self {
            min_level: LogLevel::Debug,
            show_location: true,
            ..Default::default()
        }
    }

    /// Picks a preset from `RINPAINT_ENV` (`production`, otherwise
    /// development), then applies `RUST_LOG`, `RINPAINT_LOG_FILE` and
    /// `NO_COLOR`.
    pub fn from_env() -> Self {
        let mut config = match env::var("RINPAINT_ENV").as_deref() {
            Ok("production") | Ok("prod") => Self::production(),
            _ => Self::development(),
        };
        if let Some(level) = env::var("RUST_LOG").ok().and_then(|v| LogLevel::parse(&v)) {
            config = config.with_level(level);
        }
        if let Ok(path) = env::var("RINPAINT_LOG_FILE") {
            if !path.is_empty() {
                config = config.with_file(path);
            }
        }
        if env::var_os("NO_COLOR").is_some() {
            config.show_colors = false;
        }
        config
    }
}

/// `log` backend writing coloured lines or JSON to stderr, optionally
/// mirrored to a file.
#[derive(Default)]
pub struct ConsoleLogger {
    config: Mutex<LoggerConfig>,
    file: Mutex<Option<File>>,
}

impl ConsoleLogger {
    pub fn update_config(&self, config: LoggerConfig) {
        let file = config.log_file.as_ref().and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| eprintln!("Failed to open log file {}: {}", path.display(), e))
                .ok()
        });
        if let Ok(mut slot) = self.file.lock() {
            *slot = file;
        }
        if let Ok(mut slot) = self.config.lock() {
            *slot = config;
        }
    }

    fn render(entry: &LogEntry, config: &LoggerConfig, colors: bool) -> String {
        if config.output_json {
            return serde_json::to_string(entry).unwrap_or_default();
        }
        let paint = |text: String, style: fn(String) -> ColoredString| -> String {
            if colors {
                style(text).to_string()
            } else {
                text
            }
        };

        let mut parts = Vec::new();
        if let Some(prefix) = &config.prefix {
            parts.push(format!("[{}]", paint(prefix.clone(), |s| s.bright_white().bold())));
        }
        if config.include_timestamp {
            let timestamp = entry.timestamp.format(&config.timestamp_format).to_string();
            parts.push(paint(timestamp, |s| s.bright_black()));
        }
        let level = if config.show_emojis {
            format!("{} {}", entry.level.emoji(), entry.level.as_str())
        } else {
            entry.level.as_str().to_string()
        };
        let level = if colors {
            level.color(entry.level.color()).bold().to_string()
        } else {
            level
        };
        parts.push(format!("[{}]", level));
        parts.push(format!("{}: {}", paint(entry.module.clone(), |s| s.bright_blue()), entry.message));

        if !entry.context.is_empty() {
            let context = serde_json::to_string(&entry.context).unwrap_or_default();
            parts.push(paint(context, |s| s.bright_cyan()));
        }
        if let Some(ms) = entry.duration_ms {
            parts.push(format!("[{}ms]", paint(ms.to_string(), |s| s.bright_magenta())));
        }
        if config.show_location {
            if let Some(location) = &entry.location {
                parts.push(format!("({})", paint(location.clone(), |s| s.bright_black())));
            }
        }
        parts.join(" ")
    }
}

impl log::Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.config
            .lock()
            .map(|config| metadata.level() <= LevelFilter::from(config.min_level))
            .unwrap_or(true)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let entry = LogEntry::from_record(record);
        let Ok(config) = self.config.lock() else {
            return;
        };

        eprintln!("{}", Self::render(&entry, &config, config.show_colors));
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                // no escape codes in files
                let _ = writeln!(file, "{}", Self::render(&entry, &config, false));
            }
        }
    }

    fn flush(&self) {
        let _ = io::stderr().flush();
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                let _ = file.flush();
            }
        }
    }
}

/// Logs how long a scope took when dropped, as a `duration_ms` key-value.
pub struct Timer {
    start: Instant,
    name: String,
    context: Option<String>,
}

impl Timer {
    pub fn new(name: &str) -> Self {
        log::debug!("⏱️  Starting timer: {}", name);
        Self {
            start: Instant::now(),
            name: name.to_string(),
            context: None,
        }
    }

    /// Tags the finishing line with a session id.
    pub fn for_session(name: &str, session: &str) -> Self {
        let mut timer = Self::new(name);
        timer.context = Some(session.to_string());
        timer
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let ms = u64::try_from(self.elapsed().as_millis()).unwrap_or(u64::MAX);
        match &self.context {
            Some(session) => log::info!(
                session = session.as_str(), duration_ms = ms;
                "⏱️  {} finished", self.name
            ),
            None => log::info!(duration_ms = ms; "⏱️  {} finished", self.name),
        }
    }
}

pub fn log_startup_info(app_name: &str, version: &str) {
    log::info!("🚀 Starting {} v{}", app_name, version);
    log::info!("📝 Logger initialized successfully");
}

pub fn log_config_info(config: &crate::config::Config) {
    log::info!("⚙️  Configuration loaded:");
    log::info!(
        "   Container: {}x{}",
        config.container.0,
        config.container.1
    );
    log::info!(
        "   Brush: {}px, rgba{:?}",
        config.brush.diameter,
        config.brush.color
    );
    match &config.gemini {
        Some(gemini) => {
            log::info!("   Model: {}", gemini.model_or_default());
            log::info!("   Endpoint: {}", gemini.endpoint_or_default());
            log::info!(
                "   API key: {}",
                if gemini.api_key.is_some() { "✅" } else { "❌" }
            );
        }
        None => log::info!("   Gemini: ❌"),
    }
}
