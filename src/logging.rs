//! Structured JSONL logging plus human-readable stderr output.
//!
//! Dual-output logging:
//! - **JSONL to file** (~/.notch-tasks/logs/notch-tasks.jsonl) - structured
//!   for tooling
//! - **Compact to stderr** - human-readable for developers
//!
//! ```rust,ignore
//! // Initialize logging - keep the guard alive for the program's lifetime
//! let _guard = logging::init();
//!
//! tracing::info!(event_type = "app_start", "Application started");
//! ```

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// In-memory ring buffer for the debug overlay
static LOG_BUFFER: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();
const MAX_LOG_LINES: usize = 50;

/// Guard that must be kept alive for the duration of the program.
/// Dropping it flushes and closes the log file.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the dual-output logging system.
///
/// Returns a guard that must be kept alive for the duration of the program;
/// dropping it flushes remaining logs and closes the file.
pub fn init() -> LoggingGuard {
    let _ = LOG_BUFFER.set(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));

    let log_dir = get_log_dir();
    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("[LOGGING] Failed to create log directory: {}", e);
    }

    let log_path = log_dir.join("notch-tasks.jsonl");

    // Open with append; a broken path falls back to a sink writer
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map(|f| Box::new(f) as Box<dyn std::io::Write + Send>)
        .unwrap_or_else(|e| {
            eprintln!("[LOGGING] Failed to open log file: {}", e);
            Box::new(std::io::sink())
        });

    // Non-blocking writer so logging never stalls the pump
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file);

    // Default to info, override via RUST_LOG
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,global_hotkey=warn,tray_icon=warn"));

    // JSONL layer for file output
    let json_layer = fmt::layer()
        .json()
        .with_writer(non_blocking_file)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_span_events(FmtSpan::NONE);

    // Compact layer for stderr
    let pretty_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .compact();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();

    tracing::info!(
        event_type = "app_lifecycle",
        action = "started",
        log_path = %log_path.display(),
        "Logging initialized"
    );

    LoggingGuard {
        _file_guard: file_guard,
    }
}

/// Log directory (~/.notch-tasks/logs/)
fn get_log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".notch-tasks").join("logs"))
        .unwrap_or_else(|| std::env::temp_dir().join("notch-tasks-logs"))
}

/// Path to the JSONL log file
pub fn log_path() -> PathBuf {
    get_log_dir().join("notch-tasks.jsonl")
}

/// Category-tagged log line. Also lands in the ring buffer for the debug
/// overlay. Prefer tracing macros directly when structured fields help:
/// ```rust,ignore
/// tracing::info!(category = "SESSION", dwell_ms = 300, "trigger armed");
/// ```
pub fn log(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::info!(category = category, "{}", message);
}

fn add_to_buffer(category: &str, message: &str) {
    if let Some(buffer) = LOG_BUFFER.get() {
        if let Ok(mut buf) = buffer.lock() {
            if buf.len() >= MAX_LOG_LINES {
                buf.pop_front();
            }
            buf.push_back(format!("[{}] {}", category, message));
        }
    }
}

/// Recent log lines for the debug overlay
pub fn get_recent_logs() -> Vec<String> {
    if let Some(buffer) = LOG_BUFFER.get() {
        if let Ok(buf) = buffer.lock() {
            return buf.iter().cloned().collect();
        }
    }
    Vec::new()
}

/// Debug-only logging - compiled out in release builds.
/// Use for verbose per-pump sampling logs.
#[cfg(debug_assertions)]
pub fn log_debug(category: &str, message: &str) {
    add_to_buffer(category, message);
    tracing::debug!(category = category, "{}", message);
}

#[cfg(not(debug_assertions))]
pub fn log_debug(_category: &str, _message: &str) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_caps_at_max_lines() {
        let _ = LOG_BUFFER.set(Mutex::new(VecDeque::with_capacity(MAX_LOG_LINES)));
        for i in 0..(MAX_LOG_LINES + 10) {
            add_to_buffer("TEST", &format!("line {}", i));
        }
        // The buffer is process-global and other tests log into it, so
        // only assert on this test's own lines: eviction drops oldest
        // first, so the survivors are always the newest tail.
        let logs = get_recent_logs();
        assert!(logs.len() <= MAX_LOG_LINES);
        let own: Vec<&String> = logs.iter().filter(|l| l.starts_with("[TEST]")).collect();
        assert!(own.len() <= MAX_LOG_LINES);
        assert!(!own.iter().any(|l| l.as_str() == "[TEST] line 0"));
        if let Some(last) = own.last() {
            assert_eq!(last.as_str(), "[TEST] line 59");
        }
    }

    #[test]
    fn log_path_is_under_logs_dir() {
        let path = log_path();
        assert!(path.ends_with("logs/notch-tasks.jsonl") || path.ends_with("notch-tasks.jsonl"));
    }
}
