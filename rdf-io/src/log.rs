//! Pluggable log callback (§6.4): a domain string, a level, structured
//! key-value fields, and a formatted message. Grounded in the teacher's
//! `storage::observability` module, which wires `tracing` spans around
//! every store operation; here the same idiom reports reader/writer
//! diagnostics instead of storage-operation latency.

use rdf_model::Cursor;

/// Log levels, matching the syslog-style severities §6.4 names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Emerg,
    Alert,
    Crit,
    Err,
    Warning,
    Notice,
    Info,
    Debug,
}

/// One structured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry<'a> {
    pub domain: &'a str,
    pub level: Level,
    pub cursor: Option<&'a Cursor>,
    pub status: Option<&'a str>,
    pub message: &'a str,
}

/// A pluggable log sink.
pub trait LogSink {
    fn log(&mut self, entry: LogEntry<'_>);
}

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct QuietLog;

impl LogSink for QuietLog {
    fn log(&mut self, _entry: LogEntry<'_>) {}
}

/// Forwards entries to `tracing`, attaching `file`/`line`/`col`/`status` as
/// structured fields the way `storage::observability` attaches operation
/// metadata to its spans.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl LogSink for TracingLog {
    fn log(&mut self, entry: LogEntry<'_>) {
        let (line, col) = entry.cursor.map(|c| (c.line, c.column)).unwrap_or((0, 0));
        let status = entry.status.unwrap_or("");
        match entry.level {
            Level::Emerg | Level::Alert | Level::Crit | Level::Err => {
                tracing::error!(domain = entry.domain, line, col, status, "{}", entry.message)
            }
            Level::Warning => {
                tracing::warn!(domain = entry.domain, line, col, status, "{}", entry.message)
            }
            Level::Notice | Level::Info => {
                tracing::info!(domain = entry.domain, line, col, status, "{}", entry.message)
            }
            Level::Debug => {
                tracing::debug!(domain = entry.domain, line, col, status, "{}", entry.message)
            }
        }
    }
}
