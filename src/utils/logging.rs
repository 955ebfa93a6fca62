//! Structured Logging with Redaction
//!
//! Log lines go to stderr as `[timestamp] LEVEL [module] message | k=v ...`.
//! Each field is classified by its key before it is rendered: secrets and
//! key handles never appear, addresses and hashes are shortened.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);

/// Turn debug-level output on for the rest of the process
pub fn enable_debug() {
    DEBUG_ENABLED.store(true, Ordering::Relaxed);
}

pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a field value is shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sensitivity {
    Plain,
    Address,
    Digest,
    Secret,
}

impl Sensitivity {
    fn of(key: &str) -> Self {
        let key = key.to_ascii_lowercase();
        let has_suffix = |name: &str| key == name || key.ends_with(&format!("_{}", name));

        if ["secret", "private", "seed", "password", "key_handle", "slot"]
            .iter()
            .any(|k| key.contains(k))
        {
            Sensitivity::Secret
        } else if ["address", "sender", "from", "to"].iter().any(|k| has_suffix(*k)) {
            Sensitivity::Address
        } else if ["hash", "digest", "raw"].iter().any(|k| key.contains(k)) {
            Sensitivity::Digest
        } else {
            Sensitivity::Plain
        }
    }

    fn apply(self, value: &str) -> String {
        let value = value.trim();
        if value.is_empty() && self != Sensitivity::Plain {
            return "[EMPTY]".to_string();
        }
        match self {
            Sensitivity::Plain => value.to_string(),
            Sensitivity::Secret => format!("[REDACTED:{}chars]", value.len()),
            Sensitivity::Address => shorten(value, 6, 4),
            Sensitivity::Digest => shorten(value, 10, 6),
        }
    }
}

/// Keep `head` hex digits after an optional `0x` and the last `tail`
fn shorten(value: &str, head: usize, tail: usize) -> String {
    let prefix = if value.starts_with("0x") { 2 } else { 0 };
    let keep = prefix + head;
    if !value.is_ascii() || value.len() <= keep + tail + 3 {
        return value.to_string();
    }
    format!("{}...{}", &value[..keep], &value[value.len() - tail..])
}

/// One log line under construction
#[derive(Debug)]
pub struct LogEntry {
    pub level: LogLevel,
    pub module: &'static str,
    pub message: String,
    pub fields: Vec<(&'static str, String)>,
}

impl LogEntry {
    pub fn new(level: LogLevel, module: &'static str, message: impl Into<String>) -> Self {
        Self {
            level,
            module,
            message: message.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, key: &'static str, value: impl fmt::Display) -> Self {
        let shown = Sensitivity::of(key).apply(&value.to_string());
        self.fields.push((key, shown));
        self
    }

    /// The line without its timestamp
    pub fn render(&self) -> String {
        let mut line = format!("{} [{}] {}", self.level, self.module, self.message);
        for (i, (key, value)) in self.fields.iter().enumerate() {
            line.push_str(if i == 0 { " | " } else { " " });
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        line
    }

    pub fn log(self) {
        if self.level == LogLevel::Debug && !is_debug_enabled() {
            return;
        }
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        eprintln!("[{}] {}", timestamp, self.render());
    }
}

/// Build and emit an entry at the given [`LogLevel`] variant
#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($level:ident, $module:expr, $msg:expr $(, $key:ident = $value:expr)* $(,)?) => {
        $crate::utils::logging::LogEntry::new(
            $crate::utils::logging::LogLevel::$level,
            $module,
            $msg,
        )
        $(.field(stringify!($key), &$value))*
        .log()
    };
}

/// Dropped unless debug logging is on
#[macro_export]
macro_rules! log_debug {
    ($($args:tt)*) => { $crate::log_at!(Debug, $($args)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($args:tt)*) => { $crate::log_at!(Info, $($args)*) };
}

#[macro_export]
macro_rules! log_warn {
    ($($args:tt)*) => { $crate::log_at!(Warn, $($args)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($args:tt)*) => { $crate::log_at!(Error, $($args)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(Sensitivity::of("key_handle"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("secret"), Sensitivity::Secret);
        assert_eq!(Sensitivity::of("sender"), Sensitivity::Address);
        assert_eq!(Sensitivity::of("device_from"), Sensitivity::Address);
        assert_eq!(Sensitivity::of("tx_hash"), Sensitivity::Digest);
        assert_eq!(Sensitivity::of("chain_id"), Sensitivity::Plain);
        assert_eq!(Sensitivity::of("total"), Sensitivity::Plain);
        assert_eq!(Sensitivity::of("rpc_host"), Sensitivity::Plain);
    }

    #[test]
    fn test_secret_values_hidden() {
        assert_eq!(Sensitivity::Secret.apply("4646"), "[REDACTED:4chars]");
        assert_eq!(Sensitivity::Secret.apply(""), "[EMPTY]");
    }

    #[test]
    fn test_address_shortened() {
        let shown = Sensitivity::Address.apply("0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F");
        assert_eq!(shown, "0x9d8A62...5A4F");
        assert_eq!(Sensitivity::Address.apply("0x1234"), "0x1234");
    }

    #[test]
    fn test_hash_shortened() {
        let hash = "0x45366398a20fede7838fcf664d0e5f7c6414dfed6667544eab8cdbbaf3211dbb";
        assert_eq!(Sensitivity::Digest.apply(hash), "0x45366398a2...211dbb");
        assert_eq!(Sensitivity::Digest.apply("0xabcdef"), "0xabcdef");
    }

    #[test]
    fn test_render() {
        let entry = LogEntry::new(LogLevel::Info, "coordinator", "signed")
            .field("chain_id", 3)
            .field("key_handle", "slot 16");
        assert_eq!(entry.render(), "INFO [coordinator] signed | chain_id=3 key_handle=[REDACTED:7chars]");

        let bare = LogEntry::new(LogLevel::Warn, "rpc", "retrying");
        assert_eq!(bare.render(), "WARN [rpc] retrying");
    }
}
