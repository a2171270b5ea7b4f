//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

#[test]
fn test_global_init_forwards_redacted_events_once() {
    // The global subscriber can only be installed once per process.
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Info)
        .with_pii_redaction(true)
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::info!(
        target: "core_auth::token_store",
        access_token = "a1",
        user_id = "user-1",
        "Token stored"
    );
    tracing::debug!(target: "core_auth::token_store", "below configured level");

    {
        let entries = sink.entries.lock().unwrap();
        let entry = entries
            .iter()
            .find(|e| e.message == "Token stored")
            .expect("event forwarded to sink");
        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.fields.get("access_token"), Some(&"[REDACTED]".to_string()));
        assert_eq!(entry.fields.get("user_id"), Some(&"user-1".to_string()));
        assert!(!entries.iter().any(|e| e.message == "below configured level"));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Logging(_))));
}

#[test]
fn test_oauth_parameters_are_redacted() {
    for field in ["code", "state", "code_verifier", "refresh_token", "Authorization"] {
        assert_eq!(redact_if_sensitive(field, "value"), "[REDACTED]", "{field}");
    }

    // Substrings of ordinary field names are left alone.
    assert_eq!(redact_if_sensitive("status_code", "401"), "401");
    assert_eq!(redact_if_sensitive("kind", "INVALID_STATE"), "INVALID_STATE");
}

#[test]
fn test_email_masking() {
    let redacted = redact_if_sensitive("user", "ada@clipify.space");
    assert!(redacted.starts_with('a'));
    assert!(!redacted.contains("clipify.space"));

    assert_eq!(redact_if_sensitive("note", "not-an-email@"), "not-an-email@");
}
