//! Observable channel for swallowed failures.
//!
//! Persistence and delivery errors never abort the operation that hit
//! them; they are reported here instead, so embedders can log them and
//! tests can assert on them.

use std::sync::Mutex;

use crate::error::HavenError;

pub trait FailureSink: Send + Sync {
    fn record(&self, context: &str, error: &HavenError);
}

/// Default sink: log the failure and move on.
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn record(&self, context: &str, error: &HavenError) {
        tracing::warn!(context, %error, "operation degraded");
    }
}

/// Captures failures so tests can assert on them.
#[derive(Default)]
pub struct RecordingSink {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }
}

impl FailureSink for RecordingSink {
    fn record(&self, context: &str, error: &HavenError) {
        self.entries
            .lock()
            .unwrap()
            .push((context.to_string(), error.to_string()));
    }
}
