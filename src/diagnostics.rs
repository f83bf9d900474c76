use std::sync::Mutex;

use log::*;

/// Where a signal source reports what it was configured with and how it was misused.
pub trait Diagnostics: Send + Sync {
    fn debug(&self, msg: &str);
    fn info(&self, msg: &str);
    fn warn(&self, msg: &str);
}

/// Forwards to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn debug(&self, msg: &str) {
        debug!("{}", msg);
    }

    fn info(&self, msg: &str) {
        info!("{}", msg);
    }

    fn warn(&self, msg: &str) {
        warn!("{}", msg);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Level {
    Debug,
    Info,
    Warn,
}

/// Keeps every message, for inspection after the fact.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    messages: Mutex<Vec<(Level, String)>>,
}

impl RecordingDiagnostics {
    pub fn new() -> RecordingDiagnostics {
        RecordingDiagnostics::default()
    }

    pub fn messages(&self) -> Vec<(Level, String)> {
        match self.messages.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(level, _)| *level == Level::Warn)
            .map(|(_, msg)| msg)
            .collect()
    }

    fn push(&self, level: Level, msg: &str) {
        let mut guard = match self.messages.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.push((level, msg.to_string()));
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn debug(&self, msg: &str) {
        self.push(Level::Debug, msg);
    }

    fn info(&self, msg: &str) {
        trace!("diagnostics info: {}", msg);
        self.push(Level::Info, msg);
    }

    fn warn(&self, msg: &str) {
        trace!("diagnostics warn: {}", msg);
        self.push(Level::Warn, msg);
    }
}
