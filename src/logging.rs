//! Injected logging capability.
//!
//! Core functions stay pure: components that want to report (skipped lines,
//! encoding fallbacks) take a `Logger` instead of reaching for a global.

use std::sync::Arc;

pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);

    fn critical(&self, message: &str) {
        self.error(message);
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Discards everything. Default for library callers.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warning(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
}

/// Forwards to `tracing` events, tagged with the emitting component.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: &'static str,
}

impl TracingLogger {
    pub fn new(component: &'static str) -> Self {
        Self { component }
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = self.component, "{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!(component = self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = self.component, "{}", message);
    }

    fn critical(&self, message: &str) {
        tracing::error!(component = self.component, critical = true, "{}", message);
    }
}

pub fn noop() -> SharedLogger {
    Arc::new(NoopLogger)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Logger;
    use std::sync::Mutex;

    /// Captures messages with their level for assertions.
    #[derive(Default)]
    pub struct RecordingLogger {
        pub entries: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingLogger {
        pub fn messages(&self, level: &str) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }

        fn push(&self, level: &'static str, message: &str) {
            self.entries
                .lock()
                .unwrap()
                .push((level, message.to_string()));
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str) {
            self.push("debug", message);
        }
        fn info(&self, message: &str) {
            self.push("info", message);
        }
        fn warning(&self, message: &str) {
            self.push("warning", message);
        }
        fn error(&self, message: &str) {
            self.push("error", message);
        }
    }
}
