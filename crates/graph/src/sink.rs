use std::sync::Mutex;

/// Diagnostic collaborator handed to the builder and each renderer.
///
/// Traversal and render logic report progress and prune decisions here
/// instead of writing to process-wide state, so both are testable without a
/// global logger.
pub trait DiagnosticSink: Send + Sync {
    fn note(&self, message: &str);
}

/// Forwards diagnostics to the `log` facade at debug level.
#[derive(Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn note(&self, message: &str) {
        log::debug!("{message}");
    }
}

/// Captures diagnostics in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    messages: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("sink poisoned").clone()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.messages().iter().any(|m| m.contains(fragment))
    }
}

impl DiagnosticSink for MemorySink {
    fn note(&self, message: &str) {
        self.messages
            .lock()
            .expect("sink poisoned")
            .push(message.to_string());
    }
}
