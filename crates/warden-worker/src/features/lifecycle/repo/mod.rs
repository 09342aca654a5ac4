use std::collections::HashMap;

/// Ciphertext of the managed instance's identifier.
pub const INSTANCE_ID_VAR: &str = "WARDEN_INSTANCE_ID";
/// Ciphertext of the notification webhook URL.
pub const WEBHOOK_URL_VAR: &str = "WARDEN_WEBHOOK_URL";

/// Source of the worker's environment-bound configuration.
///
/// Read on every invocation; values are never cached between runs.
pub trait WorkerEnvironment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl WorkerEnvironment for ProcessEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Fixed key/value environment.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    vars: HashMap<String, String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }
}

impl WorkerEnvironment for StaticEnvironment {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}
