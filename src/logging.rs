use chrono::Utc;
use serde_json::json;

/// Logger struct for handling structured logging
#[derive(Clone, Debug)]
pub struct Logger {
    request_id: String,
}

impl Logger {
    /// Create a new Logger instance
    ///
    /// # Arguments
    ///
    /// * `request_id` - A correlation identifier for the current page or flow
    pub fn new(request_id: String) -> Self {
        Self { request_id }
    }

    /// Create a logger scoped to a named component, with a fresh correlation id
    pub fn for_component(component: &str) -> Self {
        Self::new(format!("{}-{}", component, crate::utils::generate_request_id()))
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Log an info message
    pub fn info(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("INFO", message, data);
    }

    /// Log a warning message
    pub fn warn(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("WARN", message, data);
    }

    /// Log an error message
    pub fn error(&self, message: &str, data: Option<serde_json::Value>) {
        self.log("ERROR", message, data);
    }

    /// Internal method to handle log creation and output
    ///
    /// # Arguments
    ///
    /// * `level` - The log level (INFO, WARN, ERROR)
    /// * `message` - The log message
    /// * `data` - Optional additional data to include in the log
    fn log(&self, level: &str, message: &str, data: Option<serde_json::Value>) {
        let timestamp = Utc::now().to_rfc3339();
        let log_data = json!({
            "timestamp": timestamp,
            "level": level,
            "request_id": self.request_id,
            "message": message,
            "data": data
        });

        emit(level, &log_data.to_string());
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_arch = "wasm32")] {
        fn emit(level: &str, line: &str) {
            use worker::{console_error, console_log, console_warn};

            match level {
                "INFO" => console_log!("{}", line),
                "WARN" => console_warn!("{}", line),
                "ERROR" => console_error!("{}", line),
                _ => console_log!("{}", line),
            }
        }
    } else {
        // Host builds (tests, tooling) have no JS console.
        fn emit(_level: &str, line: &str) {
            eprintln!("{}", line);
        }
    }
}

/// Macro to create a JSON object for additional log data
///
/// Usage: log_data!("key1" => "value1", "key2" => 42)
#[macro_export]
macro_rules! log_data {
    ($($key:expr => $value:expr),*) => {
        Some(serde_json::json!({ $($key: $value),* }))
    };
}
