use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PageError {
    #[error(
        "Timed out after {timeout:?} waiting for {condition}{}",
        last_error_suffix(.last_error)
    )]
    Timeout {
        condition: String,
        timeout: Duration,
        last_error: Option<String>,
    },

    #[error("No such window: {0}")]
    NoSuchWindow(String),

    #[error("Window index {index} is out of range ({count} windows open)")]
    WindowIndexOutOfRange { index: usize, count: usize },

    #[error("No such element: {0}")]
    NoSuchElement(String),

    #[error("Stale element: {0}")]
    StaleElement(String),

    #[error("No alert is present")]
    NoSuchAlert,

    #[error("No such frame: {0}")]
    NoSuchFrame(String),

    #[error("Expected <{expected}> element but found <{actual}>")]
    UnexpectedTagName { expected: String, actual: String },

    #[error("No such option: {0}")]
    NoSuchOption(String),

    #[error("Invalid locator: {0}")]
    InvalidLocator(String),

    #[error("Unsupported browser: {0}")]
    UnsupportedBrowser(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    Anyhow(String),
}

fn last_error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_ref()
        .map(|e| format!(" (last error: {})", e))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, PageError>;

impl From<anyhow::Error> for PageError {
    fn from(err: anyhow::Error) -> Self {
        PageError::Anyhow(err.to_string())
    }
}

impl PageError {
    pub fn from_any_error<E: std::fmt::Display>(err: E) -> Self {
        PageError::Driver(err.to_string())
    }

    /// Lookup misses a readiness wait keeps polling through.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PageError::NoSuchElement(_) | PageError::StaleElement(_) | PageError::NoSuchAlert
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, PageError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_misses_are_transient() {
        assert!(PageError::NoSuchElement("id=x".into()).is_transient());
        assert!(PageError::StaleElement("id=x".into()).is_transient());
        assert!(PageError::NoSuchAlert.is_transient());
        assert!(!PageError::JavaScriptFailed("boom".into()).is_transient());
        assert!(!PageError::NoSuchWindow("x".into()).is_transient());
    }

    #[test]
    fn timeout_message_names_condition_and_last_error() {
        let err = PageError::Timeout {
            condition: "presence of id=missing".into(),
            timeout: Duration::from_secs(1),
            last_error: Some("No such element: id=missing".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("presence of id=missing"));
        assert!(msg.contains("1s"));
        assert!(msg.contains("last error"));
        assert!(err.is_timeout());
    }
}
