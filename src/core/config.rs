use crate::errors::{PageError, Result};
use crate::types::Timeout;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const BROWSER_ENV: &str = "PAGE_PILOT_BROWSER";
pub const HEADLESS_ENV: &str = "PAGE_PILOT_HEADLESS";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub waits: WaitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser_type: BrowserType,
    pub headless: bool,
    pub viewport: Viewport,
    pub user_agent: Option<String>,
    pub args: Vec<String>,
    /// Browser binary; required for Edge, optional for Chrome.
    pub executable: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub default_timeout_secs: u64,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserType {
    Chrome,
    Firefox,
    Edge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser_type: BrowserType::Chrome,
            headless: true,
            viewport: Viewport::default(),
            user_agent: None,
            args: vec![],
            executable: None,
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 10,
            poll_interval_ms: 500,
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

impl WaitConfig {
    pub fn default_timeout(&self) -> Timeout {
        Timeout::from_secs(self.default_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl FromStr for BrowserType {
    type Err = PageError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chrome" => Ok(BrowserType::Chrome),
            "firefox" => Ok(BrowserType::Firefox),
            "edge" => Ok(BrowserType::Edge),
            other => Err(PageError::UnsupportedBrowser(other.to_string())),
        }
    }
}

impl Config {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PageError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Overrides browser choice and headless mode from the environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(
            std::env::var(BROWSER_ENV).ok(),
            std::env::var(HEADLESS_ENV).ok(),
        )
    }

    fn apply_vars(mut self, browser: Option<String>, headless: Option<String>) -> Result<Self> {
        if let Some(browser) = browser {
            self.browser.browser_type = browser.parse()?;
        }
        if let Some(headless) = headless {
            self.browser.headless = parse_flag(&headless).ok_or_else(|| {
                PageError::Config(format!("{} must be a boolean, got {:?}", HEADLESS_ENV, headless))
            })?;
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_ten_second_wait() {
        let config = Config::default();
        assert_eq!(config.browser.browser_type, BrowserType::Chrome);
        assert!(config.browser.headless);
        assert_eq!(config.waits.default_timeout(), Timeout::from_secs(10));
        assert_eq!(config.waits.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "browser": { "browser_type": "edge", "headless": false } }"#)
                .unwrap();
        assert_eq!(config.browser.browser_type, BrowserType::Edge);
        assert!(!config.browser.headless);
        assert_eq!(config.browser.viewport, Viewport::default());
        assert_eq!(config.waits.default_timeout_secs, 10);
    }

    #[test]
    fn env_overrides_browser_and_headless() {
        let config = Config::default()
            .apply_vars(Some("Firefox".into()), Some("false".into()))
            .unwrap();
        assert_eq!(config.browser.browser_type, BrowserType::Firefox);
        assert!(!config.browser.headless);
    }

    #[test]
    fn unknown_browser_is_unsupported() {
        let err = Config::default()
            .apply_vars(Some("netscape".into()), None)
            .unwrap_err();
        assert!(matches!(err, PageError::UnsupportedBrowser(name) if name == "netscape"));
    }

    #[test]
    fn bad_headless_flag_is_a_config_error() {
        let err = Config::default()
            .apply_vars(None, Some("maybe".into()))
            .unwrap_err();
        assert!(matches!(err, PageError::Config(_)));
    }
}
