#[cfg(feature = "chrome")]
pub mod chrome;

#[cfg(feature = "chrome")]
pub use chrome::{ChromeDriver, ChromeElement};

use crate::core::{BrowserConfig, BrowserType};
use crate::errors::{PageError, Result};

/// Rejects browser kinds this build has no backend for.
pub fn ensure_supported(config: &BrowserConfig) -> Result<()> {
    match config.browser_type {
        BrowserType::Chrome => Ok(()),
        BrowserType::Edge if config.executable.is_some() => Ok(()),
        BrowserType::Edge => Err(PageError::UnsupportedBrowser(
            "edge requires browser.executable to point at the msedge binary".to_string(),
        )),
        BrowserType::Firefox => Err(PageError::UnsupportedBrowser(
            "firefox does not speak the DevTools protocol".to_string(),
        )),
    }
}

/// Starts a browser session for `config`.
#[cfg(feature = "chrome")]
pub async fn launch(config: &BrowserConfig) -> Result<ChromeDriver> {
    ensure_supported(config)?;
    ChromeDriver::launch(config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(browser_type: BrowserType) -> BrowserConfig {
        BrowserConfig {
            browser_type,
            ..BrowserConfig::default()
        }
    }

    #[test]
    fn chrome_is_always_supported() {
        assert!(ensure_supported(&config(BrowserType::Chrome)).is_ok());
    }

    #[test]
    fn edge_needs_an_executable() {
        let mut edge = config(BrowserType::Edge);
        assert!(matches!(
            ensure_supported(&edge),
            Err(PageError::UnsupportedBrowser(_))
        ));

        edge.executable = Some(PathBuf::from("/opt/microsoft/msedge/msedge"));
        assert!(ensure_supported(&edge).is_ok());
    }

    #[test]
    fn firefox_is_rejected() {
        assert!(matches!(
            ensure_supported(&config(BrowserType::Firefox)),
            Err(PageError::UnsupportedBrowser(_))
        ));
    }
}
