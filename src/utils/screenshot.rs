use crate::core::Driver;
use crate::errors::{PageError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub struct ScreenshotManager;

impl ScreenshotManager {
    pub async fn take_base64<D: Driver>(driver: &D) -> Result<String> {
        let screenshot_bytes = Self::capture(driver).await?;
        Ok(STANDARD.encode(screenshot_bytes))
    }

    /// Writes a PNG capture of the viewport to `file_path`, creating parent
    /// directories as needed.
    pub async fn save_to_file<D: Driver>(
        driver: &D,
        file_path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let file_path = file_path.as_ref();
        let screenshot_bytes = Self::capture(driver).await?;

        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(file_path, screenshot_bytes).await?;

        Ok(file_path.to_path_buf())
    }

    /// `screenshot-<UTC timestamp>.png`.
    pub fn default_file_name() -> String {
        format!(
            "screenshot-{}.png",
            chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
        )
    }

    async fn capture<D: Driver>(driver: &D) -> Result<Vec<u8>> {
        let bytes = driver.screenshot_png().await?;
        if !bytes.starts_with(PNG_SIGNATURE) {
            return Err(PageError::ScreenshotFailed(
                "driver returned data that is not a PNG image".to_string(),
            ));
        }
        Ok(bytes)
    }
}
