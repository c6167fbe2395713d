//! Session-level operations: navigation, cookies, windows, frames, alerts,
//! scripts, scrolling and screenshots.

use super::BasePage;
use crate::core::{Driver, ScriptArg};
use crate::errors::{PageError, Result};
use crate::types::{Cookie, FrameRef, Locator, WindowHandle, WindowPosition, WindowSize};
use crate::utils::{JavaScriptRunner, ScreenshotManager};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

impl<D: Driver> BasePage<D> {
    // Navigation

    pub async fn navigate_to_url(&self, url: &str) -> Result<()> {
        info!(%url, "navigating");
        self.driver.get(url).await
    }

    pub async fn navigate_back(&self) -> Result<()> {
        self.driver.back().await
    }

    pub async fn navigate_forward(&self) -> Result<()> {
        self.driver.forward().await
    }

    pub async fn refresh_page(&self) -> Result<()> {
        self.driver.refresh().await
    }

    pub async fn get_page_title(&self) -> Result<String> {
        self.driver.title().await
    }

    pub async fn get_current_url(&self) -> Result<String> {
        self.driver.current_url().await
    }

    pub async fn get_current_page_url(&self) -> Result<String> {
        self.get_current_url().await
    }

    pub async fn get_page_source(&self) -> Result<String> {
        self.driver.page_source().await
    }

    // Cookies

    pub async fn get_cookie(&self, name: &str) -> Result<Option<Cookie>> {
        self.driver.get_cookie(name).await
    }

    pub async fn get_all_cookies(&self) -> Result<Vec<Cookie>> {
        self.driver.get_cookies().await
    }

    pub async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        debug!(name = %cookie.name, "adding cookie");
        self.driver.add_cookie(cookie).await
    }

    pub async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.driver.delete_cookie(name).await
    }

    pub async fn delete_all_cookies(&self) -> Result<()> {
        self.driver.delete_all_cookies().await
    }

    // Window geometry

    pub async fn minimize_window(&self) -> Result<()> {
        self.driver.minimize_window().await
    }

    pub async fn set_window_size(&self, width: u32, height: u32) -> Result<()> {
        self.driver
            .set_window_size(WindowSize { width, height })
            .await
    }

    pub async fn get_current_window_size(&self) -> Result<WindowSize> {
        self.driver.window_size().await
    }

    pub async fn get_current_window_position(&self) -> Result<WindowPosition> {
        self.driver.window_position().await
    }

    // Frames

    pub async fn switch_to_frame(&self, locator: &Locator) -> Result<()> {
        let frame = self.resolve(locator).await?;
        debug!(%locator, "switching to frame");
        self.driver.switch_to_frame(FrameRef::Element(frame)).await
    }

    pub async fn switch_to_frame_by_index(&self, index: u16) -> Result<()> {
        self.driver.switch_to_frame(FrameRef::Index(index)).await
    }

    pub async fn switch_to_frame_by_name_or_id(&self, name_or_id: &str) -> Result<()> {
        self.driver
            .switch_to_frame(FrameRef::NameOrId(name_or_id.to_string()))
            .await
    }

    pub async fn switch_to_parent_frame(&self) -> Result<()> {
        self.driver.switch_to_parent_frame().await
    }

    pub async fn switch_to_default_content(&self) -> Result<()> {
        self.driver.switch_to_default_content().await
    }

    // Windows

    pub async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        info!(%handle, "switching window");
        self.driver.switch_to_window(handle).await
    }

    pub async fn get_all_window_handles(&self) -> Result<Vec<WindowHandle>> {
        self.driver.window_handles().await
    }

    pub async fn get_current_window_handle(&self) -> Result<WindowHandle> {
        self.driver.current_window_handle().await
    }

    pub async fn switch_to_window_by_index(&self, index: usize) -> Result<()> {
        let handles = self.driver.window_handles().await?;
        let handle = handles
            .get(index)
            .ok_or(PageError::WindowIndexOutOfRange {
                index,
                count: handles.len(),
            })?;
        self.switch_to_window(handle).await
    }

    /// Focuses the first other window whose title contains `title`.
    ///
    /// On failure focus stays on the last window visited.
    pub async fn switch_to_window_by_title(&self, title: &str) -> Result<()> {
        let found = self
            .search_windows(|driver| async move {
                Ok::<_, PageError>(driver.title().await?.contains(title))
            })
            .await?;
        if found {
            Ok(())
        } else {
            Err(PageError::NoSuchWindow(format!(
                "no window with title containing '{}'",
                title
            )))
        }
    }

    /// Focuses the first other window whose URL contains `url`.
    ///
    /// On failure focus stays on the last window visited.
    pub async fn switch_to_window_by_url(&self, url: &str) -> Result<()> {
        let found = self
            .search_windows(|driver| async move {
                Ok::<_, PageError>(driver.current_url().await?.contains(url))
            })
            .await?;
        if found {
            Ok(())
        } else {
            Err(PageError::NoSuchWindow(format!(
                "no window with URL containing '{}'",
                url
            )))
        }
    }

    async fn search_windows<'s, F, Fut>(&'s self, mut matches: F) -> Result<bool>
    where
        F: FnMut(&'s D) -> Fut,
        Fut: std::future::Future<Output = Result<bool>>,
    {
        let current = self.driver.current_window_handle().await?;
        for handle in self.driver.window_handles().await? {
            if handle == current {
                continue;
            }
            self.driver.switch_to_window(&handle).await?;
            if matches(self.driver.as_ref()).await? {
                info!(%handle, "switched window");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Closes the focused window.
    pub async fn close_browser(&self) -> Result<()> {
        self.driver.close_window().await
    }

    /// Ends the session.
    pub async fn quit_browser(&self) -> Result<()> {
        info!("quitting browser session");
        self.driver.quit().await
    }

    // Alerts

    /// Text of the alert open right now; does not wait.
    pub async fn switch_to_alert(&self) -> Result<String> {
        self.driver.alert_text().await
    }

    pub async fn accept_alert(&self) -> Result<()> {
        self.wait_for_alert(self.timeout).await?;
        self.driver.accept_alert().await
    }

    pub async fn dismiss_alert(&self) -> Result<()> {
        self.wait_for_alert(self.timeout).await?;
        self.driver.dismiss_alert().await
    }

    pub async fn get_alert_text(&self) -> Result<String> {
        self.wait_for_alert(self.timeout).await
    }

    // Scripts

    pub async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<D::Element>>,
    ) -> Result<Value> {
        self.driver.execute_script(script, args).await
    }

    pub async fn execute_async_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<D::Element>>,
    ) -> Result<Value> {
        self.driver.execute_async_script(script, args).await
    }

    // Scrolling

    pub async fn scroll_into_view(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator).await?;
        JavaScriptRunner::scroll_into_view(self.driver.as_ref(), &element).await
    }

    pub async fn scroll_to_element(&self, locator: &Locator) -> Result<()> {
        self.scroll_into_view(locator).await
    }

    pub async fn scroll_to_top(&self) -> Result<()> {
        JavaScriptRunner::scroll_to_top(self.driver.as_ref()).await
    }

    pub async fn scroll_to_bottom(&self) -> Result<()> {
        JavaScriptRunner::scroll_to_bottom(self.driver.as_ref()).await
    }

    // Screenshots

    pub async fn capture_screenshot(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let written = ScreenshotManager::save_to_file(self.driver.as_ref(), path).await?;
        info!(path = %written.display(), "saved screenshot");
        Ok(written)
    }

    pub async fn take_screenshot(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        self.capture_screenshot(path).await
    }
}

#[cfg(test)]
mod tests {
    use crate::core::Driver;
    use crate::page::BasePage;
    use crate::testing::{FakeDriver, FakeElement, Interaction};
    use crate::types::{Cookie, Locator, Timeout};
    use crate::utils::javascript::{SCROLL_INTO_VIEW, SCROLL_TO_BOTTOM};
    use crate::PageError;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test]
    async fn cookies_round_trip_and_re_adding_is_idempotent() {
        let page = BasePage::new(Arc::new(FakeDriver::new()));

        page.add_cookie(Cookie::new("session", "abc")).await.unwrap();
        page.add_cookie(Cookie::new("session", "abc")).await.unwrap();

        let cookie = page.get_cookie("session").await.unwrap().unwrap();
        assert_eq!((cookie.name.as_str(), cookie.value.as_str()), ("session", "abc"));
        assert_eq!(page.get_all_cookies().await.unwrap().len(), 1);

        page.delete_cookie("session").await.unwrap();
        assert!(page.get_cookie("session").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn window_index_must_be_in_range() {
        let driver = Arc::new(FakeDriver::new());
        let second = driver.open_window("Second", "https://second.test/").await;
        let page = BasePage::new(driver);

        page.switch_to_window_by_index(1).await.unwrap();
        assert_eq!(page.get_current_window_handle().await.unwrap(), second);

        match page.switch_to_window_by_index(2).await {
            Err(PageError::WindowIndexOutOfRange { index, count }) => {
                assert_eq!((index, count), (2, 2));
            }
            other => panic!("expected out of range, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn window_search_skips_the_current_window() {
        let driver = Arc::new(FakeDriver::new());
        driver.register_page("https://rooms.test/", "Rooms").await;
        driver.get("https://rooms.test/").await.unwrap();
        driver.open_window("Booking details", "https://rooms.test/booking/7").await;
        let help = driver.open_window("Help", "https://help.test/").await;
        let page = BasePage::new(driver);

        assert!(matches!(
            page.switch_to_window_by_title("Rooms").await,
            Err(PageError::NoSuchWindow(_))
        ));
        // Every other window was visited; focus stays on the last one.
        assert_eq!(page.get_current_window_handle().await.unwrap(), help);

        page.switch_to_window_by_url("booking/7").await.unwrap();
        assert_eq!(page.get_page_title().await.unwrap(), "Booking details");
    }

    #[tokio::test(start_paused = true)]
    async fn alerts_are_waited_for_before_acting() {
        let driver = Arc::new(FakeDriver::new());
        driver
            .schedule_alert("Room booked", Duration::from_secs(1))
            .await;
        let page = BasePage::new(driver);

        assert!(matches!(page.switch_to_alert().await, Err(PageError::NoSuchAlert)));
        assert_eq!(page.get_alert_text().await.unwrap(), "Room booked");
        page.accept_alert().await.unwrap();

        assert_eq!(
            page.driver().interactions().await,
            vec![Interaction::AlertAccepted("Room booked".into())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_alert_times_out_at_the_requested_duration() {
        let page = BasePage::new(Arc::new(FakeDriver::new()));
        let started = Instant::now();

        let err = page.wait_for_alert(Timeout::from_secs(2)).await.unwrap_err();

        assert!(err.is_timeout());
        assert!(started.elapsed() >= Duration::from_secs(2));
        assert!(started.elapsed() < Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn frames_switch_by_element_index_and_name() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_frame("calendar").await;
        driver.add_frame("map").await;
        driver
            .add_element(FakeElement::new("iframe").with_id("payment"))
            .await;
        let page = BasePage::new(driver);

        page.switch_to_frame(&Locator::id("payment")).await.unwrap();
        page.switch_to_frame_by_index(1).await.unwrap();
        assert_eq!(page.driver().frame_stack().await, vec!["payment", "map"]);

        page.switch_to_parent_frame().await.unwrap();
        page.switch_to_frame_by_name_or_id("calendar").await.unwrap();
        assert_eq!(page.driver().frame_stack().await, vec!["payment", "calendar"]);

        page.switch_to_default_content().await.unwrap();
        assert!(page.driver().frame_stack().await.is_empty());
        assert!(matches!(
            page.switch_to_frame_by_name_or_id("nope").await,
            Err(PageError::NoSuchFrame(_))
        ));
    }

    #[tokio::test]
    async fn scrolling_injects_scripts_against_the_resolved_element() {
        let driver = Arc::new(FakeDriver::new());
        driver.add_element(FakeElement::new("footer").with_id("foot")).await;
        let page = BasePage::new(driver);

        page.scroll_to_element(&Locator::id("foot")).await.unwrap();
        page.scroll_to_bottom().await.unwrap();

        assert_eq!(
            page.driver().interactions().await,
            vec![
                Interaction::Script {
                    script: SCROLL_INTO_VIEW.into(),
                    args: vec!["foot".into()],
                },
                Interaction::Script {
                    script: SCROLL_TO_BOTTOM.into(),
                    args: vec![],
                },
            ]
        );
    }

    #[tokio::test]
    async fn scripts_return_driver_values() {
        let driver = Arc::new(FakeDriver::new());
        driver.on_script("document.readyState", json!("complete")).await;
        driver.on_script("done(", json!(42)).await;
        let page = BasePage::new(driver);

        assert_eq!(
            page.execute_script("return document.readyState;", vec![])
                .await
                .unwrap(),
            json!("complete")
        );
        assert_eq!(
            page.execute_async_script(
                "const done = arguments[arguments.length - 1]; done(42);",
                vec![json!(1).into()]
            )
            .await
            .unwrap(),
            json!(42)
        );
    }

    #[tokio::test]
    async fn navigation_and_window_geometry() {
        let driver = Arc::new(FakeDriver::new());
        driver.register_page("https://rooms.test/", "Rooms").await;
        let page = BasePage::new(driver);

        page.navigate_to_url("https://rooms.test/").await.unwrap();
        assert_eq!(page.get_page_title().await.unwrap(), "Rooms");
        assert!(page.get_page_source().await.unwrap().contains("<title>Rooms</title>"));
        page.navigate_back().await.unwrap();
        assert_eq!(page.get_current_page_url().await.unwrap(), "about:blank");
        page.navigate_forward().await.unwrap();
        assert_eq!(page.get_current_url().await.unwrap(), "https://rooms.test/");

        page.minimize_window().await.unwrap();
        assert!(page.driver().is_minimized().await);
        page.set_window_size(800, 600).await.unwrap();
        let size = page.get_current_window_size().await.unwrap();
        assert_eq!((size.width, size.height), (800, 600));
        assert_eq!(page.get_current_window_position().await.unwrap().x, 0);
    }

    #[tokio::test]
    async fn close_and_quit_reach_the_driver() {
        let driver = Arc::new(FakeDriver::new());
        let other = driver.open_window("Other", "https://other.test/").await;
        let page = BasePage::new(driver);

        page.close_browser().await.unwrap();
        assert_eq!(page.get_all_window_handles().await.unwrap(), vec![other]);
        page.quit_browser().await.unwrap();
        assert!(page.driver().is_quit().await);
    }
}
