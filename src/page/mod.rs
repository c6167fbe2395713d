//! Page-object base: wait-then-act wrappers over a [`Driver`].
//!
//! Every element operation re-resolves its locator through a readiness wait
//! bounded by the page's timeout, then performs a single driver action.

mod session;

use crate::actions::{ActionChain, Key, Select};
use crate::core::{Driver, WaitConfig};
use crate::errors::{PageError, Result};
use crate::types::{Locator, Point, Size, Timeout};
use crate::wait::{Waiter, DEFAULT_POLL_INTERVAL};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct BasePage<D: Driver> {
    driver: Arc<D>,
    timeout: Timeout,
    poll_interval: Duration,
}

impl<D: Driver> Clone for BasePage<D> {
    fn clone(&self) -> Self {
        Self {
            driver: Arc::clone(&self.driver),
            timeout: self.timeout,
            poll_interval: self.poll_interval,
        }
    }
}

impl<D: Driver> BasePage<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            driver,
            timeout: Timeout::DEFAULT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn from_config(driver: Arc<D>, waits: &WaitConfig) -> Self {
        Self {
            driver,
            timeout: waits.default_timeout(),
            poll_interval: waits.poll_interval(),
        }
    }

    /// A view of the same session whose operations wait up to `timeout`.
    pub fn with_timeout(&self, timeout: impl Into<Timeout>) -> Self {
        Self {
            timeout: timeout.into(),
            ..self.clone()
        }
    }

    pub fn with_poll_interval(&self, poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..self.clone()
        }
    }

    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    fn waiter(&self, timeout: Timeout) -> Waiter<'_, D> {
        Waiter::new(self.driver.as_ref(), timeout).with_poll_interval(self.poll_interval)
    }

    async fn resolve(&self, locator: &Locator) -> Result<D::Element> {
        self.wait_for_element(locator, self.timeout).await
    }

    async fn select(&self, locator: &Locator) -> Result<Select<'_, D>> {
        let element = self.resolve(locator).await?;
        Select::new(self.driver.as_ref(), element).await
    }

    // Waits

    pub async fn wait_for_element(
        &self,
        locator: &Locator,
        timeout: Timeout,
    ) -> Result<D::Element> {
        self.waiter(timeout).for_presence(locator).await
    }

    pub async fn wait_for_visible_element(
        &self,
        locator: &Locator,
        timeout: Timeout,
    ) -> Result<D::Element> {
        self.waiter(timeout).for_visibility(locator).await
    }

    /// Succeeds once nothing matches `locator` or the first match is hidden.
    pub async fn wait_for_invisible_element(
        &self,
        locator: &Locator,
        timeout: Timeout,
    ) -> Result<()> {
        self.waiter(timeout).for_invisibility(locator).await
    }

    /// Succeeds once nothing matches `locator`.
    pub async fn wait_for_element_absent(&self, locator: &Locator, timeout: Timeout) -> Result<()> {
        self.waiter(timeout).for_absence(locator).await
    }

    pub async fn wait_for_elements(
        &self,
        locator: &Locator,
        timeout: Timeout,
    ) -> Result<Vec<D::Element>> {
        self.waiter(timeout).for_all_present(locator).await
    }

    /// Waits for an alert and returns its text.
    pub async fn wait_for_alert(&self, timeout: Timeout) -> Result<String> {
        self.waiter(timeout).for_alert().await
    }

    pub async fn wait_for_alert_to_be_present(&self, timeout: Timeout) -> Result<String> {
        self.wait_for_alert(timeout).await
    }

    pub async fn wait_for_url_to_contain(
        &self,
        partial_url: &str,
        timeout: Timeout,
    ) -> Result<String> {
        self.waiter(timeout).for_url_contains(partial_url).await
    }

    pub async fn wait_for_url_to_match(&self, full_url: &str, timeout: Timeout) -> Result<String> {
        self.waiter(timeout).for_url_equals(full_url).await
    }

    pub async fn wait_for_text_to_be_present_in_element(
        &self,
        locator: &Locator,
        text: &str,
        timeout: Timeout,
    ) -> Result<()> {
        self.waiter(timeout).for_text_in_element(locator, text).await
    }

    pub async fn wait_for_text_to_be_present_in_element_value(
        &self,
        locator: &Locator,
        text: &str,
        timeout: Timeout,
    ) -> Result<()> {
        self.waiter(timeout)
            .for_text_in_element_value(locator, text)
            .await
    }

    // Element reads

    pub async fn get_element_location(&self, locator: &Locator) -> Result<Point> {
        let element = self.resolve(locator).await?;
        Ok(self.driver.element_rect(&element).await?.location())
    }

    pub async fn get_element_size(&self, locator: &Locator) -> Result<Size> {
        let element = self.resolve(locator).await?;
        Ok(self.driver.element_rect(&element).await?.size())
    }

    pub async fn get_element_text(&self, locator: &Locator) -> Result<String> {
        let element = self.resolve(locator).await?;
        self.driver.element_text(&element).await
    }

    pub async fn get_element_attribute(
        &self,
        locator: &Locator,
        attribute: &str,
    ) -> Result<Option<String>> {
        let element = self.resolve(locator).await?;
        self.driver.element_attribute(&element, attribute).await
    }

    pub async fn get_attribute_value(
        &self,
        locator: &Locator,
        attribute: &str,
    ) -> Result<Option<String>> {
        self.get_element_attribute(locator, attribute).await
    }

    pub async fn get_element_count(&self, locator: &Locator) -> Result<usize> {
        Ok(self.wait_for_elements(locator, self.timeout).await?.len())
    }

    // Boolean queries: a timeout reads as `false`, anything else propagates.

    pub async fn is_element_displayed(&self, locator: &Locator) -> Result<bool> {
        let outcome = match self.wait_for_visible_element(locator, self.timeout).await {
            Ok(element) => self.driver.is_displayed(&element).await,
            Err(e) => Err(e),
        };
        collapse_timeout("is_element_displayed", locator, outcome)
    }

    pub async fn is_element_clickable(&self, locator: &Locator, timeout: Timeout) -> Result<bool> {
        let outcome = self.waiter(timeout).for_clickable(locator).await.map(|_| true);
        collapse_timeout("is_element_clickable", locator, outcome)
    }

    pub async fn is_element_enabled(&self, locator: &Locator) -> Result<bool> {
        let outcome = match self.resolve(locator).await {
            Ok(element) => self.driver.is_enabled(&element).await,
            Err(e) => Err(e),
        };
        collapse_timeout("is_element_enabled", locator, outcome)
    }

    pub async fn is_element_selected(&self, locator: &Locator) -> Result<bool> {
        let outcome = match self.resolve(locator).await {
            Ok(element) => self.driver.is_selected(&element).await,
            Err(e) => Err(e),
        };
        collapse_timeout("is_element_selected", locator, outcome)
    }

    // Element actions

    pub async fn click_element(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator).await?;
        debug!(%locator, "click");
        self.driver.click(&element).await
    }

    /// Clicks the match at `index`, or every match in document order.
    pub async fn click_elements(&self, locator: &Locator, index: Option<usize>) -> Result<()> {
        let elements = self.wait_for_elements(locator, self.timeout).await?;
        match index {
            Some(index) => {
                let element = elements.get(index).ok_or_else(|| {
                    PageError::NoSuchElement(format!(
                        "{} at index {} ({} matched)",
                        locator,
                        index,
                        elements.len()
                    ))
                })?;
                self.driver.click(element).await
            }
            None => {
                for element in &elements {
                    self.driver.click(element).await?;
                }
                Ok(())
            }
        }
    }

    /// Clears the element, then types `text`.
    pub async fn input_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let element = self.resolve(locator).await?;
        debug!(%locator, chars = text.chars().count(), "input text");
        self.driver.clear(&element).await?;
        self.driver.send_keys(&element, text).await
    }

    pub async fn upload_file(&self, locator: &Locator, file_path: &str) -> Result<()> {
        let element = self.resolve(locator).await?;
        self.driver.send_keys(&element, file_path).await
    }

    pub async fn upload_file_using_input(&self, locator: &Locator, file_path: &str) -> Result<()> {
        self.upload_file(locator, file_path).await
    }

    pub async fn press_enter_key(&self, locator: &Locator) -> Result<()> {
        self.press_key(locator, Key::Enter).await
    }

    pub async fn press_tab_key(&self, locator: &Locator) -> Result<()> {
        self.press_key(locator, Key::Tab).await
    }

    pub async fn press_escape_key(&self, locator: &Locator) -> Result<()> {
        self.press_key(locator, Key::Escape).await
    }

    async fn press_key(&self, locator: &Locator, key: Key) -> Result<()> {
        let element = self.resolve(locator).await?;
        self.driver.send_keys(&element, &key.to_string()).await
    }

    // Dropdowns

    pub async fn select_dropdown_option_by_visible_text(
        &self,
        locator: &Locator,
        option_text: &str,
    ) -> Result<()> {
        self.select(locator).await?.select_by_visible_text(option_text).await
    }

    pub async fn select_dropdown_option_by_value(
        &self,
        locator: &Locator,
        option_value: &str,
    ) -> Result<()> {
        self.select(locator).await?.select_by_value(option_value).await
    }

    /// Selects each option by visible text, in order.
    pub async fn select_multiple_dropdown_options(
        &self,
        locator: &Locator,
        options: &[&str],
    ) -> Result<()> {
        let select = self.select(locator).await?;
        for option in options {
            select.select_by_visible_text(option).await?;
        }
        Ok(())
    }

    pub async fn get_selected_option_text(&self, locator: &Locator) -> Result<String> {
        let select = self.select(locator).await?;
        let option = select.first_selected_option().await?;
        self.driver.element_text(&option).await
    }

    pub async fn get_dropdown_options(&self, locator: &Locator) -> Result<Vec<String>> {
        self.select(locator).await?.option_texts().await
    }

    // Gestures

    pub async fn hover_over_element(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator).await?;
        self.driver
            .perform_actions(ActionChain::new().move_to_element(element))
            .await
    }

    pub async fn hover_and_click(&self, hover: &Locator, target: &Locator) -> Result<()> {
        let hover_element = self.resolve(hover).await?;
        let click_element = self.resolve(target).await?;
        self.driver
            .perform_actions(
                ActionChain::new()
                    .move_to_element(hover_element)
                    .click(click_element),
            )
            .await
    }

    pub async fn drag_and_drop(&self, source: &Locator, target: &Locator) -> Result<()> {
        let source_element = self.resolve(source).await?;
        let target_element = self.resolve(target).await?;
        self.driver
            .perform_actions(ActionChain::new().drag_and_drop(source_element, target_element))
            .await
    }

    pub async fn drag_and_drop_by_offset(
        &self,
        locator: &Locator,
        x_offset: i64,
        y_offset: i64,
    ) -> Result<()> {
        let element = self.resolve(locator).await?;
        let chain = ActionChain::new().drag_and_drop_by_offset(element, x_offset, y_offset);
        self.driver.perform_actions(chain).await
    }

    pub async fn perform_double_click(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator).await?;
        self.driver
            .perform_actions(ActionChain::new().double_click(element))
            .await
    }

    pub async fn perform_right_click(&self, locator: &Locator) -> Result<()> {
        let element = self.resolve(locator).await?;
        self.driver
            .perform_actions(ActionChain::new().context_click(element))
            .await
    }

    /// Sends `keys` to the focused element as one sequence. Modifiers stay
    /// held until [`Key::Null`], so `Control` followed by `a` selects all.
    pub async fn perform_keyboard_shortcut<K: ToString>(&self, keys: &[K]) -> Result<()> {
        let sequence: String = keys.iter().map(ToString::to_string).collect();
        self.driver
            .perform_actions(ActionChain::new().send_keys(sequence))
            .await
    }
}

fn collapse_timeout(operation: &str, locator: &Locator, outcome: Result<bool>) -> Result<bool> {
    match outcome {
        Err(PageError::Timeout { timeout, .. }) => {
            warn!(%locator, ?timeout, "{} timed out, reporting false", operation);
            Ok(false)
        }
        other => other,
    }
}
