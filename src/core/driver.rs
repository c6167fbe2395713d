use crate::actions::ActionChain;
use crate::errors::{PageError, Result};
use crate::types::{
    Cookie, ElementRect, FrameRef, Locator, WindowHandle, WindowPosition, WindowSize,
};
use async_trait::async_trait;
use serde_json::Value;

/// Argument passed into an injected script, reachable there as `arguments[i]`.
#[derive(Debug, Clone)]
pub enum ScriptArg<E> {
    Value(Value),
    Element(E),
}

impl<E> From<Value> for ScriptArg<E> {
    fn from(value: Value) -> Self {
        ScriptArg::Value(value)
    }
}

/// Control surface of one browser session.
///
/// Element handles are only valid for the call that produced them; callers
/// re-resolve locators instead of holding handles.
#[async_trait]
pub trait Driver: Send + Sync {
    type Element: Clone + Send + Sync;

    /// All elements matching `locator`, in document order. Empty when none match.
    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    /// Descendants of `parent` matching `locator`.
    async fn find_child_elements(
        &self,
        parent: &Self::Element,
        locator: &Locator,
    ) -> Result<Vec<Self::Element>>;

    /// First element matching `locator`.
    async fn find_element(&self, locator: &Locator) -> Result<Self::Element> {
        self.find_elements(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PageError::NoSuchElement(locator.to_string()))
    }

    async fn element_text(&self, element: &Self::Element) -> Result<String>;

    async fn element_attribute(&self, element: &Self::Element, name: &str)
        -> Result<Option<String>>;

    async fn element_rect(&self, element: &Self::Element) -> Result<ElementRect>;

    async fn element_tag_name(&self, element: &Self::Element) -> Result<String>;

    async fn is_displayed(&self, element: &Self::Element) -> Result<bool>;

    async fn is_enabled(&self, element: &Self::Element) -> Result<bool>;

    async fn is_selected(&self, element: &Self::Element) -> Result<bool>;

    async fn click(&self, element: &Self::Element) -> Result<()>;

    async fn clear(&self, element: &Self::Element) -> Result<()>;

    /// Types `text` into the element. Characters from [`crate::actions::Key`]
    /// are sent as the corresponding special keys.
    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<()>;

    async fn perform_actions(&self, chain: ActionChain<Self::Element>) -> Result<()>;

    async fn get(&self, url: &str) -> Result<()>;

    async fn back(&self) -> Result<()>;

    async fn forward(&self) -> Result<()>;

    async fn refresh(&self) -> Result<()>;

    async fn current_url(&self) -> Result<String>;

    async fn title(&self) -> Result<String>;

    async fn page_source(&self) -> Result<String>;

    async fn get_cookies(&self) -> Result<Vec<Cookie>>;

    async fn get_cookie(&self, name: &str) -> Result<Option<Cookie>> {
        Ok(self
            .get_cookies()
            .await?
            .into_iter()
            .find(|cookie| cookie.name == name))
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()>;

    async fn delete_cookie(&self, name: &str) -> Result<()>;

    async fn delete_all_cookies(&self) -> Result<()>;

    async fn minimize_window(&self) -> Result<()>;

    async fn set_window_size(&self, size: WindowSize) -> Result<()>;

    async fn window_size(&self) -> Result<WindowSize>;

    async fn window_position(&self) -> Result<WindowPosition>;

    async fn window_handles(&self) -> Result<Vec<WindowHandle>>;

    async fn current_window_handle(&self) -> Result<WindowHandle>;

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()>;

    /// Closes the focused window; the session stays alive.
    async fn close_window(&self) -> Result<()>;

    /// Ends the whole session.
    async fn quit(&self) -> Result<()>;

    async fn switch_to_frame(&self, frame: FrameRef<Self::Element>) -> Result<()>;

    async fn switch_to_parent_frame(&self) -> Result<()>;

    async fn switch_to_default_content(&self) -> Result<()>;

    /// Text of the open alert, or [`PageError::NoSuchAlert`].
    async fn alert_text(&self) -> Result<String>;

    async fn accept_alert(&self) -> Result<()>;

    async fn dismiss_alert(&self) -> Result<()>;

    async fn execute_script(&self, script: &str, args: Vec<ScriptArg<Self::Element>>)
        -> Result<Value>;

    /// Runs `script` with a completion callback appended to its arguments and
    /// resolves with the value passed to that callback.
    async fn execute_async_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<Self::Element>>,
    ) -> Result<Value>;

    /// PNG-encoded capture of the viewport.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;
}
