//! In-memory browser session for exercising page objects without a browser.
//!
//! Elements, alerts and windows can be scheduled to appear or vanish at a
//! point in time measured from driver creation on the tokio clock, so waits
//! behave deterministically under `#[tokio::test(start_paused = true)]`.

use crate::actions::{ActionChain, Gesture};
use crate::core::{Driver, ScriptArg};
use crate::errors::{PageError, Result};
use crate::types::{
    By, Cookie, ElementRect, FrameRef, Locator, WindowHandle, WindowPosition, WindowSize,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// PNG signature followed by an empty IHDR-less body; enough to identify the format.
pub const FAKE_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Handle to an element of a [`FakeDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FakeHandle(usize);

/// Builder for an element inserted into a [`FakeDriver`].
#[derive(Debug, Clone)]
pub struct FakeElement {
    tag: String,
    text: String,
    attributes: BTreeMap<String, String>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    rect: ElementRect,
    appear_after: Duration,
    vanish_after: Option<Duration>,
    aliases: Vec<Locator>,
    children: Vec<FakeElement>,
}

impl FakeElement {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            text: String::new(),
            attributes: BTreeMap::new(),
            displayed: true,
            enabled: true,
            selected: false,
            rect: ElementRect {
                x: 0.0,
                y: 0.0,
                width: 100.0,
                height: 20.0,
            },
            appear_after: Duration::ZERO,
            vanish_after: None,
            aliases: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A `<select>` holding one `<option>` per `(value, text)` pair.
    pub fn select(options: &[(&str, &str)]) -> Self {
        options
            .iter()
            .fold(FakeElement::new("select"), |select, (value, text)| {
                select.with_child(
                    FakeElement::new("option")
                        .with_attribute("value", *value)
                        .with_text(*text),
                )
            })
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_rect(mut self, rect: ElementRect) -> Self {
        self.rect = rect;
        self
    }

    pub fn with_child(mut self, child: FakeElement) -> Self {
        self.children.push(child);
        self
    }

    /// Also match `locator`; CSS and XPath locators only match through aliases.
    pub fn matching(mut self, locator: Locator) -> Self {
        self.aliases.push(locator);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn appearing_after(mut self, delay: Duration) -> Self {
        self.appear_after = delay;
        self
    }

    pub fn vanishing_after(mut self, delay: Duration) -> Self {
        self.vanish_after = Some(delay);
        self
    }
}

#[derive(Debug)]
struct Node {
    spec: FakeElement,
    parent: Option<usize>,
}

impl Node {
    fn is_present(&self, elapsed: Duration) -> bool {
        elapsed >= self.spec.appear_after
            && self.spec.vanish_after.map_or(true, |vanish| elapsed < vanish)
    }

    fn label(&self, index: usize) -> String {
        self.spec
            .attributes
            .get("id")
            .cloned()
            .unwrap_or_else(|| format!("{}#{}", self.spec.tag, index))
    }

    fn matches(&self, locator: &Locator) -> bool {
        if self.spec.aliases.contains(locator) {
            return true;
        }
        let attr = |name: &str| self.spec.attributes.get(name).map(String::as_str);
        let selector = locator.selector.as_str();
        match locator.by {
            By::Id => attr("id") == Some(selector),
            By::Name => attr("name") == Some(selector),
            By::ClassName => attr("class")
                .map(|classes| classes.split_whitespace().any(|c| c == selector))
                .unwrap_or(false),
            By::TagName => self.spec.tag.eq_ignore_ascii_case(selector),
            By::LinkText => {
                self.spec.tag == "a"
                    && self.spec.text.split_whitespace().collect::<Vec<_>>().join(" ") == selector
            }
            By::PartialLinkText => self.spec.tag == "a" && self.spec.text.contains(selector),
            By::Css | By::XPath => false,
        }
    }
}

#[derive(Debug, Clone)]
struct FakeWindow {
    handle: WindowHandle,
    title: String,
    history: Vec<String>,
    position: usize,
}

impl FakeWindow {
    fn new(handle: WindowHandle, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            handle,
            title: title.into(),
            history: vec![url.into()],
            position: 0,
        }
    }

    fn url(&self) -> &str {
        &self.history[self.position]
    }
}

#[derive(Debug)]
struct FakeAlert {
    text: String,
    appear_after: Duration,
}

/// Something the session was asked to do, recorded in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Click(String),
    Clear(String),
    SendKeys { target: String, text: String },
    MoveTo(String),
    DoubleClick(String),
    ContextClick(String),
    DragAndDrop { source: String, target: String },
    DragByOffset { element: String, x: i64, y: i64 },
    KeysToFocused(String),
    Script { script: String, args: Vec<String> },
    AsyncScript { script: String, args: Vec<String> },
    Refresh,
    AlertAccepted(String),
    AlertDismissed(String),
    FrameSwitch(String),
    WindowClosed(WindowHandle),
    Screenshot,
    Quit,
}

#[derive(Debug)]
struct FakeState {
    nodes: Vec<Node>,
    windows: Vec<FakeWindow>,
    current_window: usize,
    pages: HashMap<String, String>,
    frames: Vec<String>,
    frame_stack: Vec<String>,
    alerts: Vec<FakeAlert>,
    cookies: Vec<Cookie>,
    script_results: Vec<(String, Value)>,
    interactions: Vec<Interaction>,
    window_size: WindowSize,
    window_position: WindowPosition,
    minimized: bool,
    quit: bool,
}

/// Scriptable [`Driver`] backed by an in-memory document.
#[derive(Debug)]
pub struct FakeDriver {
    epoch: Instant,
    state: Mutex<FakeState>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        let main = FakeWindow::new(WindowHandle::new("main"), "", "about:blank");
        Self {
            epoch: Instant::now(),
            state: Mutex::new(FakeState {
                nodes: Vec::new(),
                windows: vec![main],
                current_window: 0,
                pages: HashMap::new(),
                frames: Vec::new(),
                frame_stack: Vec::new(),
                alerts: Vec::new(),
                cookies: Vec::new(),
                script_results: Vec::new(),
                interactions: Vec::new(),
                window_size: WindowSize {
                    width: 1280,
                    height: 720,
                },
                window_position: WindowPosition::default(),
                minimized: false,
                quit: false,
            }),
        }
    }

    fn elapsed(&self) -> Duration {
        self.epoch.elapsed()
    }

    pub async fn add_element(&self, element: FakeElement) {
        let mut state = self.state.lock().await;
        insert_node(&mut state.nodes, element, None);
    }

    /// Title shown by any window navigated to `url`.
    pub async fn register_page(&self, url: impl Into<String>, title: impl Into<String>) {
        self.state.lock().await.pages.insert(url.into(), title.into());
    }

    /// Opens another window (not focused) and returns its handle.
    pub async fn open_window(&self, title: &str, url: &str) -> WindowHandle {
        let handle = WindowHandle::new(uuid::Uuid::new_v4().to_string());
        self.state
            .lock()
            .await
            .windows
            .push(FakeWindow::new(handle.clone(), title, url));
        handle
    }

    pub async fn add_frame(&self, name_or_id: impl Into<String>) {
        self.state.lock().await.frames.push(name_or_id.into());
    }

    pub async fn schedule_alert(&self, text: impl Into<String>, after: Duration) {
        self.state.lock().await.alerts.push(FakeAlert {
            text: text.into(),
            appear_after: after,
        });
    }

    /// Any script containing `fragment` evaluates to `result`.
    pub async fn on_script(&self, fragment: impl Into<String>, result: Value) {
        self.state
            .lock()
            .await
            .script_results
            .push((fragment.into(), result));
    }

    pub async fn interactions(&self) -> Vec<Interaction> {
        self.state.lock().await.interactions.clone()
    }

    pub async fn frame_stack(&self) -> Vec<String> {
        self.state.lock().await.frame_stack.clone()
    }

    pub async fn is_minimized(&self) -> bool {
        self.state.lock().await.minimized
    }

    pub async fn is_quit(&self) -> bool {
        self.state.lock().await.quit
    }

    /// Current `value` attribute of the first element matching `locator`.
    pub async fn value_of(&self, locator: &Locator) -> Option<String> {
        let elapsed = self.elapsed();
        let state = self.state.lock().await;
        state
            .nodes
            .iter()
            .find(|node| node.is_present(elapsed) && node.matches(locator))
            .and_then(|node| node.spec.attributes.get("value").cloned())
    }

    fn script_result(state: &FakeState, script: &str) -> Value {
        state
            .script_results
            .iter()
            .rev()
            .find(|(fragment, _)| script.contains(fragment.as_str()))
            .map(|(_, value)| value.clone())
            .unwrap_or(Value::Null)
    }

    fn arg_labels(state: &FakeState, args: &[ScriptArg<FakeHandle>]) -> Vec<String> {
        args.iter()
            .map(|arg| match arg {
                ScriptArg::Value(value) => value.to_string(),
                ScriptArg::Element(handle) => state.nodes[handle.0].label(handle.0),
            })
            .collect()
    }

    fn live<'s>(&self, state: &'s FakeState, handle: &FakeHandle) -> Result<&'s Node> {
        let node = state
            .nodes
            .get(handle.0)
            .ok_or_else(|| PageError::NoSuchElement(format!("handle {}", handle.0)))?;
        if node.is_present(self.elapsed()) {
            Ok(node)
        } else {
            Err(PageError::StaleElement(node.label(handle.0)))
        }
    }

    fn live_mut<'s>(&self, state: &'s mut FakeState, handle: &FakeHandle) -> Result<&'s mut Node> {
        self.live(state, handle)?;
        Ok(&mut state.nodes[handle.0])
    }

    fn current_window<'s>(&self, state: &'s mut FakeState) -> Result<&'s mut FakeWindow> {
        let index = state.current_window;
        state
            .windows
            .get_mut(index)
            .ok_or_else(|| PageError::NoSuchWindow("no window is focused".to_string()))
    }

    fn open_alert_index(&self, state: &FakeState) -> Option<usize> {
        let elapsed = self.elapsed();
        state
            .alerts
            .iter()
            .position(|alert| elapsed >= alert.appear_after)
    }

    fn label(&self, state: &FakeState, handle: &FakeHandle) -> String {
        state.nodes[handle.0].label(handle.0)
    }
}

fn insert_node(nodes: &mut Vec<Node>, mut element: FakeElement, parent: Option<usize>) {
    let children = std::mem::take(&mut element.children);
    let index = nodes.len();
    nodes.push(Node {
        spec: element,
        parent,
    });
    for child in children {
        insert_node(nodes, child, Some(index));
    }
}

fn is_descendant(nodes: &[Node], mut index: usize, ancestor: usize) -> bool {
    while let Some(parent) = nodes[index].parent {
        if parent == ancestor {
            return true;
        }
        index = parent;
    }
    false
}

#[async_trait]
impl Driver for FakeDriver {
    type Element = FakeHandle;

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<FakeHandle>> {
        let elapsed = self.elapsed();
        let state = self.state.lock().await;
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.is_present(elapsed) && node.matches(locator))
            .map(|(index, _)| FakeHandle(index))
            .collect())
    }

    async fn find_child_elements(
        &self,
        parent: &FakeHandle,
        locator: &Locator,
    ) -> Result<Vec<FakeHandle>> {
        let elapsed = self.elapsed();
        let state = self.state.lock().await;
        self.live(&state, parent)?;
        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(index, node)| {
                is_descendant(&state.nodes, *index, parent.0)
                    && node.is_present(elapsed)
                    && node.matches(locator)
            })
            .map(|(index, _)| FakeHandle(index))
            .collect())
    }

    async fn element_text(&self, element: &FakeHandle) -> Result<String> {
        let state = self.state.lock().await;
        let node = self.live(&state, element)?;
        Ok(if node.spec.displayed {
            node.spec.text.clone()
        } else {
            String::new()
        })
    }

    async fn element_attribute(&self, element: &FakeHandle, name: &str) -> Result<Option<String>> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.attributes.get(name).cloned())
    }

    async fn element_rect(&self, element: &FakeHandle) -> Result<ElementRect> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.rect)
    }

    async fn element_tag_name(&self, element: &FakeHandle) -> Result<String> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.tag.clone())
    }

    async fn is_displayed(&self, element: &FakeHandle) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.displayed)
    }

    async fn is_enabled(&self, element: &FakeHandle) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.enabled)
    }

    async fn is_selected(&self, element: &FakeHandle) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(self.live(&state, element)?.spec.selected)
    }

    async fn click(&self, element: &FakeHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let label = self.label(&state, element);
        let node = self.live_mut(&mut state, element)?;
        let tag = node.spec.tag.clone();
        let input_type = node.spec.attributes.get("type").cloned();
        let parent = node.parent;

        if tag == "option" {
            let multiple = parent
                .map(|p| state.nodes[p].spec.attributes.contains_key("multiple"))
                .unwrap_or(false);
            if multiple {
                let node = &mut state.nodes[element.0];
                node.spec.selected = !node.spec.selected;
            } else {
                if let Some(p) = parent {
                    for node in state.nodes.iter_mut().filter(|n| n.parent == Some(p)) {
                        node.spec.selected = false;
                    }
                }
                state.nodes[element.0].spec.selected = true;
            }
        } else if tag == "input" && matches!(input_type.as_deref(), Some("checkbox" | "radio")) {
            let node = &mut state.nodes[element.0];
            node.spec.selected = !node.spec.selected;
        }

        state.interactions.push(Interaction::Click(label));
        Ok(())
    }

    async fn clear(&self, element: &FakeHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let label = self.label(&state, element);
        let node = self.live_mut(&mut state, element)?;
        node.spec.attributes.insert("value".to_string(), String::new());
        state.interactions.push(Interaction::Clear(label));
        Ok(())
    }

    async fn send_keys(&self, element: &FakeHandle, text: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let label = self.label(&state, element);
        let node = self.live_mut(&mut state, element)?;
        let typed: String = text
            .chars()
            .filter(|ch| crate::actions::Key::from_char(*ch).is_none())
            .collect();
        node.spec
            .attributes
            .entry("value".to_string())
            .or_default()
            .push_str(&typed);
        state.interactions.push(Interaction::SendKeys {
            target: label,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn perform_actions(&self, chain: ActionChain<FakeHandle>) -> Result<()> {
        let mut state = self.state.lock().await;
        let mut recorded = Vec::new();
        for gesture in chain {
            let interaction = match gesture {
                Gesture::MoveTo(e) => {
                    self.live(&state, &e)?;
                    Interaction::MoveTo(self.label(&state, &e))
                }
                Gesture::Click(e) => {
                    self.live(&state, &e)?;
                    Interaction::Click(self.label(&state, &e))
                }
                Gesture::DoubleClick(e) => {
                    self.live(&state, &e)?;
                    Interaction::DoubleClick(self.label(&state, &e))
                }
                Gesture::ContextClick(e) => {
                    self.live(&state, &e)?;
                    Interaction::ContextClick(self.label(&state, &e))
                }
                Gesture::DragAndDrop { source, target } => {
                    self.live(&state, &source)?;
                    self.live(&state, &target)?;
                    Interaction::DragAndDrop {
                        source: self.label(&state, &source),
                        target: self.label(&state, &target),
                    }
                }
                Gesture::DragByOffset { element, x, y } => {
                    self.live(&state, &element)?;
                    Interaction::DragByOffset {
                        element: self.label(&state, &element),
                        x,
                        y,
                    }
                }
                Gesture::SendKeys(keys) => Interaction::KeysToFocused(keys),
            };
            recorded.push(interaction);
        }
        state.interactions.extend(recorded);
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        let title = state.pages.get(url).cloned();
        let window = self.current_window(&mut state)?;
        window.history.truncate(window.position + 1);
        window.history.push(url.to_string());
        window.position += 1;
        if let Some(title) = title {
            window.title = title;
        }
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let pages = state.pages.clone();
        let window = self.current_window(&mut state)?;
        if window.position > 0 {
            window.position -= 1;
            if let Some(title) = pages.get(window.url()) {
                window.title = title.clone();
            }
        }
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let pages = state.pages.clone();
        let window = self.current_window(&mut state)?;
        if window.position + 1 < window.history.len() {
            window.position += 1;
            if let Some(title) = pages.get(window.url()) {
                window.title = title.clone();
            }
        }
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.state.lock().await.interactions.push(Interaction::Refresh);
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        Ok(self.current_window(&mut state)?.url().to_string())
    }

    async fn title(&self) -> Result<String> {
        let mut state = self.state.lock().await;
        Ok(self.current_window(&mut state)?.title.clone())
    }

    async fn page_source(&self) -> Result<String> {
        let title = self.title().await?;
        Ok(format!(
            "<html><head><title>{}</title></head><body></body></html>",
            title
        ))
    }

    async fn get_cookies(&self) -> Result<Vec<Cookie>> {
        Ok(self.state.lock().await.cookies.clone())
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        let mut state = self.state.lock().await;
        state.cookies.retain(|c| c.name != cookie.name);
        state.cookies.push(cookie);
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        self.state.lock().await.cookies.retain(|c| c.name != name);
        Ok(())
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        self.state.lock().await.cookies.clear();
        Ok(())
    }

    async fn minimize_window(&self) -> Result<()> {
        self.state.lock().await.minimized = true;
        Ok(())
    }

    async fn set_window_size(&self, size: WindowSize) -> Result<()> {
        let mut state = self.state.lock().await;
        state.window_size = size;
        state.minimized = false;
        Ok(())
    }

    async fn window_size(&self) -> Result<WindowSize> {
        Ok(self.state.lock().await.window_size)
    }

    async fn window_position(&self) -> Result<WindowPosition> {
        Ok(self.state.lock().await.window_position)
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        let state = self.state.lock().await;
        Ok(state.windows.iter().map(|w| w.handle.clone()).collect())
    }

    async fn current_window_handle(&self) -> Result<WindowHandle> {
        let mut state = self.state.lock().await;
        Ok(self.current_window(&mut state)?.handle.clone())
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = state
            .windows
            .iter()
            .position(|w| &w.handle == handle)
            .ok_or_else(|| PageError::NoSuchWindow(handle.to_string()))?;
        state.current_window = index;
        state.frame_stack.clear();
        Ok(())
    }

    async fn close_window(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = state.current_window;
        if index >= state.windows.len() {
            return Err(PageError::NoSuchWindow("no window is focused".to_string()));
        }
        let closed = state.windows.remove(index);
        state.current_window = 0;
        state.interactions.push(Interaction::WindowClosed(closed.handle));
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        state.quit = true;
        state.interactions.push(Interaction::Quit);
        Ok(())
    }

    async fn switch_to_frame(&self, frame: FrameRef<FakeHandle>) -> Result<()> {
        let mut state = self.state.lock().await;
        let name = match frame {
            FrameRef::Element(handle) => {
                let node = self.live(&state, &handle)?;
                if !matches!(node.spec.tag.as_str(), "iframe" | "frame") {
                    return Err(PageError::NoSuchFrame(node.label(handle.0)));
                }
                node.label(handle.0)
            }
            FrameRef::Index(index) => state
                .frames
                .get(index as usize)
                .cloned()
                .ok_or_else(|| PageError::NoSuchFrame(format!("index {}", index)))?,
            FrameRef::NameOrId(name) => {
                if !state.frames.contains(&name) {
                    return Err(PageError::NoSuchFrame(name));
                }
                name
            }
        };
        state.frame_stack.push(name.clone());
        state.interactions.push(Interaction::FrameSwitch(name));
        Ok(())
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        self.state.lock().await.frame_stack.pop();
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        self.state.lock().await.frame_stack.clear();
        Ok(())
    }

    async fn alert_text(&self) -> Result<String> {
        let state = self.state.lock().await;
        self.open_alert_index(&state)
            .map(|index| state.alerts[index].text.clone())
            .ok_or(PageError::NoSuchAlert)
    }

    async fn accept_alert(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = self.open_alert_index(&state).ok_or(PageError::NoSuchAlert)?;
        let alert = state.alerts.remove(index);
        state.interactions.push(Interaction::AlertAccepted(alert.text));
        Ok(())
    }

    async fn dismiss_alert(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        let index = self.open_alert_index(&state).ok_or(PageError::NoSuchAlert)?;
        let alert = state.alerts.remove(index);
        state.interactions.push(Interaction::AlertDismissed(alert.text));
        Ok(())
    }

    async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<FakeHandle>>,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        for arg in &args {
            if let ScriptArg::Element(handle) = arg {
                self.live(&state, handle)?;
            }
        }
        let labels = Self::arg_labels(&state, &args);
        let result = Self::script_result(&state, script);
        state.interactions.push(Interaction::Script {
            script: script.to_string(),
            args: labels,
        });
        Ok(result)
    }

    async fn execute_async_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<FakeHandle>>,
    ) -> Result<Value> {
        let mut state = self.state.lock().await;
        let labels = Self::arg_labels(&state, &args);
        let result = Self::script_result(&state, script);
        state.interactions.push(Interaction::AsyncScript {
            script: script.to_string(),
            args: labels,
        });
        Ok(result)
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.state.lock().await.interactions.push(Interaction::Screenshot);
        Ok(FAKE_PNG.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elements_follow_their_schedule() {
        let driver = FakeDriver::new();
        driver
            .add_element(
                FakeElement::new("div")
                    .with_id("toast")
                    .appearing_after(Duration::from_secs(1))
                    .vanishing_after(Duration::from_secs(3)),
            )
            .await;
        let toast = Locator::id("toast");

        assert!(driver.find_elements(&toast).await.unwrap().is_empty());
        tokio::time::sleep(Duration::from_secs(1)).await;
        let handle = driver.find_element(&toast).await.unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(driver.find_elements(&toast).await.unwrap().is_empty());
        assert!(matches!(
            driver.is_displayed(&handle).await,
            Err(PageError::StaleElement(_))
        ));
    }

    #[tokio::test]
    async fn options_are_children_in_document_order() {
        let driver = FakeDriver::new();
        driver
            .add_element(FakeElement::select(&[("a", "A"), ("b", "B")]).with_id("room"))
            .await;
        driver.add_element(FakeElement::new("option")).await;

        let select = driver.find_element(&Locator::id("room")).await.unwrap();
        let options = driver
            .find_child_elements(&select, &Locator::tag_name("option"))
            .await
            .unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(driver.element_text(&options[1]).await.unwrap(), "B");
        assert_eq!(
            driver.find_elements(&Locator::tag_name("option")).await.unwrap().len(),
            3
        );
    }

    #[tokio::test]
    async fn history_moves_back_and_forward() {
        let driver = FakeDriver::new();
        driver.register_page("https://a.test/", "A").await;
        driver.register_page("https://b.test/", "B").await;
        driver.get("https://a.test/").await.unwrap();
        driver.get("https://b.test/").await.unwrap();

        driver.back().await.unwrap();
        assert_eq!(driver.title().await.unwrap(), "A");
        driver.forward().await.unwrap();
        assert_eq!(driver.current_url().await.unwrap(), "https://b.test/");
    }
}
