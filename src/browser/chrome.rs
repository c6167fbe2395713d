use crate::actions::{parse_keys, ActionChain, Gesture, Key, KeyStroke};
use crate::core::{BrowserConfig, Driver, ScriptArg};
use crate::errors::{PageError, Result};
use crate::types::{
    Cookie, ElementRect, FrameRef, Locator, Query, WindowHandle, WindowPosition, WindowSize,
};
use crate::utils::javascript::DRAG_AND_DROP;
use async_trait::async_trait;
use headless_chrome::browser::tab::ModifierKey;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::protocol::cdp::{Input, Network, DOM};
use headless_chrome::types::Bounds;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Shared by every injected script: resolves element paths back to nodes,
/// starting from the document of the focused frame in `__ppFrames`.
const HELPERS: &str = r#"
const __ppQuery = (ctx, kind, selector) => {
    if (kind === 'css') {
        return Array.from(ctx.querySelectorAll(selector));
    }
    const doc = ctx.ownerDocument || ctx;
    const snapshot = doc.evaluate(
        selector, ctx, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null
    );
    const nodes = [];
    for (let i = 0; i < snapshot.snapshotLength; i++) {
        nodes.push(snapshot.snapshotItem(i));
    }
    return nodes;
};
const __ppWalk = (root, path) => {
    let ctx = root;
    for (const step of path) {
        ctx = __ppQuery(ctx, step.kind, step.selector)[step.index];
        if (!ctx) {
            throw { __ppStale: path };
        }
    }
    return ctx;
};
const __ppDocument = () => {
    let doc = document;
    for (const frame of __ppFrames) {
        let el;
        try {
            el = __ppWalk(doc, frame);
        } catch (e) {
            throw { __ppNoFrame: frame };
        }
        if (!el.contentDocument) {
            throw { __ppNoFrame: frame };
        }
        doc = el.contentDocument;
    }
    return doc;
};
const __ppFind = (path) => __ppWalk(__ppDocument(), path);
const __ppFail = (e) => {
    if (e && e.__ppStale) {
        return JSON.stringify({ stale: e.__ppStale });
    }
    if (e && e.__ppNoFrame) {
        return JSON.stringify({ noframe: e.__ppNoFrame });
    }
    return JSON.stringify({ error: String(e) });
};
"#;

const ELEMENT_RECT: &str = r#"
const r = arguments[0].getBoundingClientRect();
return { x: r.left + window.scrollX, y: r.top + window.scrollY, width: r.width, height: r.height };
"#;

/// Scrolls the element into view and returns its centre in top-level
/// viewport coordinates, the space protocol mouse events use.
const ELEMENT_CENTER: &str = r#"
const el = arguments[0];
el.scrollIntoView({ block: 'center', inline: 'center' });
const r = el.getBoundingClientRect();
let x = r.left + r.width / 2;
let y = r.top + r.height / 2;
let win = el.ownerDocument.defaultView;
while (win.frameElement) {
    const frame = win.frameElement;
    const f = frame.getBoundingClientRect();
    x += f.left + frame.clientLeft;
    y += f.top + frame.clientTop;
    win = win.parent;
}
return { x, y };
"#;

const ELEMENT_DISPLAYED: &str = r#"
const el = arguments[0];
if (!el.isConnected) return false;
const style = window.getComputedStyle(el);
if (style.display === 'none' || style.visibility === 'hidden' || style.visibility === 'collapse') {
    return false;
}
if (el.tagName === 'OPTION') {
    const select = el.closest('select');
    return !select || window.getComputedStyle(select).display !== 'none';
}
return el.getClientRects().length > 0 && parseFloat(style.opacity) !== 0;
"#;

/// Property-first read, the way WebDriver's getAttribute behaves.
const ELEMENT_ATTRIBUTE: &str = r#"
const el = arguments[0];
const name = arguments[1];
if (name === 'value' && 'value' in el) return el.value == null ? null : String(el.value);
if (typeof el[name] === 'boolean') return el[name] ? 'true' : null;
return el.getAttribute(name);
"#;

/// Options are selected through their `<select>`, as WebDriver's element
/// click does; a plain `click()` on an option leaves the selection alone.
const ELEMENT_CLICK: &str = r#"
const el = arguments[0];
if (el.tagName === 'OPTION') {
    const select = el.closest('select');
    if (select && select.disabled) return false;
    el.selected = select && select.multiple ? !el.selected : true;
    if (select) {
        select.dispatchEvent(new Event('input', { bubbles: true }));
        select.dispatchEvent(new Event('change', { bubbles: true }));
    }
    return true;
}
el.click();
return true;
"#;

const ELEMENT_CLEAR: &str = r#"
const el = arguments[0];
el.focus();
el.value = '';
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return true;
"#;

const FRAME_STATUS: &str = r#"
const el = arguments[0];
const tag = el.tagName.toUpperCase();
if (tag !== 'IFRAME' && tag !== 'FRAME') return 'not-a-frame';
return el.contentDocument ? 'ok' : 'cross-origin';
"#;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Step {
    query: Query,
    index: usize,
}

/// Element handle that re-resolves its lookup path on every use.
///
/// Paths are relative to the document of the frame focused when the
/// element was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChromeElement {
    path: Arc<Vec<Step>>,
}

impl ChromeElement {
    fn nth(parent: Option<&ChromeElement>, query: &Query, index: usize) -> Self {
        let mut path = parent.map(|p| p.path.as_ref().clone()).unwrap_or_default();
        path.push(Step {
            query: query.clone(),
            index,
        });
        Self {
            path: Arc::new(path),
        }
    }

    fn path_json(&self) -> Value {
        Value::Array(self.path.iter().map(step_json).collect())
    }
}

fn step_json(step: &Step) -> Value {
    let (kind, selector) = query_parts(&step.query);
    json!({ "kind": kind, "selector": selector, "index": step.index })
}

fn query_parts(query: &Query) -> (&'static str, &str) {
    match query {
        Query::Css(selector) => ("css", selector),
        Query::XPath(selector) => ("xpath", selector),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ScriptOutcome {
    Ok(Value),
    Stale(Value),
    NoFrame(Value),
    Error(String),
}

/// Top-level viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
struct Pointer {
    x: f64,
    y: f64,
}

impl Pointer {
    fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x + dx as f64,
            y: self.y + dy as f64,
        }
    }
}

/// [`Driver`] over a Chrome or Chromium (including Edge) DevTools session.
///
/// Windows map to browser tabs. Frame focus reaches same-origin frames only.
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    current: Mutex<Arc<Tab>>,
    frames: Mutex<Vec<ChromeElement>>,
    dialog: Arc<Mutex<Option<String>>>,
    watched: Mutex<HashSet<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChromeDriver {
    pub async fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );

        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];

        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }

        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .path(config.executable.clone())
            .args(args)
            .build()
            .map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| PageError::LaunchFailed(e.to_string()))?;

        let driver = Self {
            browser: Mutex::new(Some(browser)),
            current: Mutex::new(Arc::clone(&tab)),
            frames: Mutex::new(Vec::new()),
            dialog: Arc::new(Mutex::new(None)),
            watched: Mutex::new(HashSet::new()),
        };
        driver.watch_dialogs(&tab)?;

        info!(
            browser = ?config.browser_type,
            headless = config.headless,
            "browser launched"
        );
        Ok(driver)
    }

    fn tab(&self) -> Arc<Tab> {
        Arc::clone(&lock(&self.current))
    }

    fn tabs(&self) -> Result<Vec<Arc<Tab>>> {
        let browser = lock(&self.browser);
        let browser = browser
            .as_ref()
            .ok_or_else(|| PageError::Driver("browser session has ended".to_string()))?;
        let tabs = lock(browser.get_tabs()).clone();
        Ok(tabs)
    }

    fn focus_tab(&self, tab: Arc<Tab>) {
        *lock(&self.current) = tab;
        lock(&self.frames).clear();
    }

    /// Tracks the JavaScript dialog state of `tab`; alerts block the page,
    /// so their text has to come from protocol events.
    fn watch_dialogs(&self, tab: &Arc<Tab>) -> Result<()> {
        if !lock(&self.watched).insert(tab.get_target_id().to_string()) {
            return Ok(());
        }

        let dialog = Arc::clone(&self.dialog);
        tab.add_event_listener(Arc::new(move |event: &Event| match event {
            Event::PageJavascriptDialogOpening(opening) => {
                *lock(&dialog) = Some(opening.params.message.clone());
            }
            Event::PageJavascriptDialogClosed(_) => {
                *lock(&dialog) = None;
            }
            _ => {}
        }))
        .map_err(PageError::from_any_error)?;
        Ok(())
    }

    fn prelude(frames: &[ChromeElement]) -> String {
        let frames = Value::Array(frames.iter().map(ChromeElement::path_json).collect());
        format!("const __ppFrames = {};\n{}", frames, HELPERS)
    }

    /// Wraps `script` so it runs with `document` and `window` bound to the
    /// focused frame and reports its outcome as tagged JSON.
    fn script_expression(
        frames: &[ChromeElement],
        script: &str,
        args: &[ScriptArg<ChromeElement>],
        is_async: bool,
    ) -> String {
        let prelude = Self::prelude(frames);
        let args = args
            .iter()
            .map(|arg| match arg {
                ScriptArg::Value(value) => value.to_string(),
                ScriptArg::Element(element) => format!("__ppFind({})", element.path_json()),
            })
            .collect::<Vec<_>>()
            .join(", ");

        if is_async {
            format!(
                r#"(function() {{
{prelude}
return new Promise((resolve) => {{
    try {{
        const __ppDoc = __ppDocument();
        const args = [{args}];
        const __ppDone = (result) => ({{ ok: result === undefined ? null : result }});
        args.push((result) => resolve(JSON.stringify(__ppDone(result))));
        (function(document, window) {{
            (function() {{ {script} }}).apply(null, args);
        }})(__ppDoc, __ppDoc.defaultView);
    }} catch (e) {{
        resolve(__ppFail(e));
    }}
}});
}})()"#
            )
        } else {
            format!(
                r#"(function() {{
{prelude}
try {{
    const __ppDoc = __ppDocument();
    const args = [{args}];
    const result = (function(document, window) {{
        return (function() {{ {script} }}).apply(null, args);
    }})(__ppDoc, __ppDoc.defaultView);
    return JSON.stringify({{ ok: result === undefined ? null : result }});
}} catch (e) {{
    return __ppFail(e);
}}
}})()"#
            )
        }
    }

    fn run_script(
        &self,
        script: &str,
        args: &[ScriptArg<ChromeElement>],
        is_async: bool,
    ) -> Result<Value> {
        let frames = lock(&self.frames).clone();
        let expression = Self::script_expression(&frames, script, args, is_async);
        let result = self
            .tab()
            .evaluate(&expression, is_async)
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;

        let raw = result
            .value
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::JavaScriptFailed("script produced no result".to_string()))?;

        match serde_json::from_str(raw)? {
            ScriptOutcome::Ok(value) => Ok(value),
            ScriptOutcome::Stale(path) => Err(PageError::StaleElement(path.to_string())),
            ScriptOutcome::NoFrame(path) => Err(PageError::NoSuchFrame(path.to_string())),
            ScriptOutcome::Error(message) => Err(PageError::JavaScriptFailed(message)),
        }
    }

    fn on_element(
        &self,
        element: &ChromeElement,
        script: &str,
        extra: Vec<Value>,
    ) -> Result<Value> {
        let mut args = vec![ScriptArg::Element(element.clone())];
        args.extend(extra.into_iter().map(ScriptArg::Value));
        self.run_script(script, &args, false)
    }

    fn evaluate(&self, expression: &str) -> Result<Value> {
        let result = self
            .tab()
            .evaluate(expression, false)
            .map_err(|e| PageError::JavaScriptFailed(e.to_string()))?;
        Ok(result.value.unwrap_or(Value::Null))
    }

    fn find_in(
        &self,
        parent: Option<&ChromeElement>,
        locator: &Locator,
    ) -> Result<Vec<ChromeElement>> {
        let query = locator.to_query();
        let (kind, selector) = query_parts(&query);
        let context = match parent {
            Some(element) => ScriptArg::Element(element.clone()),
            None => ScriptArg::Value(Value::Null),
        };

        let count = self
            .run_script(
                "return __ppQuery(arguments[0] || document, arguments[1], arguments[2]).length;",
                &[context, json!(kind).into(), json!(selector).into()],
                false,
            )
            .map_err(|e| match e {
                PageError::JavaScriptFailed(message) if message.contains("SyntaxError") => {
                    PageError::InvalidLocator(format!("{}: {}", locator, message))
                }
                other => other,
            })?
            .as_u64()
            .unwrap_or(0) as usize;

        debug!(%locator, count, "resolved locator");
        Ok((0..count)
            .map(|index| ChromeElement::nth(parent, &query, index))
            .collect())
    }

    fn type_keys(&self, keys: &str) -> Result<()> {
        let tab = self.tab();
        for stroke in parse_keys(keys) {
            let typed = match stroke {
                KeyStroke::Text(text) => tab.type_str(&text).map(|_| ()),
                KeyStroke::Press { key, modifiers } => {
                    let modifiers = modifier_keys(&modifiers);
                    tab.press_key_with_modifiers(key.dom_name(), Some(modifiers.as_slice()))
                        .map(|_| ())
                }
                KeyStroke::Chord { ch, modifiers } => {
                    let modifiers = modifier_keys(&modifiers);
                    tab.press_key_with_modifiers(&ch.to_string(), Some(modifiers.as_slice()))
                        .map(|_| ())
                }
            };
            typed.map_err(PageError::from_any_error)?;
        }
        Ok(())
    }

    fn set_input_files(&self, element: &ChromeElement, paths: &str) -> Result<()> {
        let frames = lock(&self.frames).clone();
        let expression = format!(
            "(function() {{ {} return __ppFind({}); }})()",
            Self::prelude(&frames),
            element.path_json()
        );
        let tab = self.tab();
        let object_id = tab
            .evaluate(&expression, false)
            .map_err(|e| PageError::StaleElement(e.to_string()))?
            .object_id
            .ok_or_else(|| PageError::StaleElement(element.path_json().to_string()))?;

        tab.call_method(DOM::SetFileInputFiles {
            files: paths.lines().map(str::to_string).collect(),
            node_id: None,
            backend_node_id: None,
            object_id: Some(object_id),
        })
        .map_err(PageError::from_any_error)?;
        Ok(())
    }

    fn pointer_at(&self, element: &ChromeElement) -> Result<Pointer> {
        let center = self.on_element(element, ELEMENT_CENTER, vec![])?;
        Ok(serde_json::from_value(center)?)
    }

    fn mouse(&self, kind: &str, at: Pointer, button: &str, click_count: u32) -> Result<()> {
        let event: Input::DispatchMouseEvent =
            serde_json::from_value(mouse_event(kind, at, button, click_count))?;
        self.tab()
            .call_method(event)
            .map_err(PageError::from_any_error)?;
        Ok(())
    }

    fn press(&self, at: Pointer, button: &str, click_count: u32) -> Result<()> {
        self.mouse("mousePressed", at, button, click_count)?;
        self.mouse("mouseReleased", at, button, click_count)
    }

    fn perform(&self, gesture: Gesture<ChromeElement>) -> Result<()> {
        match gesture {
            Gesture::MoveTo(element) => {
                let at = self.pointer_at(&element)?;
                self.mouse("mouseMoved", at, "none", 0)?;
            }
            Gesture::Click(element) => {
                self.on_element(&element, ELEMENT_CLICK, vec![])?;
            }
            Gesture::DoubleClick(element) => {
                let at = self.pointer_at(&element)?;
                self.mouse("mouseMoved", at, "none", 0)?;
                self.press(at, "left", 1)?;
                self.press(at, "left", 2)?;
            }
            Gesture::ContextClick(element) => {
                let at = self.pointer_at(&element)?;
                self.mouse("mouseMoved", at, "none", 0)?;
                self.press(at, "right", 1)?;
            }
            Gesture::DragAndDrop { source, target } => {
                self.run_script(
                    DRAG_AND_DROP,
                    &[ScriptArg::Element(source), ScriptArg::Element(target)],
                    false,
                )?;
            }
            Gesture::DragByOffset { element, x, y } => {
                let from = self.pointer_at(&element)?;
                let to = from.offset(x, y);
                self.mouse("mouseMoved", from, "none", 0)?;
                self.mouse("mousePressed", from, "left", 1)?;
                self.mouse("mouseMoved", to, "left", 0)?;
                self.mouse("mouseReleased", to, "left", 1)?;
            }
            Gesture::SendKeys(keys) => self.type_keys(&keys)?,
        }
        Ok(())
    }

    fn string_result(&self, expression: &str) -> Result<String> {
        Ok(self
            .evaluate(expression)?
            .as_str()
            .unwrap_or_default()
            .to_string())
    }

    fn delete_cookies(&self, cookies: &[Cookie]) -> Result<()> {
        if cookies.is_empty() {
            return Ok(());
        }
        let deletions = cookies
            .iter()
            .map(|cookie| serde_json::from_value(cookie_deletion(cookie)))
            .collect::<std::result::Result<Vec<Network::DeleteCookies>, _>>()?;
        self.tab()
            .delete_cookies(deletions)
            .map_err(PageError::from_any_error)?;
        Ok(())
    }

    fn frame_named(&self, name: &str) -> Result<ChromeElement> {
        for locator in [Locator::name(name), Locator::id(name)] {
            for candidate in self.find_in(None, &locator)? {
                let tag = self.on_element(&candidate, "return arguments[0].tagName;", vec![])?;
                let tag = tag.as_str().unwrap_or_default().to_ascii_uppercase();
                if tag == "IFRAME" || tag == "FRAME" {
                    return Ok(candidate);
                }
            }
        }
        Err(PageError::NoSuchFrame(name.to_string()))
    }

    fn enter_frame(&self, frame: ChromeElement) -> Result<()> {
        let status = self.on_element(&frame, FRAME_STATUS, vec![])?;
        match status.as_str() {
            Some("ok") => {
                debug!(frame = %frame.path_json(), "entered frame");
                lock(&self.frames).push(frame);
                Ok(())
            }
            Some("cross-origin") => Err(PageError::Unsupported(
                "cross-origin frame content is not reachable from the page".to_string(),
            )),
            _ => Err(PageError::NoSuchFrame(frame.path_json().to_string())),
        }
    }
}

/// `Input.dispatchMouseEvent` parameters; `buttons` tracks the held button.
fn mouse_event(kind: &str, at: Pointer, button: &str, click_count: u32) -> Value {
    let held = match (kind, button) {
        ("mouseReleased", _) => 0,
        (_, "left") => 1,
        (_, "right") => 2,
        _ => 0,
    };
    json!({
        "type": kind,
        "x": at.x,
        "y": at.y,
        "button": button,
        "buttons": held,
        "clickCount": click_count,
    })
}

fn modifier_keys(keys: &[Key]) -> Vec<ModifierKey> {
    keys.iter()
        .filter_map(|key| match key {
            Key::Shift => Some(ModifierKey::Shift),
            Key::Control => Some(ModifierKey::Ctrl),
            Key::Alt => Some(ModifierKey::Alt),
            Key::Meta => Some(ModifierKey::Meta),
            _ => None,
        })
        .collect()
}

/// Reads a `Network.Cookie`; session cookies report `expires` as -1.
fn cookie_from_protocol(raw: &Value) -> Cookie {
    let text = |key: &str| raw.get(key).and_then(Value::as_str).map(str::to_string);
    let flag = |key: &str| raw.get(key).and_then(Value::as_bool).unwrap_or(false);
    Cookie {
        name: text("name").unwrap_or_default(),
        value: text("value").unwrap_or_default(),
        path: text("path"),
        domain: text("domain"),
        secure: flag("secure"),
        http_only: flag("httpOnly"),
        expiry: raw
            .get("expires")
            .and_then(Value::as_f64)
            .filter(|expires| *expires >= 0.0)
            .map(|expires| expires as i64),
        same_site: text("sameSite"),
    }
}

/// `Network.CookieParam` for `cookie`. Host-only cookies are scoped by `url`.
fn cookie_param(cookie: &Cookie, url: &str) -> Value {
    let mut param = json!({
        "name": cookie.name,
        "value": cookie.value,
        "secure": cookie.secure,
        "httpOnly": cookie.http_only,
    });
    match &cookie.domain {
        Some(domain) => param["domain"] = json!(domain),
        None => param["url"] = json!(url),
    }
    if let Some(path) = &cookie.path {
        param["path"] = json!(path);
    }
    if let Some(expiry) = cookie.expiry {
        param["expires"] = json!(expiry as f64);
    }
    if let Some(same_site) = cookie.same_site.as_deref().and_then(same_site_option) {
        param["sameSite"] = json!(same_site);
    }
    param
}

fn same_site_option(value: &str) -> Option<&'static str> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Some("Strict"),
        "lax" => Some("Lax"),
        "none" => Some("None"),
        _ => None,
    }
}

/// `Network.DeleteCookies` matching exactly this cookie's domain and path.
fn cookie_deletion(cookie: &Cookie) -> Value {
    let mut deletion = json!({ "name": cookie.name });
    if let Some(domain) = &cookie.domain {
        deletion["domain"] = json!(domain);
    }
    if let Some(path) = &cookie.path {
        deletion["path"] = json!(path);
    }
    deletion
}

#[async_trait]
impl Driver for ChromeDriver {
    type Element = ChromeElement;

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ChromeElement>> {
        self.find_in(None, locator)
    }

    async fn find_child_elements(
        &self,
        parent: &ChromeElement,
        locator: &Locator,
    ) -> Result<Vec<ChromeElement>> {
        self.find_in(Some(parent), locator)
    }

    async fn element_text(&self, element: &ChromeElement) -> Result<String> {
        let text = self.on_element(element, "return arguments[0].innerText;", vec![])?;
        Ok(text.as_str().unwrap_or_default().to_string())
    }

    async fn element_attribute(
        &self,
        element: &ChromeElement,
        name: &str,
    ) -> Result<Option<String>> {
        let value = self.on_element(element, ELEMENT_ATTRIBUTE, vec![json!(name)])?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn element_rect(&self, element: &ChromeElement) -> Result<ElementRect> {
        let rect = self.on_element(element, ELEMENT_RECT, vec![])?;
        Ok(serde_json::from_value(rect)?)
    }

    async fn element_tag_name(&self, element: &ChromeElement) -> Result<String> {
        let tag = self.on_element(element, "return arguments[0].tagName.toLowerCase();", vec![])?;
        Ok(tag.as_str().unwrap_or_default().to_string())
    }

    async fn is_displayed(&self, element: &ChromeElement) -> Result<bool> {
        let displayed = self.on_element(element, ELEMENT_DISPLAYED, vec![])?;
        Ok(displayed.as_bool().unwrap_or(false))
    }

    async fn is_enabled(&self, element: &ChromeElement) -> Result<bool> {
        let enabled = self.on_element(element, "return !arguments[0].disabled;", vec![])?;
        Ok(enabled.as_bool().unwrap_or(true))
    }

    async fn is_selected(&self, element: &ChromeElement) -> Result<bool> {
        let selected = self.on_element(
            element,
            "return !!(arguments[0].selected || arguments[0].checked);",
            vec![],
        )?;
        Ok(selected.as_bool().unwrap_or(false))
    }

    async fn click(&self, element: &ChromeElement) -> Result<()> {
        self.perform(Gesture::Click(element.clone()))
    }

    async fn clear(&self, element: &ChromeElement) -> Result<()> {
        self.on_element(element, ELEMENT_CLEAR, vec![])?;
        Ok(())
    }

    async fn send_keys(&self, element: &ChromeElement, text: &str) -> Result<()> {
        let is_file_input = self
            .on_element(
                element,
                "return arguments[0].tagName === 'INPUT' && arguments[0].type === 'file';",
                vec![],
            )?
            .as_bool()
            .unwrap_or(false);
        if is_file_input {
            return self.set_input_files(element, text);
        }

        self.on_element(element, "arguments[0].focus(); return true;", vec![])?;
        self.type_keys(text)
    }

    async fn perform_actions(&self, chain: ActionChain<ChromeElement>) -> Result<()> {
        for gesture in chain {
            self.perform(gesture)?;
        }
        Ok(())
    }

    async fn get(&self, url: &str) -> Result<()> {
        let tab = self.tab();
        tab.navigate_to(url)
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        tab.wait_until_navigated()
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;

        lock(&self.frames).clear();
        Ok(())
    }

    async fn back(&self) -> Result<()> {
        self.evaluate("window.history.back()")?;
        lock(&self.frames).clear();
        Ok(())
    }

    async fn forward(&self) -> Result<()> {
        self.evaluate("window.history.forward()")?;
        lock(&self.frames).clear();
        Ok(())
    }

    async fn refresh(&self) -> Result<()> {
        self.tab()
            .reload(false, None)
            .map_err(|e| PageError::NavigationFailed(e.to_string()))?;
        lock(&self.frames).clear();
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.tab().get_url())
    }

    async fn title(&self) -> Result<String> {
        self.string_result("document.title")
    }

    async fn page_source(&self) -> Result<String> {
        self.string_result("document.documentElement.outerHTML")
    }

    async fn get_cookies(&self) -> Result<Vec<Cookie>> {
        let cookies = self
            .tab()
            .get_cookies()
            .map_err(PageError::from_any_error)?;
        cookies
            .iter()
            .map(|cookie| -> Result<Cookie> {
                Ok(cookie_from_protocol(&serde_json::to_value(cookie)?))
            })
            .collect()
    }

    async fn add_cookie(&self, cookie: Cookie) -> Result<()> {
        let tab = self.tab();
        let param: Network::CookieParam =
            serde_json::from_value(cookie_param(&cookie, &tab.get_url()))?;
        tab.set_cookies(vec![param])
            .map_err(PageError::from_any_error)?;
        Ok(())
    }

    async fn delete_cookie(&self, name: &str) -> Result<()> {
        let matching: Vec<Cookie> = self
            .get_cookies()
            .await?
            .into_iter()
            .filter(|cookie| cookie.name == name)
            .collect();
        self.delete_cookies(&matching)
    }

    async fn delete_all_cookies(&self) -> Result<()> {
        let cookies = self.get_cookies().await?;
        self.delete_cookies(&cookies)
    }

    async fn minimize_window(&self) -> Result<()> {
        self.tab()
            .set_bounds(Bounds::Minimized)
            .map_err(PageError::from_any_error)?;
        Ok(())
    }

    async fn set_window_size(&self, size: WindowSize) -> Result<()> {
        let tab = self.tab();
        tab.set_bounds(Bounds::Normal {
            left: None,
            top: None,
            width: Some(f64::from(size.width)),
            height: Some(f64::from(size.height)),
        })
        .map_err(PageError::from_any_error)?;
        Ok(())
    }

    async fn window_size(&self) -> Result<WindowSize> {
        let size = self.run_script(
            "return { width: window.outerWidth, height: window.outerHeight };",
            &[],
            false,
        )?;
        Ok(serde_json::from_value(size)?)
    }

    async fn window_position(&self) -> Result<WindowPosition> {
        let position = self.run_script(
            "return { x: window.screenX, y: window.screenY };",
            &[],
            false,
        )?;
        Ok(serde_json::from_value(position)?)
    }

    async fn window_handles(&self) -> Result<Vec<WindowHandle>> {
        Ok(self
            .tabs()?
            .iter()
            .map(|tab| WindowHandle::new(tab.get_target_id().to_string()))
            .collect())
    }

    async fn current_window_handle(&self) -> Result<WindowHandle> {
        Ok(WindowHandle::new(self.tab().get_target_id().to_string()))
    }

    async fn switch_to_window(&self, handle: &WindowHandle) -> Result<()> {
        let tab = self
            .tabs()?
            .into_iter()
            .find(|tab| tab.get_target_id().as_str() == handle.as_str())
            .ok_or_else(|| PageError::NoSuchWindow(handle.to_string()))?;

        tab.activate().map_err(PageError::from_any_error)?;
        self.watch_dialogs(&tab)?;
        self.focus_tab(tab);
        Ok(())
    }

    async fn close_window(&self) -> Result<()> {
        let tab = self.tab();
        let closed = tab.get_target_id().to_string();
        tab.close(true).map_err(PageError::from_any_error)?;

        if let Some(next) = self
            .tabs()?
            .into_iter()
            .find(|tab| tab.get_target_id().as_str() != closed)
        {
            self.focus_tab(next);
        }
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        // Dropping the browser terminates the process.
        if lock(&self.browser).take().is_some() {
            info!("browser closed");
        }
        Ok(())
    }

    async fn switch_to_frame(&self, frame: FrameRef<ChromeElement>) -> Result<()> {
        let element = match frame {
            FrameRef::Element(element) => element,
            FrameRef::Index(index) => self
                .find_in(None, &Locator::css("iframe, frame"))?
                .into_iter()
                .nth(usize::from(index))
                .ok_or_else(|| PageError::NoSuchFrame(format!("index {}", index)))?,
            FrameRef::NameOrId(name) => self.frame_named(&name)?,
        };
        self.enter_frame(element)
    }

    async fn switch_to_parent_frame(&self) -> Result<()> {
        lock(&self.frames).pop();
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        lock(&self.frames).clear();
        Ok(())
    }

    async fn alert_text(&self) -> Result<String> {
        lock(&self.dialog).clone().ok_or(PageError::NoSuchAlert)
    }

    async fn accept_alert(&self) -> Result<()> {
        if lock(&self.dialog).is_none() {
            return Err(PageError::NoSuchAlert);
        }
        self.tab()
            .get_dialog()
            .accept(None)
            .map_err(PageError::from_any_error)?;
        *lock(&self.dialog) = None;
        Ok(())
    }

    async fn dismiss_alert(&self) -> Result<()> {
        if lock(&self.dialog).is_none() {
            return Err(PageError::NoSuchAlert);
        }
        self.tab()
            .get_dialog()
            .dismiss()
            .map_err(PageError::from_any_error)?;
        *lock(&self.dialog) = None;
        Ok(())
    }

    async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<ChromeElement>>,
    ) -> Result<Value> {
        self.run_script(script, &args, false)
    }

    async fn execute_async_script(
        &self,
        script: &str,
        args: Vec<ScriptArg<ChromeElement>>,
    ) -> Result<Value> {
        self.run_script(script, &args, true)
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let screenshot = self
            .tab()
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| PageError::ScreenshotFailed(e.to_string()))?;

        Ok(screenshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_elements_extend_the_parent_path() {
        let select = ChromeElement::nth(None, &Locator::id("room").to_query(), 0);
        let option = ChromeElement::nth(Some(&select), &Locator::tag_name("option").to_query(), 2);

        assert_eq!(
            option.path_json(),
            json!([
                { "kind": "css", "selector": "[id=\"room\"]", "index": 0 },
                { "kind": "css", "selector": "option", "index": 2 }
            ])
        );
    }

    #[test]
    fn script_arguments_are_inlined_in_order() {
        let link = ChromeElement::nth(None, &Locator::link_text("Book").to_query(), 1);
        let expression = ChromeDriver::script_expression(
            &[],
            "return arguments[1];",
            &[ScriptArg::Element(link), json!({"n": 1}).into()],
            false,
        );

        assert!(expression.contains("const __ppFrames = [];"));
        assert!(expression.contains(r#"const args = [__ppFind([{"#));
        assert!(expression.contains(r#""kind":"xpath""#));
        assert!(expression.contains(r#", {"n":1}];"#));
        assert!(expression.contains("(function() { return arguments[1]; }).apply(null, args)"));
    }

    #[test]
    fn scripts_see_the_focused_frame_document() {
        let frame = ChromeElement::nth(None, &Locator::css("iframe, frame").to_query(), 1);
        let expression =
            ChromeDriver::script_expression(&[frame], "return document.title;", &[], false);

        assert!(expression.contains("const __ppFrames = [[{"));
        assert!(expression.contains(r#""selector":"iframe, frame""#));
        assert!(expression.contains("const __ppDoc = __ppDocument();"));
        assert!(expression.contains("})(__ppDoc, __ppDoc.defaultView);"));
    }

    #[test]
    fn async_scripts_receive_a_completion_callback() {
        let expression = ChromeDriver::script_expression(&[], "arguments[0](7);", &[], true);
        assert!(expression.contains("new Promise"));
        assert!(expression.contains("args.push((result) => resolve("));
        assert!(expression.contains("const __ppDoc = __ppDocument();"));
    }

    #[test]
    fn option_clicks_go_through_the_select() {
        assert!(ELEMENT_CLICK.contains("el.tagName === 'OPTION'"));
        assert!(ELEMENT_CLICK.contains("select.multiple ? !el.selected : true"));
        assert!(ELEMENT_CLICK.contains("new Event('change', { bubbles: true })"));
    }

    #[test]
    fn only_modifier_keys_map_to_protocol_modifiers() {
        assert_eq!(
            modifier_keys(&[Key::Control, Key::Shift, Key::Enter]).len(),
            2
        );
    }

    #[test]
    fn script_outcomes_deserialize_from_tagged_json() {
        assert!(matches!(
            serde_json::from_str::<ScriptOutcome>(r#"{"ok": 3}"#).unwrap(),
            ScriptOutcome::Ok(v) if v == json!(3)
        ));
        assert!(matches!(
            serde_json::from_str::<ScriptOutcome>(r#"{"error": "TypeError"}"#).unwrap(),
            ScriptOutcome::Error(_)
        ));
        assert!(matches!(
            serde_json::from_str::<ScriptOutcome>(r#"{"stale": []}"#).unwrap(),
            ScriptOutcome::Stale(_)
        ));
        assert!(matches!(
            serde_json::from_str::<ScriptOutcome>(r#"{"noframe": []}"#).unwrap(),
            ScriptOutcome::NoFrame(_)
        ));
    }

    #[test]
    fn pointer_gestures_become_protocol_mouse_events() {
        let at = Pointer { x: 40.0, y: 12.5 }.offset(10, -2);
        let event: Input::DispatchMouseEvent =
            serde_json::from_value(mouse_event("mousePressed", at, "right", 1)).unwrap();
        let sent = serde_json::to_value(&event).unwrap();

        assert_eq!(sent["type"], "mousePressed");
        assert_eq!(sent["button"], "right");
        assert_eq!(sent["buttons"], 2);
        assert_eq!(sent["clickCount"], 1);
        assert_eq!(sent["x"], 50.0);
        assert_eq!(sent["y"], 10.5);

        let released = mouse_event("mouseReleased", at, "left", 2);
        assert_eq!(released["buttons"], 0);
    }

    #[test]
    fn cookie_params_keep_every_attribute() {
        let cookie = Cookie {
            secure: true,
            http_only: true,
            expiry: Some(1_900_000_000),
            same_site: Some("lax".into()),
            ..Cookie::new("session", "abc").with_path("/app")
        };

        let param: Network::CookieParam =
            serde_json::from_value(cookie_param(&cookie, "https://rooms.test/")).unwrap();
        let sent = serde_json::to_value(&param).unwrap();

        assert_eq!(sent["name"], "session");
        assert_eq!(sent["url"], "https://rooms.test/");
        assert_eq!(sent["path"], "/app");
        assert_eq!(sent["httpOnly"], true);
        assert_eq!(sent["secure"], true);
        assert_eq!(sent["sameSite"], "Lax");
        assert_eq!(sent["expires"], 1_900_000_000.0);
    }

    #[test]
    fn domain_cookies_are_not_pinned_to_the_page_url() {
        let cookie = Cookie::new("theme", "dark").with_domain(".rooms.test");
        let param = cookie_param(&cookie, "https://rooms.test/");

        assert_eq!(param["domain"], ".rooms.test");
        assert!(param.get("url").is_none());
    }

    #[test]
    fn protocol_cookies_read_back_all_attributes() {
        let session = cookie_from_protocol(&json!({
            "name": "session", "value": "abc", "domain": "rooms.test", "path": "/",
            "expires": -1.0, "httpOnly": true, "secure": false, "sameSite": "Strict"
        }));
        assert_eq!(
            session,
            Cookie {
                path: Some("/".into()),
                domain: Some("rooms.test".into()),
                http_only: true,
                same_site: Some("Strict".into()),
                ..Cookie::new("session", "abc")
            }
        );

        let lasting = cookie_from_protocol(&json!({
            "name": "theme", "value": "dark", "expires": 1_900_000_000.5
        }));
        assert_eq!(lasting.expiry, Some(1_900_000_000));
    }

    #[test]
    fn deletions_target_the_cookie_scope() {
        let cookie = Cookie::new("session", "abc")
            .with_domain("rooms.test")
            .with_path("/app");
        let deletion: Network::DeleteCookies =
            serde_json::from_value(cookie_deletion(&cookie)).unwrap();
        let sent = serde_json::to_value(&deletion).unwrap();

        assert_eq!(sent["name"], "session");
        assert_eq!(sent["domain"], "rooms.test");
        assert_eq!(sent["path"], "/app");
    }
}
