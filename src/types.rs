use crate::errors::{PageError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Element lookup strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum By {
    Id,
    Name,
    Css,
    XPath,
    ClassName,
    TagName,
    LinkText,
    PartialLinkText,
}

impl By {
    pub fn prefix(&self) -> &'static str {
        match self {
            By::Id => "id",
            By::Name => "name",
            By::Css => "css",
            By::XPath => "xpath",
            By::ClassName => "class",
            By::TagName => "tag",
            By::LinkText => "link",
            By::PartialLinkText => "partial-link",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "id" => Some(By::Id),
            "name" => Some(By::Name),
            "css" => Some(By::Css),
            "xpath" => Some(By::XPath),
            "class" => Some(By::ClassName),
            "tag" => Some(By::TagName),
            "link" => Some(By::LinkText),
            "partial-link" => Some(By::PartialLinkText),
            _ => None,
        }
    }
}

/// An immutable `(strategy, selector)` pair. May match any number of elements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Locator {
    pub by: By,
    pub selector: String,
}

impl Locator {
    pub fn new(by: By, selector: impl Into<String>) -> Self {
        Self {
            by,
            selector: selector.into(),
        }
    }

    pub fn id(selector: impl Into<String>) -> Self {
        Self::new(By::Id, selector)
    }

    pub fn name(selector: impl Into<String>) -> Self {
        Self::new(By::Name, selector)
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(By::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(By::XPath, selector)
    }

    pub fn class_name(selector: impl Into<String>) -> Self {
        Self::new(By::ClassName, selector)
    }

    pub fn tag_name(selector: impl Into<String>) -> Self {
        Self::new(By::TagName, selector)
    }

    pub fn link_text(selector: impl Into<String>) -> Self {
        Self::new(By::LinkText, selector)
    }

    pub fn partial_link_text(selector: impl Into<String>) -> Self {
        Self::new(By::PartialLinkText, selector)
    }

    /// Parses `strategy:selector`, e.g. `css:select#room` or `xpath://button`.
    pub fn parse(input: &str) -> Result<Self> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let pattern = PATTERN.get_or_init(|| {
            Regex::new(r"^(id|name|css|xpath|class|tag|link|partial-link):(.+)$")
                .expect("locator pattern is valid")
        });

        let captures = pattern
            .captures(input.trim())
            .ok_or_else(|| PageError::InvalidLocator(input.to_string()))?;
        let by = By::from_prefix(&captures[1])
            .ok_or_else(|| PageError::InvalidLocator(input.to_string()))?;
        Ok(Self::new(by, &captures[2]))
    }

    /// Translates the locator into the two query languages a browser understands.
    pub fn to_query(&self) -> Query {
        match self.by {
            By::Css => Query::Css(self.selector.clone()),
            By::XPath => Query::XPath(self.selector.clone()),
            By::Id => Query::Css(format!("[id={}]", css_string(&self.selector))),
            By::Name => Query::Css(format!("[name={}]", css_string(&self.selector))),
            By::ClassName => Query::Css(format!(".{}", css_escape_ident(&self.selector))),
            By::TagName => Query::Css(self.selector.clone()),
            By::LinkText => Query::XPath(format!(
                "//a[normalize-space(.)={}]",
                xpath_string(&self.selector)
            )),
            By::PartialLinkText => Query::XPath(format!(
                "//a[contains(., {})]",
                xpath_string(&self.selector)
            )),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.by.prefix(), self.selector)
    }
}

/// A locator lowered to a CSS selector or an XPath expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    Css(String),
    XPath(String),
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn css_escape_ident(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (i, ch) in value.chars().enumerate() {
        if i == 0 && ch.is_ascii_digit() {
            out.push_str(&format!("\\{:x} ", ch as u32));
        } else if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            out.push(ch);
        } else {
            out.push('\\');
            out.push(ch);
        }
    }
    out
}

/// XPath 1.0 has no escape syntax, so mixed quotes go through `concat()`.
pub(crate) fn xpath_string(value: &str) -> String {
    if !value.contains('"') {
        return format!("\"{}\"", value);
    }
    if !value.contains('\'') {
        return format!("'{}'", value);
    }
    let parts: Vec<String> = value
        .split('"')
        .map(|part| format!("\"{}\"", part))
        .collect();
    format!("concat({})", parts.join(", '\"', "))
}

/// How long a readiness wait may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timeout(Duration);

impl Timeout {
    pub const DEFAULT: Timeout = Timeout(Duration::from_secs(10));

    pub const fn from_secs(secs: u64) -> Self {
        Timeout(Duration::from_secs(secs))
    }

    pub const fn from_millis(millis: u64) -> Self {
        Timeout(Duration::from_millis(millis))
    }

    pub const fn duration(&self) -> Duration {
        self.0
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Duration> for Timeout {
    fn from(duration: Duration) -> Self {
        Timeout(duration)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    pub fn location(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    pub fn center(&self) -> Point {
        Point {
            x: self.x + self.width / 2.0,
            y: self.y + self.height / 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowPosition {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowHandle(pub String);

impl WindowHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Target of a frame switch.
#[derive(Debug, Clone)]
pub enum FrameRef<E> {
    Element(E),
    Index(u16),
    NameOrId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locators_lower_to_css_or_xpath() {
        assert_eq!(
            Locator::id("room").to_query(),
            Query::Css("[id=\"room\"]".into())
        );
        assert_eq!(
            Locator::name("q").to_query(),
            Query::Css("[name=\"q\"]".into())
        );
        assert_eq!(
            Locator::class_name("btn-primary").to_query(),
            Query::Css(".btn-primary".into())
        );
        assert_eq!(
            Locator::tag_name("option").to_query(),
            Query::Css("option".into())
        );
        assert_eq!(
            Locator::link_text("Book now").to_query(),
            Query::XPath("//a[normalize-space(.)=\"Book now\"]".into())
        );
        assert_eq!(
            Locator::partial_link_text("Book").to_query(),
            Query::XPath("//a[contains(., \"Book\")]".into())
        );
        assert_eq!(
            Locator::xpath("//button").to_query(),
            Query::XPath("//button".into())
        );
    }

    #[test]
    fn class_names_with_special_characters_are_escaped() {
        assert_eq!(
            Locator::class_name("w-1/2").to_query(),
            Query::Css(".w-1\\/2".into())
        );
        assert_eq!(
            Locator::class_name("1col").to_query(),
            Query::Css(".\\31 col".into())
        );
    }

    #[test]
    fn xpath_literals_handle_both_quote_kinds() {
        assert_eq!(xpath_string("plain"), "\"plain\"");
        assert_eq!(xpath_string("say \"hi\""), "'say \"hi\"'");
        assert_eq!(
            xpath_string("it's \"x\""),
            "concat(\"it's \", '\"', \"x\", '\"', \"\")"
        );
    }

    #[test]
    fn parse_accepts_every_prefix() {
        let cases = [
            ("id:room", By::Id, "room"),
            ("name:q", By::Name, "q"),
            ("css:#booking-form button", By::Css, "#booking-form button"),
            ("xpath://a[@href]", By::XPath, "//a[@href]"),
            ("class:card", By::ClassName, "card"),
            ("tag:select", By::TagName, "select"),
            ("link:Home", By::LinkText, "Home"),
            ("partial-link:Ho", By::PartialLinkText, "Ho"),
        ];
        for (input, by, selector) in cases {
            let locator = Locator::parse(input).unwrap();
            assert_eq!(locator, Locator::new(by, selector));
            let shown = locator.to_string().replacen('=', ":", 1);
            assert_eq!(Locator::parse(&shown).unwrap(), locator);
        }
    }

    #[test]
    fn parse_rejects_unknown_strategies() {
        assert!(matches!(
            Locator::parse("aria:button"),
            Err(PageError::InvalidLocator(_))
        ));
        assert!(Locator::parse("css:").is_err());
        assert!(Locator::parse("#room").is_err());
    }

    #[test]
    fn timeout_defaults_to_ten_seconds() {
        assert_eq!(Timeout::default().duration(), Duration::from_secs(10));
        assert_eq!(
            Timeout::from(Duration::from_millis(250)),
            Timeout::from_millis(250)
        );
    }

    #[test]
    fn cookie_serializes_with_camel_case_keys() {
        let mut cookie = Cookie::new("session", "abc").with_path("/");
        cookie.http_only = true;
        let json = serde_json::to_value(&cookie).unwrap();
        assert_eq!(json["name"], "session");
        assert_eq!(json["httpOnly"], true);
        assert!(json.get("domain").is_none());
    }
}
