//! Readiness checks.
//!
//! Each check resolves its locator afresh and answers `Some(value)` once the
//! condition holds, `None` while it does not. Lookup misses may also surface
//! as transient errors, which the waiter treats like `None`.

use crate::core::Driver;
use crate::errors::{PageError, Result};
use crate::types::Locator;
use std::fmt;

/// Name of a readiness condition, used in logs and timeout errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Presence(Locator),
    Visibility(Locator),
    Invisibility(Locator),
    Absence(Locator),
    Clickable(Locator),
    AllPresent(Locator),
    AlertPresent,
    UrlContains(String),
    UrlEquals(String),
    TextInElement(Locator, String),
    TextInElementValue(Locator, String),
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Presence(l) => write!(f, "presence of {}", l),
            Condition::Visibility(l) => write!(f, "visibility of {}", l),
            Condition::Invisibility(l) => write!(f, "invisibility of {}", l),
            Condition::Absence(l) => write!(f, "absence of {}", l),
            Condition::Clickable(l) => write!(f, "{} to be clickable", l),
            Condition::AllPresent(l) => write!(f, "presence of all {}", l),
            Condition::AlertPresent => write!(f, "an alert to be present"),
            Condition::UrlContains(s) => write!(f, "url to contain {:?}", s),
            Condition::UrlEquals(s) => write!(f, "url to be {:?}", s),
            Condition::TextInElement(l, t) => write!(f, "text {:?} in {}", t, l),
            Condition::TextInElementValue(l, t) => write!(f, "text {:?} in value of {}", t, l),
        }
    }
}

pub async fn presence<D: Driver>(driver: &D, locator: &Locator) -> Result<Option<D::Element>> {
    Ok(driver.find_elements(locator).await?.into_iter().next())
}

pub async fn visibility<D: Driver>(driver: &D, locator: &Locator) -> Result<Option<D::Element>> {
    match presence(driver, locator).await? {
        Some(element) if driver.is_displayed(&element).await? => Ok(Some(element)),
        _ => Ok(None),
    }
}

/// Holds when nothing matches or the first match is hidden.
pub async fn invisibility<D: Driver>(driver: &D, locator: &Locator) -> Result<Option<()>> {
    let element = match presence(driver, locator).await? {
        Some(element) => element,
        None => return Ok(Some(())),
    };
    match driver.is_displayed(&element).await {
        Ok(true) => Ok(None),
        Ok(false) => Ok(Some(())),
        Err(PageError::StaleElement(_)) | Err(PageError::NoSuchElement(_)) => Ok(Some(())),
        Err(e) => Err(e),
    }
}

pub async fn absence<D: Driver>(driver: &D, locator: &Locator) -> Result<Option<()>> {
    if driver.find_elements(locator).await?.is_empty() {
        Ok(Some(()))
    } else {
        Ok(None)
    }
}

pub async fn clickable<D: Driver>(driver: &D, locator: &Locator) -> Result<Option<D::Element>> {
    match visibility(driver, locator).await? {
        Some(element) if driver.is_enabled(&element).await? => Ok(Some(element)),
        _ => Ok(None),
    }
}

pub async fn all_present<D: Driver>(
    driver: &D,
    locator: &Locator,
) -> Result<Option<Vec<D::Element>>> {
    let elements = driver.find_elements(locator).await?;
    if elements.is_empty() {
        Ok(None)
    } else {
        Ok(Some(elements))
    }
}

pub async fn alert_present<D: Driver>(driver: &D) -> Result<Option<String>> {
    match driver.alert_text().await {
        Ok(text) => Ok(Some(text)),
        Err(PageError::NoSuchAlert) => Ok(None),
        Err(e) => Err(e),
    }
}

pub async fn url_contains<D: Driver>(driver: &D, fragment: &str) -> Result<Option<String>> {
    let url = driver.current_url().await?;
    Ok(url.contains(fragment).then_some(url))
}

pub async fn url_equals<D: Driver>(driver: &D, expected: &str) -> Result<Option<String>> {
    let url = driver.current_url().await?;
    Ok((url == expected).then_some(url))
}

pub async fn text_in_element<D: Driver>(
    driver: &D,
    locator: &Locator,
    text: &str,
) -> Result<Option<()>> {
    let element = driver.find_element(locator).await?;
    let element_text = driver.element_text(&element).await?;
    Ok(element_text.contains(text).then_some(()))
}

pub async fn text_in_element_value<D: Driver>(
    driver: &D,
    locator: &Locator,
    text: &str,
) -> Result<Option<()>> {
    let element = driver.find_element(locator).await?;
    let value = driver.element_attribute(&element, "value").await?;
    Ok(value
        .map(|value| value.contains(text))
        .unwrap_or(false)
        .then_some(()))
}
