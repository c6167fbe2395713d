use super::conditions::{self, Condition};
use crate::core::Driver;
use crate::errors::{PageError, Result};
use crate::types::{Locator, Timeout};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default polling interval between checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls a readiness check until it yields a value or the timeout runs out.
pub struct Waiter<'a, D: Driver> {
    driver: &'a D,
    timeout: Timeout,
    poll_interval: Duration,
}

impl<'a, D: Driver> Waiter<'a, D> {
    pub fn new(driver: &'a D, timeout: Timeout) -> Self {
        Self {
            driver,
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Runs `check` until it returns `Ok(Some(_))`.
    ///
    /// Transient lookup errors count as "not yet"; any other error ends the
    /// wait immediately. The final check runs at the deadline, so a timeout is
    /// never reported before the full duration has elapsed.
    pub async fn until<T, F, Fut>(&self, condition: Condition, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let timeout = self.timeout.duration();
        let started = Instant::now();
        // Timeouts past the clock's range never expire.
        let deadline = started.checked_add(timeout);
        let mut last_error = None;
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            match check().await {
                Ok(Some(value)) => {
                    debug!(
                        condition = %condition,
                        attempts,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "condition met"
                    );
                    return Ok(value);
                }
                Ok(None) => {}
                Err(e) if e.is_transient() => last_error = Some(e.to_string()),
                Err(e) => return Err(e),
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    debug!(condition = %condition, attempts, ?timeout, "condition timed out");
                    return Err(PageError::Timeout {
                        condition: condition.to_string(),
                        timeout,
                        last_error,
                    });
                }
                Some(deadline) => self.poll_interval.min(deadline - now),
                None => self.poll_interval,
            };

            tokio::time::sleep(pause).await;
        }
    }

    pub async fn for_presence(&self, locator: &Locator) -> Result<D::Element> {
        self.until(Condition::Presence(locator.clone()), || {
            conditions::presence(self.driver, locator)
        })
        .await
    }

    pub async fn for_visibility(&self, locator: &Locator) -> Result<D::Element> {
        self.until(Condition::Visibility(locator.clone()), || {
            conditions::visibility(self.driver, locator)
        })
        .await
    }

    pub async fn for_invisibility(&self, locator: &Locator) -> Result<()> {
        self.until(Condition::Invisibility(locator.clone()), || {
            conditions::invisibility(self.driver, locator)
        })
        .await
    }

    pub async fn for_absence(&self, locator: &Locator) -> Result<()> {
        self.until(Condition::Absence(locator.clone()), || {
            conditions::absence(self.driver, locator)
        })
        .await
    }

    pub async fn for_clickable(&self, locator: &Locator) -> Result<D::Element> {
        self.until(Condition::Clickable(locator.clone()), || {
            conditions::clickable(self.driver, locator)
        })
        .await
    }

    pub async fn for_all_present(&self, locator: &Locator) -> Result<Vec<D::Element>> {
        self.until(Condition::AllPresent(locator.clone()), || {
            conditions::all_present(self.driver, locator)
        })
        .await
    }

    pub async fn for_alert(&self) -> Result<String> {
        self.until(Condition::AlertPresent, || {
            conditions::alert_present(self.driver)
        })
        .await
    }

    pub async fn for_url_contains(&self, fragment: &str) -> Result<String> {
        self.until(Condition::UrlContains(fragment.to_string()), || {
            conditions::url_contains(self.driver, fragment)
        })
        .await
    }

    pub async fn for_url_equals(&self, expected: &str) -> Result<String> {
        self.until(Condition::UrlEquals(expected.to_string()), || {
            conditions::url_equals(self.driver, expected)
        })
        .await
    }

    pub async fn for_text_in_element(&self, locator: &Locator, text: &str) -> Result<()> {
        self.until(
            Condition::TextInElement(locator.clone(), text.to_string()),
            || conditions::text_in_element(self.driver, locator, text),
        )
        .await
    }

    pub async fn for_text_in_element_value(&self, locator: &Locator, text: &str) -> Result<()> {
        self.until(
            Condition::TextInElementValue(locator.clone(), text.to_string()),
            || conditions::text_in_element_value(self.driver, locator, text),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDriver, FakeElement};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn waiter(driver: &FakeDriver, secs: u64) -> Waiter<'_, FakeDriver> {
        Waiter::new(driver, Timeout::from_secs(secs))
    }

    #[tokio::test(start_paused = true)]
    async fn presence_fails_only_after_the_full_timeout() {
        let driver = FakeDriver::new();
        let started = Instant::now();

        let err = waiter(&driver, 3)
            .for_presence(&Locator::id("missing"))
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert!(err.is_timeout());
        assert!(elapsed >= Duration::from_secs(3));
        assert!(elapsed < Duration::from_secs(3) + DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn presence_succeeds_once_the_element_appears() {
        let driver = FakeDriver::new();
        driver
            .add_element(
                FakeElement::new("div")
                    .with_id("late")
                    .with_text("fresh")
                    .appearing_after(Duration::from_secs(2)),
            )
            .await;
        let started = Instant::now();

        let element = waiter(&driver, 5)
            .for_presence(&Locator::id("late"))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_secs(2));
        assert_eq!(driver.element_text(&element).await.unwrap(), "fresh");
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_abort_the_wait() {
        let driver = FakeDriver::new();
        let started = Instant::now();
        let calls = AtomicU32::new(0);

        let err = waiter(&driver, 10)
            .until(Condition::AlertPresent, || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<Option<()>, _>(PageError::JavaScriptFailed("boom".into())) }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PageError::JavaScriptFailed(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_reported_in_the_timeout() {
        let driver = FakeDriver::new();

        let err = waiter(&driver, 1)
            .for_text_in_element(&Locator::id("status"), "done")
            .await
            .unwrap_err();

        match err {
            PageError::Timeout {
                condition,
                last_error,
                ..
            } => {
                assert!(condition.contains("id=status"));
                assert!(last_error.unwrap().contains("id=status"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn invisibility_accepts_hidden_and_absent_elements() {
        let driver = FakeDriver::new();
        driver
            .add_element(FakeElement::new("div").with_id("spinner").hidden())
            .await;

        assert!(waiter(&driver, 1)
            .for_invisibility(&Locator::id("spinner"))
            .await
            .is_ok());
        assert!(waiter(&driver, 1)
            .for_invisibility(&Locator::id("nothing"))
            .await
            .is_ok());
        assert!(waiter(&driver, 1)
            .for_absence(&Locator::id("spinner"))
            .await
            .unwrap_err()
            .is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn clickable_requires_visible_and_enabled() {
        let driver = FakeDriver::new();
        driver
            .add_element(FakeElement::new("button").with_id("off").disabled())
            .await;
        driver
            .add_element(FakeElement::new("button").with_id("on"))
            .await;

        assert!(waiter(&driver, 1)
            .for_clickable(&Locator::id("off"))
            .await
            .unwrap_err()
            .is_timeout());
        assert!(waiter(&driver, 1)
            .for_clickable(&Locator::id("on"))
            .await
            .is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn url_conditions_match_substring_and_exact() {
        let driver = FakeDriver::new();
        driver.get("https://example.test/booking?room=2").await.unwrap();

        assert!(waiter(&driver, 1).for_url_contains("booking").await.is_ok());
        assert!(waiter(&driver, 1)
            .for_url_equals("https://example.test/booking")
            .await
            .unwrap_err()
            .is_timeout());
        assert_eq!(
            waiter(&driver, 1)
                .for_url_equals("https://example.test/booking?room=2")
                .await
                .unwrap(),
            "https://example.test/booking?room=2"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn text_value_condition_reads_the_value_attribute() {
        let driver = FakeDriver::new();
        driver
            .add_element(
                FakeElement::new("input")
                    .with_id("start-time")
                    .with_attribute("value", "09:30"),
            )
            .await;

        assert!(waiter(&driver, 1)
            .for_text_in_element_value(&Locator::id("start-time"), "09:")
            .await
            .is_ok());
        assert!(waiter(&driver, 1)
            .for_text_in_element(&Locator::id("start-time"), "09:")
            .await
            .unwrap_err()
            .is_timeout());
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_timeout_still_finds_elements() {
        let driver = FakeDriver::new();
        driver
            .add_element(FakeElement::new("div").with_id("here"))
            .await;
        driver
            .add_element(
                FakeElement::new("div")
                    .with_id("later")
                    .appearing_after(Duration::from_secs(3)),
            )
            .await;
        let waiter = Waiter::new(&driver, Timeout::from_secs(u64::MAX));

        assert!(waiter.for_presence(&Locator::id("here")).await.is_ok());
        assert!(waiter.for_presence(&Locator::id("later")).await.is_ok());
    }

    #[test]
    fn poll_interval_has_a_floor() {
        let driver = FakeDriver::new();
        let waiter = Waiter::new(&driver, Timeout::DEFAULT).with_poll_interval(Duration::ZERO);
        assert_eq!(waiter.poll_interval, MIN_POLL_INTERVAL);
    }
}
