use crate::core::Driver;
use crate::errors::{PageError, Result};
use crate::types::Locator;

/// A `<select>` element driven through its `<option>` children.
pub struct Select<'a, D: Driver> {
    driver: &'a D,
    element: D::Element,
    multiple: bool,
}

impl<'a, D: Driver> Select<'a, D> {
    pub async fn new(driver: &'a D, element: D::Element) -> Result<Self> {
        let tag = driver.element_tag_name(&element).await?;
        if !tag.eq_ignore_ascii_case("select") {
            return Err(PageError::UnexpectedTagName {
                expected: "select".to_string(),
                actual: tag.to_ascii_lowercase(),
            });
        }

        let multiple = driver
            .element_attribute(&element, "multiple")
            .await?
            .map(|value| value != "false")
            .unwrap_or(false);

        Ok(Self {
            driver,
            element,
            multiple,
        })
    }

    pub async fn options(&self) -> Result<Vec<D::Element>> {
        self.driver
            .find_child_elements(&self.element, &Locator::tag_name("option"))
            .await
    }

    pub async fn option_texts(&self) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for option in self.options().await? {
            texts.push(self.driver.element_text(&option).await?);
        }
        Ok(texts)
    }

    pub async fn first_selected_option(&self) -> Result<D::Element> {
        for option in self.options().await? {
            if self.driver.is_selected(&option).await? {
                return Ok(option);
            }
        }
        Err(PageError::NoSuchOption("no options are selected".to_string()))
    }

    /// Matches options whose text equals `text` after whitespace normalization.
    pub async fn select_by_visible_text(&self, text: &str) -> Result<()> {
        let wanted = normalize_space(text);
        let mut matched = false;

        for option in self.options().await? {
            let option_text = self.driver.element_text(&option).await?;
            if normalize_space(&option_text) == wanted {
                self.set_selected(&option).await?;
                if !self.multiple {
                    return Ok(());
                }
                matched = true;
            }
        }

        if matched {
            Ok(())
        } else {
            Err(PageError::NoSuchOption(format!(
                "could not locate option with visible text: {}",
                text
            )))
        }
    }

    pub async fn select_by_value(&self, value: &str) -> Result<()> {
        let mut matched = false;

        for option in self.options().await? {
            let option_value = self.driver.element_attribute(&option, "value").await?;
            if option_value.as_deref() == Some(value) {
                self.set_selected(&option).await?;
                if !self.multiple {
                    return Ok(());
                }
                matched = true;
            }
        }

        if matched {
            Ok(())
        } else {
            Err(PageError::NoSuchOption(format!(
                "could not locate option with value: {}",
                value
            )))
        }
    }

    async fn set_selected(&self, option: &D::Element) -> Result<()> {
        if !self.driver.is_selected(option).await? {
            self.driver.click(option).await?;
        }
        Ok(())
    }
}

fn normalize_space(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
