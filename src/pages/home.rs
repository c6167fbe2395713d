use super::locators::HomePageLocators;
use crate::core::Driver;
use crate::errors::Result;
use crate::page::BasePage;
use std::ops::Deref;
use std::sync::Arc;
use tracing::info;

/// The room-booking form: pick a room, set a time range, book.
pub struct HomePage<D: Driver> {
    page: BasePage<D>,
}

impl<D: Driver> HomePage<D> {
    pub fn new(driver: Arc<D>) -> Self {
        Self {
            page: BasePage::new(driver),
        }
    }

    pub fn from_page(page: BasePage<D>) -> Self {
        Self { page }
    }

    pub async fn select_room(&self, room: &str) -> Result<()> {
        self.select_dropdown_option_by_value(&HomePageLocators::select_room(), room)
            .await
    }

    /// Focuses the start-time field and types `time` into it.
    pub async fn set_start_time(&self, time: &str) -> Result<()> {
        let field = HomePageLocators::start_time();
        self.click_element(&field).await?;
        self.input_text(&field, time).await
    }

    pub async fn set_end_time(&self, time: &str) -> Result<()> {
        let field = HomePageLocators::end_time();
        self.click_element(&field).await?;
        self.input_text(&field, time).await
    }

    pub async fn click_room_book_button(&self) -> Result<()> {
        info!("booking room");
        self.click_element(&HomePageLocators::book_room_button())
            .await
    }

    /// Fills in the whole form and submits it.
    pub async fn book_room(&self, room: &str, start: &str, end: &str) -> Result<()> {
        self.select_room(room).await?;
        self.set_start_time(start).await?;
        self.set_end_time(end).await?;
        self.click_room_book_button().await
    }
}

impl<D: Driver> Deref for HomePage<D> {
    type Target = BasePage<D>;

    fn deref(&self) -> &Self::Target {
        &self.page
    }
}
