use crate::types::Locator;

/// Locators of the room-booking home page.
pub struct HomePageLocators;

impl HomePageLocators {
    pub fn select_room() -> Locator {
        Locator::css("select#room")
    }

    pub fn start_time() -> Locator {
        Locator::css("input#start-time")
    }

    pub fn end_time() -> Locator {
        Locator::css("input#end-time")
    }

    pub fn book_room_button() -> Locator {
        Locator::css("#booking-form button")
    }
}
