pub mod home;
pub mod locators;

pub use home::HomePage;
pub use locators::HomePageLocators;
