pub mod actions;
pub mod browser;
pub mod core;
pub mod errors;
pub mod page;
pub mod pages;
pub mod testing;
pub mod types;
pub mod utils;
pub mod wait;

pub use crate::core::{Config, Driver};
pub use errors::{PageError, Result};
pub use page::BasePage;
pub use pages::HomePage;
pub use types::*;
