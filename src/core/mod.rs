pub mod config;
pub mod driver;

pub use config::{BrowserConfig, BrowserType, Config, Viewport, WaitConfig};
pub use driver::{Driver, ScriptArg};
