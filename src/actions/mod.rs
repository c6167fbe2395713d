pub mod chain;
pub mod keys;
pub mod select;

pub use chain::{ActionChain, Gesture};
pub use keys::{parse_keys, Key, KeyStroke};
pub use select::Select;
