//! Browser session management.

pub mod chromedriver;
pub mod driver;
pub mod locator;

pub use chromedriver::ChromeDriverProcess;
pub use driver::SessionDriver;
