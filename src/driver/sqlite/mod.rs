mod driver;
mod platform;

pub use driver::Driver;
pub use platform::SQLitePlatform;
