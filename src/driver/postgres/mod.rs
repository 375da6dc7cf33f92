mod driver;
mod platform;
mod rows;

pub use driver::Driver;
pub use platform::PostgreSQLPlatform;
