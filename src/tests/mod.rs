mod connection;

pub use connection::SLOW_MARKER;
pub use connection::SlowDriver;
pub use connection::YieldingDriver;
pub use connection::create_connection;
pub use connection::create_file_connection;
