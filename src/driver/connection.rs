use crate::platform::DatabasePlatform;
use crate::{AsyncResult, Parameters, Row};
use std::fmt::Debug;

/// A live session with a database backend.
///
/// Drivers only execute statements: transaction boundaries are plain
/// statements issued by [`crate::Connection`], so implementations must run
/// every call on the same underlying session.
pub trait DriverConnection: Debug + Send + Sync {
    /// Creates the platform describing this backend's SQL dialect.
    fn create_platform(&self) -> Box<dyn DatabasePlatform>;

    /// Returns the server version string, if the backend reports one.
    fn server_version(&self) -> AsyncResult<'_, Option<String>>;

    /// Executes a single statement, returning the number of affected rows.
    fn execute<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, usize>;

    /// Executes a single statement and collects every returned row.
    fn query<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, Vec<Row>>;

    /// Executes a script possibly containing multiple statements, without parameters.
    fn batch_execute<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()>;
}
