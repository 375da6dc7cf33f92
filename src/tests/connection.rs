use crate::configuration::MigrationConfiguration;
use crate::driver::DriverConnection;
use crate::driver::sqlite::{Driver, SQLitePlatform};
use crate::platform::{DatabasePlatform, platform_debug};
use crate::{AsyncResult, Connection, ConnectionOptions, Parameters, Row, Value};
use chrono::{DateTime, Utc};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Statements containing this marker stall after being executed.
pub const SLOW_MARKER: &str = "/* slow */";

pub async fn create_connection() -> Connection {
    Connection::create_from_dsn("sqlite://:memory:")
        .unwrap()
        .connect()
        .await
        .expect("unable to connect")
}

pub async fn create_file_connection(path: &Path) -> Connection {
    Connection::create_from_dsn(&format!("sqlite://{}", path.to_str().unwrap()))
        .unwrap()
        .connect()
        .await
        .expect("unable to connect")
}

/// SQLite driver which sleeps after running any statement marked with
/// [`SLOW_MARKER`], leaving room for a timeout to cancel the caller.
pub struct SlowDriver {
    inner: Driver,
    delay: Duration,
    trigger: &'static str,
    remaining: AtomicUsize,
}

impl SlowDriver {
    pub fn new(delay: Duration) -> Self {
        let options = ConnectionOptions::try_from("sqlite://:memory:").unwrap();
        Self {
            inner: Driver::create(&options).unwrap(),
            delay,
            trigger: SLOW_MARKER,
            remaining: AtomicUsize::new(usize::MAX),
        }
    }

    /// Stalls on the first `times` statements containing `trigger` instead
    /// of every statement containing [`SLOW_MARKER`].
    pub fn stalling_on(mut self, trigger: &'static str, times: usize) -> Self {
        self.trigger = trigger;
        self.remaining = AtomicUsize::new(times);
        self
    }

    pub fn into_connection(self) -> Connection {
        Connection::with_driver(Box::new(self))
    }

    async fn stall(&self, sql: &str) {
        if !sql.contains(self.trigger) {
            return;
        }

        let armed = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Debug for SlowDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlowDriver")
            .field("inner", &self.inner)
            .field("delay", &self.delay)
            .field("trigger", &self.trigger)
            .finish()
    }
}

impl DriverConnection for SlowDriver {
    fn create_platform(&self) -> Box<dyn DatabasePlatform> {
        self.inner.create_platform()
    }

    fn server_version(&self) -> AsyncResult<'_, Option<String>> {
        self.inner.server_version()
    }

    fn execute<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, usize> {
        Box::pin(async move {
            let result = self.inner.execute(sql, params).await;
            self.stall(sql).await;
            result
        })
    }

    fn query<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, Vec<Row>> {
        self.inner.query(sql, params)
    }

    fn batch_execute<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let result = self.inner.batch_execute(sql).await;
            self.stall(sql).await;
            result
        })
    }
}

/// File-backed SQLite driver which hands control back to the runtime before
/// every call, so that joined futures on separate connections interleave.
///
/// Its platform creates the history table without `IF NOT EXISTS`, so that
/// losing a creation race surfaces as an error. Failed calls are counted.
pub struct YieldingDriver {
    inner: Driver,
    failures: Arc<AtomicUsize>,
}

impl YieldingDriver {
    pub fn new(path: &Path, failures: Arc<AtomicUsize>) -> Self {
        let dsn = format!("sqlite://{}", path.to_str().unwrap());
        let options = ConnectionOptions::try_from(dsn.as_str()).unwrap();
        Self {
            inner: Driver::create(&options).unwrap(),
            failures,
        }
    }

    pub fn into_connection(self) -> Connection {
        Connection::with_driver(Box::new(self))
    }

    fn count<T>(&self, result: crate::Result<T>) -> crate::Result<T> {
        if result.is_err() {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
        result
    }
}

impl Debug for YieldingDriver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldingDriver")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl DriverConnection for YieldingDriver {
    fn create_platform(&self) -> Box<dyn DatabasePlatform> {
        Box::new(StrictDdlPlatform(SQLitePlatform))
    }

    fn server_version(&self) -> AsyncResult<'_, Option<String>> {
        self.inner.server_version()
    }

    fn execute<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, usize> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.count(self.inner.execute(sql, params).await)
        })
    }

    fn query<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.count(self.inner.query(sql, params).await)
        })
    }

    fn batch_execute<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            tokio::task::yield_now().await;
            self.count(self.inner.batch_execute(sql).await)
        })
    }
}

struct StrictDdlPlatform(SQLitePlatform);
platform_debug!(StrictDdlPlatform);

impl DatabasePlatform for StrictDdlPlatform {
    fn get_name(&self) -> &'static str {
        self.0.get_name()
    }

    fn get_parameter_placeholder(&self, position: usize) -> String {
        self.0.get_parameter_placeholder(position)
    }

    fn get_datetime_type_declaration_sql(&self) -> &'static str {
        self.0.get_datetime_type_declaration_sql()
    }

    fn convert_datetime_to_database_value(&self, value: DateTime<Utc>) -> Value {
        self.0.convert_datetime_to_database_value(value)
    }

    fn get_begin_transaction_sql(&self) -> &'static str {
        self.0.get_begin_transaction_sql()
    }

    fn get_create_history_table_sql(&self, configuration: &MigrationConfiguration) -> String {
        self.0
            .get_create_history_table_sql(configuration)
            .replacen(" IF NOT EXISTS", "", 1)
    }

    fn get_table_exists_sql(&self, table_name: &str) -> String {
        self.0.get_table_exists_sql(table_name)
    }
}
