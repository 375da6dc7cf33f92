use crate::driver::DriverConnection;
use crate::platform::DatabasePlatform;
use crate::{ConnectionOptions, Error, Parameters, Result, Row, Transaction};
use log::{debug, info, warn};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub struct Connection {
    connection_options: ConnectionOptions,
    driver: Option<Arc<dyn DriverConnection>>,
    platform: Option<Arc<dyn DatabasePlatform>>,
    pub(crate) transaction_active: AtomicBool,
    pub(crate) rollback_pending: AtomicBool,
}

impl Connection {
    pub fn create(connection_options: ConnectionOptions) -> Self {
        Self {
            connection_options,
            driver: None,
            platform: None,
            transaction_active: AtomicBool::new(false),
            rollback_pending: AtomicBool::new(false),
        }
    }

    pub fn create_from_dsn(dsn: &str) -> Result<Self> {
        Ok(Self::create(ConnectionOptions::try_from(dsn)?))
    }

    /// Wraps an already opened driver connection.
    pub fn with_driver(driver: Box<dyn DriverConnection>) -> Self {
        let platform: Arc<dyn DatabasePlatform> = Arc::from(driver.create_platform());
        let mut connection = Self::create(ConnectionOptions::default());
        connection.driver = Some(Arc::from(driver));
        connection.platform = Some(platform);

        connection
    }

    pub fn is_connected(&self) -> bool {
        self.driver.is_some()
    }

    pub async fn connect(mut self) -> Result<Self> {
        if self.driver.is_some() {
            return Ok(self);
        }

        let driver: Arc<dyn DriverConnection> =
            Arc::from(crate::driver::create(&self.connection_options).await?);
        let platform: Arc<dyn DatabasePlatform> = Arc::from(driver.create_platform());

        match driver.server_version().await {
            Ok(Some(version)) => {
                info!(target: "strata::connection", "Connected to {} {}", platform.get_name(), version)
            }
            Ok(None) => info!(target: "strata::connection", "Connected to {}", platform.get_name()),
            Err(e) => return Err(Error::connection(e.to_string())),
        }

        self.driver = Some(driver);
        self.platform = Some(platform);

        Ok(self)
    }

    pub fn get_platform(&self) -> Result<Arc<dyn DatabasePlatform>> {
        self.platform.clone().ok_or_else(Error::not_connected)
    }

    pub(crate) fn get_driver(&self) -> Result<&Arc<dyn DriverConnection>> {
        self.driver.as_ref().ok_or_else(Error::not_connected)
    }

    /// Whether a [`Transaction`] obtained from this connection is still open.
    pub fn is_transaction_active(&self) -> bool {
        self.transaction_active.load(Ordering::SeqCst)
    }

    /// Rolls back the work left behind by a transaction that was dropped
    /// before being committed or rolled back.
    async fn settle(&self) -> Result<()> {
        if self.is_transaction_active() || !self.rollback_pending.swap(false, Ordering::SeqCst) {
            return Ok(());
        }

        warn!(target: "strata::connection", "Rolling back abandoned transaction");
        let platform = self.get_platform()?;
        if let Err(e) = self
            .get_driver()?
            .batch_execute(platform.get_rollback_sql())
            .await
        {
            debug!(target: "strata::connection", "Rollback of abandoned transaction failed: {}", e);
        }

        Ok(())
    }

    /// Executes a statement, returning the number of affected rows.
    pub async fn execute_statement(&self, sql: &str, params: Parameters) -> Result<usize> {
        self.settle().await?;
        debug!(target: "strata::connection", "{}", sql);
        self.get_driver()?.execute(sql, params).await
    }

    /// Executes a script with no parameters, possibly containing multiple statements.
    pub async fn batch_execute(&self, sql: &str) -> Result<()> {
        self.settle().await?;
        debug!(target: "strata::connection", "{}", sql);
        self.get_driver()?.batch_execute(sql).await
    }

    /// Executes a query and collects all the resulting rows.
    pub async fn fetch_all(&self, sql: &str, params: Parameters) -> Result<Vec<Row>> {
        self.settle().await?;
        debug!(target: "strata::connection", "{}", sql);
        self.get_driver()?.query(sql, params).await
    }

    /// Opens a transaction.
    ///
    /// Only one transaction at a time can be open on a connection: a nested call
    /// fails with a `TransactionError`.
    pub async fn begin_transaction(&self) -> Result<Transaction<'_>> {
        self.settle().await?;

        let platform = self.get_platform()?;
        let driver = self.get_driver()?.clone();
        if self
            .transaction_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::nested_transaction());
        }

        // the guard exists before BEGIN is awaited, so that a cancellation
        // in flight still schedules a rollback and releases the connection
        let transaction = Transaction::new(self, driver.clone(), platform.clone());
        if let Err(e) = driver.batch_execute(platform.get_begin_transaction_sql()).await {
            transaction.discard();
            return Err(e);
        }

        Ok(transaction)
    }
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_options", &self.connection_options)
            .field("driver", &self.driver)
            .field("transaction_active", &self.is_transaction_active())
            .finish()
    }
}
