use crate::driver::DriverConnection;
use crate::platform::DatabasePlatform;
use crate::{Connection, Parameters, Result, Row};
use log::{debug, warn};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// An open transaction on a [`Connection`].
///
/// The transaction must be ended with [`Transaction::commit`] or
/// [`Transaction::roll_back`]. If it is dropped while still open (for example
/// because the future driving it has been cancelled), the connection rolls it
/// back before executing anything else.
pub struct Transaction<'conn> {
    connection: &'conn Connection,
    driver: Arc<dyn DriverConnection>,
    platform: Arc<dyn DatabasePlatform>,
    finished: bool,
}

impl<'conn> Transaction<'conn> {
    pub(crate) fn new(
        connection: &'conn Connection,
        driver: Arc<dyn DriverConnection>,
        platform: Arc<dyn DatabasePlatform>,
    ) -> Self {
        Self {
            connection,
            driver,
            platform,
            finished: false,
        }
    }

    pub fn get_platform(&self) -> &dyn DatabasePlatform {
        self.platform.as_ref()
    }

    pub async fn execute_statement(&self, sql: &str, params: Parameters) -> Result<usize> {
        debug!(target: "strata::connection", "{}", sql);
        self.driver.execute(sql, params).await
    }

    pub async fn batch_execute(&self, sql: &str) -> Result<()> {
        debug!(target: "strata::connection", "{}", sql);
        self.driver.batch_execute(sql).await
    }

    pub async fn fetch_all(&self, sql: &str, params: Parameters) -> Result<Vec<Row>> {
        debug!(target: "strata::connection", "{}", sql);
        self.driver.query(sql, params).await
    }

    pub async fn commit(mut self) -> Result<()> {
        let result = self
            .driver
            .batch_execute(self.platform.get_commit_sql())
            .await;

        if result.is_err() {
            // a failed COMMIT may leave the transaction open on some backends
            if let Err(e) = self
                .driver
                .batch_execute(self.platform.get_rollback_sql())
                .await
            {
                debug!(target: "strata::connection", "Rollback after failed commit failed: {}", e);
            }
        }

        self.finish();
        result
    }

    pub async fn roll_back(mut self) -> Result<()> {
        let result = self
            .driver
            .batch_execute(self.platform.get_rollback_sql())
            .await;

        self.finish();
        result
    }

    /// Releases a guard whose BEGIN never succeeded.
    pub(crate) fn discard(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.finished = true;
        self.connection
            .transaction_active
            .store(false, Ordering::SeqCst);
    }
}

impl Debug for Transaction<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("platform", &self.platform.get_name())
            .field("finished", &self.finished)
            .finish()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        warn!(target: "strata::connection", "Transaction dropped while still open, scheduling rollback");
        self.connection
            .rollback_pending
            .store(true, Ordering::SeqCst);
        self.connection
            .transaction_active
            .store(false, Ordering::SeqCst);
    }
}
