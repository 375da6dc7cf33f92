mod executed_migration;

use crate::configuration::MigrationConfiguration;
use crate::error::ErrorKind;
use crate::parameter::NO_PARAMS;
use crate::platform::DatabasePlatform;
use crate::{AsyncResult, Connection, Error, Result, Row, Transaction, Value};
use log::debug;
pub use executed_migration::{ExecutedMigration, ExecutedMigrationList};

/// Persistent record of which migrations have been applied.
///
/// Writes happen inside the transaction of the migration they describe, so
/// that a migration and its history record are committed or rolled back
/// together.
pub trait HistoryStore: Send + Sync {
    /// Creates the backing storage if it does not exist.
    /// Concurrent calls from several processes must all succeed.
    fn ensure_initialized<'a>(&'a self, connection: &'a Connection) -> AsyncResult<'a, ()>;

    /// Lists the applied migrations. An uninitialized store yields an empty list.
    fn get_executed_migrations<'a>(
        &'a self,
        connection: &'a Connection,
    ) -> AsyncResult<'a, ExecutedMigrationList>;

    fn record_applied<'a>(
        &'a self,
        transaction: &'a Transaction<'_>,
        migration: &'a ExecutedMigration,
    ) -> AsyncResult<'a, ()>;

    fn remove_applied<'a>(
        &'a self,
        transaction: &'a Transaction<'_>,
        name: &'a str,
    ) -> AsyncResult<'a, ()>;
}

/// History store backed by a table of the migrated database.
#[derive(Clone, Debug, Default)]
pub struct TableHistoryStore {
    configuration: MigrationConfiguration,
}

impl TableHistoryStore {
    pub fn new(configuration: MigrationConfiguration) -> Self {
        Self { configuration }
    }

    pub fn get_configuration(&self) -> &MigrationConfiguration {
        &self.configuration
    }

    async fn is_initialized(&self, connection: &Connection) -> Result<bool> {
        let platform = connection.get_platform()?;
        let rows = connection
            .fetch_all(
                &platform.get_table_exists_sql(self.configuration.get_table_name()),
                NO_PARAMS,
            )
            .await?;

        Ok(!rows.is_empty())
    }

    fn convert_row(&self, row: &Row) -> Result<ExecutedMigration> {
        let name = row
            .get(self.configuration.get_name_column_name())?
            .as_str()?
            .to_string();
        let applied_at = row
            .get(self.configuration.get_applied_at_column_name())?
            .to_datetime()?;
        let execution_time = row
            .get(self.configuration.get_execution_time_column_name())?
            .to_i64()?
            .map(|t| t.max(0) as u64);

        Ok(ExecutedMigration {
            name,
            applied_at,
            execution_time,
        })
    }

    fn get_select_sql(&self, platform: &dyn DatabasePlatform) -> String {
        let c = &self.configuration;
        let name_column = platform.quote_identifier(c.get_name_column_name());
        let applied_at_column = platform.quote_identifier(c.get_applied_at_column_name());

        format!(
            "SELECT {}, {}, {} FROM {} ORDER BY {} ASC, {} ASC",
            name_column,
            applied_at_column,
            platform.quote_identifier(c.get_execution_time_column_name()),
            platform.quote_identifier(c.get_table_name()),
            applied_at_column,
            name_column,
        )
    }

    fn get_insert_sql(&self, platform: &dyn DatabasePlatform) -> String {
        let c = &self.configuration;
        format!(
            "INSERT INTO {} ({}, {}, {}) VALUES ({}, {}, {})",
            platform.quote_identifier(c.get_table_name()),
            platform.quote_identifier(c.get_name_column_name()),
            platform.quote_identifier(c.get_applied_at_column_name()),
            platform.quote_identifier(c.get_execution_time_column_name()),
            platform.get_parameter_placeholder(1),
            platform.get_parameter_placeholder(2),
            platform.get_parameter_placeholder(3),
        )
    }

    fn get_delete_sql(&self, platform: &dyn DatabasePlatform) -> String {
        let c = &self.configuration;
        format!(
            "DELETE FROM {} WHERE {} = {}",
            platform.quote_identifier(c.get_table_name()),
            platform.quote_identifier(c.get_name_column_name()),
            platform.get_parameter_placeholder(1),
        )
    }
}

impl HistoryStore for TableHistoryStore {
    fn ensure_initialized<'a>(&'a self, connection: &'a Connection) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            if self.is_initialized(connection).await? {
                return Ok(());
            }

            let platform = connection.get_platform()?;
            let sql = platform.get_create_history_table_sql(&self.configuration);
            match connection.batch_execute(&sql).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    // another process may have won the race between the check and the DDL
                    if self.is_initialized(connection).await? {
                        debug!(target: "strata::migrate", "History table created concurrently: {}", e);
                        Ok(())
                    } else {
                        Err(e)
                    }
                }
            }
        })
    }

    fn get_executed_migrations<'a>(
        &'a self,
        connection: &'a Connection,
    ) -> AsyncResult<'a, ExecutedMigrationList> {
        Box::pin(async move {
            if !self.is_initialized(connection).await? {
                return Ok(ExecutedMigrationList::default());
            }

            let platform = connection.get_platform()?;
            let rows = connection
                .fetch_all(&self.get_select_sql(platform.as_ref()), NO_PARAMS)
                .await?;

            let items = rows
                .iter()
                .map(|row| self.convert_row(row))
                .collect::<Result<Vec<_>>>()?;

            Ok(ExecutedMigrationList::new(items))
        })
    }

    fn record_applied<'a>(
        &'a self,
        transaction: &'a Transaction<'_>,
        migration: &'a ExecutedMigration,
    ) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let platform = transaction.get_platform();
            let params = vec![
                Value::from(migration.name.as_str()),
                platform.convert_datetime_to_database_value(migration.applied_at),
                Value::from(migration.execution_time.map(|t| t as i64)),
            ];

            transaction
                .execute_statement(&self.get_insert_sql(platform), params)
                .await?;

            Ok(())
        })
    }

    fn remove_applied<'a>(
        &'a self,
        transaction: &'a Transaction<'_>,
        name: &'a str,
    ) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            let platform = transaction.get_platform();
            let affected = transaction
                .execute_statement(&self.get_delete_sql(platform), vec![Value::from(name)])
                .await?;

            if affected == 0 {
                return Err(Error::new(
                    ErrorKind::InconsistentHistory,
                    format!("Migration \"{}\" is not recorded as applied", name),
                ));
            }

            Ok(())
        })
    }
}
