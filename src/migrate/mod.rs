mod execution_result;
mod executor;
pub mod metadata;
mod migration_plan;
pub mod provider;

pub use crate::migrate::execution_result::{
    MigrationOutcome, MigrationRun, MigrationStatus, OutcomeStatus,
};
pub use crate::migrate::executor::Executor;
use crate::migrate::metadata::{
    ExecutedMigration, ExecutedMigrationList, HistoryStore, TableHistoryStore,
};
use crate::migrate::migration_plan::MigrationPlan;
pub use crate::migrate::provider::{
    EmbeddedMigration, EmbeddedMigrationProvider, FileMigrationProvider, MigrationProvider,
    StaticMigrationProvider,
};
use crate::configuration::MigrationConfiguration;
use crate::platform::default::get_advisory_lock_key;
use crate::{Connection, Error, Result, Transaction};
use chrono::Utc;
use log::{error, info, warn};
use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    Up,
    Down,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Up => "up",
                Self::Down => "down",
            }
        )
    }
}

pub type OpClosure = dyn (Fn(&mut Executor<'_>) -> Result<()>) + Send + Sync;

/// What a migration step does when executed.
#[derive(Clone)]
pub enum MigrationAction {
    /// A SQL script, possibly made of several statements.
    Sql(Cow<'static, str>),
    /// A function queueing statements on the given [`Executor`].
    Closure(Arc<OpClosure>),
}

impl MigrationAction {
    pub fn sql<S: Into<Cow<'static, str>>>(sql: S) -> Self {
        Self::Sql(sql.into())
    }

    pub fn closure<F>(func: F) -> Self
    where
        F: Fn(&mut Executor<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self::Closure(Arc::new(func))
    }
}

impl Debug for MigrationAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sql(sql) => f.debug_tuple("Sql").field(sql).finish(),
            Self::Closure(_) => f.debug_tuple("Closure").finish_non_exhaustive(),
        }
    }
}

/// A named, ordered schema change with an optional reversal.
///
/// Names are unique within a provider and define the application order.
#[derive(Clone, Debug)]
pub struct Migration {
    name: Cow<'static, str>,
    up: MigrationAction,
    down: Option<MigrationAction>,
}

impl Migration {
    pub fn new<N: Into<Cow<'static, str>>>(name: N, up: MigrationAction) -> Self {
        Self {
            name: name.into(),
            up,
            down: None,
        }
    }

    pub fn sql<N, S>(name: N, up: S) -> Self
    where
        N: Into<Cow<'static, str>>,
        S: Into<Cow<'static, str>>,
    {
        Self::new(name, MigrationAction::sql(up))
    }

    pub fn from_fn<N, F>(name: N, up: F) -> Self
    where
        N: Into<Cow<'static, str>>,
        F: Fn(&mut Executor<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, MigrationAction::closure(up))
    }

    pub fn with_down(mut self, down: MigrationAction) -> Self {
        self.down = Some(down);
        self
    }

    pub fn with_down_sql<S: Into<Cow<'static, str>>>(self, down: S) -> Self {
        self.with_down(MigrationAction::sql(down))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn up(&self) -> &MigrationAction {
        &self.up
    }

    pub fn down(&self) -> Option<&MigrationAction> {
        self.down.as_ref()
    }

    pub fn has_down(&self) -> bool {
        self.down.is_some()
    }
}

#[derive(Clone, Copy)]
enum Target<'t> {
    Latest,
    Next,
    Steps(usize),
    Name(&'t str),
}

/// Brings a database schema in line with the migrations of a provider.
///
/// Every migration runs in its own transaction together with its history
/// record. A run stops at the first failing migration: the previous ones
/// stay committed and the failing one is rolled back.
pub struct Migrator<P: MigrationProvider> {
    provider: P,
    configuration: MigrationConfiguration,
    table_history_store: TableHistoryStore,
    history_store: Option<Box<dyn HistoryStore>>,
}

impl<P: MigrationProvider> Migrator<P> {
    pub fn new(provider: P) -> Self {
        let configuration = MigrationConfiguration::default();
        Self {
            provider,
            table_history_store: TableHistoryStore::new(configuration.clone()),
            configuration,
            history_store: None,
        }
    }

    pub fn with_configuration(mut self, configuration: MigrationConfiguration) -> Self {
        self.table_history_store = TableHistoryStore::new(configuration.clone());
        self.configuration = configuration;
        self
    }

    /// Replaces the table-backed history store.
    pub fn with_history_store<H: HistoryStore + 'static>(mut self, history_store: H) -> Self {
        self.history_store = Some(Box::new(history_store));
        self
    }

    pub fn get_provider(&self) -> &P {
        &self.provider
    }

    pub fn get_configuration(&self) -> &MigrationConfiguration {
        &self.configuration
    }

    fn history_store(&self) -> &dyn HistoryStore {
        match &self.history_store {
            Some(store) => store.as_ref(),
            None => &self.table_history_store,
        }
    }

    /// Applies every pending migration, in order.
    pub async fn migrate_to_latest(&self, connection: &Connection) -> Result<MigrationRun> {
        self.run(connection, Target::Latest).await
    }

    /// Applies the first pending migration only.
    pub async fn migrate_up(&self, connection: &Connection) -> Result<MigrationRun> {
        self.run(connection, Target::Next).await
    }

    /// Reverts the `steps` most recently applied migrations, newest first.
    pub async fn migrate_down(&self, connection: &Connection, steps: usize) -> Result<MigrationRun> {
        self.run(connection, Target::Steps(steps)).await
    }

    /// Applies or reverts migrations until `name` is the latest applied one.
    pub async fn migrate_to(&self, connection: &Connection, name: &str) -> Result<MigrationRun> {
        self.run(connection, Target::Name(name)).await
    }

    /// Lists every available migration with its application time, if applied.
    pub async fn status(&self, connection: &Connection) -> Result<Vec<MigrationStatus>> {
        let available = self.provider.list().await?;
        let executed = self.history_store().get_executed_migrations(connection).await?;

        Ok(available
            .iter()
            .map(|m| MigrationStatus {
                name: m.name().to_string(),
                applied_at: executed.get_migration(m.name()).map(|e| e.applied_at),
            })
            .collect())
    }

    async fn run(&self, connection: &Connection, target: Target<'_>) -> Result<MigrationRun> {
        self.history_store().ensure_initialized(connection).await?;

        let lock_key = self.acquire_lock(connection).await?;
        let result = self.run_locked(connection, target).await;
        self.release_lock(connection, lock_key).await;

        result
    }

    async fn run_locked(&self, connection: &Connection, target: Target<'_>) -> Result<MigrationRun> {
        let available = self.provider.list().await?;
        let executed = self.history_store().get_executed_migrations(connection).await?;

        if !self.configuration.is_ignore_missing() {
            migration_plan::check_missing(&available, &executed)?;
        }

        let plans = match target {
            Target::Latest | Target::Next => {
                let mut pending = migration_plan::pending(&available, &executed);
                if self.configuration.is_strict_order() {
                    migration_plan::check_order(&pending, &executed)?;
                }

                if matches!(target, Target::Next) {
                    pending.truncate(1);
                }

                pending
                    .into_iter()
                    .map(|m| MigrationPlan::new(m.clone(), Direction::Up))
                    .collect()
            }
            Target::Steps(steps) => migration_plan::plan_down(&available, &executed, steps)?,
            Target::Name(name) => {
                let plans = migration_plan::plan_to(&available, &executed, name)?;
                if self.configuration.is_strict_order() {
                    let pending: Vec<&Migration> = plans
                        .iter()
                        .filter(|p| p.direction == Direction::Up)
                        .map(|p| &p.migration)
                        .collect();
                    migration_plan::check_order(&pending, &executed)?;
                }

                plans
            }
        };

        Ok(self.execute_plans(connection, plans, &executed).await)
    }

    async fn execute_plans(
        &self,
        connection: &Connection,
        plans: Vec<MigrationPlan>,
        executed: &ExecutedMigrationList,
    ) -> MigrationRun {
        let mut run = MigrationRun::default();
        if plans.is_empty() {
            info!(target: "strata::migrate", "No migration to execute.");
            return run;
        }

        info!(
            target: "strata::migrate",
            "Migrating {} from {} ({} migrations)",
            plans[0].direction,
            executed.last().map_or("empty history", |m| m.name.as_str()),
            plans.len()
        );

        let global_start = Utc::now();
        let mut sql_count = 0;
        for plan in plans {
            let start = Utc::now();
            let result = self.execute_plan(connection, &plan).await;
            let execution_time = (Utc::now() - start).num_milliseconds().max(0) as u64;

            match result {
                Ok(count) => {
                    sql_count += count;
                    run.outcomes.push(MigrationOutcome::success(
                        plan.name(),
                        plan.direction,
                        execution_time,
                    ));
                }
                Err(e) => {
                    error!(target: "strata::migrate", "Error while executing migration {}: {}", plan.name(), e);
                    run.outcomes.push(MigrationOutcome::error(
                        plan.name(),
                        plan.direction,
                        &e,
                        execution_time,
                    ));
                    run.error = Some(Error::migration_failed(plan.name(), &e));
                    break;
                }
            }
        }

        let total_time = Utc::now() - global_start;
        info!(
            target: "strata::migrate",
            "Migrated database in {}ms, {} migrations executed, {} sql queries",
            total_time.num_milliseconds(),
            run.completed().len(),
            sql_count
        );

        run
    }

    async fn execute_plan(&self, connection: &Connection, plan: &MigrationPlan) -> Result<usize> {
        let transaction = connection.begin_transaction().await?;
        let start = Utc::now();

        match self.apply(&transaction, plan, start).await {
            Ok(count) => {
                transaction.commit().await?;
                Ok(count)
            }
            Err(e) => {
                if let Err(rollback_error) = transaction.roll_back().await {
                    warn!(target: "strata::migrate", "Rollback of migration {} failed: {}", plan.name(), rollback_error);
                }

                Err(e)
            }
        }
    }

    async fn apply(
        &self,
        transaction: &Transaction<'_>,
        plan: &MigrationPlan,
        start: chrono::DateTime<Utc>,
    ) -> Result<usize> {
        let count = executor::execute(transaction, plan).await?;

        match plan.direction {
            Direction::Up => {
                let applied_at = Utc::now();
                let record = ExecutedMigration {
                    name: plan.name().to_string(),
                    applied_at,
                    execution_time: Some((applied_at - start).num_milliseconds().max(0) as u64),
                };

                self.history_store()
                    .record_applied(transaction, &record)
                    .await?
            }
            Direction::Down => {
                self.history_store()
                    .remove_applied(transaction, plan.name())
                    .await?
            }
        }

        Ok(count)
    }

    async fn acquire_lock(&self, connection: &Connection) -> Result<Option<String>> {
        if !self.configuration.is_locking() {
            return Ok(None);
        }

        let platform = connection.get_platform()?;
        let key = get_advisory_lock_key(&self.configuration);
        let Some(lock_sql) = platform.get_advisory_lock_sql(key) else {
            return Ok(None);
        };

        info!(target: "strata::migrate", "Acquiring migration lock");
        connection.batch_execute(&lock_sql).await?;

        Ok(platform.get_advisory_unlock_sql(key))
    }

    async fn release_lock(&self, connection: &Connection, unlock_sql: Option<String>) {
        let Some(unlock_sql) = unlock_sql else {
            return;
        };

        if let Err(e) = connection.batch_execute(&unlock_sql).await {
            warn!(target: "strata::migrate", "Unable to release migration lock: {}", e);
        }
    }
}

impl<P: MigrationProvider + Debug> Debug for Migrator<P> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("provider", &self.provider)
            .field("configuration", &self.configuration)
            .field("custom_history_store", &self.history_store.is_some())
            .finish()
    }
}
