use crate::migrate::migration_plan::MigrationPlan;
use crate::migrate::{Direction, MigrationAction};
use crate::platform::DatabasePlatform;
use crate::{Error, Result, Transaction};
use log::info;
use std::fmt::Display;

/// Collects the statements of a code-defined migration step.
///
/// Statements added with [`Executor::add_sql`] are executed in order, inside
/// the transaction of the step, once the closure returns successfully.
pub struct Executor<'a> {
    platform: &'a dyn DatabasePlatform,
    migration_name: &'a str,
    direction: Direction,
    sql: Vec<String>,
}

impl<'a> Executor<'a> {
    fn new(platform: &'a dyn DatabasePlatform, plan: &'a MigrationPlan) -> Self {
        Self {
            platform,
            migration_name: plan.name(),
            direction: plan.direction,
            sql: vec![],
        }
    }

    pub fn get_platform(&self) -> &dyn DatabasePlatform {
        self.platform
    }

    pub fn get_migration_name(&self) -> &str {
        self.migration_name
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn add_sql(&mut self, sql: impl Display) {
        self.sql.push(sql.to_string());
    }
}

/// Runs the action of a plan in the given transaction, returning the
/// number of executed scripts.
pub(super) async fn execute(transaction: &Transaction<'_>, plan: &MigrationPlan) -> Result<usize> {
    let action = match plan.direction {
        Direction::Up => plan.migration.up(),
        Direction::Down => plan
            .migration
            .down()
            .ok_or_else(|| Error::irreversible_migration(plan.name()))?,
    };

    info!(target: "strata::migrate", "++ {} {}", if plan.direction == Direction::Up {
        "migrating"
    } else {
        "reverting"
    }, plan.name());

    let mut executor = Executor::new(transaction.get_platform(), plan);
    match action {
        MigrationAction::Sql(sql) => executor.add_sql(sql),
        MigrationAction::Closure(func) => func(&mut executor)?,
    }

    let mut sql_count = 0;
    for q in executor.sql.iter().filter(|q| !q.trim().is_empty()) {
        transaction.batch_execute(q).await?;
        sql_count += 1;
    }

    Ok(sql_count)
}
