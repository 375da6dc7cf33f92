use crate::migrate::metadata::ExecutedMigrationList;
use crate::migrate::{Direction, Migration};
use crate::{Error, Result};

/// A migration scheduled to run in a given direction.
#[derive(Clone, Debug)]
pub(super) struct MigrationPlan {
    pub migration: Migration,
    pub direction: Direction,
}

impl MigrationPlan {
    pub fn new(migration: Migration, direction: Direction) -> Self {
        Self {
            migration,
            direction,
        }
    }

    pub fn name(&self) -> &str {
        self.migration.name()
    }
}

/// Available migrations not yet applied, in provider order.
pub(super) fn pending<'m>(
    available: &'m [Migration],
    executed: &ExecutedMigrationList,
) -> Vec<&'m Migration> {
    let applied = executed.applied_names();
    available
        .iter()
        .filter(|m| !applied.contains(m.name()))
        .collect()
}

/// Fails on the first applied migration whose definition is not available.
pub(super) fn check_missing(available: &[Migration], executed: &ExecutedMigrationList) -> Result<()> {
    match executed
        .iter()
        .find(|e| !available.iter().any(|m| m.name() == e.name))
    {
        Some(missing) => Err(Error::missing_migration(&missing.name)),
        None => Ok(()),
    }
}

/// Fails when a pending migration sorts before the latest applied one.
pub(super) fn check_order(pending: &[&Migration], executed: &ExecutedMigrationList) -> Result<()> {
    let Some(last_applied) = executed.max_name() else {
        return Ok(());
    };

    match pending.iter().find(|m| m.name() < last_applied) {
        Some(m) => Err(Error::unordered_migration(m.name(), last_applied)),
        None => Ok(()),
    }
}

/// Plans the reversal of the `steps` most recently applied migrations,
/// newest first. `steps` is clamped to the history size.
pub(super) fn plan_down(
    available: &[Migration],
    executed: &ExecutedMigrationList,
    steps: usize,
) -> Result<Vec<MigrationPlan>> {
    executed
        .iter()
        .rev()
        .take(steps)
        .map(|e| {
            find(available, &e.name)
                .map(|m| MigrationPlan::new(m.clone(), Direction::Down))
                .ok_or_else(|| Error::missing_migration(&e.name))
        })
        .collect()
}

/// Plans the steps bringing the database to `target`.
///
/// When `target` is not applied, pending migrations up to and including it
/// are applied. Otherwise every applied migration sorting after it is
/// reverted, newest first.
pub(super) fn plan_to(
    available: &[Migration],
    executed: &ExecutedMigrationList,
    target: &str,
) -> Result<Vec<MigrationPlan>> {
    if find(available, target).is_none() {
        return Err(Error::unknown_migration(target));
    }

    if executed.has_migration(target) {
        executed
            .iter()
            .rev()
            .filter(|e| e.name.as_str() > target)
            .map(|e| {
                find(available, &e.name)
                    .map(|m| MigrationPlan::new(m.clone(), Direction::Down))
                    .ok_or_else(|| Error::missing_migration(&e.name))
            })
            .collect()
    } else {
        Ok(pending(available, executed)
            .into_iter()
            .filter(|m| m.name() <= target)
            .map(|m| MigrationPlan::new(m.clone(), Direction::Up))
            .collect())
    }
}

fn find<'m>(available: &'m [Migration], name: &str) -> Option<&'m Migration> {
    available.iter().find(|m| m.name() == name)
}
