use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// A row of the migration history.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutedMigration {
    pub name: String,
    pub applied_at: DateTime<Utc>,
    pub execution_time: Option<u64>,
}

/// Applied migrations, in application order (oldest first).
#[derive(Clone, Debug, Default)]
pub struct ExecutedMigrationList {
    pub(super) items: Vec<ExecutedMigration>,
}

impl ExecutedMigrationList {
    pub fn new(mut items: Vec<ExecutedMigration>) -> Self {
        items.sort_by(|a, b| {
            a.applied_at
                .cmp(&b.applied_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Self { items }
    }

    pub fn first(&self) -> Option<&ExecutedMigration> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&ExecutedMigration> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &ExecutedMigration> {
        self.items.iter()
    }

    pub fn has_migration(&self, name: &str) -> bool {
        self.items.iter().any(|m| m.name == name)
    }

    pub fn get_migration(&self, name: &str) -> Option<&ExecutedMigration> {
        self.items.iter().find(|m| m.name == name)
    }

    pub fn applied_names(&self) -> HashSet<&str> {
        self.items.iter().map(|m| m.name.as_str()).collect()
    }

    /// The applied migration with the greatest name.
    pub fn max_name(&self) -> Option<&str> {
        self.items.iter().map(|m| m.name.as_str()).max()
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutedMigration, ExecutedMigrationList};
    use chrono::{TimeZone, Utc};

    fn executed(name: &str, second: u32) -> ExecutedMigration {
        ExecutedMigration {
            name: name.to_string(),
            applied_at: Utc.with_ymd_and_hms(2024, 1, 10, 20, 48, second).unwrap(),
            execution_time: Some(1),
        }
    }

    #[test]
    fn orders_by_application_time_then_name() {
        let list = ExecutedMigrationList::new(vec![
            executed("003_c", 5),
            executed("002_b", 1),
            executed("001_a", 1),
        ]);

        let names: Vec<&str> = list.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["001_a", "002_b", "003_c"]);
        assert_eq!(list.last().unwrap().name, "003_c");
        assert_eq!(list.max_name(), Some("003_c"));
        assert!(list.has_migration("002_b"));
        assert!(!list.has_migration("004_d"));
        assert_eq!(list.applied_names().len(), 3);
    }
}
