use std::fmt::Debug;

/// Engine settings for the migrator and its history table.
#[derive(Clone, Debug)]
pub struct MigrationConfiguration {
    table_name: String,
    name_column_name: String,
    applied_at_column_name: String,
    execution_time_column_name: String,
    locking: bool,
    ignore_missing: bool,
    strict_order: bool,
}

impl MigrationConfiguration {
    pub fn new() -> Self {
        Self {
            table_name: "migration_versions".to_string(),
            name_column_name: "name".to_string(),
            applied_at_column_name: "applied_at".to_string(),
            execution_time_column_name: "execution_time".to_string(),
            locking: true,
            ignore_missing: false,
            strict_order: false,
        }
    }

    pub fn with_table_name(mut self, table_name: &str) -> Self {
        self.table_name = table_name.to_string();
        self
    }

    pub fn with_name_column_name(mut self, name_column_name: &str) -> Self {
        self.name_column_name = name_column_name.to_string();
        self
    }

    pub fn with_applied_at_column_name(mut self, applied_at_column_name: &str) -> Self {
        self.applied_at_column_name = applied_at_column_name.to_string();
        self
    }

    pub fn with_execution_time_column_name(mut self, execution_time_column_name: &str) -> Self {
        self.execution_time_column_name = execution_time_column_name.to_string();
        self
    }

    /// Holds a platform advisory lock around every run.
    pub fn with_locking(mut self, locking: bool) -> Self {
        self.locking = locking;
        self
    }

    /// Tolerates history entries whose definition is no longer provided.
    pub fn with_ignore_missing(mut self, ignore_missing: bool) -> Self {
        self.ignore_missing = ignore_missing;
        self
    }

    /// Refuses to apply a pending migration that sorts before the latest applied one.
    pub fn with_strict_order(mut self, strict_order: bool) -> Self {
        self.strict_order = strict_order;
        self
    }

    pub fn get_table_name(&self) -> &str {
        &self.table_name
    }

    pub fn get_name_column_name(&self) -> &str {
        &self.name_column_name
    }

    pub fn get_applied_at_column_name(&self) -> &str {
        &self.applied_at_column_name
    }

    pub fn get_execution_time_column_name(&self) -> &str {
        &self.execution_time_column_name
    }

    pub fn is_locking(&self) -> bool {
        self.locking
    }

    pub fn is_ignore_missing(&self) -> bool {
        self.ignore_missing
    }

    pub fn is_strict_order(&self) -> bool {
        self.strict_order
    }
}

impl Default for MigrationConfiguration {
    fn default() -> Self {
        MigrationConfiguration::new()
    }
}
