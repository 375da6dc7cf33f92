use crate::Value;
use crate::platform::{DatabasePlatform, platform_debug};
use crate::value::DATETIME_TEXT_FORMAT;
use chrono::{DateTime, Utc};

pub struct SQLitePlatform;
platform_debug!(SQLitePlatform);

impl DatabasePlatform for SQLitePlatform {
    fn get_name(&self) -> &'static str {
        "sqlite"
    }

    fn get_parameter_placeholder(&self, position: usize) -> String {
        format!("?{}", position)
    }

    fn get_datetime_type_declaration_sql(&self) -> &'static str {
        "DATETIME"
    }

    fn convert_datetime_to_database_value(&self, value: DateTime<Utc>) -> Value {
        Value::String(value.format(DATETIME_TEXT_FORMAT).to_string())
    }

    /// Takes the write lock upfront, so that two writers never deadlock
    /// while upgrading their locks.
    fn get_begin_transaction_sql(&self) -> &'static str {
        "BEGIN IMMEDIATE"
    }

    fn get_table_exists_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = {}",
            self.quote_string_literal(table_name)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::SQLitePlatform;
    use crate::Value;
    use crate::platform::DatabasePlatform;
    use chrono::{TimeZone, Utc};

    #[test]
    fn formats_dialect_snippets() {
        let platform = SQLitePlatform;
        assert_eq!(platform.get_parameter_placeholder(2), "?2");
        assert_eq!(
            platform.get_table_exists_sql("migration_versions"),
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'migration_versions'"
        );
        assert!(platform.get_advisory_lock_sql(1).is_none());
    }

    #[test]
    fn stores_datetimes_as_sortable_text() {
        let platform = SQLitePlatform;
        let value = platform.convert_datetime_to_database_value(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 21, 0).unwrap(),
        );
        assert_eq!(value, Value::String("2024-01-15 00:21:00.000000".to_string()));
    }
}
