use crate::platform::{DatabasePlatform, platform_debug};

pub struct PostgreSQLPlatform;
platform_debug!(PostgreSQLPlatform);

impl DatabasePlatform for PostgreSQLPlatform {
    fn get_name(&self) -> &'static str {
        "postgresql"
    }

    fn get_parameter_placeholder(&self, position: usize) -> String {
        format!("${}", position)
    }

    fn get_datetime_type_declaration_sql(&self) -> &'static str {
        "TIMESTAMP(6) WITH TIME ZONE"
    }

    fn get_table_exists_sql(&self, table_name: &str) -> String {
        format!(
            "SELECT 1 AS found WHERE to_regclass({}) IS NOT NULL",
            self.quote_string_literal(&self.quote_identifier(table_name))
        )
    }

    fn get_advisory_lock_sql(&self, key: i64) -> Option<String> {
        Some(format!("SELECT pg_advisory_lock({})", key))
    }

    fn get_advisory_unlock_sql(&self, key: i64) -> Option<String> {
        Some(format!("SELECT pg_advisory_unlock({})", key))
    }
}
