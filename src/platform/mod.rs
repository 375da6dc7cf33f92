pub mod default;

use crate::Value;
use crate::configuration::MigrationConfiguration;
use chrono::{DateTime, Utc};
use std::fmt::Debug;

macro_rules! platform_debug {
    ($platform:ident) => {
        impl std::fmt::Debug for $platform {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(core::any::type_name::<Self>())
                    .finish_non_exhaustive()
            }
        }
    };
}

pub(crate) use platform_debug;

/// Dialect-specific SQL generation used by the connection and the migration engine.
pub trait DatabasePlatform: Debug + Send + Sync {
    /// Gets the name of the platform.
    fn get_name(&self) -> &'static str;

    /// Gets the character used for identifier quoting.
    fn get_identifier_quote_character(&self) -> char {
        '"'
    }

    /// Quotes a single identifier (no dot chain separation).
    fn quote_single_identifier(&self, str: &str) -> String {
        default::quote_single_identifier(self, str)
    }

    /// Quotes a string so that it can be safely used as a table or column name,
    /// even if it is a reserved word of the platform. Dot-separated parts are
    /// quoted one by one.
    fn quote_identifier(&self, identifier: &str) -> String {
        default::quote_identifier(self, identifier)
    }

    /// Quotes a literal string.
    /// This is useful if you need to write a query or a statement that does not
    /// take parameters.
    fn quote_string_literal(&self, str: &str) -> String {
        default::quote_string_literal(str)
    }

    /// Returns the placeholder for the positional parameter at `position` (1-based).
    fn get_parameter_placeholder(&self, position: usize) -> String;

    /// Returns the SQL snippet that declares a timestamp column.
    fn get_datetime_type_declaration_sql(&self) -> &'static str;

    /// Converts a timestamp into the value bound for a datetime column.
    fn convert_datetime_to_database_value(&self, value: DateTime<Utc>) -> Value {
        Value::DateTime(value)
    }

    fn get_begin_transaction_sql(&self) -> &'static str {
        "BEGIN"
    }

    fn get_commit_sql(&self) -> &'static str {
        "COMMIT"
    }

    fn get_rollback_sql(&self) -> &'static str {
        "ROLLBACK"
    }

    /// Returns the idempotent DDL creating the migration history table.
    fn get_create_history_table_sql(&self, configuration: &MigrationConfiguration) -> String {
        default::get_create_history_table_sql(self, configuration)
    }

    /// Returns a query yielding one row when the given table exists.
    fn get_table_exists_sql(&self, table_name: &str) -> String;

    /// Returns the statement acquiring a session-wide advisory lock, if the
    /// platform supports one.
    fn get_advisory_lock_sql(&self, _key: i64) -> Option<String> {
        None
    }

    fn get_advisory_unlock_sql(&self, _key: i64) -> Option<String> {
        None
    }
}
