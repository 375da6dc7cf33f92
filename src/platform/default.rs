use crate::configuration::MigrationConfiguration;
use crate::platform::DatabasePlatform;

pub fn quote_identifier<T: DatabasePlatform + ?Sized>(this: &T, identifier: &str) -> String {
    identifier
        .split('.')
        .map(|w| this.quote_single_identifier(w))
        .collect::<Vec<String>>()
        .join(".")
}

pub fn quote_single_identifier<T: DatabasePlatform + ?Sized>(this: &T, str: &str) -> String {
    let c = this.get_identifier_quote_character();
    format!("{}{}{}", c, str.replace(c, &c.to_string().repeat(2)), c)
}

pub fn quote_string_literal(str: &str) -> String {
    format!("'{}'", str.replace('\'', "''"))
}

pub fn get_create_history_table_sql<T: DatabasePlatform + ?Sized>(
    this: &T,
    configuration: &MigrationConfiguration,
) -> String {
    let name_column = this.quote_identifier(configuration.get_name_column_name());

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({} VARCHAR(255) NOT NULL, {} {} NOT NULL, {} BIGINT DEFAULT NULL, PRIMARY KEY ({}))",
        this.quote_identifier(configuration.get_table_name()),
        name_column,
        this.quote_identifier(configuration.get_applied_at_column_name()),
        this.get_datetime_type_declaration_sql(),
        this.quote_identifier(configuration.get_execution_time_column_name()),
        name_column,
    )
}

/// Derives a stable advisory lock key from the history table name.
pub fn get_advisory_lock_key(configuration: &MigrationConfiguration) -> i64 {
    const CRC: crc::Crc<u64> = crc::Crc::<u64>::new(&crc::CRC_64_ECMA_182);
    CRC.checksum(configuration.get_table_name().as_bytes()) as i64
}
