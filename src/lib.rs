//! Ordered, transactional schema migrations for SQL databases.
//!
//! A [`migrate::Migrator`] compares the migrations listed by a
//! [`migrate::MigrationProvider`] with the history recorded in the database
//! and applies the pending ones, each in its own transaction.

extern crate self as strata;

mod configuration;
mod connection;
mod connection_options;
pub mod driver;
pub mod error;
pub mod migrate;
mod parameter;
pub mod platform;
mod result;
mod rows;
mod transaction;
mod value;

#[cfg(all(test, feature = "sqlite"))]
mod tests;

pub use configuration::MigrationConfiguration;
pub use connection::Connection;
pub use connection_options::ConnectionOptions;
pub use connection_options::{
    DATABASE_DSN_VAR, POSTGRES_DB_VAR, POSTGRES_HOST_VAR, POSTGRES_PASSWORD_VAR,
    POSTGRES_PORT_VAR, POSTGRES_USER_VAR,
};
pub use error::Error;
pub use parameter::{NO_PARAMS, Parameters};
pub use result::{AsyncResult, Result};
pub use rows::{ColumnIndex, Row};
pub use strata_macros::embed_migrations;
pub use transaction::Transaction;
pub use value::Value;
