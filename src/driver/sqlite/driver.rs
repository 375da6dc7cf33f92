use crate::driver::DriverConnection;
use crate::driver::sqlite::SQLitePlatform;
use crate::platform::DatabasePlatform;
use crate::value::DATETIME_TEXT_FORMAT;
use crate::{AsyncResult, ConnectionOptions, Error, Parameters, Result, Row, Value};
use rusqlite::ToSql;
use rusqlite::types::{ToSqlOutput, ValueRef};
use std::fmt::{Debug, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Driver {
    connection: Mutex<rusqlite::Connection>,
    path: Option<String>,
}

impl Driver {
    pub fn create(options: &ConnectionOptions) -> Result<Self> {
        let (connection, path) = if options.is_in_memory() {
            (rusqlite::Connection::open_in_memory(), None)
        } else {
            let path = options
                .file_path
                .clone()
                .ok_or_else(|| Error::config("SQLite connection requires a file path"))?;
            (rusqlite::Connection::open(&path), Some(path))
        };

        let connection = connection.map_err(Error::connection)?;
        connection
            .busy_timeout(BUSY_TIMEOUT)
            .map_err(Error::connection)?;

        Ok(Driver {
            connection: Mutex::new(connection),
            path,
        })
    }

    fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.connection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn internal_execute(&self, sql: &str, params: Parameters) -> Result<usize> {
        let connection = self.lock();
        let mut statement = connection.prepare(sql)?;

        match statement.execute(rusqlite::params_from_iter(params.iter())) {
            Ok(size) => Ok(size),
            Err(rusqlite::Error::ExecuteReturnedResults) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn internal_query(&self, sql: &str, params: Parameters) -> Result<Vec<Row>> {
        let connection = self.lock();
        let mut statement = connection.prepare(sql)?;
        let columns: Vec<String> = statement
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();

        let mut rows = statement.query(rusqlite::params_from_iter(params.iter()))?;
        let mut result = vec![];
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                values.push(match row.get_ref(i)? {
                    ValueRef::Null => Value::NULL,
                    ValueRef::Integer(v) => Value::Int(v),
                    ValueRef::Real(v) => Value::Float(v),
                    ValueRef::Text(v) => Value::String(String::from_utf8_lossy(v).into_owned()),
                    ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
                });
            }

            result.push(Row::new(columns.clone(), values));
        }

        Ok(result)
    }
}

impl Debug for Driver {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SQLite Driver")
            .field("path", &self.path.as_deref().unwrap_or(":memory:"))
            .finish()
    }
}

impl DriverConnection for Driver {
    fn create_platform(&self) -> Box<dyn DatabasePlatform> {
        Box::new(SQLitePlatform)
    }

    fn server_version(&self) -> AsyncResult<'_, Option<String>> {
        Box::pin(async move { Ok(Some(rusqlite::version().to_string())) })
    }

    fn execute<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, usize> {
        Box::pin(async move { self.internal_execute(sql, params) })
    }

    fn query<'a>(&'a self, sql: &'a str, params: Parameters) -> AsyncResult<'a, Vec<Row>> {
        Box::pin(async move { self.internal_query(sql, params) })
    }

    fn batch_execute<'a>(&'a self, sql: &'a str) -> AsyncResult<'a, ()> {
        Box::pin(async move {
            self.lock().execute_batch(sql)?;
            Ok(())
        })
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::NULL => ToSqlOutput::from(rusqlite::types::Null),
            Value::Int(value) => ToSqlOutput::from(*value),
            Value::Float(value) => ToSqlOutput::from(*value),
            Value::String(value) => ToSqlOutput::from(value.as_str()),
            Value::Bytes(value) => ToSqlOutput::from(value.as_slice()),
            Value::DateTime(value) => ToSqlOutput::Owned(rusqlite::types::Value::Text(
                value.format(DATETIME_TEXT_FORMAT).to_string(),
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Driver;
    use crate::driver::DriverConnection;
    use crate::error::ErrorKind;
    use crate::{ConnectionOptions, Value, params};

    fn memory_driver() -> Driver {
        Driver::create(&ConnectionOptions::try_from("sqlite://:memory:").unwrap())
            .expect("Must be connected")
    }

    #[test]
    fn can_connect() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let options = ConnectionOptions::try_from(
            format!("sqlite://{}", file.path().to_str().unwrap()).as_str(),
        )
        .unwrap();

        assert!(Driver::create(&options).is_ok());
    }

    #[test]
    fn unreachable_file_is_a_connection_error() {
        let options = ConnectionOptions::default()
            .with_scheme(Some("sqlite".to_string()))
            .with_file_path(Some("/definitely/not/here/app.db".to_string()));

        let err = Driver::create(&options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionError);
    }

    #[tokio::test]
    async fn can_execute_and_fetch_rows() {
        let driver = memory_driver();
        driver
            .batch_execute("CREATE TABLE t (id INTEGER, name TEXT); CREATE TABLE u (id INTEGER);")
            .await
            .unwrap();

        let affected = driver
            .execute("INSERT INTO t (id, name) VALUES (?1, ?2)", params![1_i64, "one"])
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = driver
            .query("SELECT id, name FROM t WHERE id = ?1", params![1_i64])
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id").unwrap(), &Value::Int(1));
        assert_eq!(rows[0].get("name").unwrap(), &Value::from("one"));

        let rows = driver.query("SELECT * FROM u", params![]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn invalid_statements_fail() {
        let driver = memory_driver();
        assert!(driver.execute("NOT_A_COMMAND 1", params![]).await.is_err());
        assert!(driver.batch_execute("CREATE TABLE (").await.is_err());
    }
}
