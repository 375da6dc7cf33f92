use crate::{ConnectionOptions, Error, Result};
pub use connection::DriverConnection;
use log::debug;

pub mod connection;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub mod sqlite;

/// Opens a driver connection for the scheme carried by the given options.
pub async fn create(connection_options: &ConnectionOptions) -> Result<Box<dyn DriverConnection>> {
    let scheme = connection_options
        .scheme
        .as_deref()
        .ok_or_else(|| Error::config("Database scheme is not set"))?;

    debug!(target: "strata::driver", "Opening {} connection", scheme);

    let driver = match scheme {
        #[cfg(feature = "postgres")]
        "psql" | "postgres" | "postgresql" => {
            Box::new(postgres::Driver::create(connection_options).await?)
                as Box<dyn DriverConnection>
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            Box::new(sqlite::Driver::create(connection_options)?) as Box<dyn DriverConnection>
        }
        proto => return Err(Error::unknown_driver(proto)),
    };

    Ok(driver)
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::{ConnectionOptions, params};

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn can_create_connection() {
        let options = ConnectionOptions::try_from("sqlite://:memory:").unwrap();
        let connection = super::create(&options).await.expect("Must be connected");

        let rows = connection.query("SELECT 1", params![]).await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn unknown_scheme_is_a_connection_error() {
        let options = ConnectionOptions::default().with_scheme(Some("mysql".to_string()));
        let err = super::create(&options).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConnectionError);
    }
}
