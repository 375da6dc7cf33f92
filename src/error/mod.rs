use std::backtrace::Backtrace;
use std::fmt::{Debug, Display, Formatter};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    ConfigurationError = 1,
    DiscoveryError = 2,
    ConnectionError = 3,
    MigrationExecutionError = 4,
    InconsistentHistory = 5,
    UnknownMigration = 6,
    TransactionError = 7,
    OutOfBounds = 8,
    TypeMismatch = 9,

    UnknownError = -1,
}

pub struct Error {
    kind: ErrorKind,
    inner: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

/// Adapter exposing an [`Error`] as a [`std::error::Error`].
pub struct StdError(Error);

impl Display for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for StdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl std::error::Error for StdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.0.inner.as_ref())
    }
}

impl From<Error> for StdError {
    fn from(e: Error) -> Self {
        StdError(e)
    }
}

impl Error {
    pub fn new<E>(kind: ErrorKind, error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error {
            kind,
            inner: error.into(),
            backtrace: Backtrace::capture(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    pub fn config<T: Display + ?Sized>(message: &T) -> Self {
        Self::new(ErrorKind::ConfigurationError, message.to_string())
    }

    pub fn missing_configuration(key: &str) -> Self {
        Self::new(
            ErrorKind::ConfigurationError,
            format!("Missing required environment variable: {}", key),
        )
    }

    pub fn discovery<T: Display + ?Sized>(message: &T) -> Self {
        Self::new(ErrorKind::DiscoveryError, message.to_string())
    }

    pub fn duplicate_migration(name: &str) -> Self {
        Self::new(
            ErrorKind::DiscoveryError,
            format!("Migration \"{}\" is defined more than once", name),
        )
    }

    pub fn connection<E>(error: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(ErrorKind::ConnectionError, error)
    }

    pub fn not_connected() -> Self {
        Self::new(ErrorKind::ConnectionError, "Connection is not established")
    }

    pub fn unknown_driver(driver: &str) -> Self {
        Self::new(
            ErrorKind::ConnectionError,
            format!("Unknown or disabled database driver \"{}\"", driver),
        )
    }

    pub fn migration_failed(name: &str, cause: &Error) -> Self {
        Self::new(
            ErrorKind::MigrationExecutionError,
            format!("Migration \"{}\" failed: {}", name, cause),
        )
    }

    pub fn irreversible_migration(name: &str) -> Self {
        Self::new(
            ErrorKind::MigrationExecutionError,
            format!("Migration \"{}\" has no down action", name),
        )
    }

    pub fn missing_migration(name: &str) -> Self {
        Self::new(
            ErrorKind::InconsistentHistory,
            format!(
                "Migration \"{}\" has been applied but its definition is missing",
                name
            ),
        )
    }

    pub fn unordered_migration(name: &str, last_applied: &str) -> Self {
        Self::new(
            ErrorKind::InconsistentHistory,
            format!(
                "Pending migration \"{}\" sorts before already applied migration \"{}\"",
                name, last_applied
            ),
        )
    }

    pub fn unknown_migration(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownMigration,
            format!("Migration \"{}\" does not exist", name),
        )
    }

    pub fn nested_transaction() -> Self {
        Self::new(
            ErrorKind::TransactionError,
            "A transaction is already active on this connection",
        )
    }

    pub fn out_of_bounds<T>(index: T) -> Self
    where
        T: ToString,
    {
        Self::new(
            ErrorKind::OutOfBounds,
            format!("Unable to read {} index", index.to_string()),
        )
    }

    pub fn type_mismatch() -> Self {
        Self::new(ErrorKind::TypeMismatch, "Type mismatch")
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}: {}\nBacktrace:\n{}",
            self.kind, self.inner, self.backtrace
        )
    }
}

impl<T> From<T> for Error
where
    T: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn from(err: T) -> Self {
        Error::new(ErrorKind::UnknownError, err)
    }
}
