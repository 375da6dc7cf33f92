use crate::migrate::Migration;
use crate::migrate::provider::{MigrationProvider, SourceFile, assemble};
use crate::AsyncResult;
use std::borrow::Cow;

/// A migration file compiled into the binary.
#[derive(Clone, Copy, Debug)]
pub struct EmbeddedMigration {
    pub file_name: &'static str,
    pub contents: &'static str,
}

/// Provides migrations embedded at compile time, usually through the
/// [`embed_migrations!`](crate::embed_migrations) macro.
///
/// The files follow the same naming rules as [`FileMigrationProvider`](super::FileMigrationProvider).
#[derive(Clone, Debug)]
pub struct EmbeddedMigrationProvider {
    files: Cow<'static, [EmbeddedMigration]>,
}

impl EmbeddedMigrationProvider {
    pub const fn new(files: Cow<'static, [EmbeddedMigration]>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> &[EmbeddedMigration] {
        &self.files
    }
}

impl MigrationProvider for EmbeddedMigrationProvider {
    fn list(&self) -> AsyncResult<'_, Vec<Migration>> {
        Box::pin(async move {
            assemble(
                self.files
                    .iter()
                    .map(|f| SourceFile {
                        file_name: f.file_name.to_string(),
                        contents: f.contents.to_string(),
                    })
                    .collect(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{EmbeddedMigration, EmbeddedMigrationProvider};
    use crate::migrate::provider::{FileMigrationProvider, MigrationProvider};
    use std::borrow::Cow;

    crate::embed_migrations!(MIGRATIONS, "tests/migrations");

    #[tokio::test]
    async fn embedded_files_match_directory() {
        let embedded = MIGRATIONS.list().await.unwrap();
        let on_disk = FileMigrationProvider::new("tests/migrations")
            .list()
            .await
            .unwrap();

        assert_eq!(MIGRATIONS.files().len(), 4);
        assert_eq!(
            embedded.iter().map(|m| m.name()).collect::<Vec<_>>(),
            on_disk.iter().map(|m| m.name()).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn const_provider() {
        const PROVIDER: EmbeddedMigrationProvider =
            EmbeddedMigrationProvider::new(Cow::Borrowed(&[EmbeddedMigration {
                file_name: "001_init.sql",
                contents: "CREATE TABLE t (id INTEGER);\n-- migrate:down\nDROP TABLE t;",
            }]));

        let migrations = PROVIDER.list().await.unwrap();
        assert_eq!(migrations.len(), 1);
        assert!(migrations[0].has_down());
    }
}
