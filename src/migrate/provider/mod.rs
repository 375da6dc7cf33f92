mod embedded;
mod file;

use crate::migrate::Migration;
use crate::{AsyncResult, Error, Result};
pub use embedded::{EmbeddedMigration, EmbeddedMigrationProvider};
pub use file::FileMigrationProvider;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

const UP_MARKER: &str = "-- migrate:up";
const DOWN_MARKER: &str = "-- migrate:down";

static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[0-9A-Za-z][0-9A-Za-z_-]*)(?:\.(?P<kind>up|down))?\.sql$")
        .expect("invalid migration file name pattern")
});

/// Source of the migration definitions known to the application.
///
/// Implementations must return the full set of definitions sorted by name,
/// and fail instead of returning a partial list.
pub trait MigrationProvider: Send + Sync {
    fn list(&self) -> AsyncResult<'_, Vec<Migration>>;
}

/// Provides migrations defined in code.
#[derive(Clone, Debug, Default)]
pub struct StaticMigrationProvider {
    migrations: Vec<Migration>,
}

impl StaticMigrationProvider {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }

    pub fn add_migration(mut self, migration: Migration) -> Self {
        self.migrations.push(migration);
        self
    }
}

impl MigrationProvider for StaticMigrationProvider {
    fn list(&self) -> AsyncResult<'_, Vec<Migration>> {
        Box::pin(async move { sort_and_validate(self.migrations.clone()) })
    }
}

fn sort_and_validate(mut migrations: Vec<Migration>) -> Result<Vec<Migration>> {
    let mut seen = HashSet::new();
    for migration in migrations.iter() {
        if migration.name().is_empty() {
            return Err(Error::discovery("Migration name cannot be empty"));
        }

        if !seen.insert(migration.name()) {
            return Err(Error::duplicate_migration(migration.name()));
        }
    }

    migrations.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(migrations)
}

/// A SQL file read by a provider.
pub(crate) struct SourceFile {
    pub file_name: String,
    pub contents: String,
}

#[derive(Default)]
struct SourceParts {
    single: Option<String>,
    up: Option<String>,
    down: Option<String>,
}

/// Builds migrations out of SQL files.
///
/// `<name>.sql` holds both directions, the down section starting at a
/// `-- migrate:down` line. `<name>.up.sql` and an optional `<name>.down.sql`
/// hold one direction each.
pub(crate) fn assemble(files: Vec<SourceFile>) -> Result<Vec<Migration>> {
    let mut sources: BTreeMap<String, SourceParts> = BTreeMap::new();

    for file in files {
        let captures = FILE_NAME_PATTERN.captures(&file.file_name).ok_or_else(|| {
            Error::discovery(&format!(
                "Malformed migration file name \"{}\"",
                file.file_name
            ))
        })?;

        let name = captures["name"].to_string();
        let parts = sources.entry(name.clone()).or_default();
        let slot = match captures.name("kind").map(|k| k.as_str()) {
            Some("up") => &mut parts.up,
            Some(_) => &mut parts.down,
            None => &mut parts.single,
        };

        if slot.replace(file.contents).is_some() {
            return Err(Error::duplicate_migration(&name));
        }
    }

    let mut migrations = Vec::with_capacity(sources.len());
    for (name, parts) in sources {
        let (up, down) = match parts {
            SourceParts {
                single: Some(_),
                up: Some(_),
                ..
            }
            | SourceParts {
                single: Some(_),
                down: Some(_),
                ..
            } => return Err(Error::duplicate_migration(&name)),
            SourceParts {
                single: Some(contents),
                ..
            } => split_sections(&name, &contents)?,
            SourceParts {
                up: Some(up), down, ..
            } => (up, down),
            SourceParts { down: Some(_), .. } => {
                return Err(Error::discovery(&format!(
                    "Migration \"{}\" has a down file but no up file",
                    name
                )));
            }
            SourceParts { .. } => continue,
        };

        if is_blank(&up) {
            return Err(Error::discovery(&format!(
                "Migration \"{}\" has an empty up section",
                name
            )));
        }

        let migration = Migration::sql(name, up);
        migrations.push(match down.filter(|d| !is_blank(d)) {
            Some(down) => migration.with_down_sql(down),
            None => migration,
        });
    }

    Ok(migrations)
}

fn split_sections(name: &str, contents: &str) -> Result<(String, Option<String>)> {
    let mut up = String::new();
    let mut down: Option<String> = None;

    for line in contents.lines() {
        let marker = line.trim();
        if marker.eq_ignore_ascii_case(UP_MARKER) {
            if down.is_some() || !is_blank(&up) {
                return Err(Error::discovery(&format!(
                    "Misplaced \"{}\" marker in migration \"{}\"",
                    UP_MARKER, name
                )));
            }

            continue;
        }

        if marker.eq_ignore_ascii_case(DOWN_MARKER) {
            if down.is_some() {
                return Err(Error::discovery(&format!(
                    "Duplicate \"{}\" marker in migration \"{}\"",
                    DOWN_MARKER, name
                )));
            }

            down = Some(String::new());
            continue;
        }

        let section = down.as_mut().unwrap_or(&mut up);
        section.push_str(line);
        section.push('\n');
    }

    Ok((up, down))
}

/// Whether a script holds nothing but whitespace and line comments.
fn is_blank(sql: &str) -> bool {
    sql.lines().all(|l| {
        let l = l.trim();
        l.is_empty() || l.starts_with("--")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::migrate::MigrationAction;

    fn file(file_name: &str, contents: &str) -> SourceFile {
        SourceFile {
            file_name: file_name.to_string(),
            contents: contents.to_string(),
        }
    }

    fn sql(action: &MigrationAction) -> &str {
        match action {
            MigrationAction::Sql(sql) => sql,
            MigrationAction::Closure(_) => panic!("expected a SQL action"),
        }
    }

    #[test]
    fn assembles_single_and_paired_files() {
        let migrations = assemble(vec![
            file(
                "002_posts.sql",
                "-- migrate:up\nCREATE TABLE posts (id INTEGER);\n-- migrate:down\nDROP TABLE posts;\n",
            ),
            file("001_users.down.sql", "DROP TABLE users;"),
            file("001_users.up.sql", "CREATE TABLE users (id INTEGER);"),
            file("003_seed.sql", "INSERT INTO users (id) VALUES (1);"),
        ])
        .unwrap();

        let names: Vec<&str> = migrations.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["001_users", "002_posts", "003_seed"]);

        assert_eq!(sql(migrations[0].up()), "CREATE TABLE users (id INTEGER);");
        assert_eq!(sql(migrations[0].down().unwrap()), "DROP TABLE users;");
        assert_eq!(sql(migrations[1].up()), "CREATE TABLE posts (id INTEGER);\n");
        assert_eq!(sql(migrations[1].down().unwrap()), "DROP TABLE posts;\n");
        assert!(!migrations[2].has_down());
    }

    #[test]
    fn empty_down_section_means_no_down() {
        let migrations = assemble(vec![file(
            "001_users.sql",
            "CREATE TABLE users (id INTEGER);\n-- migrate:down\n-- nothing to do\n",
        )])
        .unwrap();

        assert!(!migrations[0].has_down());
    }

    #[test]
    fn rejects_invalid_sources() {
        let cases = vec![
            vec![file("users.table.sql", "SELECT 1")],
            vec![file("_init.sql", "SELECT 1")],
            vec![file("001_users.down.sql", "DROP TABLE users;")],
            vec![
                file("001_users.sql", "SELECT 1"),
                file("001_users.up.sql", "SELECT 1"),
            ],
            vec![file("001_users.sql", "-- migrate:down\nDROP TABLE users;")],
            vec![file("001_users.up.sql", "  \n-- only a comment\n")],
            vec![file(
                "001_users.sql",
                "SELECT 1;\n-- migrate:down\nSELECT 2;\n-- migrate:down\nSELECT 3;",
            )],
        ];

        for files in cases {
            let err = assemble(files).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DiscoveryError, "{}", err);
        }
    }

    #[test]
    fn duplicate_names_are_reported() {
        let err = assemble(vec![
            file("001_users.sql", "SELECT 1"),
            file("001_users.up.sql", "SELECT 1"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("001_users"));
    }

    #[tokio::test]
    async fn static_provider_sorts_and_rejects_duplicates() {
        let provider = StaticMigrationProvider::new(vec![
            Migration::sql("002_b", "SELECT 2"),
            Migration::sql("001_a", "SELECT 1"),
        ]);
        let names: Vec<String> = provider
            .list()
            .await
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["001_a", "002_b"]);

        let provider = provider.add_migration(Migration::sql("001_a", "SELECT 3"));
        let err = provider.list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DiscoveryError);
    }
}
