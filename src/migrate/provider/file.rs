use crate::migrate::Migration;
use crate::migrate::provider::{MigrationProvider, SourceFile, assemble};
use crate::{AsyncResult, Error, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// Reads migrations from the `.sql` files of a directory.
///
/// Hidden files, subdirectories and files without the `.sql` extension are
/// ignored. The directory is read again on every call to `list`.
#[derive(Clone, Debug)]
pub struct FileMigrationProvider {
    path: PathBuf,
}

impl FileMigrationProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn get_path(&self) -> &Path {
        &self.path
    }

    async fn read_files(&self) -> Result<Vec<SourceFile>> {
        let mut entries = tokio::fs::read_dir(&self.path).await.map_err(|e| {
            Error::discovery(&format!(
                "Unable to read migrations directory {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let mut files = vec![];
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(Error::discovery(&format!(
                        "Unable to read migrations directory {}: {}",
                        self.path.display(),
                        e
                    )));
                }
            };

            let path = entry.path();
            let file_name = match entry.file_name().into_string() {
                Ok(file_name) => file_name,
                Err(raw) if raw.to_string_lossy().ends_with(".sql") => {
                    return Err(Error::discovery(&format!(
                        "Migration file name {:?} is not valid UTF-8",
                        raw
                    )));
                }
                Err(_) => continue,
            };

            if file_name.starts_with('.') || !file_name.ends_with(".sql") {
                continue;
            }

            let metadata = tokio::fs::metadata(&path).await.map_err(|e| {
                Error::discovery(&format!("Unable to stat {}: {}", path.display(), e))
            })?;
            if !metadata.is_file() {
                continue;
            }

            let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
                Error::discovery(&format!(
                    "Unable to read migration file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            debug!(target: "strata::migrate", "Found migration file {}", path.display());
            files.push(SourceFile {
                file_name,
                contents,
            });
        }

        Ok(files)
    }
}

impl MigrationProvider for FileMigrationProvider {
    fn list(&self) -> AsyncResult<'_, Vec<Migration>> {
        Box::pin(async move { assemble(self.read_files().await?) })
    }
}
