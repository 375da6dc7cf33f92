use crate::common::{resolve_path, Result};
use proc_macro2::{Ident, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use std::ffi::OsString;
use std::fs::{metadata, read_dir};
use std::path::{Path, PathBuf};
use syn::parse::Parse;
use syn::{LitStr, Token};

pub(crate) struct MigrateInput {
    pub_token: Option<Token![pub]>,
    ident: Ident,
    _comma: Token![,],
    path: LitStr,
}

impl Parse for MigrateInput {
    fn parse(input: syn::parse::ParseStream) -> syn::Result<Self> {
        let pub_token = if input.peek(Token![pub]) {
            Some(input.parse()?)
        } else {
            None
        };

        Ok(Self {
            pub_token,
            ident: input.parse()?,
            _comma: input.parse()?,
            path: input.parse()?,
        })
    }
}

struct QuotedMigrationFile {
    file_name: String,
    path: PathBuf,
}

impl ToTokens for QuotedMigrationFile {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let file_name = &self.file_name;
        let path = self.path.to_string_lossy().to_string();

        let ts = quote! {
            ::strata::migrate::EmbeddedMigration {
                file_name: #file_name,
                // include_str! makes cargo rebuild when the file changes
                contents: ::std::include_str!(#path),
            }
        };

        tokens.append_all(ts);
    }
}

pub(crate) fn expand_migrator_from_lit_dir(migrate_input: MigrateInput) -> Result<TokenStream> {
    let path = resolve_path(migrate_input.path.value(), migrate_input.path.span())?;
    expand_migrator(&path, &migrate_input.ident, &migrate_input.pub_token)
}

/// Keeps visible `.sql` files. Non-UTF-8 names are only an error when they
/// would otherwise have been picked up as migrations.
fn migration_file_name(raw: OsString) -> Result<Option<String>> {
    let file_name = match raw.into_string() {
        Ok(file_name) => file_name,
        Err(raw) if raw.to_string_lossy().ends_with(".sql") => {
            return Err(format!("migration file name {:?} is not valid UTF-8", raw).into());
        }
        Err(_) => return Ok(None),
    };

    if file_name.starts_with('.') || !file_name.ends_with(".sql") {
        return Ok(None);
    }

    Ok(Some(file_name))
}

pub(crate) fn expand_migrator(
    path: &Path,
    provider_name: &Ident,
    pub_token: &Option<Token![pub]>,
) -> Result<TokenStream> {
    let mut files = Vec::new();

    for entry in read_dir(path)? {
        let entry = entry?;
        if !metadata(entry.path())?.is_file() {
            continue;
        }

        let Some(file_name) = migration_file_name(entry.file_name())? else {
            continue;
        };

        files.push(QuotedMigrationFile {
            file_name,
            path: entry.path().canonicalize()?,
        });
    }

    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));

    let token_stream: TokenStream = quote! {
        #pub_token const #provider_name: ::strata::migrate::EmbeddedMigrationProvider =
            ::strata::migrate::EmbeddedMigrationProvider::new(
                ::std::borrow::Cow::Borrowed(&[
                    #(#files),*
                ]),
            );
    };

    Ok(token_stream)
}

#[cfg(test)]
mod tests {
    use super::migration_file_name;
    use std::ffi::OsString;

    #[test]
    fn keeps_visible_sql_files_only() {
        let name = migration_file_name(OsString::from("001_init.up.sql")).unwrap();
        assert_eq!(name.as_deref(), Some("001_init.up.sql"));

        assert!(migration_file_name(OsString::from(".001_init.sql")).unwrap().is_none());
        assert!(migration_file_name(OsString::from("README.md")).unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_fail_only_for_sql_files() {
        use std::os::unix::ffi::OsStringExt;

        let notes = OsString::from_vec(b"notes-\xff.txt".to_vec());
        assert!(migration_file_name(notes).unwrap().is_none());

        let migration = OsString::from_vec(b"001_\xff.sql".to_vec());
        assert!(migration_file_name(migration).is_err());
    }
}
