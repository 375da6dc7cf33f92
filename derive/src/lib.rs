extern crate proc_macro;

mod common;
mod migrate;

use proc_macro::TokenStream;
use syn::parse_macro_input;

/// Embeds every `.sql` migration file found in the given directory (relative to
/// the crate manifest) into a `const` [`EmbeddedMigrationProvider`].
///
/// ```ignore
/// strata::embed_migrations!(pub MIGRATIONS, "migrations");
/// ```
///
/// [`EmbeddedMigrationProvider`]: ../strata/migrate/struct.EmbeddedMigrationProvider.html
#[proc_macro]
pub fn embed_migrations(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as migrate::MigrateInput);
    match migrate::expand_migrator_from_lit_dir(input) {
        Ok(ts) => ts.into(),
        Err(e) => {
            if let Some(parse_err) = e.downcast_ref::<syn::Error>() {
                parse_err.to_compile_error().into()
            } else {
                let msg = e.to_string();
                quote::quote!(::std::compile_error!(#msg)).into()
            }
        }
    }
}
