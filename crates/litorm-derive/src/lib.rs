//! Derive macros for litorm
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]` macros.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod record;

/// Derive `FromRow` trait for a struct.
///
/// Each field is decoded from the column of the same name (or the one named by
/// `#[orm(column = "...")]`), qualified by the table the row is decoded for.
///
/// # Example
///
/// ```ignore
/// use litorm::FromRow;
///
/// #[derive(FromRow)]
/// struct Planet {
///     id: Option<i64>,
///     #[orm(column = "galaxyID")]
///     galaxy_id: i64,
///     name: String,
/// }
/// ```
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `Record` for a struct, binding it to a table.
///
/// # Example
///
/// ```ignore
/// use litorm::{FromRow, Record};
///
/// #[derive(FromRow, Record)]
/// #[orm(table = "Planet")]
/// struct Planet {
///     #[orm(id)]
///     id: Option<i64>,
///     #[orm(column = "galaxyID", references = "Galaxy::ID")]
///     galaxy_id: i64,
///     #[orm(default = "Unamed Planet")]
///     name: String,
/// }
/// ```
///
/// # Generated
///
/// - `const ID: Field<Planet, Option<i64>>`, `GALAXY_ID`, `NAME`: one field
///   reference per struct field
/// - `impl Record`: table name, column declarations and the encoder
///
/// Column types and NOT NULL are inferred from the field types.
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (defaults to the struct name)
/// - `#[orm(id)]` / `#[orm(primary_key)]` - Primary key
/// - `#[orm(autoincrement)]` - Primary key with AUTOINCREMENT
/// - `#[orm(column = "name")]` - Map field to a different column name
/// - `#[orm(unique)]` - UNIQUE
/// - `#[orm(default = <literal>)]` - Literal default value
/// - `#[orm(default_expr = "CURRENT_TIMESTAMP")]` - Computed default
/// - `#[orm(references = "Other::FIELD")]` - Foreign key
#[proc_macro_derive(Record, attributes(orm))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
