//! Derive macros for rowmap
//!
//! Provides `#[derive(Record)]`.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod record;

/// Derive the `Record` trait for a struct with named fields.
///
/// # Example
///
/// ```ignore
/// use rowmap::Record;
///
/// #[derive(Default, Record)]
/// #[rowmap(table = "company")]
/// struct Company {
///     #[rowmap(auto_key)]
///     id: i64,
///     name: String,
///     #[rowmap(column = "symbol")]
///     ticker: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[rowmap(table = "name")]` - Table name (defaults to the struct name in snake_case)
/// - `#[rowmap(column = "name")]` - Map field to a different column name
/// - `#[rowmap(primary_key)]` - Caller-supplied primary key
/// - `#[rowmap(auto_key)]` - Primary key generated by the database on insert
/// - `#[rowmap(no_insert)]` - Leave the column out of INSERT
/// - `#[rowmap(blob)]` - Binary column using the dialect's blob type
/// - `#[rowmap(sql_type = "TEXT")]` - Column type for `CREATE TABLE`
/// - `#[rowmap(skip)]` - Not persisted; left untouched when scanning
///
/// Field values are converted with `Value::from(field.clone())` and read back with
/// `FromValue`, in declaration order.
#[proc_macro_derive(Record, attributes(rowmap))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
