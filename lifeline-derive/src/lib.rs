//! Procedural macros for lifeline
//!
//! This crate provides the `LifeModel` derive used by every entity that takes
//! part in relation loading or relation mutation.

mod attributes;
mod macros;
mod utils;

use proc_macro::TokenStream;

/// Derive macro for `LifeModel`
///
/// Generates, for a struct with named fields:
/// - `ModelTrait` (table name, primary key, name-based column accessors, insert values)
/// - `FromRow` (relation fields start out empty)
/// - `WithRelations` (relation names to eager-load request nodes)
/// - one `RelatedField<R>` implementation per related type `R`
///
/// Struct attribute: `#[table_name = "users"]` (defaults to the snake_case struct name).
///
/// Field attributes:
/// - `#[primary_key]`: primary key column (defaults to a column named `id`)
/// - `#[auto_increment]`: left out of `INSERT`s
/// - `#[column_name = "..."]`: column name when it differs from the field name
/// - `#[relation = "PATH_TO_RELATION_DEF"]`: a relation field holding `Option<R>`,
///   `Option<Box<R>>`, `Vec<R>`, `HashSet<R>` or `BTreeSet<R>`; not a column
///
/// ```ignore
/// #[derive(Debug, Clone, Default, LifeModel)]
/// #[table_name = "posts"]
/// pub struct Post {
///     #[primary_key]
///     #[auto_increment]
///     pub id: i32,
///     pub user_id: i32,
///     #[relation = "POST_AUTHOR"]
///     pub author: Option<Box<User>>,
/// }
/// ```
#[proc_macro_derive(LifeModel, attributes(table_name, primary_key, auto_increment, column_name, relation))]
pub fn derive_life_model(input: TokenStream) -> TokenStream {
    macros::derive_life_model(input)
}
