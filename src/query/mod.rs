//! Query building and execution for models.
//!
//! - **Select**: `SelectQuery<M>`, the SELECT builder relation constraints operate on
//! - **Execution**: `all` and `find_one`
//! - **Value Conversion**: bound `sea_query::Value`s to `may_postgres` parameters and back
//!
//! # Examples
//!
//! ```no_run
//! use lifeline::{Ident, LifeExecutor, SelectQuery};
//! use sea_query::{Expr, ExprTrait, Order};
//! # use lifeline::LifeModel;
//! # #[derive(Debug, Clone, Default, LifeModel)]
//! # #[table_name = "posts"]
//! # struct Post { #[primary_key] id: i32, published: bool }
//! # fn run(executor: &dyn LifeExecutor) -> Result<(), lifeline::LifeError> {
//!
//! let published = SelectQuery::<Post>::new()
//!     .filter(Expr::col(Ident::new("published")).eq(true))
//!     .order_by("id", Order::Desc)
//!     .limit(10)
//!     .all(executor)?;
//! # Ok(())
//! # }
//! ```

pub mod execution;
pub mod select;
pub mod value_conversion;

pub use select::SelectQuery;

use crate::model::ModelTrait;
use sea_query::Iden;
use std::borrow::Cow;

/// The mapped columns of `M`, for explicit SELECT and RETURNING lists.
///
/// Columns the model does not map are never fetched, so their types never
/// reach the row decoder.
pub(crate) fn model_columns<M: ModelTrait>() -> impl Iterator<Item = Ident> {
    M::column_names().iter().map(|column| Ident::new(*column))
}

/// Table or column identifier.
///
/// Relation definitions carry `&'static str` names; this wraps them (or an
/// owned name) for use anywhere `sea_query` expects an `Iden`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident(Cow<'static, str>);

impl Ident {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Iden for Ident {
    fn unquoted(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for Ident {
    fn from(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }
}

impl From<String> for Ident {
    fn from(name: String) -> Self {
        Self(Cow::Owned(name))
    }
}
