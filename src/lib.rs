//! # Lifeline
//!
//! Relationship layer for the lifeguard PostgreSQL ORM: batched eager loading
//! (no N+1 queries) and relation mutation (associate, attach, sync, toggle, ...)
//! driven by one set of compile-time relation definitions.
//!
//! ```no_run
//! use lifeline::{EagerLoader, LoadTree, LifeModel, RelationDef};
//! # use lifeline::{LifeError, MayPostgresExecutor};
//!
//! pub const USER_POSTS: RelationDef = RelationDef::has_many("posts", "users", "posts", "user_id", "id");
//!
//! #[derive(Debug, Clone, Default, LifeModel)]
//! #[table_name = "users"]
//! pub struct User {
//!     #[primary_key]
//!     pub id: i32,
//!     #[relation = "USER_POSTS"]
//!     pub posts: Vec<Post>,
//! }
//!
//! #[derive(Debug, Clone, Default, LifeModel)]
//! #[table_name = "posts"]
//! pub struct Post {
//!     #[primary_key]
//!     pub id: i32,
//!     pub user_id: i32,
//! }
//!
//! # fn run(executor: &MayPostgresExecutor, mut users: Vec<User>) -> Result<(), LifeError> {
//! let tree = LoadTree::<User>::from_paths(&["posts"])?;
//! EagerLoader::new().load_relations(&mut users, &tree, executor)?;
//! # Ok(())
//! # }
//! ```

extern crate self as lifeline;

pub mod config;
pub mod connection;
pub mod executor;
#[cfg(any(feature = "metrics", feature = "tracing"))]
pub mod metrics;
pub mod model;
pub mod query;
pub mod relation;
pub mod row;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod transaction;
pub mod value;

#[cfg(test)]
mod tests_cfg;

pub use sea_query;

pub use config::LifelineConfig;
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use lifeline_derive::LifeModel;
pub use model::{ModelError, ModelTrait};
pub use query::{Ident, SelectQuery};
pub use relation::{
    load_relations, Aggregate, EagerLoad, EagerLoader, Key, KeySet, Load, LoadTree, PivotDef,
    RelatedField, RelationDef, RelationError, RelationKind, RelationSlot, RelationType,
    RelationshipManager, SyncChanges, ThroughDef, WithRelations,
};
pub use row::{FromRow, Row};
pub use transaction::Transaction;
