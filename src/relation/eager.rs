//! Eager loading of related entities.
//!
//! Loads relations for a whole batch of owners with one SELECT per relation
//! (two for pivot and through kinds), in the "selectinload" style:
//!
//! 1. Collect the distinct non-null key values from the owners
//! 2. Fetch every related row with a single `IN (...)` query
//! 3. Load nested relations on the fetched batch, recursively
//! 4. Hand each owner the related entities matching its key
//!
//! The number of statements depends on the request tree, never on the number
//! of owners. A relation whose key set is empty issues no query at all.
//!
//! # Example
//!
//! ```no_run
//! use lifeline::{EagerLoader, Load, LoadTree, LifeExecutor, LifeError};
//! # use lifeline::{LifeModel, RelationDef};
//! # pub const USER_POSTS: RelationDef = RelationDef::has_many("posts", "users", "posts", "user_id", "id");
//! # #[derive(Debug, Clone, Default, LifeModel)]
//! # #[table_name = "users"]
//! # pub struct User { #[primary_key] pub id: i32, #[relation = "USER_POSTS"] pub posts: Vec<Post> }
//! # #[derive(Debug, Clone, Default, LifeModel)]
//! # #[table_name = "posts"]
//! # pub struct Post { #[primary_key] pub id: i32, pub user_id: i32, pub published: bool }
//! # fn run(executor: &dyn LifeExecutor, mut users: Vec<User>) -> Result<(), LifeError> {
//!
//! let tree = LoadTree::new().with(
//!     Load::<User, Post>::new(USER_POSTS).constrain(|q| q.filter_eq("published", true)),
//! );
//! EagerLoader::new().load_relations(&mut users, &tree, executor)?;
//! # Ok(())
//! # }
//! ```

use crate::config::LifelineConfig;
use crate::executor::{LifeError, LifeExecutor};
use crate::model::ModelTrait;
use crate::relation::batch;
use crate::relation::def::{Aggregate, Bridge, RelationDef, RelationKind};
use crate::relation::error::RelationError;
use crate::relation::keys::{extract_keys, Key, KeySet};
use crate::relation::populate::{populate_bridged, populate_keyed, RelatedField};
use crate::relation::request::{Constraint, EagerLoad, LoadTree};
use sea_query::{Order, PostgresQueryBuilder};
use std::collections::HashMap;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Runs request trees against an executor.
#[derive(Debug, Clone)]
pub struct EagerLoader {
    strict_fields: bool,
}

impl Default for EagerLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Related entities fetched for one node, plus how to match them to owners.
struct Resolved<R> {
    related: Vec<R>,
    owner_key: &'static str,
    related_key: &'static str,
    /// Present for pivot and through kinds
    links: Option<HashMap<Key, Vec<Key>>>,
}

impl<R> Resolved<R> {
    fn keyed(related: Vec<R>, owner_key: &'static str, related_key: &'static str) -> Self {
        Self {
            related,
            owner_key,
            related_key,
            links: None,
        }
    }

    fn bridged(related: Vec<R>, links: HashMap<Key, Vec<Key>>, bridge: &Bridge) -> Self {
        Self {
            related,
            owner_key: bridge.owner_key,
            related_key: bridge.related_key,
            links: Some(links),
        }
    }
}

impl EagerLoader {
    /// Loader that rejects relation fields the owner does not have.
    pub fn new() -> Self {
        Self { strict_fields: true }
    }

    pub fn from_config(config: &LifelineConfig) -> Self {
        Self {
            strict_fields: config.relations.strict_fields,
        }
    }

    /// With `strict = false`, a relation whose field the owner lacks is
    /// skipped with a warning instead of failing the load.
    pub fn with_strict_fields(mut self, strict: bool) -> Self {
        self.strict_fields = strict;
        self
    }

    pub fn strict_fields(&self) -> bool {
        self.strict_fields
    }

    /// Load every relation in `tree` into `owners`.
    ///
    /// Root requests run in order; the first failure aborts the load and is
    /// returned unchanged. Owners already populated before the failure keep
    /// their content.
    ///
    /// Within one request, nested relations load on the fetched batch before
    /// that batch is distributed to `owners`. If a nested load fails, the
    /// owners' field for that request is left as it was, even though the
    /// request's own query succeeded.
    ///
    /// # Errors
    ///
    /// Relation errors (unsupported kind, unknown field or column, table
    /// mismatch) and executor failures.
    pub fn load_relations<O, Ex>(
        &self,
        owners: &mut [O],
        tree: &LoadTree<O>,
        executor: &Ex,
    ) -> Result<(), LifeError>
    where
        Ex: LifeExecutor,
    {
        let executor: &dyn LifeExecutor = executor;
        for request in tree.roots() {
            request.load(self, owners, executor)?;
        }
        Ok(())
    }

    pub(crate) fn load_node<O, R>(
        &self,
        def: &RelationDef,
        constraint: Option<&Constraint<R>>,
        nested: &[Box<dyn EagerLoad<R>>],
        owners: &mut [O],
        executor: &dyn LifeExecutor,
    ) -> Result<(), LifeError>
    where
        O: ModelTrait + RelatedField<R>,
        R: ModelTrait,
    {
        let rel_type = def.rel_type();
        if rel_type.is_morph() {
            return Err(RelationError::UnsupportedKind {
                field: def.field,
                rel_type,
            }
            .into());
        }
        check_table(def, def.owner_table, O::table_name())?;
        check_table(def, def.related_table, R::table_name())?;

        if !O::accepts_related_field(def.field) {
            if self.strict_fields {
                return Err(RelationError::UnknownField {
                    entity: O::table_name(),
                    field: def.field.to_string(),
                }
                .into());
            }
            log::warn!(
                "skipping relation `{}`: `{}` has no such relation field",
                def.field,
                O::table_name()
            );
            return Ok(());
        }
        if O::related_field_is_singular(def.field) != Some(rel_type.is_singular()) {
            return Err(RelationError::ShapeMismatch {
                entity: O::table_name(),
                field: def.field,
                rel_type,
            }
            .into());
        }

        if owners.is_empty() {
            return Ok(());
        }

        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::load_relation_span(def.field, rel_type.as_str(), owners.len()).entered();

        let mut resolved = self.resolve(def, constraint, owners, executor)?;
        log::debug!(
            "loaded {} {} row(s) for {} {} owner(s)",
            resolved.related.len(),
            def,
            owners.len(),
            O::table_name()
        );

        // Nested loads run on the fetched batch before it is cloned out to the
        // owners, so every copy carries the nested data.
        if !resolved.related.is_empty() {
            for node in nested {
                node.load(self, &mut resolved.related, executor)?;
            }
        }

        match &resolved.links {
            Some(links) => populate_bridged(
                owners,
                &resolved.related,
                links,
                resolved.owner_key,
                resolved.related_key,
                def.field,
            )?,
            None => populate_keyed(
                owners,
                &resolved.related,
                resolved.owner_key,
                resolved.related_key,
                def.field,
            )?,
        }
        Ok(())
    }

    fn resolve<O, R>(
        &self,
        def: &RelationDef,
        constraint: Option<&Constraint<R>>,
        owners: &[O],
        executor: &dyn LifeExecutor,
    ) -> Result<Resolved<R>, LifeError>
    where
        O: ModelTrait,
        R: ModelTrait,
    {
        match def.kind {
            RelationKind::HasOne { foreign_key, local_key }
            | RelationKind::HasMany { foreign_key, local_key } => {
                load_direct(def, owners, local_key, foreign_key, None, constraint, executor)
            }
            RelationKind::LatestOfMany { foreign_key, local_key, column } => {
                let order = Some((column, Order::Desc));
                load_direct(def, owners, local_key, foreign_key, order, constraint, executor)
            }
            RelationKind::OldestOfMany { foreign_key, local_key, column } => {
                let order = Some((column, Order::Asc));
                load_direct(def, owners, local_key, foreign_key, order, constraint, executor)
            }
            RelationKind::OfMany { foreign_key, local_key, column, aggregate } => {
                let direction = match aggregate {
                    Aggregate::Max => Order::Desc,
                    Aggregate::Min => Order::Asc,
                };
                load_direct(def, owners, local_key, foreign_key, Some((column, direction)), constraint, executor)
            }
            RelationKind::BelongsTo { foreign_key, related_key } => {
                load_direct(def, owners, foreign_key, related_key, None, constraint, executor)
            }
            RelationKind::BelongsToMany(pivot) => {
                load_bridged(def, owners, &pivot.bridge(), constraint, executor)
            }
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                load_bridged(def, owners, &through.bridge(), constraint, executor)
            }
            RelationKind::MorphOne { .. }
            | RelationKind::MorphMany { .. }
            | RelationKind::MorphTo { .. }
            | RelationKind::MorphToMany { .. }
            | RelationKind::MorphedByMany { .. } => Err(RelationError::UnsupportedKind {
                field: def.field,
                rel_type: def.rel_type(),
            }
            .into()),
        }
    }
}

/// Load relations with the default (strict) loader.
///
/// # Errors
///
/// See [`EagerLoader::load_relations`].
pub fn load_relations<O, Ex>(owners: &mut [O], tree: &LoadTree<O>, executor: &Ex) -> Result<(), LifeError>
where
    Ex: LifeExecutor,
{
    EagerLoader::new().load_relations(owners, tree, executor)
}

fn check_table(def: &RelationDef, expected: &'static str, actual: &'static str) -> Result<(), RelationError> {
    if expected == actual {
        Ok(())
    } else {
        Err(RelationError::TableMismatch {
            field: def.field,
            expected,
            actual,
        })
    }
}

fn load_direct<O, R>(
    def: &RelationDef,
    owners: &[O],
    owner_key: &'static str,
    related_key: &'static str,
    one_of_many: Option<(&'static str, Order)>,
    constraint: Option<&Constraint<R>>,
    executor: &dyn LifeExecutor,
) -> Result<Resolved<R>, LifeError>
where
    O: ModelTrait,
    R: ModelTrait,
{
    let keys = extract_keys(owners, owner_key)?;
    if keys.is_empty() {
        return Ok(Resolved::keyed(Vec::new(), owner_key, related_key));
    }

    let query = match one_of_many {
        Some((column, order)) => batch::one_of_many_query::<R>(related_key, column, order, &keys),
        None => batch::direct_query::<R>(related_key, &keys),
    };
    let query = batch::constrained(query, constraint);

    log::trace!("{def}: batching {} key(s)", keys.len());
    #[cfg(feature = "metrics")]
    METRICS.record_relation_query(def.rel_type());

    let related = query.all(executor)?;
    Ok(Resolved::keyed(related, owner_key, related_key))
}

fn load_bridged<O, R>(
    def: &RelationDef,
    owners: &[O],
    bridge: &Bridge,
    constraint: Option<&Constraint<R>>,
    executor: &dyn LifeExecutor,
) -> Result<Resolved<R>, LifeError>
where
    O: ModelTrait,
    R: ModelTrait,
{
    let keys = extract_keys(owners, bridge.owner_key)?;
    if keys.is_empty() {
        return Ok(Resolved::bridged(Vec::new(), HashMap::new(), bridge));
    }

    #[cfg(feature = "metrics")]
    METRICS.record_relation_query(def.rel_type());
    let (sql, values) = batch::bridge_query(bridge, &keys).build(PostgresQueryBuilder);
    let rows = executor.query_all(&sql, &values)?;

    let mut links: HashMap<Key, Vec<Key>> = HashMap::new();
    let mut related_keys = KeySet::new();
    for row in &rows {
        let owner_value = bridge_value(row, bridge, bridge.owner_column)?;
        let related_value = bridge_value(row, bridge, bridge.related_column)?;
        let (Some(owner), Some(related)) = (Key::from_value(owner_value), Key::from_value(related_value)) else {
            continue;
        };
        related_keys.insert(related_value);
        let targets = links.entry(owner).or_default();
        if !targets.contains(&related) {
            targets.push(related);
        }
    }
    log::debug!(
        "{} link(s) in `{}` for {} ({} distinct related key(s))",
        rows.len(),
        bridge.table,
        def,
        related_keys.len()
    );

    if related_keys.is_empty() {
        return Ok(Resolved::bridged(Vec::new(), links, bridge));
    }

    let query = batch::constrained(batch::direct_query::<R>(bridge.related_key, &related_keys), constraint);
    #[cfg(feature = "metrics")]
    METRICS.record_relation_query(def.rel_type());
    let related = query.all(executor)?;
    Ok(Resolved::bridged(related, links, bridge))
}

fn bridge_value<'r>(row: &'r crate::row::Row, bridge: &Bridge, column: &str) -> Result<&'r sea_query::Value, RelationError> {
    row.get_value(column).ok_or_else(|| RelationError::UnknownColumn {
        table: bridge.table,
        column: column.to_string(),
    })
}
