//! Relation mutations.
//!
//! `RelationshipManager` writes relations through the caller's executor,
//! normally a [`Transaction`](crate::Transaction). It validates the relation
//! kind before building any SQL, never retries and never opens transactions
//! of its own: a failed statement is returned as-is and the caller decides
//! whether to roll back.
//!
//! # Example
//!
//! ```no_run
//! use lifeline::{LifeError, MayPostgresExecutor, RelationshipManager};
//! # use lifeline::{LifeModel, PivotDef, RelationDef};
//! # pub const USER_ROLES: RelationDef = RelationDef::belongs_to_many(
//! #     "roles", "users", "roles", PivotDef::new("role_user", "user_id", "role_id"));
//! # #[derive(Debug, Clone, Default, LifeModel)]
//! # #[table_name = "users"]
//! # pub struct User { #[primary_key] pub id: i32 }
//! # fn run(executor: &MayPostgresExecutor, user: &User) -> Result<(), LifeError> {
//!
//! let manager = RelationshipManager::new();
//! let tx = executor.begin()?;
//! let changes = manager.sync(&tx, user, &USER_ROLES, [5, 6])?;
//! tx.commit()?;
//! println!("attached {:?}, detached {:?}", changes.attached, changes.detached);
//! # Ok(())
//! # }
//! ```

use crate::config::LifelineConfig;
use crate::executor::{LifeError, LifeExecutor};
use crate::model::ModelTrait;
use crate::query::{model_columns, Ident, SelectQuery};
use crate::relation::def::{PivotDef, RelationDef, RelationKind, RelationType};
use crate::relation::error::RelationError;
use crate::relation::keys::KeySet;
use crate::value::is_null;
use sea_query::{Expr, ExprTrait, PostgresQueryBuilder, Query, Value};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Pivot rows added and removed by `sync`, `sync_without_detaching` or `toggle`.
///
/// Values are the related keys, in the order they were planned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncChanges {
    pub attached: Vec<Value>,
    pub detached: Vec<Value>,
}

impl SyncChanges {
    /// `attached = desired - current`, `detached = current - desired`.
    pub fn plan(current: &KeySet, desired: &KeySet) -> Self {
        Self {
            attached: desired
                .iter()
                .filter(|(key, _)| !current.contains(key))
                .map(|(_, value)| value.clone())
                .collect(),
            detached: current
                .iter()
                .filter(|(key, _)| !desired.contains(key))
                .map(|(_, value)| value.clone())
                .collect(),
        }
    }

    /// Every id in `ids` flips membership.
    pub fn toggle_plan(current: &KeySet, ids: &KeySet) -> Self {
        let mut changes = Self::default();
        for (key, value) in ids.iter() {
            if current.contains(key) {
                changes.detached.push(value.clone());
            } else {
                changes.attached.push(value.clone());
            }
        }
        changes
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.detached.is_empty()
    }
}

/// Writes relations defined by [`RelationDef`]s.
#[derive(Debug, Clone)]
pub struct RelationshipManager {
    created_at_column: String,
    updated_at_column: String,
}

impl Default for RelationshipManager {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationshipManager {
    pub fn new() -> Self {
        Self::with_timestamp_columns("created_at", "updated_at")
    }

    pub fn from_config(config: &LifelineConfig) -> Self {
        Self::with_timestamp_columns(
            config.pivot.created_at_column.clone(),
            config.pivot.updated_at_column.clone(),
        )
    }

    /// Column names written on pivot tables declared `with_timestamps()`.
    pub fn with_timestamp_columns(created_at: impl Into<String>, updated_at: impl Into<String>) -> Self {
        Self {
            created_at_column: created_at.into(),
            updated_at_column: updated_at.into(),
        }
    }

    // ---------------------------------------------------------------
    // BelongsTo
    // ---------------------------------------------------------------

    /// Point `child`'s foreign key at `parent` and persist it.
    ///
    /// # Errors
    ///
    /// `WrongKind` unless `def` is `BelongsTo`; `MissingKey` when the parent
    /// key or the child's primary key is null; executor failures.
    pub fn associate<Ex, C, P>(
        &self,
        executor: &Ex,
        child: &mut C,
        def: &RelationDef,
        parent: &P,
    ) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        C: ModelTrait,
        P: ModelTrait,
    {
        let (foreign_key, related_key) = expect_belongs_to("associate", def)?;
        check_tables::<C, P>(def)?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("associate", def.field).entered();

        let value = key_value(parent, related_key)?;
        set_foreign_key(executor, child, foreign_key, value)
    }

    /// Clear `child`'s foreign key and persist it.
    ///
    /// # Errors
    ///
    /// `WrongKind` unless `def` is `BelongsTo`; `Model` errors when the
    /// foreign key field is not nullable; executor failures.
    pub fn dissociate<Ex, C>(&self, executor: &Ex, child: &mut C, def: &RelationDef) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        C: ModelTrait,
    {
        let (foreign_key, _) = expect_belongs_to("dissociate", def)?;
        check_table(def, def.owner_table, C::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("dissociate", def.field).entered();

        set_foreign_key(executor, child, foreign_key, Value::Int(None))
    }

    // ---------------------------------------------------------------
    // HasOne / HasMany
    // ---------------------------------------------------------------

    /// Insert `child` with its foreign key set to `parent`; returns the stored row.
    ///
    /// # Errors
    ///
    /// `WrongKind` unless `def` is `HasOne`/`HasMany`; `MissingKey` for an
    /// unsaved parent; executor failures.
    pub fn save<Ex, P, R>(&self, executor: &Ex, parent: &P, def: &RelationDef, mut child: R) -> Result<R, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        let (foreign_key, local_key) = expect_has("save", def)?;
        check_tables::<P, R>(def)?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("save", def.field).entered();

        child.set_by_column_name(foreign_key, key_value(parent, local_key)?)?;
        insert_returning(executor, child.insert_values())
    }

    /// [`save`](Self::save) for each child, in order. Stops at the first failure.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save).
    pub fn save_many<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        children: Vec<R>,
    ) -> Result<Vec<R>, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        children
            .into_iter()
            .map(|child| self.save(executor, parent, def, child))
            .collect()
    }

    /// Insert a related row built from `attributes` plus the foreign key.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save).
    pub fn create<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        attributes: &[(&'static str, Value)],
    ) -> Result<R, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        let (foreign_key, local_key) = expect_has("create", def)?;
        check_tables::<P, R>(def)?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("create", def.field).entered();

        let parent_key = key_value(parent, local_key)?;
        insert_returning(executor, with_foreign_key(attributes, foreign_key, parent_key))
    }

    /// Related rows of `parent` matching every `(column, value)` pair.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save).
    pub fn find_by_criteria<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        criteria: &[(&'static str, Value)],
    ) -> Result<Vec<R>, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        let (foreign_key, local_key) = expect_has("find_by_criteria", def)?;
        check_tables::<P, R>(def)?;
        criteria_query::<R>(foreign_key, key_value(parent, local_key)?, criteria).all(executor)
    }

    /// First related row matching `criteria`, or a new one created from
    /// `criteria` and `values`.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save).
    pub fn first_or_create<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        criteria: &[(&'static str, Value)],
        values: &[(&'static str, Value)],
    ) -> Result<R, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        let (foreign_key, local_key) = expect_has("first_or_create", def)?;
        check_tables::<P, R>(def)?;
        let parent_key = key_value(parent, local_key)?;

        if let Some(found) = criteria_query::<R>(foreign_key, parent_key.clone(), criteria).find_one(executor)? {
            return Ok(found);
        }
        let attributes = merge_attributes(criteria, values);
        insert_returning(executor, with_foreign_key(&attributes, foreign_key, parent_key))
    }

    /// First related row matching `criteria`, or an unsaved `R::default()`
    /// filled from `criteria`, `values` and the foreign key.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save), plus `Model` errors from filling the new entity.
    pub fn first_or_new<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        criteria: &[(&'static str, Value)],
        values: &[(&'static str, Value)],
    ) -> Result<R, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait + Default,
    {
        let (foreign_key, local_key) = expect_has("first_or_new", def)?;
        check_tables::<P, R>(def)?;
        let parent_key = key_value(parent, local_key)?;

        if let Some(found) = criteria_query::<R>(foreign_key, parent_key.clone(), criteria).find_one(executor)? {
            return Ok(found);
        }
        let mut fresh = R::default();
        for (column, value) in with_foreign_key(&merge_attributes(criteria, values), foreign_key, parent_key) {
            fresh.set_by_column_name(column, value)?;
        }
        Ok(fresh)
    }

    /// Update the first related row matching `criteria` with `values`, or
    /// create it from both.
    ///
    /// # Errors
    ///
    /// As [`save`](Self::save).
    pub fn update_or_create<Ex, P, R>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        criteria: &[(&'static str, Value)],
        values: &[(&'static str, Value)],
    ) -> Result<R, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        R: ModelTrait,
    {
        let (foreign_key, local_key) = expect_has("update_or_create", def)?;
        check_tables::<P, R>(def)?;
        let parent_key = key_value(parent, local_key)?;

        match criteria_query::<R>(foreign_key, parent_key.clone(), criteria).find_one(executor)? {
            Some(found) if values.is_empty() => Ok(found),
            Some(found) => {
                let pk = key_value(&found, R::primary_key())?;
                let mut query = Query::update();
                query.table(Ident::new(R::table_name()));
                for (column, value) in values {
                    query.value(Ident::new(*column), value.clone());
                }
                query
                    .and_where(Expr::col(Ident::new(R::primary_key())).eq(pk))
                    .returning(Query::returning().columns(model_columns::<R>()));
                let (sql, bound) = query.build(PostgresQueryBuilder);
                log::debug!("update_or_create {}: updating existing row", def);
                R::from_row(&executor.query_one(&sql, &bound)?)
            }
            None => {
                let attributes = merge_attributes(criteria, values);
                insert_returning(executor, with_foreign_key(&attributes, foreign_key, parent_key))
            }
        }
    }

    // ---------------------------------------------------------------
    // BelongsToMany
    // ---------------------------------------------------------------

    /// Insert one pivot row, with extra pivot `attributes`.
    ///
    /// # Errors
    ///
    /// `WrongKind` unless `def` is `BelongsToMany`; `MissingKey` for an
    /// unsaved parent; executor failures.
    pub fn attach<Ex, P>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        id: impl Into<Value>,
        attributes: &[(&'static str, Value)],
    ) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
    {
        let pivot = expect_pivot("attach", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("attach", def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        self.insert_pivot_rows(executor, &pivot, &parent_key, &[id.into()], attributes)
    }

    /// Insert one pivot row per distinct id, in a single statement.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn attach_many<Ex, P, I, V>(&self, executor: &Ex, parent: &P, def: &RelationDef, ids: I) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pivot = expect_pivot("attach_many", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("attach_many", def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        let ids: KeySet = ids.into_iter().collect();
        self.insert_pivot_rows(executor, &pivot, &parent_key, ids.values(), &[])
    }

    /// Delete the pivot row for `id`, or every pivot row of `parent` for `None`.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn detach<Ex, P>(&self, executor: &Ex, parent: &P, def: &RelationDef, id: Option<Value>) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
    {
        let pivot = expect_pivot("detach", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("detach", def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        match id {
            Some(id) => delete_pivot_rows(executor, &pivot, &parent_key, Some(&[id])),
            None => delete_pivot_rows(executor, &pivot, &parent_key, None),
        }
    }

    /// Delete the pivot rows for `ids`; no statement for an empty list.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn detach_many<Ex, P, I, V>(&self, executor: &Ex, parent: &P, def: &RelationDef, ids: I) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let pivot = expect_pivot("detach_many", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("detach_many", def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        let ids: KeySet = ids.into_iter().collect();
        delete_pivot_rows(executor, &pivot, &parent_key, Some(ids.values()))
    }

    /// Related keys currently attached to `parent`, read fresh from the pivot.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn attached_ids<Ex, P>(&self, executor: &Ex, parent: &P, def: &RelationDef) -> Result<KeySet, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
    {
        let pivot = expect_pivot("attached_ids", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        let parent_key = key_value(parent, pivot.parent_key)?;
        current_attachments(executor, &pivot, &parent_key)
    }

    /// Make the attached set equal `desired`: detach the surplus, then attach
    /// the missing. Running it twice changes nothing the second time.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn sync<Ex, P, I, V>(&self, executor: &Ex, parent: &P, def: &RelationDef, desired: I) -> Result<SyncChanges, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let desired: KeySet = desired.into_iter().collect();
        self.apply_plan(executor, parent, def, "sync", |current| SyncChanges::plan(current, &desired))
    }

    /// Attach the members of `desired` that are missing; detach nothing.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn sync_without_detaching<Ex, P, I, V>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        desired: I,
    ) -> Result<SyncChanges, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let desired: KeySet = desired.into_iter().collect();
        self.apply_plan(executor, parent, def, "sync_without_detaching", |current| SyncChanges {
            detached: Vec::new(),
            ..SyncChanges::plan(current, &desired)
        })
    }

    /// Flip the membership of every id: attached ones are detached, the rest attached.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn toggle<Ex, P, I, V>(&self, executor: &Ex, parent: &P, def: &RelationDef, ids: I) -> Result<SyncChanges, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let ids: KeySet = ids.into_iter().collect();
        self.apply_plan(executor, parent, def, "toggle", |current| SyncChanges::toggle_plan(current, &ids))
    }

    /// Update extra columns of an existing pivot row.
    ///
    /// # Errors
    ///
    /// As [`attach`](Self::attach).
    pub fn update_existing_pivot<Ex, P>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        id: impl Into<Value>,
        attributes: &[(&'static str, Value)],
    ) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
    {
        let pivot = expect_pivot("update_existing_pivot", def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span("update_existing_pivot", def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        if attributes.is_empty() && !pivot.timestamps {
            return Ok(0);
        }
        let mut query = Query::update();
        query.table(Ident::new(pivot.table));
        for (column, value) in attributes {
            query.value(Ident::new(*column), value.clone());
        }
        if pivot.timestamps {
            query.value(Ident::new(self.updated_at_column.clone()), Expr::cust("CURRENT_TIMESTAMP"));
        }
        query
            .and_where(Expr::col(Ident::new(pivot.foreign_pivot_key)).eq(parent_key))
            .and_where(Expr::col(Ident::new(pivot.related_pivot_key)).eq(id.into()));
        let (sql, values) = query.build(PostgresQueryBuilder);
        executor.execute(&sql, &values)
    }

    fn apply_plan<Ex, P, F>(
        &self,
        executor: &Ex,
        parent: &P,
        def: &RelationDef,
        operation: &'static str,
        plan: F,
    ) -> Result<SyncChanges, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
        P: ModelTrait,
        F: FnOnce(&KeySet) -> SyncChanges,
    {
        let pivot = expect_pivot(operation, def)?;
        check_table(def, def.owner_table, P::table_name())?;
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::mutate_relation_span(operation, def.field).entered();

        let parent_key = key_value(parent, pivot.parent_key)?;
        let current = current_attachments(executor, &pivot, &parent_key)?;
        let changes = plan(&current);
        log::debug!(
            "{operation} {def}: {} attached, +{} -{}",
            current.len(),
            changes.attached.len(),
            changes.detached.len()
        );

        if !changes.detached.is_empty() {
            delete_pivot_rows(executor, &pivot, &parent_key, Some(&changes.detached))?;
        }
        if !changes.attached.is_empty() {
            self.insert_pivot_rows(executor, &pivot, &parent_key, &changes.attached, &[])?;
        }
        Ok(changes)
    }

    fn insert_pivot_rows<Ex>(
        &self,
        executor: &Ex,
        pivot: &PivotDef,
        parent_key: &Value,
        ids: &[Value],
        attributes: &[(&'static str, Value)],
    ) -> Result<u64, LifeError>
    where
        Ex: LifeExecutor + ?Sized,
    {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut columns = vec![
            Ident::new(pivot.foreign_pivot_key),
            Ident::new(pivot.related_pivot_key),
        ];
        columns.extend(attributes.iter().map(|(column, _)| Ident::new(*column)));
        if pivot.timestamps {
            columns.push(Ident::new(self.created_at_column.clone()));
            columns.push(Ident::new(self.updated_at_column.clone()));
        }

        let mut query = Query::insert();
        query.into_table(Ident::new(pivot.table)).columns(columns);
        for id in ids {
            let mut row: Vec<Expr> = vec![parent_key.clone().into(), id.clone().into()];
            row.extend(attributes.iter().map(|(_, value)| value.clone().into()));
            if pivot.timestamps {
                row.push(Expr::cust("CURRENT_TIMESTAMP"));
                row.push(Expr::cust("CURRENT_TIMESTAMP"));
            }
            query
                .values(row)
                .map_err(|e| LifeError::QueryError(format!("pivot insert into `{}`: {e}", pivot.table)))?;
        }
        let (sql, values) = query.build(PostgresQueryBuilder);
        let inserted = executor.execute(&sql, &values)?;
        #[cfg(feature = "metrics")]
        METRICS.record_pivot_change("attach", inserted);
        Ok(inserted)
    }
}

fn delete_pivot_rows<Ex>(
    executor: &Ex,
    pivot: &PivotDef,
    parent_key: &Value,
    ids: Option<&[Value]>,
) -> Result<u64, LifeError>
where
    Ex: LifeExecutor + ?Sized,
{
    let mut query = Query::delete();
    query
        .from_table(Ident::new(pivot.table))
        .and_where(Expr::col(Ident::new(pivot.foreign_pivot_key)).eq(parent_key.clone()));
    if let Some(ids) = ids {
        if ids.is_empty() {
            return Ok(0);
        }
        query.and_where(Expr::col(Ident::new(pivot.related_pivot_key)).is_in(ids.iter().cloned()));
    }
    let (sql, values) = query.build(PostgresQueryBuilder);
    let deleted = executor.execute(&sql, &values)?;
    #[cfg(feature = "metrics")]
    METRICS.record_pivot_change("detach", deleted);
    Ok(deleted)
}

fn current_attachments<Ex>(executor: &Ex, pivot: &PivotDef, parent_key: &Value) -> Result<KeySet, LifeError>
where
    Ex: LifeExecutor + ?Sized,
{
    let (sql, values) = Query::select()
        .column(Ident::new(pivot.related_pivot_key))
        .from(Ident::new(pivot.table))
        .and_where(Expr::col(Ident::new(pivot.foreign_pivot_key)).eq(parent_key.clone()))
        .build(PostgresQueryBuilder);
    let rows = executor.query_all(&sql, &values)?;

    let mut current = KeySet::new();
    for row in &rows {
        let value = row
            .get_value(pivot.related_pivot_key)
            .ok_or_else(|| RelationError::UnknownColumn {
                table: pivot.table,
                column: pivot.related_pivot_key.to_string(),
            })?;
        current.insert(value);
    }
    Ok(current)
}

fn set_foreign_key<Ex, C>(executor: &Ex, child: &mut C, foreign_key: &'static str, value: Value) -> Result<u64, LifeError>
where
    Ex: LifeExecutor + ?Sized,
    C: ModelTrait,
{
    let mut updated = child.clone();
    updated.set_by_column_name(foreign_key, value.clone())?;
    let pk = key_value(child, C::primary_key())?;

    let (sql, values) = Query::update()
        .table(Ident::new(C::table_name()))
        .value(Ident::new(foreign_key), value)
        .and_where(Expr::col(Ident::new(C::primary_key())).eq(pk))
        .build(PostgresQueryBuilder);
    let affected = executor.execute(&sql, &values)?;
    *child = updated;
    Ok(affected)
}

fn insert_returning<Ex, R>(executor: &Ex, attributes: Vec<(&'static str, Value)>) -> Result<R, LifeError>
where
    Ex: LifeExecutor + ?Sized,
    R: ModelTrait,
{
    let mut query = Query::insert();
    query
        .into_table(Ident::new(R::table_name()))
        .columns(attributes.iter().map(|(column, _)| Ident::new(*column)));
    query
        .values(attributes.into_iter().map(|(_, value)| value.into()))
        .map_err(|e| LifeError::QueryError(format!("insert into `{}`: {e}", R::table_name())))?;
    query.returning(Query::returning().columns(model_columns::<R>()));
    let (sql, values) = query.build(PostgresQueryBuilder);
    R::from_row(&executor.query_one(&sql, &values)?)
}

fn criteria_query<R: ModelTrait>(
    foreign_key: &'static str,
    parent_key: Value,
    criteria: &[(&'static str, Value)],
) -> SelectQuery<R> {
    criteria
        .iter()
        .fold(SelectQuery::<R>::new().filter_eq(foreign_key, parent_key), |query, (column, value)| {
            query.filter_eq(column, value.clone())
        })
}

/// `criteria` overridden by `values`, column order preserved.
fn merge_attributes(criteria: &[(&'static str, Value)], values: &[(&'static str, Value)]) -> Vec<(&'static str, Value)> {
    let mut merged: Vec<(&'static str, Value)> = criteria.to_vec();
    for (column, value) in values {
        match merged.iter_mut().find(|(existing, _)| existing == column) {
            Some(slot) => slot.1 = value.clone(),
            None => merged.push((column, value.clone())),
        }
    }
    merged
}

/// `attributes` with `foreign_key` forced to `parent_key`.
fn with_foreign_key(
    attributes: &[(&'static str, Value)],
    foreign_key: &'static str,
    parent_key: Value,
) -> Vec<(&'static str, Value)> {
    let mut merged: Vec<(&'static str, Value)> = attributes
        .iter()
        .filter(|(column, _)| *column != foreign_key)
        .cloned()
        .collect();
    merged.push((foreign_key, parent_key));
    merged
}

/// Non-null value of `column` on `entity`.
fn key_value<M: ModelTrait>(entity: &M, column: &'static str) -> Result<Value, RelationError> {
    let value = entity
        .get_by_column_name(column)
        .ok_or_else(|| RelationError::UnknownColumn {
            table: M::table_name(),
            column: column.to_string(),
        })?;
    if is_null(&value) {
        return Err(RelationError::MissingKey {
            table: M::table_name(),
            column,
        });
    }
    Ok(value)
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

fn check_tables<O: ModelTrait, R: ModelTrait>(def: &RelationDef) -> Result<(), RelationError> {
    check_table(def, def.owner_table, O::table_name())?;
    check_table(def, def.related_table, R::table_name())
}

fn wrong_kind(operation: &'static str, def: &RelationDef, expected: &'static [RelationType]) -> RelationError {
    RelationError::WrongKind {
        operation,
        field: def.field,
        expected,
        actual: def.rel_type(),
    }
}

fn expect_belongs_to(operation: &'static str, def: &RelationDef) -> Result<(&'static str, &'static str), RelationError> {
    match def.kind {
        RelationKind::BelongsTo { foreign_key, related_key } => Ok((foreign_key, related_key)),
        _ => Err(wrong_kind(operation, def, &[RelationType::BelongsTo])),
    }
}

fn expect_has(operation: &'static str, def: &RelationDef) -> Result<(&'static str, &'static str), RelationError> {
    match def.kind {
        RelationKind::HasOne { foreign_key, local_key } | RelationKind::HasMany { foreign_key, local_key } => {
            Ok((foreign_key, local_key))
        }
        _ => Err(wrong_kind(operation, def, &[RelationType::HasOne, RelationType::HasMany])),
    }
}

fn expect_pivot(operation: &'static str, def: &RelationDef) -> Result<PivotDef, RelationError> {
    match def.kind {
        RelationKind::BelongsToMany(pivot) => Ok(pivot),
        _ => Err(wrong_kind(operation, def, &[RelationType::BelongsToMany])),
    }
}
