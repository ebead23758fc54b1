//! Relation definitions.
//!
//! A [`RelationDef`] is plain `Copy` data naming the owner table, the related
//! table, the relation kind and the key columns. Definitions are usually
//! `const` items next to the model they belong to and are shared by the eager
//! loader and the [`RelationshipManager`](crate::RelationshipManager).
//!
//! # Example
//!
//! ```
//! use lifeline::relation::{PivotDef, RelationDef, RelationType, ThroughDef};
//!
//! pub const USER_POSTS: RelationDef =
//!     RelationDef::has_many("posts", "users", "posts", "user_id", "id");
//! pub const USER_ROLES: RelationDef = RelationDef::belongs_to_many(
//!     "roles",
//!     "users",
//!     "roles",
//!     PivotDef::new("role_user", "user_id", "role_id").with_timestamps(),
//! );
//! pub const COUNTRY_POSTS: RelationDef = RelationDef::has_many_through(
//!     "posts",
//!     "countries",
//!     "posts",
//!     ThroughDef::new("users", "country_id", "user_id"),
//! );
//!
//! assert_eq!(USER_POSTS.rel_type(), RelationType::HasMany);
//! assert!(USER_ROLES.kind.bridge().is_some());
//! ```

use std::fmt;

/// The fourteen relation kinds, without their key data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationType {
    HasOne,
    HasMany,
    /// Newest related row per owner, by a sort column
    LatestOfMany,
    /// Oldest related row per owner, by a sort column
    OldestOfMany,
    /// Related row per owner with the max/min of a column
    OfMany,
    BelongsTo,
    /// Many-to-many through a pivot table
    BelongsToMany,
    HasOneThrough,
    HasManyThrough,
    MorphOne,
    MorphMany,
    MorphTo,
    MorphToMany,
    MorphedByMany,
}

impl RelationType {
    /// Whether the owner field holds at most one related entity.
    pub const fn is_singular(self) -> bool {
        matches!(
            self,
            RelationType::HasOne
                | RelationType::LatestOfMany
                | RelationType::OldestOfMany
                | RelationType::OfMany
                | RelationType::BelongsTo
                | RelationType::HasOneThrough
                | RelationType::MorphOne
                | RelationType::MorphTo
        )
    }

    pub const fn is_morph(self) -> bool {
        matches!(
            self,
            RelationType::MorphOne
                | RelationType::MorphMany
                | RelationType::MorphTo
                | RelationType::MorphToMany
                | RelationType::MorphedByMany
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RelationType::HasOne => "has_one",
            RelationType::HasMany => "has_many",
            RelationType::LatestOfMany => "latest_of_many",
            RelationType::OldestOfMany => "oldest_of_many",
            RelationType::OfMany => "of_many",
            RelationType::BelongsTo => "belongs_to",
            RelationType::BelongsToMany => "belongs_to_many",
            RelationType::HasOneThrough => "has_one_through",
            RelationType::HasManyThrough => "has_many_through",
            RelationType::MorphOne => "morph_one",
            RelationType::MorphMany => "morph_many",
            RelationType::MorphTo => "morph_to",
            RelationType::MorphToMany => "morph_to_many",
            RelationType::MorphedByMany => "morphed_by_many",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which end of the `OfMany` aggregate wins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregate {
    Max,
    Min,
}

/// Pivot table of a many-to-many relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PivotDef {
    pub table: &'static str,
    /// Pivot column referencing the owner
    pub foreign_pivot_key: &'static str,
    /// Pivot column referencing the related entity
    pub related_pivot_key: &'static str,
    /// Owner column the pivot references (default `id`)
    pub parent_key: &'static str,
    /// Related column the pivot references (default `id`)
    pub related_key: &'static str,
    /// Pivot rows carry created/updated timestamp columns
    pub timestamps: bool,
}

impl PivotDef {
    pub const fn new(
        table: &'static str,
        foreign_pivot_key: &'static str,
        related_pivot_key: &'static str,
    ) -> Self {
        Self {
            table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key: "id",
            related_key: "id",
            timestamps: false,
        }
    }

    pub const fn parent_key(mut self, key: &'static str) -> Self {
        self.parent_key = key;
        self
    }

    pub const fn related_key(mut self, key: &'static str) -> Self {
        self.related_key = key;
        self
    }

    pub const fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }

    pub const fn bridge(&self) -> Bridge {
        Bridge {
            table: self.table,
            owner_column: self.foreign_pivot_key,
            related_column: self.related_pivot_key,
            owner_key: self.parent_key,
            related_key: self.related_key,
        }
    }
}

/// Intermediate table of a has-one/has-many-through relation.
///
/// Owner `local_key` = through `first_key`; through `second_local_key` =
/// related `second_key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThroughDef {
    pub table: &'static str,
    /// Through column referencing the owner
    pub first_key: &'static str,
    /// Related column referencing the through row
    pub second_key: &'static str,
    /// Owner column referenced by `first_key` (default `id`)
    pub local_key: &'static str,
    /// Through column referenced by `second_key` (default `id`)
    pub second_local_key: &'static str,
}

impl ThroughDef {
    pub const fn new(table: &'static str, first_key: &'static str, second_key: &'static str) -> Self {
        Self {
            table,
            first_key,
            second_key,
            local_key: "id",
            second_local_key: "id",
        }
    }

    pub const fn local_key(mut self, key: &'static str) -> Self {
        self.local_key = key;
        self
    }

    pub const fn second_local_key(mut self, key: &'static str) -> Self {
        self.second_local_key = key;
        self
    }

    pub const fn bridge(&self) -> Bridge {
        Bridge {
            table: self.table,
            owner_column: self.first_key,
            related_column: self.second_local_key,
            owner_key: self.local_key,
            related_key: self.second_key,
        }
    }
}

/// The shape shared by pivot and through tables for two-phase loading.
///
/// Phase one reads `(owner_column, related_column)` pairs from `table` for the
/// owners' `owner_key` values; phase two selects related rows whose
/// `related_key` is among the collected `related_column` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bridge {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub related_column: &'static str,
    pub owner_key: &'static str,
    pub related_key: &'static str,
}

/// Relation kind with its key columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    HasOne {
        foreign_key: &'static str,
        local_key: &'static str,
    },
    HasMany {
        foreign_key: &'static str,
        local_key: &'static str,
    },
    LatestOfMany {
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
    },
    OldestOfMany {
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
    },
    OfMany {
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
        aggregate: Aggregate,
    },
    /// `foreign_key` lives on the owner, `related_key` on the related table
    BelongsTo {
        foreign_key: &'static str,
        related_key: &'static str,
    },
    BelongsToMany(PivotDef),
    HasOneThrough(ThroughDef),
    HasManyThrough(ThroughDef),
    MorphOne { name: &'static str },
    MorphMany { name: &'static str },
    MorphTo { name: &'static str },
    MorphToMany { name: &'static str },
    MorphedByMany { name: &'static str },
}

impl RelationKind {
    pub const fn rel_type(&self) -> RelationType {
        match self {
            RelationKind::HasOne { .. } => RelationType::HasOne,
            RelationKind::HasMany { .. } => RelationType::HasMany,
            RelationKind::LatestOfMany { .. } => RelationType::LatestOfMany,
            RelationKind::OldestOfMany { .. } => RelationType::OldestOfMany,
            RelationKind::OfMany { .. } => RelationType::OfMany,
            RelationKind::BelongsTo { .. } => RelationType::BelongsTo,
            RelationKind::BelongsToMany(_) => RelationType::BelongsToMany,
            RelationKind::HasOneThrough(_) => RelationType::HasOneThrough,
            RelationKind::HasManyThrough(_) => RelationType::HasManyThrough,
            RelationKind::MorphOne { .. } => RelationType::MorphOne,
            RelationKind::MorphMany { .. } => RelationType::MorphMany,
            RelationKind::MorphTo { .. } => RelationType::MorphTo,
            RelationKind::MorphToMany { .. } => RelationType::MorphToMany,
            RelationKind::MorphedByMany { .. } => RelationType::MorphedByMany,
        }
    }

    /// Intermediate table for pivot and through kinds.
    pub const fn bridge(&self) -> Option<Bridge> {
        match self {
            RelationKind::BelongsToMany(pivot) => Some(pivot.bridge()),
            RelationKind::HasOneThrough(through) | RelationKind::HasManyThrough(through) => {
                Some(through.bridge())
            }
            _ => None,
        }
    }
}

/// A named relation from `owner_table` to `related_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationDef {
    /// Field on the owner struct the loaded entities land in
    pub field: &'static str,
    pub owner_table: &'static str,
    pub related_table: &'static str,
    pub kind: RelationKind,
}

impl RelationDef {
    pub const fn new(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        kind: RelationKind,
    ) -> Self {
        Self {
            field,
            owner_table,
            related_table,
            kind,
        }
    }

    /// Related rows carry `foreign_key` pointing at the owner's `local_key`.
    pub const fn has_one(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        local_key: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::HasOne { foreign_key, local_key })
    }

    pub const fn has_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        local_key: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::HasMany { foreign_key, local_key })
    }

    pub const fn latest_of_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
    ) -> Self {
        Self::new(
            field,
            owner_table,
            related_table,
            RelationKind::LatestOfMany { foreign_key, local_key, column },
        )
    }

    pub const fn oldest_of_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
    ) -> Self {
        Self::new(
            field,
            owner_table,
            related_table,
            RelationKind::OldestOfMany { foreign_key, local_key, column },
        )
    }

    pub const fn of_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        local_key: &'static str,
        column: &'static str,
        aggregate: Aggregate,
    ) -> Self {
        Self::new(
            field,
            owner_table,
            related_table,
            RelationKind::OfMany { foreign_key, local_key, column, aggregate },
        )
    }

    /// The owner carries `foreign_key` pointing at the related `related_key`.
    pub const fn belongs_to(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        foreign_key: &'static str,
        related_key: &'static str,
    ) -> Self {
        Self::new(
            field,
            owner_table,
            related_table,
            RelationKind::BelongsTo { foreign_key, related_key },
        )
    }

    pub const fn belongs_to_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        pivot: PivotDef,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::BelongsToMany(pivot))
    }

    pub const fn has_one_through(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        through: ThroughDef,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::HasOneThrough(through))
    }

    pub const fn has_many_through(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        through: ThroughDef,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::HasManyThrough(through))
    }

    pub const fn morph_one(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        name: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::MorphOne { name })
    }

    pub const fn morph_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        name: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::MorphMany { name })
    }

    pub const fn morph_to(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        name: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::MorphTo { name })
    }

    pub const fn morph_to_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        name: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::MorphToMany { name })
    }

    pub const fn morphed_by_many(
        field: &'static str,
        owner_table: &'static str,
        related_table: &'static str,
        name: &'static str,
    ) -> Self {
        Self::new(field, owner_table, related_table, RelationKind::MorphedByMany { name })
    }

    pub const fn rel_type(&self) -> RelationType {
        self.kind.rel_type()
    }
}

impl fmt::Display for RelationDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} ({} -> {})",
            self.owner_table,
            self.field,
            self.rel_type(),
            self.related_table
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LATEST: RelationDef =
        RelationDef::latest_of_many("latest_post", "users", "posts", "user_id", "id", "created_at");

    #[test]
    fn test_rel_type_follows_kind() {
        assert_eq!(LATEST.rel_type(), RelationType::LatestOfMany);
        let def = RelationDef::morph_many("comments", "posts", "comments", "commentable");
        assert_eq!(def.rel_type(), RelationType::MorphMany);
        assert!(def.rel_type().is_morph());
        assert!(!RelationType::HasMany.is_morph());
    }

    #[test]
    fn test_singular_kinds() {
        for ty in [
            RelationType::HasOne,
            RelationType::LatestOfMany,
            RelationType::OldestOfMany,
            RelationType::OfMany,
            RelationType::BelongsTo,
            RelationType::HasOneThrough,
        ] {
            assert!(ty.is_singular(), "{ty}");
        }
        for ty in [
            RelationType::HasMany,
            RelationType::BelongsToMany,
            RelationType::HasManyThrough,
        ] {
            assert!(!ty.is_singular(), "{ty}");
        }
    }

    #[test]
    fn test_pivot_bridge() {
        let pivot = PivotDef::new("role_user", "user_id", "role_id").related_key("uuid");
        let bridge = RelationDef::belongs_to_many("roles", "users", "roles", pivot)
            .kind
            .bridge()
            .unwrap();
        assert_eq!(bridge.table, "role_user");
        assert_eq!(bridge.owner_column, "user_id");
        assert_eq!(bridge.related_column, "role_id");
        assert_eq!(bridge.owner_key, "id");
        assert_eq!(bridge.related_key, "uuid");
    }

    #[test]
    fn test_through_bridge() {
        let through = ThroughDef::new("users", "country_id", "user_id");
        let bridge = through.bridge();
        assert_eq!(bridge.table, "users");
        assert_eq!(bridge.owner_column, "country_id");
        assert_eq!(bridge.related_column, "id");
        assert_eq!(bridge.owner_key, "id");
        assert_eq!(bridge.related_key, "user_id");
    }

    #[test]
    fn test_direct_kinds_have_no_bridge() {
        assert!(LATEST.kind.bridge().is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(LATEST.to_string(), "users.latest_post (latest_of_many -> posts)");
    }
}
