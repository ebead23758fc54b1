//! Relation errors.

use crate::relation::def::RelationType;
use std::fmt;

/// Failures raised by relation definitions, relation fields and key columns.
///
/// Every variant is detected before any SQL for the offending relation is
/// issued, except `UnknownColumn` on rows coming back from the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationError {
    /// The relation kind is modelled but cannot be loaded or mutated
    UnsupportedKind {
        field: &'static str,
        rel_type: RelationType,
    },
    /// A mutation was called with a relation of the wrong kind
    WrongKind {
        operation: &'static str,
        field: &'static str,
        expected: &'static [RelationType],
        actual: RelationType,
    },
    /// The owner entity has no relation field with this name
    UnknownField { entity: &'static str, field: String },
    /// An entity or bridge row lacks a key column
    UnknownColumn { table: &'static str, column: String },
    /// A load path segment names no relation of the entity
    UnknownRelation { entity: &'static str, path: String },
    /// The definition's table does not match the entity it was applied to
    TableMismatch {
        field: &'static str,
        expected: &'static str,
        actual: &'static str,
    },
    /// A singular kind loaded into a collection field, or a plural kind into
    /// an `Option` field
    ShapeMismatch {
        entity: &'static str,
        field: &'static str,
        rel_type: RelationType,
    },
    /// A key a mutation depends on is null (typically an unsaved parent)
    MissingKey {
        table: &'static str,
        column: &'static str,
    },
}

impl fmt::Display for RelationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationError::UnsupportedKind { field, rel_type } => {
                write!(f, "relation `{field}`: {rel_type} relations are not supported")
            }
            RelationError::WrongKind {
                operation,
                field,
                expected,
                actual,
            } => {
                let expected = expected
                    .iter()
                    .map(|t| t.as_str())
                    .collect::<Vec<_>>()
                    .join(" or ");
                write!(
                    f,
                    "{operation} requires a {expected} relation, `{field}` is {actual}"
                )
            }
            RelationError::UnknownField { entity, field } => {
                write!(f, "`{entity}` has no relation field `{field}`")
            }
            RelationError::UnknownColumn { table, column } => {
                write!(f, "`{table}` has no column `{column}`")
            }
            RelationError::UnknownRelation { entity, path } => {
                write!(f, "`{entity}` has no relation matching path `{path}`")
            }
            RelationError::TableMismatch {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "relation `{field}` is defined for `{expected}` but was applied to `{actual}`"
                )
            }
            RelationError::ShapeMismatch {
                entity,
                field,
                rel_type,
            } => {
                let expected = if rel_type.is_singular() {
                    "an `Option` field"
                } else {
                    "a collection field"
                };
                write!(f, "`{entity}.{field}` is a {rel_type} relation and needs {expected}")
            }
            RelationError::MissingKey { table, column } => {
                write!(f, "`{table}.{column}` is null")
            }
        }
    }
}

impl std::error::Error for RelationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_kind_lists_expected_kinds() {
        let err = RelationError::WrongKind {
            operation: "save",
            field: "roles",
            expected: &[RelationType::HasOne, RelationType::HasMany],
            actual: RelationType::BelongsToMany,
        };
        assert_eq!(
            err.to_string(),
            "save requires a has_one or has_many relation, `roles` is belongs_to_many"
        );
    }

    #[test]
    fn test_unsupported_kind_display() {
        let err = RelationError::UnsupportedKind {
            field: "image",
            rel_type: RelationType::MorphOne,
        };
        assert!(err.to_string().contains("morph_one"));
    }

    #[test]
    fn test_shape_mismatch_names_expected_shape() {
        let err = RelationError::ShapeMismatch {
            entity: "users",
            field: "first_post",
            rel_type: RelationType::HasMany,
        };
        assert_eq!(
            err.to_string(),
            "`users.first_post` is a has_many relation and needs a collection field"
        );
    }
}
