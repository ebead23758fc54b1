//! Relation module for entity relationships.
//!
//! - **Def**: relation definitions (`RelationDef`, `RelationKind`, `PivotDef`, `ThroughDef`)
//! - **Request**: eager-load request trees (`Load`, `LoadTree`, dot paths)
//! - **Eager**: the batched loader (`EagerLoader`)
//! - **Populate**: relation field shapes and owner-side assignment
//! - **Manager**: relation mutations (`RelationshipManager`)
//! - **Keys** / **Batch**: key normalization and the batched SQL

pub mod batch;
pub mod def;
pub mod eager;
pub mod error;
pub mod keys;
pub mod manager;
pub mod populate;
pub mod request;

#[doc(inline)]
pub use def::{Aggregate, Bridge, PivotDef, RelationDef, RelationKind, RelationType, ThroughDef};
#[doc(inline)]
pub use eager::{load_relations, EagerLoader};
#[doc(inline)]
pub use error::RelationError;
#[doc(inline)]
pub use keys::{extract_keys, Key, KeySet};
#[doc(inline)]
pub use manager::{RelationshipManager, SyncChanges};
#[doc(inline)]
pub use populate::{RelatedField, RelationSlot};
#[doc(inline)]
pub use request::{Constraint, EagerLoad, Load, LoadTree, WithRelations};
