//! Distributing loaded entities back onto their owners.
//!
//! Owners are matched to related entities through a key index built once per
//! batch, so distribution is linear in owners plus related rows.

use crate::model::ModelTrait;
use crate::relation::error::RelationError;
use crate::relation::keys::{key_of, Key};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// A field shape that can hold loaded related entities.
///
/// Singular relations use `Option<R>` (or `Option<Box<R>>`) and keep the first
/// match; plural relations collect every match.
pub trait RelationSlot<R>: Sized {
    /// Holds at most one entity.
    const SINGULAR: bool;

    fn fill(related: Vec<R>) -> Self;
}

impl<R> RelationSlot<R> for Option<R> {
    const SINGULAR: bool = true;

    fn fill(related: Vec<R>) -> Self {
        related.into_iter().next()
    }
}

impl<R> RelationSlot<R> for Option<Box<R>> {
    const SINGULAR: bool = true;

    fn fill(related: Vec<R>) -> Self {
        related.into_iter().next().map(Box::new)
    }
}

impl<R> RelationSlot<R> for Vec<R> {
    const SINGULAR: bool = false;

    fn fill(related: Vec<R>) -> Self {
        related
    }
}

impl<R: Eq + Hash> RelationSlot<R> for HashSet<R> {
    const SINGULAR: bool = false;

    fn fill(related: Vec<R>) -> Self {
        related.into_iter().collect()
    }
}

impl<R: Ord> RelationSlot<R> for BTreeSet<R> {
    const SINGULAR: bool = false;

    fn fill(related: Vec<R>) -> Self {
        related.into_iter().collect()
    }
}

/// Owner-side access to relation fields holding `R`.
///
/// Implemented by `#[derive(LifeModel)]` once per related type.
pub trait RelatedField<R> {
    /// Whether `field` names a relation field holding `R`.
    fn accepts_related_field(field: &str) -> bool;

    /// `Some(true)` when `field` holds a single entity, `Some(false)` for a
    /// collection, `None` when no such field holds `R`.
    fn related_field_is_singular(field: &str) -> Option<bool>;

    /// Replace the content of relation field `field`.
    ///
    /// # Errors
    ///
    /// `RelationError::UnknownField` if no such field holds `R`.
    fn assign_related(&mut self, field: &str, related: Vec<R>) -> Result<(), RelationError>;
}

/// Assign to each owner the related entities whose `related_key` equals the
/// owner's `owner_key`. Owners with a null key receive the empty shape.
///
/// # Errors
///
/// `UnknownColumn` for a missing key column, `UnknownField` from the owner.
pub fn populate_keyed<O, R>(
    owners: &mut [O],
    related: &[R],
    owner_key: &str,
    related_key: &str,
    field: &str,
) -> Result<(), RelationError>
where
    O: ModelTrait + RelatedField<R>,
    R: ModelTrait,
{
    let index = index_by(related, related_key)?;
    for owner in owners.iter_mut() {
        let matches = match key_of(owner, owner_key)? {
            Some(key) => collect(related, index.get(&key).map(Vec::as_slice)),
            None => Vec::new(),
        };
        owner.assign_related(field, matches)?;
    }
    Ok(())
}

/// Two-phase variant: owners reach related entities through `links`
/// (owner key to related keys, bridge order, deduplicated per owner).
///
/// # Errors
///
/// `UnknownColumn` for a missing key column, `UnknownField` from the owner.
pub fn populate_bridged<O, R>(
    owners: &mut [O],
    related: &[R],
    links: &HashMap<Key, Vec<Key>>,
    owner_key: &str,
    related_key: &str,
    field: &str,
) -> Result<(), RelationError>
where
    O: ModelTrait + RelatedField<R>,
    R: ModelTrait,
{
    let index = index_by(related, related_key)?;
    for owner in owners.iter_mut() {
        let mut matches = Vec::new();
        if let Some(targets) = key_of(owner, owner_key)?.and_then(|key| links.get(&key)) {
            for target in targets {
                matches.extend(collect(related, index.get(target).map(Vec::as_slice)));
            }
        }
        owner.assign_related(field, matches)?;
    }
    Ok(())
}

fn index_by<R: ModelTrait>(related: &[R], column: &str) -> Result<HashMap<Key, Vec<usize>>, RelationError> {
    let mut index: HashMap<Key, Vec<usize>> = HashMap::new();
    for (position, entity) in related.iter().enumerate() {
        if let Some(key) = key_of(entity, column)? {
            index.entry(key).or_default().push(position);
        }
    }
    Ok(index)
}

fn collect<R: Clone>(related: &[R], positions: Option<&[usize]>) -> Vec<R> {
    positions
        .unwrap_or_default()
        .iter()
        .map(|&position| related[position].clone())
        .collect()
}
