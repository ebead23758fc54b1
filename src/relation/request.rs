//! Eager-load requests.
//!
//! A request tree says which relations to load and how: each [`Load`] node
//! names a relation definition, an optional query constraint and nested loads
//! for the related entities. Trees are built in code or from dot paths such as
//! `"posts.comments"`; shared prefixes merge into one node, so `"posts"` and
//! `"posts.comments"` together still load `posts` once.

use crate::executor::{LifeError, LifeExecutor};
use crate::model::ModelTrait;
use crate::query::SelectQuery;
use crate::relation::def::RelationDef;
use crate::relation::eager::EagerLoader;
use crate::relation::error::RelationError;
use crate::relation::populate::RelatedField;
use crate::row::same_column_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Query refinement applied to a relation's batched SELECT.
pub type Constraint<R> = Arc<dyn Fn(SelectQuery<R>) -> SelectQuery<R> + Send + Sync>;

/// One node of a request tree, erased over the related type.
pub trait EagerLoad<O> {
    fn def(&self) -> &RelationDef;

    /// Load this relation (and its nested loads) into `owners`.
    ///
    /// # Errors
    ///
    /// Relation errors and executor failures, unchanged.
    fn load(
        &self,
        loader: &EagerLoader,
        owners: &mut [O],
        executor: &dyn LifeExecutor,
    ) -> Result<(), LifeError>;

    /// Merge a dot path into this node's nested loads.
    ///
    /// # Errors
    ///
    /// `RelationError::UnknownRelation` if a segment names no relation.
    fn nest_path(&mut self, path: &str) -> Result<(), RelationError>;

    /// Nodes in this subtree, this one included.
    fn node_count(&self) -> usize;
}

/// Resolves relation names to request nodes. Implemented by `#[derive(LifeModel)]`.
pub trait WithRelations: Sized {
    /// Request node for the relation field `name` (`snake_case` or `camelCase`).
    fn load_request(name: &str) -> Option<Box<dyn EagerLoad<Self>>>;
}

/// Load relation `def` from owners `O` into related entities `R`.
pub struct Load<O, R> {
    def: RelationDef,
    constraint: Option<Constraint<R>>,
    nested: Vec<Box<dyn EagerLoad<R>>>,
    _owner: PhantomData<fn(&mut O)>,
}

impl<O, R> Load<O, R>
where
    O: ModelTrait + RelatedField<R>,
    R: ModelTrait + WithRelations,
{
    pub fn new(def: RelationDef) -> Self {
        Self {
            def,
            constraint: None,
            nested: Vec::new(),
            _owner: PhantomData,
        }
    }

    /// Refine the related query (filters, ordering, limits).
    pub fn constrain<F>(mut self, constraint: F) -> Self
    where
        F: Fn(SelectQuery<R>) -> SelectQuery<R> + Send + Sync + 'static,
    {
        self.constraint = Some(Arc::new(constraint));
        self
    }

    /// Load `nested` on the related entities once they are fetched.
    pub fn with<L>(mut self, nested: L) -> Self
    where
        L: EagerLoad<R> + 'static,
    {
        self.nested.push(Box::new(nested));
        self
    }

    pub fn with_boxed(mut self, nested: Box<dyn EagerLoad<R>>) -> Self {
        self.nested.push(nested);
        self
    }

    /// Add nested loads by dot path, relative to `R`.
    ///
    /// # Errors
    ///
    /// `RelationError::UnknownRelation` if a segment names no relation.
    pub fn with_path(mut self, path: &str) -> Result<Self, RelationError> {
        merge_path(&mut self.nested, path)?;
        Ok(self)
    }

    pub fn constraint(&self) -> Option<&Constraint<R>> {
        self.constraint.as_ref()
    }

    pub fn nested(&self) -> &[Box<dyn EagerLoad<R>>] {
        &self.nested
    }

    pub fn boxed(self) -> Box<dyn EagerLoad<O>>
    where
        O: 'static,
    {
        Box::new(self)
    }
}

impl<O, R> EagerLoad<O> for Load<O, R>
where
    O: ModelTrait + RelatedField<R>,
    R: ModelTrait + WithRelations,
{
    fn def(&self) -> &RelationDef {
        &self.def
    }

    fn load(
        &self,
        loader: &EagerLoader,
        owners: &mut [O],
        executor: &dyn LifeExecutor,
    ) -> Result<(), LifeError> {
        loader.load_node(&self.def, self.constraint.as_ref(), &self.nested, owners, executor)
    }

    fn nest_path(&mut self, path: &str) -> Result<(), RelationError> {
        merge_path(&mut self.nested, path)
    }

    fn node_count(&self) -> usize {
        1 + self.nested.iter().map(|n| n.node_count()).sum::<usize>()
    }
}

impl<O, R> fmt::Debug for Load<O, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Load")
            .field("def", &self.def)
            .field("constrained", &self.constraint.is_some())
            .field("nested", &self.nested.len())
            .finish()
    }
}

/// Root of a request tree for owners `O`.
pub struct LoadTree<O> {
    roots: Vec<Box<dyn EagerLoad<O>>>,
}

impl<O> LoadTree<O> {
    pub fn new() -> Self {
        Self { roots: Vec::new() }
    }

    pub fn with<L>(mut self, load: L) -> Self
    where
        L: EagerLoad<O> + 'static,
    {
        self.roots.push(Box::new(load));
        self
    }

    pub fn push(&mut self, load: Box<dyn EagerLoad<O>>) {
        self.roots.push(load);
    }

    pub fn roots(&self) -> &[Box<dyn EagerLoad<O>>] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Nodes in the whole tree; an upper bound on the SELECTs for direct kinds.
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(|n| n.node_count()).sum()
    }
}

impl<O: WithRelations> LoadTree<O> {
    /// Add loads by dot path (`"posts"`, `"posts.comments"`).
    ///
    /// # Errors
    ///
    /// `RelationError::UnknownRelation` if a segment names no relation.
    pub fn with_path(mut self, path: &str) -> Result<Self, RelationError> {
        merge_path(&mut self.roots, path)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// `RelationError::UnknownRelation` if a segment names no relation.
    pub fn from_paths(paths: &[&str]) -> Result<Self, RelationError> {
        paths
            .iter()
            .try_fold(Self::new(), |tree, path| tree.with_path(path))
    }
}

impl<O> Default for LoadTree<O> {
    fn default() -> Self {
        Self::new()
    }
}

fn merge_path<O: WithRelations>(
    nodes: &mut Vec<Box<dyn EagerLoad<O>>>,
    path: &str,
) -> Result<(), RelationError> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head.trim(), Some(rest)),
        None => (path.trim(), None),
    };
    let unknown = || RelationError::UnknownRelation {
        entity: std::any::type_name::<O>(),
        path: path.to_string(),
    };
    if head.is_empty() {
        return Err(unknown());
    }

    let index = match nodes
        .iter()
        .position(|node| same_column_name(node.def().field, head))
    {
        Some(index) => index,
        None => {
            nodes.push(O::load_request(head).ok_or_else(unknown)?);
            nodes.len() - 1
        }
    };
    match rest {
        Some(rest) => nodes[index].nest_path(rest),
        None => Ok(()),
    }
}
