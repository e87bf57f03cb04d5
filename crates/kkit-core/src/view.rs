//! # Entity Views
//!
//! Read-only snapshots of the entities the writer formats. Each `read`
//! performs the typed field reads for one entity; the graph is never
//! touched for writing.

use crate::graph::ModelGraph;
use crate::{EntityId, EntityKind, KkitError, Relation};

/// Parent of a non-root entity.
pub(crate) fn require_parent<G: ModelGraph + ?Sized>(
    graph: &G,
    id: EntityId,
) -> Result<EntityId, KkitError> {
    graph.parent(id)?.ok_or_else(|| {
        KkitError::InvalidModel(format!("entity {} has no parent", id))
    })
}

/// A chemical compartment (`ChemCompt`).
#[derive(Debug, Clone, PartialEq)]
pub struct CompartmentView {
    pub id: EntityId,
    pub name: String,
    pub path: String,
    pub volume: f64,
    pub dimensions: u32,
}

impl CompartmentView {
    pub fn read<G: ModelGraph + ?Sized>(graph: &G, id: EntityId) -> Result<Self, KkitError> {
        Ok(Self {
            id,
            name: graph.name(id)?,
            path: graph.path(id)?,
            volume: graph.get_f64(id, "volume")?,
            dimensions: graph.get_u32(id, "numDimensions")?,
        })
    }
}

/// A molecular pool (`PoolBase`).
#[derive(Debug, Clone, PartialEq)]
pub struct PoolView {
    pub id: EntityId,
    pub name: String,
    pub path: String,
    pub parent_name: String,
    pub parent_kind: EntityKind,
    pub diff_const: f64,
    pub conc_init: f64,
    pub conc: f64,
    pub n_init: f64,
    pub n: f64,
    pub volume: f64,
}

impl PoolView {
    pub fn read<G: ModelGraph + ?Sized>(graph: &G, id: EntityId) -> Result<Self, KkitError> {
        let parent = require_parent(graph, id)?;
        Ok(Self {
            id,
            name: graph.name(id)?,
            path: graph.path(id)?,
            parent_name: graph.name(parent)?,
            parent_kind: graph.kind(parent)?,
            diff_const: graph.get_f64(id, "diffConst")?,
            conc_init: graph.get_f64(id, "concInit")?,
            conc: graph.get_f64(id, "conc")?,
            n_init: graph.get_f64(id, "nInit")?,
            n: graph.get_f64(id, "n")?,
            volume: graph.get_f64(id, "volume")?,
        })
    }

    /// Pools under an enzyme are its enzyme-substrate complex and belong to
    /// the enzyme's own record.
    #[must_use]
    pub fn is_enzyme_complex(&self) -> bool {
        self.parent_kind.is_enzyme()
    }
}

/// A mass-action reaction (`ReacBase`).
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionView {
    pub id: EntityId,
    pub name: String,
    pub path: String,
    pub parent_name: String,
    pub kf: f64,
    pub kb: f64,
}

impl ReactionView {
    pub fn read<G: ModelGraph + ?Sized>(graph: &G, id: EntityId) -> Result<Self, KkitError> {
        let parent = require_parent(graph, id)?;
        Ok(Self {
            id,
            name: graph.name(id)?,
            path: graph.path(id)?,
            parent_name: graph.name(parent)?,
            kf: graph.get_f64(id, "kf")?,
            kb: graph.get_f64(id, "kb")?,
        })
    }
}

/// A recorder table and the pools it observes.
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub id: EntityId,
    pub path: String,
    pub sources: Vec<EntityId>,
}

impl TableView {
    pub fn read<G: ModelGraph + ?Sized>(graph: &G, id: EntityId) -> Result<Self, KkitError> {
        Ok(Self {
            id,
            path: graph.path(id)?,
            sources: graph.related(id, Relation::RequestOut)?,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
