//! # Message Directives
//!
//! kkit files wire entities together with explicit `addmsg` lines. The model
//! graph only carries references (reaction -> substrate/product pools,
//! recorder -> observed pool), so the writer derives the directives from
//! them.
//!
//! ## Paths
//!
//! Directives use parent-relative paths: `/<parent name>/<name>`, built from
//! the structural parent link. Recorder paths start at their graph
//! namespace segment (`/graphs/...` or `/moregraphs/...`).
//!
//! ## Order
//!
//! Substrates before products; within each group the graph's edge order.
//! Directives are written in the order they were collected.

use crate::graph::ModelGraph;
use crate::primitives::GRAPH_NAMESPACES;
use crate::view::require_parent;
use crate::{EntityId, KkitError, Relation};
use std::fmt;
use std::io;

// =============================================================================
// DIRECTIVES
// =============================================================================

/// One `addmsg` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Pool count feeds the reaction as a substrate.
    Substrate { pool: String, reaction: String },
    /// Pool count feeds the reaction as a product.
    Product { pool: String, reaction: String },
    /// Reaction rate acts back on a pool. `forward` for substrates
    /// (`REAC A B`), reversed for products (`REAC B A`).
    ReacEffect {
        reaction: String,
        pool: String,
        forward: bool,
    },
    /// Pool concentration is plotted by a recorder.
    Plot {
        pool: String,
        table: String,
        pool_name: String,
        color: String,
    },
}

impl Directive {
    /// Message type keyword.
    #[must_use]
    pub const fn message_type(&self) -> &'static str {
        match self {
            Self::Substrate { .. } => "SUBSTRATE",
            Self::Product { .. } => "PRODUCT",
            Self::ReacEffect { .. } => "REAC",
            Self::Plot { .. } => "PLOT",
        }
    }

    #[must_use]
    pub fn source(&self) -> &str {
        match self {
            Self::Substrate { pool, .. } | Self::Product { pool, .. } | Self::Plot { pool, .. } => {
                pool
            }
            Self::ReacEffect { reaction, .. } => reaction,
        }
    }

    #[must_use]
    pub fn destination(&self) -> &str {
        match self {
            Self::Substrate { reaction, .. } | Self::Product { reaction, .. } => reaction,
            Self::ReacEffect { pool, .. } => pool,
            Self::Plot { table, .. } => table,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "addmsg {} {} {}",
            self.source(),
            self.destination(),
            self.message_type()
        )?;
        match self {
            Self::Substrate { .. } | Self::Product { .. } => f.write_str(" n"),
            Self::ReacEffect { forward: true, .. } => f.write_str(" A B"),
            Self::ReacEffect { forward: false, .. } => f.write_str(" B A"),
            Self::Plot {
                pool_name, color, ..
            } => write!(f, " Co *{} *{}", pool_name, color),
        }
    }
}

// =============================================================================
// PATH RENDERING
// =============================================================================

/// `/<parent name>/<name>` of an entity.
pub fn relative_path<G: ModelGraph + ?Sized>(graph: &G, id: EntityId) -> Result<String, KkitError> {
    let parent = require_parent(graph, id)?;
    Ok(format!("/{}/{}", graph.name(parent)?, graph.name(id)?))
}

/// Render a recorder path from its graph namespace.
///
/// `graphs` is searched first, then `moregraphs`; the match is on whole
/// path segments. `None` means the recorder is outside both namespaces.
#[must_use]
pub fn graph_namespace_path(path: &str) -> Option<String> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    GRAPH_NAMESPACES.iter().find_map(|namespace| {
        segments
            .iter()
            .position(|s| s == namespace)
            .map(|start| format!("/{}", segments[start..].join("/")))
    })
}

// =============================================================================
// DERIVATION
// =============================================================================

/// Directives implied by one reaction: two per substrate, then two per
/// product.
pub fn reaction_links<G: ModelGraph + ?Sized>(
    graph: &G,
    reaction: EntityId,
) -> Result<Vec<Directive>, KkitError> {
    let reac_path = relative_path(graph, reaction)?;
    let mut links = Vec::new();

    for sub in graph.related(reaction, Relation::Sub)? {
        let pool = relative_path(graph, sub)?;
        links.push(Directive::Substrate {
            pool: pool.clone(),
            reaction: reac_path.clone(),
        });
        links.push(Directive::ReacEffect {
            reaction: reac_path.clone(),
            pool,
            forward: true,
        });
    }
    for prd in graph.related(reaction, Relation::Prd)? {
        let pool = relative_path(graph, prd)?;
        links.push(Directive::Product {
            pool: pool.clone(),
            reaction: reac_path.clone(),
        });
        links.push(Directive::ReacEffect {
            reaction: reac_path.clone(),
            pool,
            forward: false,
        });
    }
    Ok(links)
}

/// The `PLOT` directive for one (recorder, observed pool) pair, or `None`
/// when the recorder is outside the graph namespaces.
pub fn recorder_link<G: ModelGraph + ?Sized>(
    graph: &G,
    table_path: &str,
    pool: EntityId,
    color: &str,
) -> Result<Option<Directive>, KkitError> {
    let Some(table) = graph_namespace_path(table_path) else {
        return Ok(None);
    };
    Ok(Some(Directive::Plot {
        pool: relative_path(graph, pool)?,
        table,
        pool_name: graph.name(pool)?,
        color: color.to_string(),
    }))
}

// =============================================================================
// COLLECTOR
// =============================================================================

/// Append-only list of directives for one export.
#[derive(Debug, Clone, Default)]
pub struct ConnectionCollector {
    directives: Vec<Directive>,
}

impl ConnectionCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect a reaction's directives. Returns how many were added.
    pub fn collect_reaction_links<G: ModelGraph + ?Sized>(
        &mut self,
        graph: &G,
        reaction: EntityId,
    ) -> Result<usize, KkitError> {
        let links = reaction_links(graph, reaction)?;
        let added = links.len();
        self.directives.extend(links);
        Ok(added)
    }

    /// Collect one recorder directive. Returns `false` if the recorder was
    /// skipped.
    pub fn collect_recorder_link<G: ModelGraph + ?Sized>(
        &mut self,
        graph: &G,
        table_path: &str,
        pool: EntityId,
        color: &str,
    ) -> Result<bool, KkitError> {
        match recorder_link(graph, table_path, pool, color)? {
            Some(link) => {
                self.directives.push(link);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Write every directive, one per line, in collection order.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        for directive in &self.directives {
            writeln!(out, "{}", directive)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
