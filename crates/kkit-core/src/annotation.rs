//! # Annotation Resolver
//!
//! Display metadata (position, colors, notes) lives on an optional
//! `Annotator` child at `<entity>/info`. A missing annotation is legal and
//! resolves to `Annotation::default()`; it never fails an export.

use crate::graph::ModelGraph;
use crate::primitives::{ANNOTATION_NAME, DEFAULT_COLOR, DEFAULT_TEXT_COLOR};
use crate::{EntityId, EntityKind, KkitError};

/// Display metadata of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    /// Background color (also the plot trace color of a pool).
    pub color: String,
    /// Foreground (label) color.
    pub text_color: String,
    pub notes: String,
}

impl Default for Annotation {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            color: DEFAULT_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            notes: String::new(),
        }
    }
}

/// Path of the annotation belonging to `entity_path`.
#[must_use]
pub fn annotation_path(entity_path: &str) -> String {
    format!("{}/{}", entity_path.trim_end_matches('/'), ANNOTATION_NAME)
}

/// Find the annotator entity for `entity_path`, if there is one.
///
/// An entity at the annotation path that is not an `Annotator` is treated
/// as absent.
pub fn find_annotation<G: ModelGraph + ?Sized>(
    graph: &G,
    entity_path: &str,
) -> Result<Option<EntityId>, KkitError> {
    match graph.lookup(&annotation_path(entity_path)) {
        Some(info) if graph.kind(info)? == EntityKind::Annotator => Ok(Some(info)),
        _ => Ok(None),
    }
}

/// Resolve the annotation of `entity_path`, substituting defaults.
///
/// Colors left empty on a present annotator fall back individually.
pub fn resolve<G: ModelGraph + ?Sized>(
    graph: &G,
    entity_path: &str,
) -> Result<Annotation, KkitError> {
    let Some(info) = find_annotation(graph, entity_path)? else {
        return Ok(Annotation::default());
    };

    let defaults = Annotation::default();
    let color = graph.get_text(info, "color")?;
    let text_color = graph.get_text(info, "textColor")?;
    Ok(Annotation {
        x: graph.get_f64(info, "x")?,
        y: graph.get_f64(info, "y")?,
        color: if color.is_empty() {
            defaults.color
        } else {
            color
        },
        text_color: if text_color.is_empty() {
            defaults.text_color
        } else {
            text_color
        },
        notes: graph.get_text(info, "notes")?,
    })
}

// =============================================================================
// TESTS
// =============================================================================
