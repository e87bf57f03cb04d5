//! # Core Type Definitions
//!
//! This module contains the core types shared by the model graph and the
//! kkit writer:
//! - Entity identifiers and structural classes (`EntityId`, `EntityKind`)
//! - Pattern-query filters and edge kinds (`KindFilter`, `Relation`)
//! - Typed field values (`FieldType`, `FieldValue`)
//! - Error types (`KkitError`)
//!
//! ## Field Tables
//!
//! Every class carries a fixed table of recognized fields. Reading or writing
//! a field outside that table is a configuration error
//! (`KkitError::UnknownField`), never a data error.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIERS
// =============================================================================

/// Opaque handle to an entity in the model graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// FIELD TYPES & VALUES
// =============================================================================

/// Declared type of a class field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Float,
    UInt,
    Text,
    FloatList,
}

impl FieldType {
    /// The value a recognized but never-assigned field reads as.
    #[must_use]
    pub fn zero(self) -> FieldValue {
        match self {
            Self::Float => FieldValue::Float(0.0),
            Self::UInt => FieldValue::UInt(0),
            Self::Text => FieldValue::Text(String::new()),
            Self::FloatList => FieldValue::FloatList(Vec::new()),
        }
    }

    /// Lowercase name used in error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::UInt => "uint",
            Self::Text => "text",
            Self::FloatList => "float list",
        }
    }
}

/// A typed field value read from or written to an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Float(f64),
    UInt(u32),
    Text(String),
    FloatList(Vec<f64>),
}

impl FieldValue {
    /// The declared type this value satisfies.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        match self {
            Self::Float(_) => FieldType::Float,
            Self::UInt(_) => FieldType::UInt,
            Self::Text(_) => FieldType::Text,
            Self::FloatList(_) => FieldType::FloatList,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::UInt(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

// =============================================================================
// ENTITY CLASSES
// =============================================================================

const COMPARTMENT_FIELDS: &[(&str, FieldType)] = &[
    ("volume", FieldType::Float),
    ("numDimensions", FieldType::UInt),
];

const POOL_FIELDS: &[(&str, FieldType)] = &[
    ("diffConst", FieldType::Float),
    ("concInit", FieldType::Float),
    ("conc", FieldType::Float),
    ("nInit", FieldType::Float),
    ("n", FieldType::Float),
    ("volume", FieldType::Float),
];

const REAC_FIELDS: &[(&str, FieldType)] = &[("kf", FieldType::Float), ("kb", FieldType::Float)];

const ENZ_FIELDS: &[(&str, FieldType)] = &[("Km", FieldType::Float), ("kcat", FieldType::Float)];

const TABLE_FIELDS: &[(&str, FieldType)] = &[
    ("vector", FieldType::FloatList),
    ("outputValue", FieldType::Float),
];

const ANNOTATOR_FIELDS: &[(&str, FieldType)] = &[
    ("x", FieldType::Float),
    ("y", FieldType::Float),
    ("color", FieldType::Text),
    ("textColor", FieldType::Text),
    ("notes", FieldType::Text),
];

/// Structural class of a model entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Plain container (`/model`, `/graphs`, ...).
    Neutral,
    CubeMesh,
    CylMesh,
    EndoMesh,
    Pool,
    /// Buffered pool: concentration held at its initial value.
    BufPool,
    Reac,
    Enz,
    MmEnz,
    /// Recorder table.
    Table,
    /// Display annotation living at `<entity>/info`.
    Annotator,
}

impl EntityKind {
    /// Class name as the simulator reports it.
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral",
            Self::CubeMesh => "CubeMesh",
            Self::CylMesh => "CylMesh",
            Self::EndoMesh => "EndoMesh",
            Self::Pool => "Pool",
            Self::BufPool => "BufPool",
            Self::Reac => "Reac",
            Self::Enz => "Enz",
            Self::MmEnz => "MMenz",
            Self::Table => "Table2",
            Self::Annotator => "Annotator",
        }
    }

    /// The fixed table of fields this class recognizes.
    #[must_use]
    pub const fn fields(self) -> &'static [(&'static str, FieldType)] {
        match self {
            Self::Neutral => &[],
            Self::CubeMesh | Self::CylMesh | Self::EndoMesh => COMPARTMENT_FIELDS,
            Self::Pool | Self::BufPool => POOL_FIELDS,
            Self::Reac => REAC_FIELDS,
            Self::Enz | Self::MmEnz => ENZ_FIELDS,
            Self::Table => TABLE_FIELDS,
            Self::Annotator => ANNOTATOR_FIELDS,
        }
    }

    /// Look up the declared type of `field`, if this class recognizes it.
    #[must_use]
    pub fn field_type(self, field: &str) -> Option<FieldType> {
        self.fields()
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, ty)| *ty)
    }

    #[must_use]
    pub const fn is_compartment(self) -> bool {
        matches!(self, Self::CubeMesh | Self::CylMesh | Self::EndoMesh)
    }

    #[must_use]
    pub const fn is_pool(self) -> bool {
        matches!(self, Self::Pool | Self::BufPool)
    }

    #[must_use]
    pub const fn is_enzyme(self) -> bool {
        matches!(self, Self::Enz | Self::MmEnz)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

// =============================================================================
// PATTERN FILTERS & RELATIONS
// =============================================================================

/// Type filter for pattern queries ("all descendants that are-a T").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KindFilter {
    ChemCompt,
    PoolBase,
    ReacBase,
    EnzBase,
    Table,
}

impl KindFilter {
    /// The is-a test applied by `ModelGraph::find`.
    #[must_use]
    pub fn matches(self, kind: EntityKind) -> bool {
        match self {
            Self::ChemCompt => kind.is_compartment(),
            Self::PoolBase => kind.is_pool(),
            Self::ReacBase => kind == EntityKind::Reac,
            Self::EnzBase => kind.is_enzyme(),
            Self::Table => kind == EntityKind::Table,
        }
    }
}

/// Kind of a directed reference edge between entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Relation {
    /// Reaction -> substrate pool.
    Sub,
    /// Reaction -> product pool.
    Prd,
    /// Recorder table -> observed pool.
    RequestOut,
}

impl Relation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sub => "sub",
            Self::Prd => "prd",
            Self::RequestOut => "requestOut",
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building or exporting a model.
///
/// Per-entity gaps (missing annotation, recorder outside the graph
/// namespaces) are defaulted or skipped and never show up here.
#[derive(Debug, Error)]
pub enum KkitError {
    /// The entity handle does not name an entity in the graph.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The field is not part of the class's field table.
    #[error("Unknown field '{field}' for class {class}")]
    UnknownField { class: EntityKind, field: String },

    /// The field exists but holds (or was given) a value of another type.
    #[error("Field '{field}' is not a {expected} field")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    /// A model document or a graph mutation is structurally invalid.
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// No chemical compartment was found under the model root.
    #[error("No model found on {0}")]
    NoModel(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for KkitError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
