//! # kkit-core
//!
//! Export of in-memory chemical-kinetics models to the GENESIS kkit v11
//! flat dump format.
//!
//! The crate is split along the export pipeline:
//! - `graph` exposes the model graph (`ModelGraph`) and an in-memory store
//! - `estimate` fills in simulation times and the default volume
//! - `annotation`, `view` and `format` turn entities into text records
//! - `connection` derives the `addmsg` directives
//! - `export` runs the whole pass and writes the file
//!
//! ## Constraints
//!
//! - The graph is only read during an export
//! - Output is deterministic apart from the `Saved on` line
//! - No async, no network dependencies

// =============================================================================
// MODULES
// =============================================================================

pub mod annotation;
pub mod connection;
pub mod estimate;
pub mod export;
pub mod format;
pub mod graph;
pub mod ingestor;
pub mod primitives;
pub mod types;
pub mod view;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{EntityId, EntityKind, FieldType, FieldValue, KindFilter, KkitError, Relation};

// =============================================================================
// RE-EXPORTS: Export Pipeline
// =============================================================================

pub use annotation::Annotation;
pub use connection::{ConnectionCollector, Directive};
pub use estimate::{SimClock, SimTimes, estimate_default_volume, estimate_sim_times};
pub use export::{ExportOptions, ExportSummary, Exporter, export_model};
pub use graph::{ModelGraph, ModelStore};
pub use ingestor::{BuiltModel, Ingestor, ModelDocument};
