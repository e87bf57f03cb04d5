//! # kkit Export
//!
//! Drives one export in a single pass:
//!
//! ```text
//! header -> { geometry -> pools -> reactions }* per compartment
//!        -> GUI block -> { xplot }* per recorder
//!        -> addmsg directives -> footer
//! ```
//!
//! The only hard failure is a model root without any chemical compartment:
//! the header has already been written, the function returns
//! `KkitError::NoModel` and the caller must treat the file as a failed
//! export. Everything per-entity (missing annotation, recorder outside the
//! graph namespaces) is defaulted or skipped.

use crate::annotation;
use crate::connection::{ConnectionCollector, graph_namespace_path};
use crate::estimate::{SimClock, estimate_default_volume, estimate_sim_times};
use crate::format::{
    CTIME_FORMAT, FOOTER, GUI_BLOCK, GeometryRecord, Header, PlotRecord, PoolRecord, ReacRecord,
};
use crate::graph::ModelGraph;
use crate::view::{CompartmentView, PoolView, ReactionView, TableView};
use crate::{EntityId, KindFilter, KkitError};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// =============================================================================
// OPTIONS & SUMMARY
// =============================================================================

/// Per-export settings that are not part of the model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Text of the `// Saved on` line. `None` stamps the current local time.
    pub saved_on: Option<String>,
}

impl ExportOptions {
    /// Pin the `Saved on` line, making the whole file reproducible.
    #[must_use]
    pub fn with_timestamp(saved_on: impl Into<String>) -> Self {
        Self {
            saved_on: Some(saved_on.into()),
        }
    }

    fn timestamp(&self) -> String {
        self.saved_on
            .clone()
            .unwrap_or_else(|| chrono::Local::now().format(CTIME_FORMAT).to_string())
    }
}

/// What an export wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub compartments: usize,
    pub pools: usize,
    /// Pools under an enzyme, left to the enzyme's record.
    pub enzyme_complexes: usize,
    pub reactions: usize,
    pub plots: usize,
    /// Recorders outside `/graphs` and `/moregraphs`.
    pub skipped_tables: usize,
    pub directives: usize,
}

// =============================================================================
// EXPORTER
// =============================================================================

/// Writes one model of a graph as a kkit dump.
pub struct Exporter<'g, G: ModelGraph + ?Sized> {
    graph: &'g G,
    clock: SimClock,
    options: ExportOptions,
}

impl<'g, G: ModelGraph + ?Sized> Exporter<'g, G> {
    #[must_use]
    pub fn new(graph: &'g G, clock: SimClock) -> Self {
        Self {
            graph,
            clock,
            options: ExportOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Export `model` to a file at `path`.
    ///
    /// The file is flushed and closed on every exit path, including
    /// `NoModel` (which leaves a header-only file behind).
    pub fn export_model(&self, model: EntityId, path: &Path) -> Result<ExportSummary, KkitError> {
        let file = File::create(path)
            .map_err(|e| KkitError::Io(format!("cannot create '{}': {}", path.display(), e)))?;
        self.write_flushed(model, &mut BufWriter::new(file))
    }

    /// `write_to`, then flush whatever happened. An export error takes
    /// precedence over a flush error.
    fn write_flushed<W: Write>(
        &self,
        model: EntityId,
        out: &mut W,
    ) -> Result<ExportSummary, KkitError> {
        let result = self.write_to(model, out);
        let flushed = out.flush();
        result.and_then(|summary| flushed.map(|()| summary).map_err(KkitError::from))
    }

    /// Export `model` to any writer.
    pub fn write_to<W: Write>(
        &self,
        model: EntityId,
        out: &mut W,
    ) -> Result<ExportSummary, KkitError> {
        let model_path = self.graph.path(model)?;
        let _span = tracing::debug_span!("kkit_export", model = %model_path).entered();

        let header = Header {
            times: estimate_sim_times(&self.clock),
            default_volume: estimate_default_volume(self.graph, model)?,
            saved_on: self.options.timestamp(),
        };
        write!(out, "{}", header)?;

        let compartments = self.graph.find(model, KindFilter::ChemCompt)?;
        if compartments.is_empty() {
            tracing::warn!(model = %model_path, "no chemical compartment found; export aborted after header");
            return Err(KkitError::NoModel(model_path));
        }

        let mut summary = ExportSummary::default();
        let mut collector = ConnectionCollector::new();
        for compartment in compartments {
            self.write_compartment(compartment, out, &mut collector, &mut summary)?;
        }

        out.write_all(GUI_BLOCK.as_bytes())?;

        for table in self.graph.find(model, KindFilter::Table)? {
            self.write_recorder(table, out, &mut collector, &mut summary)?;
        }

        collector.write_to(out)?;
        out.write_all(FOOTER.as_bytes())?;

        summary.directives = collector.len();
        tracing::debug!(?summary, "kkit export complete");
        Ok(summary)
    }

    fn write_compartment<W: Write>(
        &self,
        compartment: EntityId,
        out: &mut W,
        collector: &mut ConnectionCollector,
        summary: &mut ExportSummary,
    ) -> Result<(), KkitError> {
        let view = CompartmentView::read(self.graph, compartment)?;
        tracing::debug!(compartment = %view.path, "writing compartment");
        write!(out, "{}", GeometryRecord(&view))?;
        summary.compartments += 1;

        for id in self.graph.find(compartment, KindFilter::PoolBase)? {
            if !self.owned_by(id, compartment)? {
                continue;
            }
            let pool = PoolView::read(self.graph, id)?;
            if pool.is_enzyme_complex() {
                summary.enzyme_complexes += 1;
                continue;
            }
            let annotation = annotation::resolve(self.graph, &pool.path)?;
            write!(
                out,
                "{}",
                PoolRecord {
                    pool: &pool,
                    annotation: &annotation,
                }
            )?;
            summary.pools += 1;
        }

        for id in self.graph.find(compartment, KindFilter::ReacBase)? {
            if !self.owned_by(id, compartment)? {
                continue;
            }
            let reaction = ReactionView::read(self.graph, id)?;
            let annotation = annotation::resolve(self.graph, &reaction.path)?;
            write!(
                out,
                "{}",
                ReacRecord {
                    reaction: &reaction,
                    annotation: &annotation,
                }
            )?;
            collector.collect_reaction_links(self.graph, id)?;
            summary.reactions += 1;
        }
        Ok(())
    }

    /// One `xplot` per recorder (colored by its first observed pool), one
    /// `PLOT` directive per observed pool.
    fn write_recorder<W: Write>(
        &self,
        table: EntityId,
        out: &mut W,
        collector: &mut ConnectionCollector,
        summary: &mut ExportSummary,
    ) -> Result<(), KkitError> {
        let view = TableView::read(self.graph, table)?;
        let Some(plot_path) = graph_namespace_path(&view.path) else {
            tracing::debug!(table = %view.path, "recorder outside /graphs and /moregraphs skipped");
            summary.skipped_tables += 1;
            return Ok(());
        };

        for (i, source) in view.sources.iter().enumerate() {
            let annotation = annotation::resolve(self.graph, &self.graph.path(*source)?)?;
            if i == 0 {
                write!(
                    out,
                    "{}",
                    PlotRecord {
                        path: &plot_path,
                        color: &annotation.color,
                    }
                )?;
                summary.plots += 1;
            }
            collector.collect_recorder_link(self.graph, &view.path, *source, &annotation.color)?;
        }
        Ok(())
    }

    /// Whether `compartment` is the nearest compartment enclosing `id`.
    fn owned_by(&self, id: EntityId, compartment: EntityId) -> Result<bool, KkitError> {
        let mut current = self.graph.parent(id)?;
        while let Some(ancestor) = current {
            if self.graph.kind(ancestor)?.is_compartment() {
                return Ok(ancestor == compartment);
            }
            current = self.graph.parent(ancestor)?;
        }
        Ok(false)
    }
}

/// Export `model` to `path` with default options.
pub fn export_model<G: ModelGraph + ?Sized>(
    graph: &G,
    clock: SimClock,
    model: EntityId,
    path: &Path,
) -> Result<ExportSummary, KkitError> {
    Exporter::new(graph, clock).export_model(model, path)
}

// =============================================================================
// TESTS
// =============================================================================
