//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::{ClockConfig, Config};
use kkit_core::{
    BuiltModel, EntityId, ExportOptions, ExportSummary, Exporter, Ingestor, KindFilter, KkitError,
    ModelDocument, ModelGraph, estimate_default_volume, estimate_sim_times,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum model document size (64 MB).
///
/// This prevents memory exhaustion from malicious or accidental large files.
pub const MAX_MODEL_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), KkitError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| KkitError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(KkitError::Serialization(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, KkitError> {
    let canonical = path.canonicalize().map_err(|e| {
        KkitError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(KkitError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize an output path's directory; the file itself may not exist
/// yet.
fn validate_output_path(path: &Path) -> Result<PathBuf, KkitError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        KkitError::Io(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(KkitError::Io(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| KkitError::Io("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// MODEL LOADING
// =============================================================================

/// Read a JSON model document, applying configuration overrides.
pub fn load_document(path: &Path, config: &Config) -> Result<ModelDocument, KkitError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, MAX_MODEL_FILE_SIZE)?;

    let content = std::fs::read_to_string(&canonical)
        .map_err(|e| KkitError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let mut doc: ModelDocument = serde_json::from_str(&content)
        .map_err(|e| KkitError::Serialization(format!("Invalid model document: {}", e)))?;

    if let Some(root) = &config.export.model_root {
        doc.name = root.clone();
    }
    doc.clock = config.clock.apply(doc.clock);
    Ok(doc)
}

/// Load and build a model; `overrides` win over both file and config.
pub fn load_model(
    path: &Path,
    config: &Config,
    overrides: ClockConfig,
) -> Result<BuiltModel, KkitError> {
    let mut doc = load_document(path, config)?;
    doc.clock = overrides.apply(doc.clock);
    let built = Ingestor::build(&doc)?;
    tracing::info!(
        model = %path.display(),
        entities = built.store.entity_count(),
        "Model loaded"
    );
    Ok(built)
}

// =============================================================================
// EXPORT COMMAND
// =============================================================================

/// Export a model document as a kkit dump.
pub fn cmd_export(
    config: &Config,
    json_mode: bool,
    model_path: &Path,
    output: &Path,
    overrides: ClockConfig,
) -> Result<ExportSummary, KkitError> {
    let built = load_model(model_path, config, overrides)?;
    let output = validate_output_path(output)?;

    let options = ExportOptions {
        saved_on: config.export.pinned_timestamp(),
    };
    let summary = Exporter::new(&built.store, built.clock.clone())
        .with_options(options)
        .export_model(built.model, &output)?;

    tracing::info!(
        output = %output.display(),
        directives = summary.directives,
        "Export complete"
    );

    if json_mode {
        let report = serde_json::json!({
            "model": model_path.to_string_lossy(),
            "output": output.to_string_lossy(),
            "summary": summary,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
        return Ok(summary);
    }

    println!("Exported {} -> {}", model_path.display(), output.display());
    println!("  Compartments: {}", summary.compartments);
    println!("  Pools:        {}", summary.pools);
    println!("  Reactions:    {}", summary.reactions);
    println!("  Plots:        {}", summary.plots);
    println!("  Messages:     {}", summary.directives);
    if summary.enzyme_complexes > 0 {
        println!("  Enzyme complexes left out: {}", summary.enzyme_complexes);
    }
    if summary.skipped_tables > 0 {
        println!(
            "  Recorders outside /graphs and /moregraphs: {}",
            summary.skipped_tables
        );
    }

    Ok(summary)
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Entity counts and derived header values of one model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModelStatus {
    pub root: String,
    pub compartments: usize,
    pub pools: usize,
    pub reactions: usize,
    pub enzymes: usize,
    pub tables: usize,
    pub run_time: f64,
    pub sim_dt: f64,
    pub plot_dt: f64,
    pub default_volume: f64,
}

impl ModelStatus {
    pub fn collect<G: ModelGraph + ?Sized>(
        graph: &G,
        model: EntityId,
        clock: &kkit_core::SimClock,
    ) -> Result<Self, KkitError> {
        let count = |filter| graph.find(model, filter).map(|found| found.len());
        let times = estimate_sim_times(clock);
        Ok(Self {
            root: graph.path(model)?,
            compartments: count(KindFilter::ChemCompt)?,
            pools: count(KindFilter::PoolBase)?,
            reactions: count(KindFilter::ReacBase)?,
            enzymes: count(KindFilter::EnzBase)?,
            tables: count(KindFilter::Table)?,
            run_time: times.run_time,
            sim_dt: times.sim_dt,
            plot_dt: times.plot_dt,
            default_volume: estimate_default_volume(graph, model)?,
        })
    }
}

/// Show what an export of the model would contain.
pub fn cmd_status(
    config: &Config,
    json_mode: bool,
    model_path: &Path,
) -> Result<ModelStatus, KkitError> {
    let built = load_model(model_path, config, ClockConfig::default())?;
    let status = ModelStatus::collect(&built.store, built.model, &built.clock)?;

    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_default()
        );
        return Ok(status);
    }

    println!("kkit Model Status");
    println!("=================");
    println!("Document: {}", model_path.display());
    println!("Root:     {}", status.root);
    println!();
    println!("Compartments: {}", status.compartments);
    println!("Pools:        {}", status.pools);
    println!("Reactions:    {}", status.reactions);
    println!("Enzymes:      {}", status.enzymes);
    println!("Recorders:    {}", status.tables);
    println!();
    println!("Run time:     {}", status.run_time);
    println!("Sim dt:       {}", status.sim_dt);
    println!("Plot dt:      {}", status.plot_dt);
    println!("Default vol:  {}", status.default_volume);

    Ok(status)
}

// =============================================================================
// TESTS
// =============================================================================
