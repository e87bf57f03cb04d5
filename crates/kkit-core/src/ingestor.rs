//! # Ingestor Module
//!
//! Builds a `ModelStore` from a declarative model document.
//!
//! - Names must be non-empty, free of `/` and unique among siblings
//! - Every substrate, product and observed reference must resolve to a pool
//! - Missing pool counts are derived from concentration and volume
//! - No simulation, no unit conversion beyond `n = conc * volume * NA`
//!
//! References are resolved after every entity exists, so a reaction may
//! name a pool declared after it.

use crate::estimate::SimClock;
use crate::graph::{ModelGraph, ModelStore};
use crate::primitives::{ANNOTATION_NAME, AVOGADRO};
use crate::{EntityId, EntityKind, KkitError, Relation};
use serde::{Deserialize, Serialize};

// =============================================================================
// DOCUMENT
// =============================================================================

fn default_root() -> String {
    "model".to_string()
}

fn default_dimensions() -> u32 {
    3
}

/// A complete model description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    /// Name of the model container created under `/`.
    #[serde(default = "default_root")]
    pub name: String,
    #[serde(default)]
    pub clock: ClockSpec,
    #[serde(default)]
    pub compartments: Vec<CompartmentSpec>,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

impl Default for ModelDocument {
    fn default() -> Self {
        Self {
            name: default_root(),
            clock: ClockSpec::default(),
            compartments: Vec::new(),
            tables: Vec::new(),
        }
    }
}

/// Simulation settings. Unset or non-positive values are estimated at
/// export time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockSpec {
    pub run_time: Option<f64>,
    pub sim_dt: Option<f64>,
    pub plot_dt: Option<f64>,
}

impl ClockSpec {
    #[must_use]
    pub fn to_clock(self) -> SimClock {
        SimClock::new(self.run_time.unwrap_or(0.0))
            .with_sim_dt(self.sim_dt.unwrap_or(0.0))
            .with_plot_dt(self.plot_dt.unwrap_or(0.0))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Cube,
    Cylinder,
    Endo,
}

impl Shape {
    const fn kind(self) -> EntityKind {
        match self {
            Self::Cube => EntityKind::CubeMesh,
            Self::Cylinder => EntityKind::CylMesh,
            Self::Endo => EntityKind::EndoMesh,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentSpec {
    pub name: String,
    #[serde(default)]
    pub shape: Shape,
    /// Volume in m^3.
    pub volume: f64,
    #[serde(default = "default_dimensions")]
    pub dimensions: u32,
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    #[serde(default)]
    pub reactions: Vec<ReactionSpec>,
    #[serde(default)]
    pub enzymes: Vec<EnzymeSpec>,
    #[serde(default)]
    pub compartments: Vec<CompartmentSpec>,
    #[serde(default)]
    pub annotation: Option<AnnotationSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolSpec {
    pub name: String,
    /// Buffered pools hold their concentration fixed.
    #[serde(default)]
    pub buffered: bool,
    #[serde(default)]
    pub diff_const: f64,
    /// Initial concentration in mM.
    #[serde(default)]
    pub conc_init: f64,
    pub conc: Option<f64>,
    pub n_init: Option<f64>,
    pub n: Option<f64>,
    #[serde(default)]
    pub annotation: Option<AnnotationSpec>,
}

/// Substrate and product references are pool names in the enclosing
/// compartment, or paths relative to the model root when they contain `/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionSpec {
    pub name: String,
    #[serde(default)]
    pub kf: f64,
    #[serde(default)]
    pub kb: f64,
    #[serde(default)]
    pub substrates: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    #[serde(default)]
    pub annotation: Option<AnnotationSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnzymeSpec {
    pub name: String,
    /// Michaelis-Menten enzyme without an explicit complex.
    #[serde(default)]
    pub michaelis_menten: bool,
    #[serde(default)]
    pub km: f64,
    #[serde(default)]
    pub kcat: f64,
    #[serde(default)]
    pub substrates: Vec<String>,
    #[serde(default)]
    pub products: Vec<String>,
    /// Enzyme-substrate complex pools.
    #[serde(default)]
    pub pools: Vec<PoolSpec>,
    #[serde(default)]
    pub annotation: Option<AnnotationSpec>,
}

/// A recorder. Both paths are relative to the model root, e.g.
/// `graphs/conc1/A.Co` observing `kinetics/A`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub path: String,
    #[serde(default)]
    pub observes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSpec {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub text_color: String,
    #[serde(default)]
    pub notes: String,
}

// =============================================================================
// INGESTOR
// =============================================================================

/// Result of ingesting a document.
#[derive(Debug, Clone)]
pub struct BuiltModel {
    pub store: ModelStore,
    pub clock: SimClock,
    /// The model container (`/<name>`).
    pub model: EntityId,
}

/// A reference edge waiting for every entity to exist.
struct PendingLink {
    from: EntityId,
    relation: Relation,
    reference: String,
    /// Compartment path used to resolve bare names.
    scope: String,
}

/// Document-to-graph builder.
pub struct Ingestor {
    store: ModelStore,
    model: EntityId,
    model_path: String,
    pending: Vec<PendingLink>,
}

impl Ingestor {
    /// Build the graph and clock described by `doc`.
    pub fn build(doc: &ModelDocument) -> Result<BuiltModel, KkitError> {
        let mut store = ModelStore::new();
        let model = store.create(ModelStore::ROOT, &doc.name, EntityKind::Neutral)?;
        let model_path = store.path(model)?;
        let mut ingestor = Self {
            store,
            model,
            model_path,
            pending: Vec::new(),
        };

        for compartment in &doc.compartments {
            ingestor.add_compartment(model, compartment)?;
        }
        for table in &doc.tables {
            ingestor.add_table(table)?;
        }
        ingestor.resolve_links()?;

        tracing::debug!(
            model = %ingestor.model_path,
            entities = ingestor.store.entity_count(),
            "model document ingested"
        );
        Ok(BuiltModel {
            store: ingestor.store,
            clock: doc.clock.to_clock(),
            model: ingestor.model,
        })
    }

    fn add_compartment(
        &mut self,
        parent: EntityId,
        spec: &CompartmentSpec,
    ) -> Result<(), KkitError> {
        if spec.volume.is_nan() || spec.volume < 0.0 {
            return Err(KkitError::InvalidModel(format!(
                "compartment '{}' has invalid volume {}",
                spec.name, spec.volume
            )));
        }
        let id = self.store.create(parent, &spec.name, spec.shape.kind())?;
        self.store.set(id, "volume", spec.volume)?;
        self.store.set(id, "numDimensions", spec.dimensions)?;
        self.annotate(id, spec.annotation.as_ref())?;
        let scope = self.store.path(id)?;

        for pool in &spec.pools {
            self.add_pool(id, pool, spec.volume)?;
        }
        for reaction in &spec.reactions {
            let reac = self.store.create(id, &reaction.name, EntityKind::Reac)?;
            self.store.set(reac, "kf", reaction.kf)?;
            self.store.set(reac, "kb", reaction.kb)?;
            self.annotate(reac, reaction.annotation.as_ref())?;
            self.defer(reac, &reaction.substrates, &reaction.products, &scope);
        }
        for enzyme in &spec.enzymes {
            let kind = if enzyme.michaelis_menten {
                EntityKind::MmEnz
            } else {
                EntityKind::Enz
            };
            let enz = self.store.create(id, &enzyme.name, kind)?;
            self.store.set(enz, "Km", enzyme.km)?;
            self.store.set(enz, "kcat", enzyme.kcat)?;
            self.annotate(enz, enzyme.annotation.as_ref())?;
            for pool in &enzyme.pools {
                self.add_pool(enz, pool, spec.volume)?;
            }
            self.defer(enz, &enzyme.substrates, &enzyme.products, &scope);
        }
        for nested in &spec.compartments {
            self.add_compartment(id, nested)?;
        }
        Ok(())
    }

    fn add_pool(&mut self, parent: EntityId, spec: &PoolSpec, volume: f64) -> Result<(), KkitError> {
        let kind = if spec.buffered {
            EntityKind::BufPool
        } else {
            EntityKind::Pool
        };
        let id = self.store.create(parent, &spec.name, kind)?;
        let conc = spec.conc.unwrap_or(spec.conc_init);
        let n_init = spec
            .n_init
            .unwrap_or(spec.conc_init * volume * AVOGADRO);
        let n = spec.n.unwrap_or(conc * volume * AVOGADRO);

        self.store.set(id, "diffConst", spec.diff_const)?;
        self.store.set(id, "concInit", spec.conc_init)?;
        self.store.set(id, "conc", conc)?;
        self.store.set(id, "nInit", n_init)?;
        self.store.set(id, "n", n)?;
        self.store.set(id, "volume", volume)?;
        self.annotate(id, spec.annotation.as_ref())
    }

    fn add_table(&mut self, spec: &TableSpec) -> Result<(), KkitError> {
        let segments: Vec<&str> = spec.path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, containers)) = segments.split_last() else {
            return Err(KkitError::InvalidModel("recorder with empty path".to_string()));
        };

        let mut parent = self.model;
        for segment in containers {
            let path = format!("{}/{}", self.store.path(parent)?, segment);
            parent = match self.store.lookup(&path) {
                Some(existing) => existing,
                None => self.store.create(parent, segment, EntityKind::Neutral)?,
            };
        }
        let table = self.store.create(parent, leaf, EntityKind::Table)?;
        for observed in &spec.observes {
            self.pending.push(PendingLink {
                from: table,
                relation: Relation::RequestOut,
                reference: observed.clone(),
                scope: self.model_path.clone(),
            });
        }
        Ok(())
    }

    fn annotate(&mut self, id: EntityId, spec: Option<&AnnotationSpec>) -> Result<(), KkitError> {
        let Some(spec) = spec else {
            return Ok(());
        };
        let info = self.store.create(id, ANNOTATION_NAME, EntityKind::Annotator)?;
        self.store.set(info, "x", spec.x)?;
        self.store.set(info, "y", spec.y)?;
        self.store.set(info, "color", spec.color.as_str())?;
        self.store.set(info, "textColor", spec.text_color.as_str())?;
        self.store.set(info, "notes", spec.notes.as_str())
    }

    fn defer(&mut self, from: EntityId, substrates: &[String], products: &[String], scope: &str) {
        let links = substrates
            .iter()
            .map(|r| (Relation::Sub, r))
            .chain(products.iter().map(|r| (Relation::Prd, r)));
        for (relation, reference) in links {
            self.pending.push(PendingLink {
                from,
                relation,
                reference: reference.clone(),
                scope: scope.to_string(),
            });
        }
    }

    fn resolve_links(&mut self) -> Result<(), KkitError> {
        for link in std::mem::take(&mut self.pending) {
            let path = if link.reference.contains('/') {
                format!("{}/{}", self.model_path, link.reference.trim_start_matches('/'))
            } else {
                format!("{}/{}", link.scope, link.reference)
            };
            let target = self.store.lookup(&path).ok_or_else(|| {
                KkitError::InvalidModel(format!(
                    "{} reference '{}' does not resolve",
                    link.relation.as_str(),
                    link.reference
                ))
            })?;
            self.store.connect(link.from, link.relation, target)?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn pool(name: &str, conc_init: f64) -> PoolSpec {
        PoolSpec {
            name: name.to_string(),
            conc_init,
            ..PoolSpec::default()
        }
    }

    fn doc() -> ModelDocument {
        ModelDocument {
            name: "model".to_string(),
            clock: ClockSpec {
                run_time: Some(50.0),
                ..ClockSpec::default()
            },
            compartments: vec![CompartmentSpec {
                name: "kinetics".to_string(),
                shape: Shape::Cube,
                volume: 1e-18,
                dimensions: 3,
                pools: vec![pool("A", 1.0), pool("B", 0.0)],
                reactions: vec![ReactionSpec {
                    name: "r".to_string(),
                    kf: 0.1,
                    kb: 0.01,
                    substrates: vec!["A".to_string()],
                    products: vec!["B".to_string()],
                    annotation: None,
                }],
                enzymes: Vec::new(),
                compartments: Vec::new(),
                annotation: None,
            }],
            tables: vec![TableSpec {
                path: "graphs/conc1/A.Co".to_string(),
                observes: vec!["kinetics/A".to_string()],
            }],
        }
    }

    #[test]
    fn builds_entities_and_links() {
        let built = Ingestor::build(&doc()).unwrap();
        let store = &built.store;
        assert_eq!(store.path(built.model).unwrap(), "/model");

        let r = store.lookup("/model/kinetics/r").unwrap();
        let a = store.lookup("/model/kinetics/A").unwrap();
        let b = store.lookup("/model/kinetics/B").unwrap();
        assert_eq!(store.related(r, Relation::Sub).unwrap(), vec![a]);
        assert_eq!(store.related(r, Relation::Prd).unwrap(), vec![b]);

        let tab = store.lookup("/model/graphs/conc1/A.Co").unwrap();
        assert_eq!(store.kind(tab).unwrap(), EntityKind::Table);
        assert_eq!(store.related(tab, Relation::RequestOut).unwrap(), vec![a]);
        assert_eq!(built.clock.run_time, 50.0);
    }

    #[test]
    fn pool_counts_derive_from_concentration() {
        let built = Ingestor::build(&doc()).unwrap();
        let a = built.store.lookup("/model/kinetics/A").unwrap();
        let n_init = built.store.get_f64(a, "nInit").unwrap();
        assert!((n_init - 1e-18 * AVOGADRO).abs() < 1e-6);
        assert_eq!(built.store.get_f64(a, "conc").unwrap(), 1.0);
        assert_eq!(built.store.get_f64(a, "volume").unwrap(), 1e-18);
    }

    #[test]
    fn unresolved_reference_rejected() {
        let mut d = doc();
        d.compartments[0].reactions[0].products = vec!["Z".to_string()];
        assert!(matches!(
            Ingestor::build(&d),
            Err(KkitError::InvalidModel(msg)) if msg.contains("'Z'")
        ));
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let mut d = doc();
        d.compartments[0].pools.push(pool("A", 2.0));
        assert!(matches!(Ingestor::build(&d), Err(KkitError::InvalidModel(_))));
    }

    #[test]
    fn empty_name_rejected() {
        let mut d = doc();
        d.compartments[0].pools.push(pool("", 2.0));
        assert!(matches!(Ingestor::build(&d), Err(KkitError::InvalidModel(_))));
    }

    #[test]
    fn enzyme_complex_lives_under_enzyme() {
        let mut d = doc();
        d.compartments[0].enzymes.push(EnzymeSpec {
            name: "kinase".to_string(),
            km: 5.0,
            kcat: 0.5,
            substrates: vec!["A".to_string()],
            products: vec!["B".to_string()],
            pools: vec![pool("kinase_cplx", 0.0)],
            ..EnzymeSpec::default()
        });
        let built = Ingestor::build(&d).unwrap();
        let cplx = built
            .store
            .lookup("/model/kinetics/kinase/kinase_cplx")
            .unwrap();
        let parent = built.store.parent(cplx).unwrap().unwrap();
        assert_eq!(built.store.kind(parent).unwrap(), EntityKind::Enz);
    }

    #[test]
    fn annotation_creates_info_child() {
        let mut d = doc();
        d.compartments[0].pools[0].annotation = Some(AnnotationSpec {
            color: "red".to_string(),
            ..AnnotationSpec::default()
        });
        let built = Ingestor::build(&d).unwrap();
        let info = built.store.lookup("/model/kinetics/A/info").unwrap();
        assert_eq!(built.store.get_text(info, "color").unwrap(), "red");
    }

    #[test]
    fn document_parses_with_defaults() {
        let json = r#"{
            "compartments": [
                { "name": "kinetics", "volume": 1e-15, "pools": [ { "name": "A" } ] }
            ]
        }"#;
        let d: ModelDocument = serde_json::from_str(json).unwrap();
        assert_eq!(d.name, "model");
        assert_eq!(d.compartments[0].dimensions, 3);
        assert_eq!(d.compartments[0].shape, Shape::Cube);
        assert!(d.tables.is_empty());
    }
}
