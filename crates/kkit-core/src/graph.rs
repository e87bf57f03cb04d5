//! # Model Graph
//!
//! The read interface the writer consumes, and the in-memory store that
//! implements it.
//!
//! `ModelGraph` is deliberately read-only: the export pipeline only ever
//! holds a `&impl ModelGraph`, so it cannot mutate the model it writes.
//! Mutation lives on `ModelStore` itself and is used by the ingestor and
//! by tests to build models.
//!
//! ## Ordering Contract
//!
//! Children and reference edges are kept in insertion order. `find` walks
//! depth-first, pre-order, visiting children in that order. Message
//! directives are emitted in exactly this order, so two stores built by
//! the same sequence of calls export byte-identical files.

use crate::{EntityId, EntityKind, FieldType, FieldValue, KindFilter, KkitError, Relation};
use std::collections::BTreeMap;

// =============================================================================
// MODELGRAPH TRAIT
// =============================================================================

/// Read access to a hierarchical, typed model graph.
///
/// All fallible operations return `Result<T, KkitError>`; an unknown handle
/// is `EntityNotFound`, an unknown field is `UnknownField`.
pub trait ModelGraph {
    /// Structural class of an entity.
    fn kind(&self, id: EntityId) -> Result<EntityKind, KkitError>;

    /// Entity name (last path segment).
    fn name(&self, id: EntityId) -> Result<String, KkitError>;

    /// Structural parent. `None` only for the graph root.
    fn parent(&self, id: EntityId) -> Result<Option<EntityId>, KkitError>;

    /// Direct children in insertion order.
    fn children(&self, id: EntityId) -> Result<Vec<EntityId>, KkitError>;

    /// Absolute path, e.g. `/model/kinetics/A`.
    fn path(&self, id: EntityId) -> Result<String, KkitError>;

    /// Resolve an absolute path. Absence is not an error.
    fn lookup(&self, path: &str) -> Option<EntityId>;

    /// Typed field read.
    ///
    /// A field the class recognizes but that was never assigned reads as
    /// its zero value, except a pool's `volume`, which is inherited from
    /// the nearest enclosing compartment.
    fn get(&self, id: EntityId, field: &str) -> Result<FieldValue, KkitError>;

    /// Outbound reference edges of one kind, in insertion order.
    fn related(&self, id: EntityId, relation: Relation) -> Result<Vec<EntityId>, KkitError>;

    /// All descendants of `root` (excluding `root`) whose class matches
    /// `filter`, depth-first pre-order.
    fn find(&self, root: EntityId, filter: KindFilter) -> Result<Vec<EntityId>, KkitError> {
        let mut found = Vec::new();
        let mut stack: Vec<EntityId> = self.children(root)?.into_iter().rev().collect();
        while let Some(id) = stack.pop() {
            if filter.matches(self.kind(id)?) {
                found.push(id);
            }
            stack.extend(self.children(id)?.into_iter().rev());
        }
        Ok(found)
    }

    fn get_f64(&self, id: EntityId, field: &str) -> Result<f64, KkitError> {
        match self.get(id, field)? {
            FieldValue::Float(v) => Ok(v),
            _ => Err(type_error(field, FieldType::Float)),
        }
    }

    fn get_u32(&self, id: EntityId, field: &str) -> Result<u32, KkitError> {
        match self.get(id, field)? {
            FieldValue::UInt(v) => Ok(v),
            _ => Err(type_error(field, FieldType::UInt)),
        }
    }

    fn get_text(&self, id: EntityId, field: &str) -> Result<String, KkitError> {
        match self.get(id, field)? {
            FieldValue::Text(v) => Ok(v),
            _ => Err(type_error(field, FieldType::Text)),
        }
    }
}

fn type_error(field: &str, expected: FieldType) -> KkitError {
    KkitError::FieldType {
        field: field.to_string(),
        expected: expected.as_str(),
    }
}

// =============================================================================
// MODELSTORE IMPLEMENTATION
// =============================================================================

#[derive(Debug, Clone)]
struct Entity {
    name: String,
    kind: EntityKind,
    parent: Option<EntityId>,
    path: String,
    children: Vec<EntityId>,
    fields: BTreeMap<String, FieldValue>,
    edges: Vec<(Relation, EntityId)>,
}

/// In-memory model graph.
///
/// Entity storage is a `BTreeMap` keyed by handle; children and edges are
/// ordered vectors so insertion order survives every query.
#[derive(Debug, Clone)]
pub struct ModelStore {
    entities: BTreeMap<EntityId, Entity>,
    path_index: BTreeMap<String, EntityId>,
    next_id: u64,
}

impl Default for ModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore {
    /// Handle of the graph root (`/`).
    pub const ROOT: EntityId = EntityId(0);

    /// Create a store holding only the root container.
    #[must_use]
    pub fn new() -> Self {
        let root = Entity {
            name: String::new(),
            kind: EntityKind::Neutral,
            parent: None,
            path: "/".to_string(),
            children: Vec::new(),
            fields: BTreeMap::new(),
            edges: Vec::new(),
        };
        let mut entities = BTreeMap::new();
        entities.insert(Self::ROOT, root);
        let mut path_index = BTreeMap::new();
        path_index.insert("/".to_string(), Self::ROOT);
        Self {
            entities,
            path_index,
            next_id: 1,
        }
    }

    /// Number of entities, root included.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Create a child entity under `parent`.
    ///
    /// Names must be non-empty, free of `/`, and unique among siblings.
    pub fn create(
        &mut self,
        parent: EntityId,
        name: &str,
        kind: EntityKind,
    ) -> Result<EntityId, KkitError> {
        if name.is_empty() || name.contains('/') {
            return Err(KkitError::InvalidModel(format!(
                "invalid entity name '{}'",
                name
            )));
        }
        let parent_path = self.entity(parent)?.path.clone();
        let path = if parent_path == "/" {
            format!("/{}", name)
        } else {
            format!("{}/{}", parent_path, name)
        };
        if self.path_index.contains_key(&path) {
            return Err(KkitError::InvalidModel(format!(
                "duplicate entity path '{}'",
                path
            )));
        }

        let id = EntityId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entities.insert(
            id,
            Entity {
                name: name.to_string(),
                kind,
                parent: Some(parent),
                path: path.clone(),
                children: Vec::new(),
                fields: BTreeMap::new(),
                edges: Vec::new(),
            },
        );
        self.path_index.insert(path, id);
        self.entity_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Assign a field. Same recognition rule as `get`; the value must match
    /// the declared type.
    pub fn set(
        &mut self,
        id: EntityId,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), KkitError> {
        let value = value.into();
        let entity = self.entity_mut(id)?;
        let declared = entity
            .kind
            .field_type(field)
            .ok_or_else(|| KkitError::UnknownField {
                class: entity.kind,
                field: field.to_string(),
            })?;
        if value.field_type() != declared {
            return Err(type_error(field, declared));
        }
        entity.fields.insert(field.to_string(), value);
        Ok(())
    }

    /// Add a reference edge `from -[relation]-> to`.
    ///
    /// Substrate/product edges run from a reaction or enzyme to a pool;
    /// recorder edges run from a table to the entity it observes.
    pub fn connect(
        &mut self,
        from: EntityId,
        relation: Relation,
        to: EntityId,
    ) -> Result<(), KkitError> {
        let from_kind = self.entity(from)?.kind;
        let to_kind = self.entity(to)?.kind;
        let valid = match relation {
            Relation::Sub | Relation::Prd => {
                (from_kind == EntityKind::Reac || from_kind.is_enzyme()) && to_kind.is_pool()
            }
            Relation::RequestOut => from_kind == EntityKind::Table && to_kind.is_pool(),
        };
        if !valid {
            return Err(KkitError::InvalidModel(format!(
                "cannot connect {} -[{}]-> {}",
                from_kind,
                relation.as_str(),
                to_kind
            )));
        }
        self.entity_mut(from)?.edges.push((relation, to));
        Ok(())
    }

    /// Volume of the nearest enclosing compartment; zero outside any.
    fn inherited_volume(&self, id: EntityId) -> Result<FieldValue, KkitError> {
        let mut current = self.entity(id)?.parent;
        while let Some(ancestor) = current {
            let entity = self.entity(ancestor)?;
            if entity.kind.is_compartment() {
                return self.get(ancestor, "volume");
            }
            current = entity.parent;
        }
        Ok(FieldValue::Float(0.0))
    }

    fn entity(&self, id: EntityId) -> Result<&Entity, KkitError> {
        self.entities.get(&id).ok_or(KkitError::EntityNotFound(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, KkitError> {
        self.entities
            .get_mut(&id)
            .ok_or(KkitError::EntityNotFound(id))
    }
}

impl ModelGraph for ModelStore {
    fn kind(&self, id: EntityId) -> Result<EntityKind, KkitError> {
        Ok(self.entity(id)?.kind)
    }

    fn name(&self, id: EntityId) -> Result<String, KkitError> {
        Ok(self.entity(id)?.name.clone())
    }

    fn parent(&self, id: EntityId) -> Result<Option<EntityId>, KkitError> {
        Ok(self.entity(id)?.parent)
    }

    fn children(&self, id: EntityId) -> Result<Vec<EntityId>, KkitError> {
        Ok(self.entity(id)?.children.clone())
    }

    fn path(&self, id: EntityId) -> Result<String, KkitError> {
        Ok(self.entity(id)?.path.clone())
    }

    fn lookup(&self, path: &str) -> Option<EntityId> {
        self.path_index.get(path).copied()
    }

    fn get(&self, id: EntityId, field: &str) -> Result<FieldValue, KkitError> {
        let entity = self.entity(id)?;
        let declared = entity
            .kind
            .field_type(field)
            .ok_or_else(|| KkitError::UnknownField {
                class: entity.kind,
                field: field.to_string(),
            })?;
        if let Some(value) = entity.fields.get(field) {
            return Ok(value.clone());
        }
        if entity.kind.is_pool() && field == "volume" {
            return self.inherited_volume(id);
        }
        Ok(declared.zero())
    }

    fn related(&self, id: EntityId, relation: Relation) -> Result<Vec<EntityId>, KkitError> {
        Ok(self
            .entity(id)?
            .edges
            .iter()
            .filter(|(r, _)| *r == relation)
            .map(|(_, to)| *to)
            .collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn sample_store() -> (ModelStore, EntityId, EntityId, EntityId) {
        let mut store = ModelStore::new();
        let model = store
            .create(ModelStore::ROOT, "model", EntityKind::Neutral)
            .unwrap();
        let kin = store
            .create(model, "kinetics", EntityKind::CubeMesh)
            .unwrap();
        let a = store.create(kin, "A", EntityKind::Pool).unwrap();
        (store, model, kin, a)
    }

    #[test]
    fn create_builds_absolute_paths() {
        let (store, model, kin, a) = sample_store();
        assert_eq!(store.path(model).unwrap(), "/model");
        assert_eq!(store.path(kin).unwrap(), "/model/kinetics");
        assert_eq!(store.path(a).unwrap(), "/model/kinetics/A");
        assert_eq!(store.lookup("/model/kinetics/A"), Some(a));
        assert_eq!(store.lookup("/model/kinetics/A/info"), None);
        assert_eq!(store.parent(a).unwrap(), Some(kin));
        assert_eq!(store.parent(ModelStore::ROOT).unwrap(), None);
    }

    #[test]
    fn duplicate_sibling_rejected() {
        let (mut store, _, kin, _) = sample_store();
        let result = store.create(kin, "A", EntityKind::BufPool);
        assert!(matches!(result, Err(KkitError::InvalidModel(_))));
    }

    #[test]
    fn invalid_names_rejected() {
        let (mut store, _, kin, _) = sample_store();
        assert!(store.create(kin, "", EntityKind::Pool).is_err());
        assert!(store.create(kin, "a/b", EntityKind::Pool).is_err());
    }

    #[test]
    fn unset_field_reads_as_zero() {
        let (store, _, _, a) = sample_store();
        assert_eq!(store.get_f64(a, "diffConst").unwrap(), 0.0);
    }

    #[test]
    fn pool_volume_inherited_from_compartment() {
        let (mut store, _, kin, a) = sample_store();
        store.set(kin, "volume", 1e-18).unwrap();
        let enz = store.create(kin, "kinase", EntityKind::MmEnz).unwrap();
        let cplx = store.create(enz, "cplx", EntityKind::Pool).unwrap();
        assert_eq!(store.get_f64(a, "volume").unwrap(), 1e-18);
        assert_eq!(store.get_f64(cplx, "volume").unwrap(), 1e-18);

        store.set(a, "volume", 2e-18).unwrap();
        assert_eq!(store.get_f64(a, "volume").unwrap(), 2e-18);
    }

    #[test]
    fn pool_outside_compartment_has_zero_volume() {
        let (mut store, model, _, _) = sample_store();
        let loose = store.create(model, "loose", EntityKind::Pool).unwrap();
        assert_eq!(store.get_f64(loose, "volume").unwrap(), 0.0);
    }

    #[test]
    fn unknown_field_is_configuration_error() {
        let (mut store, _, _, a) = sample_store();
        assert!(matches!(
            store.get(a, "kf"),
            Err(KkitError::UnknownField { .. })
        ));
        assert!(matches!(
            store.set(a, "kf", 1.0),
            Err(KkitError::UnknownField { .. })
        ));
    }

    #[test]
    fn set_rejects_mismatched_type() {
        let (mut store, _, kin, _) = sample_store();
        let result = store.set(kin, "numDimensions", 3.0);
        assert!(matches!(result, Err(KkitError::FieldType { .. })));
        store.set(kin, "numDimensions", 3_u32).unwrap();
        assert_eq!(store.get_u32(kin, "numDimensions").unwrap(), 3);
    }

    #[test]
    fn typed_getter_rejects_other_type() {
        let (store, _, kin, _) = sample_store();
        assert!(matches!(
            store.get_text(kin, "volume"),
            Err(KkitError::FieldType { .. })
        ));
    }

    #[test]
    fn find_is_depth_first_preorder() {
        let mut store = ModelStore::new();
        let model = store
            .create(ModelStore::ROOT, "model", EntityKind::Neutral)
            .unwrap();
        let outer = store.create(model, "outer", EntityKind::CubeMesh).unwrap();
        let inner = store.create(outer, "inner", EntityKind::CubeMesh).unwrap();
        let second = store.create(model, "second", EntityKind::CylMesh).unwrap();

        let found = store.find(model, KindFilter::ChemCompt).unwrap();
        assert_eq!(found, vec![outer, inner, second]);
    }

    #[test]
    fn find_excludes_root() {
        let (store, _, kin, a) = sample_store();
        assert!(store.find(kin, KindFilter::ChemCompt).unwrap().is_empty());
        assert_eq!(store.find(kin, KindFilter::PoolBase).unwrap(), vec![a]);
    }

    #[test]
    fn related_preserves_insertion_order() {
        let (mut store, _, kin, a) = sample_store();
        let b = store.create(kin, "B", EntityKind::Pool).unwrap();
        let c = store.create(kin, "C", EntityKind::Pool).unwrap();
        let r = store.create(kin, "r", EntityKind::Reac).unwrap();
        store.connect(r, Relation::Sub, c).unwrap();
        store.connect(r, Relation::Prd, b).unwrap();
        store.connect(r, Relation::Sub, a).unwrap();

        assert_eq!(store.related(r, Relation::Sub).unwrap(), vec![c, a]);
        assert_eq!(store.related(r, Relation::Prd).unwrap(), vec![b]);
        assert!(store.related(r, Relation::RequestOut).unwrap().is_empty());
    }

    #[test]
    fn connect_checks_endpoint_classes() {
        let (mut store, _, kin, a) = sample_store();
        let r = store.create(kin, "r", EntityKind::Reac).unwrap();
        assert!(store.connect(a, Relation::Sub, r).is_err());
        assert!(store.connect(r, Relation::RequestOut, a).is_err());
    }

    #[test]
    fn missing_entity_reported() {
        let store = ModelStore::new();
        assert!(matches!(
            store.kind(EntityId(99)),
            Err(KkitError::EntityNotFound(EntityId(99)))
        ));
    }
}
