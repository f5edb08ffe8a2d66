//! Shared entity machinery: property bag, deferred path resolution, lazy
//! loading, and the update/delete queries every resource type issues.

use crate::context::ClientContext;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use spquery_core::{
    ClientError, EntityKey, ODataOptions, OperationArgs, PropertyBag, Query, QueryId, QueryOutcome,
    ResourcePath, Result, ResultSink,
};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

/// Identifying properties and the service operation that addresses an
/// entity by each of them within its parent collection.
const IDENTITY_OPERATIONS: [(&str, &str); 2] = [("Id", "GetById"), ("Title", "GetByTitle")];

/// Something that holds entities in memory and can drop one by key.
pub trait Detach: Send + Sync {
    fn detach(&self, key: EntityKey) -> bool;
}

/// Link from an entity to the collection it was created through.
#[derive(Clone)]
pub struct ParentLink {
    path: ResourcePath,
    members: Weak<dyn Detach>,
}

impl ParentLink {
    pub fn new(path: ResourcePath, members: Weak<dyn Detach>) -> Self {
        Self { path, members }
    }

    /// A parent that is addressable but keeps no in-memory members.
    pub fn detached(path: ResourcePath) -> Self {
        let members: Weak<dyn Detach> = Weak::<NoMembers>::new();
        Self { path, members }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("path", &self.path)
            .field("live", &(self.members.strong_count() > 0))
            .finish()
    }
}

struct NoMembers;

impl Detach for NoMembers {
    fn detach(&self, _key: EntityKey) -> bool {
        false
    }
}

/// Handle to one remote entity. Clones share the same property bag and path.
#[derive(Clone)]
pub struct EntityCore {
    inner: Arc<EntityInner>,
}

struct EntityInner {
    key: EntityKey,
    entity_type: &'static str,
    context: ClientContext,
    properties: Mutex<PropertyBag>,
    path: OnceCell<ResourcePath>,
    parent: Option<ParentLink>,
}

impl EntityCore {
    pub fn new(
        context: &ClientContext,
        entity_type: &'static str,
        path: Option<ResourcePath>,
        parent: Option<ParentLink>,
    ) -> Self {
        let cell = OnceCell::new();
        if let Some(path) = path {
            let _ = cell.set(path);
        }
        Self {
            inner: Arc::new(EntityInner {
                key: EntityKey::allocate(),
                entity_type,
                context: context.clone(),
                properties: Mutex::new(PropertyBag::new()),
                path: cell,
                parent,
            }),
        }
    }

    pub fn key(&self) -> EntityKey {
        self.inner.key
    }

    pub fn entity_type(&self) -> &'static str {
        self.inner.entity_type
    }

    pub fn context(&self) -> &ClientContext {
        &self.inner.context
    }

    pub fn parent(&self) -> Option<&ParentLink> {
        self.inner.parent.as_ref()
    }

    pub fn has_resource_path(&self) -> bool {
        self.inner.path.get().is_some()
    }

    pub fn resource_path(&self) -> Result<ResourcePath> {
        self.inner.path.get().cloned().ok_or_else(|| {
            ClientError::addressing(format!(
                "{} has no resource path yet; set Id or Title first",
                self.inner.entity_type
            ))
        })
    }

    pub fn get_property(&self, name: &str) -> Option<Value> {
        self.inner.properties.lock().get(name).cloned()
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.inner
            .properties
            .lock()
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.inner.properties.lock().get(name).and_then(|v| v.as_bool())
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.inner.properties.lock().get(name).and_then(|v| v.as_i64())
    }

    /// The property's value, failing if it was never loaded.
    pub fn require_property(&self, name: &str) -> Result<Value> {
        self.inner.properties.lock().require(name).cloned()
    }

    pub fn is_property_available(&self, name: &str) -> bool {
        self.inner.properties.lock().is_available(name)
    }

    /// Snapshot of the property bag.
    pub fn properties(&self) -> PropertyBag {
        self.inner.properties.lock().clone()
    }

    /// Stores `value` and, with `persist_changes`, records it for the next
    /// [`update`](Self::update).
    ///
    /// Setting `Id` or `Title` on an entity without a resource path addresses
    /// it as `GetById(..)` / `GetByTitle(..)` under its parent collection. The
    /// first such resolution is final.
    pub fn set_property(&self, name: &str, value: impl Into<Value>, persist_changes: bool) {
        let value = value.into();
        self.inner
            .properties
            .lock()
            .set(name, value.clone(), persist_changes);
        self.inner.resolve_path_from(name, &value);
    }

    /// Merges a server payload into the bag without marking anything for
    /// persistence. `null` (an empty response) is accepted and ignored.
    pub fn merge_payload(&self, payload: &Value) -> Result<()> {
        self.inner.merge_payload(payload)
    }

    /// Makes sure `name` is loaded.
    ///
    /// When the property is missing, `on_missing` runs (it is expected to
    /// enqueue the query that populates `name`) and the queue is flushed
    /// before returning. An available property returns immediately without
    /// calling `on_missing`.
    pub async fn ensure_property<F>(&self, name: &str, on_missing: F) -> Result<()>
    where
        F: FnOnce() -> Result<()> + Send,
    {
        if self.is_property_available(name) {
            return Ok(());
        }

        debug!("Property '{}' of {} is not loaded; fetching", name, self.inner.entity_type);
        on_missing()?;
        self.inner.context.execute_query().await?;

        if self.is_property_available(name) {
            Ok(())
        } else {
            Err(ClientError::not_loaded(name))
        }
    }

    /// [`ensure_property`](Self::ensure_property) with a read of this entity
    /// selecting `name`.
    pub async fn ensure_property_loaded(&self, name: &str) -> Result<()> {
        self.ensure_property(name, || self.load(&[name]).map(|_| ()))
            .await
    }

    /// Enqueues a read of this entity. An empty `select` reads every property.
    pub fn load(&self, select: &[&str]) -> Result<QueryId> {
        let path = self.resource_path()?;
        let query = Query::read(&path)
            .with_options(ODataOptions::select(select.iter().copied()))
            .bind(self.sink());
        Ok(self.inner.context.add_query(query))
    }

    /// Enqueues one update carrying every property set with
    /// `persist_changes` since the last update, each with its latest value.
    /// Returns `None` when nothing changed.
    ///
    /// If the update fails or is never sent, the properties are marked as
    /// changed again so a later update retries them.
    pub fn update(&self) -> Result<Option<QueryId>> {
        let path = self.resource_path()?;
        let changes = self.inner.properties.lock().take_changes();
        if changes.is_empty() {
            trace!("{} has no pending changes", self.inner.entity_type);
            return Ok(None);
        }

        let names: Vec<String> = changes.keys().cloned().collect();
        let payload = self.typed_payload(changes);
        let sink = Arc::new(UpdateSink {
            entity: Arc::downgrade(&self.inner),
            names,
        });
        let query = Query::update(&path, payload).bind(sink);
        Ok(Some(self.inner.context.add_query(query)))
    }

    /// Enqueues a delete of this entity and removes it from its parent
    /// collection's in-memory members right away, without waiting for the
    /// server to confirm.
    pub fn delete_object(&self) -> Result<QueryId> {
        let path = self.resource_path()?;
        let id = self.inner.context.add_query(Query::delete(&path));
        self.remove_from_parent_collection();
        Ok(id)
    }

    /// Drops this entity from the parent collection's members. Returns
    /// whether it was present.
    pub fn remove_from_parent_collection(&self) -> bool {
        let removed = self
            .inner
            .parent
            .as_ref()
            .and_then(|parent| parent.members.upgrade())
            .map(|members| members.detach(self.inner.key))
            .unwrap_or(false);
        if removed {
            trace!("Detached {} from its parent collection", self.inner.key);
        }
        removed
    }

    /// `properties` with the `__metadata` type annotation the API expects on writes.
    pub fn typed_payload(&self, properties: Map<String, Value>) -> Value {
        let mut payload = Map::new();
        let mut metadata = Map::new();
        metadata.insert("type".to_string(), Value::String(self.inner.entity_type.to_string()));
        payload.insert("__metadata".to_string(), Value::Object(metadata));
        payload.extend(properties);
        Value::Object(payload)
    }

    /// Sink that merges a successful response into this entity.
    ///
    /// The sink holds the entity weakly: queued queries never keep an entity
    /// (or the context it holds) alive, and an outcome arriving after the
    /// entity was dropped is ignored.
    pub fn sink(&self) -> Arc<dyn ResultSink> {
        Arc::new(EntitySink(Arc::downgrade(&self.inner)))
    }
}

impl EntityInner {
    fn resolve_path_from(&self, name: &str, value: &Value) {
        if self.path.get().is_some() {
            return;
        }
        let Some((_, operation)) = IDENTITY_OPERATIONS.iter().find(|(field, _)| *field == name) else {
            return;
        };
        let Some(parent) = &self.parent else {
            trace!("{} has no parent collection to resolve '{}' against", self.key, name);
            return;
        };
        let path = parent
            .path
            .service_operation(*operation, OperationArgs::single(value.clone()));
        if self.path.set(path).is_ok() {
            trace!("Resolved {} via {}", self.key, operation);
        }
    }

    fn merge_payload(&self, payload: &Value) -> Result<()> {
        match payload {
            Value::Null => Ok(()),
            Value::Object(map) => {
                let stored = self.properties.lock().merge(map);
                for (field, _) in IDENTITY_OPERATIONS {
                    if stored.iter().any(|name| name == field) {
                        if let Some(value) = map.get(field) {
                            self.resolve_path_from(field, value);
                        }
                    }
                }
                Ok(())
            }
            other => Err(ClientError::invalid_response(format!(
                "expected an entity object for {}, got {}",
                self.entity_type, other
            ))),
        }
    }
}

struct EntitySink(Weak<EntityInner>);

impl ResultSink for EntitySink {
    fn complete(&self, outcome: &QueryOutcome) -> Result<()> {
        match (outcome, self.0.upgrade()) {
            (QueryOutcome::Succeeded(payload), Some(entity)) => entity.merge_payload(payload),
            _ => Ok(()),
        }
    }
}

struct UpdateSink {
    entity: Weak<EntityInner>,
    names: Vec<String>,
}

impl ResultSink for UpdateSink {
    fn complete(&self, outcome: &QueryOutcome) -> Result<()> {
        let Some(entity) = self.entity.upgrade() else {
            return Ok(());
        };
        match outcome {
            QueryOutcome::Succeeded(payload) => entity.merge_payload(payload),
            QueryOutcome::Failed(_) | QueryOutcome::NotAttempted => {
                let mut properties = entity.properties.lock();
                for name in &self.names {
                    properties.mark_changed(name);
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for EntityCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCore")
            .field("key", &self.inner.key)
            .field("entity_type", &self.inner.entity_type)
            .field("path", &self.inner.path.get())
            .field("properties", &self.inner.properties.lock().len())
            .finish()
    }
}

/// Typed facade over an [`EntityCore`].
pub trait ClientObject: Clone + Send + Sync + 'static {
    /// Type name used in `__metadata.type`, e.g. `SP.View`.
    const ENTITY_TYPE: &'static str;

    fn from_core(core: EntityCore) -> Self;

    fn core(&self) -> &EntityCore;

    fn context(&self) -> &ClientContext {
        self.core().context()
    }

    fn resource_path(&self) -> Result<ResourcePath> {
        self.core().resource_path()
    }

    fn get_property(&self, name: &str) -> Option<Value> {
        self.core().get_property(name)
    }

    fn set_property(&self, name: &str, value: impl Into<Value>, persist_changes: bool) {
        self.core().set_property(name, value, persist_changes)
    }

    fn is_property_available(&self, name: &str) -> bool {
        self.core().is_property_available(name)
    }

    fn load(&self) -> Result<QueryId> {
        self.core().load(&[])
    }

    fn update(&self) -> Result<Option<QueryId>> {
        self.core().update()
    }

    fn delete_object(&self) -> Result<QueryId> {
        self.core().delete_object()
    }
}
