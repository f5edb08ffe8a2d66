use crate::context::ClientContext;
use crate::entity::{ClientObject, Detach, EntityCore, ParentLink};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use spquery_core::{ClientError, EntityKey, Query, QueryId, QueryOutcome, ResourcePath, Result, ResultSink};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

type Factory<T> = Arc<dyn Fn(EntityCore) -> T + Send + Sync>;

/// In-memory view of a remote collection of `T`.
///
/// Members are filled when a read or a bound service operation completes.
/// Entities created through the collection keep a link back to it, so
/// deleting one removes it from `members` immediately.
#[derive(Clone)]
pub struct EntityCollection<T: ClientObject> {
    inner: Arc<CollectionInner<T>>,
}

struct CollectionInner<T: ClientObject> {
    context: ClientContext,
    path: ResourcePath,
    members: Mutex<Vec<T>>,
    loaded: AtomicBool,
    factory: Factory<T>,
    this: Weak<CollectionInner<T>>,
}

impl<T: ClientObject> EntityCollection<T> {
    pub fn new(context: &ClientContext, path: ResourcePath) -> Self {
        Self::with_factory(context, path, T::from_core)
    }

    /// Collection whose members are built by `factory`, for facades that
    /// carry more than an [`EntityCore`].
    pub fn with_factory<F>(context: &ClientContext, path: ResourcePath, factory: F) -> Self
    where
        F: Fn(EntityCore) -> T + Send + Sync + 'static,
    {
        let factory: Factory<T> = Arc::new(factory);
        let inner = Arc::new_cyclic(|this| CollectionInner {
            context: context.clone(),
            path,
            members: Mutex::new(Vec::new()),
            loaded: AtomicBool::new(false),
            factory,
            this: this.clone(),
        });
        Self { inner }
    }

    pub fn context(&self) -> &ClientContext {
        &self.inner.context
    }

    pub fn path(&self) -> &ResourcePath {
        &self.inner.path
    }

    /// Whether a read of this collection has completed.
    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.inner.members.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.members.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.inner.members.lock().get(index).cloned()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.inner.members.lock().clone()
    }

    pub fn find<P>(&self, predicate: P) -> Option<T>
    where
        P: Fn(&T) -> bool,
    {
        self.inner.members.lock().iter().find(|m| predicate(m)).cloned()
    }

    /// Enqueues a read of the whole collection.
    pub fn load(&self) -> QueryId {
        let query = Query::read(&self.inner.path).bind(self.sink());
        self.inner.context.add_query(query)
    }

    /// Entity addressed as `GetById(id)` in this collection. Not added to
    /// the in-memory members.
    pub fn get_by_id(&self, id: impl Into<Value>) -> T {
        self.inner.new_member(Some(self.inner.path.get_by_id(id)))
    }

    /// Entity addressed as `GetByTitle(title)` in this collection. Not added
    /// to the in-memory members.
    pub fn get_by_title(&self, title: impl Into<String>) -> T {
        self.inner.new_member(Some(self.inner.path.get_by_title(title)))
    }

    /// Creates a new entity from `properties`, appends it to the members,
    /// and enqueues the create query. The server's response is merged into
    /// the returned entity.
    pub fn add(&self, properties: Map<String, Value>) -> T {
        let entity = self.inner.new_member(None);
        for (name, value) in &properties {
            entity.core().set_property(name, value.clone(), false);
        }
        let payload = entity.core().typed_payload(properties);
        let query = Query::create(&self.inner.path, payload).bind(entity.core().sink());
        self.inner.context.add_query(query);
        self.inner.members.lock().push(entity.clone());
        entity
    }

    /// Sink that replaces the members with a response's entity array. Holds
    /// the collection weakly, like [`EntityCore::sink`].
    pub fn sink(&self) -> Arc<dyn ResultSink> {
        Arc::new(CollectionSink {
            inner: Arc::downgrade(&self.inner),
        })
    }
}

impl<T: ClientObject> CollectionInner<T> {
    fn parent_link(&self) -> ParentLink {
        let members: Weak<dyn Detach> = self.this.clone();
        ParentLink::new(self.path.clone(), members)
    }

    fn new_member(&self, path: Option<ResourcePath>) -> T {
        let core = EntityCore::new(&self.context, T::ENTITY_TYPE, path, Some(self.parent_link()));
        (self.factory)(core)
    }

    fn replace_members(&self, payload: &Value) -> Result<()> {
        let records: &[Value] = match payload {
            Value::Array(records) => records.as_slice(),
            Value::Null => &[],
            other => {
                return Err(ClientError::invalid_response(format!(
                    "expected a collection for {}, got {}",
                    self.path, other
                )))
            }
        };

        let mut members = Vec::with_capacity(records.len());
        for record in records {
            let member = self.new_member(None);
            member.core().merge_payload(record)?;
            members.push(member);
        }

        debug!("Loaded {} members into {}", members.len(), self.path);
        *self.members.lock() = members;
        self.loaded.store(true, Ordering::Release);
        Ok(())
    }
}

impl<T: ClientObject> Detach for CollectionInner<T> {
    fn detach(&self, key: EntityKey) -> bool {
        let mut members = self.members.lock();
        let before = members.len();
        members.retain(|member| member.core().key() != key);
        members.len() != before
    }
}

struct CollectionSink<T: ClientObject> {
    inner: Weak<CollectionInner<T>>,
}

impl<T: ClientObject> ResultSink for CollectionSink<T> {
    fn complete(&self, outcome: &QueryOutcome) -> Result<()> {
        match (outcome, self.inner.upgrade()) {
            (QueryOutcome::Succeeded(payload), Some(inner)) => inner.replace_members(payload),
            _ => Ok(()),
        }
    }
}

impl<T: ClientObject> fmt::Debug for EntityCollection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityCollection")
            .field("entity_type", &T::ENTITY_TYPE)
            .field("path", &self.inner.path)
            .field("len", &self.len())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
