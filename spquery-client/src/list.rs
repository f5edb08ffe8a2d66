use crate::caml::CamlQuery;
use crate::collection::EntityCollection;
use crate::entity::{ClientObject, EntityCore};
use crate::list_item::ListItem;
use crate::view::View;
use once_cell::sync::OnceCell;
use spquery_core::{ClientError, Result, ServiceOperation};
use std::sync::{Arc, Weak};

type Slot<T> = Arc<OnceCell<EntityCollection<T>>>;

/// A list; parent of its items and views.
///
/// Clones share the same `items` and `views` collections, so whatever a
/// query loads into them is visible through every handle, including the
/// parent list of a view.
#[derive(Debug, Clone)]
pub struct List {
    core: EntityCore,
    items: Slot<ListItem>,
    views: ViewsSlot,
}

/// The views collection lives in the list, and its members point back at the
/// list; those back-pointers hold the slot weakly.
#[derive(Debug, Clone)]
enum ViewsSlot {
    Owned(Slot<View>),
    Shared(Weak<OnceCell<EntityCollection<View>>>),
}

impl List {
    pub fn title(&self) -> Option<String> {
        self.core.get_string("Title")
    }

    pub fn id(&self) -> Option<String> {
        self.core.get_string("Id")
    }

    pub fn item_count(&self) -> Option<i64> {
        self.core.get_i64("ItemCount")
    }

    /// The list's `items` collection. Fails while the list has no path.
    pub fn items(&self) -> Result<EntityCollection<ListItem>> {
        self.items
            .get_or_try_init(|| {
                let path = self.core.resource_path()?.child("items");
                Ok::<_, ClientError>(EntityCollection::new(self.core.context(), path))
            })
            .cloned()
    }

    /// The list's views; each one knows this list as its parent.
    ///
    /// On the parent handle of a view whose list has been dropped, this
    /// returns a fresh, uncached collection.
    pub fn views(&self) -> Result<EntityCollection<View>> {
        let slot = match &self.views {
            ViewsSlot::Owned(slot) => Some(slot.clone()),
            ViewsSlot::Shared(slot) => slot.upgrade(),
        };
        match slot {
            Some(slot) => slot.get_or_try_init(|| self.new_views()).cloned(),
            None => self.new_views(),
        }
    }

    fn new_views(&self) -> Result<EntityCollection<View>> {
        let path = self.core.resource_path()?.child("Views");
        let parent = self.as_parent();
        Ok(EntityCollection::with_factory(
            self.core.context(),
            path,
            move |member| View::with_parent_list(member, parent.clone()),
        ))
    }

    /// Handle given to views: shares `items`, refers to `views` weakly.
    fn as_parent(&self) -> List {
        let views = match &self.views {
            ViewsSlot::Owned(slot) => ViewsSlot::Shared(Arc::downgrade(slot)),
            ViewsSlot::Shared(slot) => ViewsSlot::Shared(slot.clone()),
        };
        List {
            core: self.core.clone(),
            items: self.items.clone(),
            views,
        }
    }

    pub fn get_view(&self, id: impl Into<String>) -> Result<View> {
        Ok(self.views()?.get_by_id(id.into()))
    }

    pub fn default_view(&self) -> Result<View> {
        let path = self.core.resource_path()?.child("DefaultView");
        let core = EntityCore::new(self.core.context(), View::ENTITY_TYPE, Some(path), None);
        Ok(View::with_parent_list(core, self.as_parent()))
    }

    /// Enqueues `GetItems` with `query`, bound to this list's `items`
    /// collection, and returns that collection.
    pub fn get_items(&self, query: &CamlQuery) -> Result<EntityCollection<ListItem>> {
        let items = self.items()?;
        let operation = ServiceOperation::new(&self.core.resource_path()?, "GetItems")
            .payload(query.to_json())
            .payload_key("query")
            .into_query()
            .bind(items.sink());
        self.core.context().add_query(operation);
        Ok(items)
    }
}

impl ClientObject for List {
    const ENTITY_TYPE: &'static str = "SP.List";

    fn from_core(core: EntityCore) -> Self {
        Self {
            core,
            items: Arc::default(),
            views: ViewsSlot::Owned(Arc::default()),
        }
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::context::ClientContext;
    use spquery_transport::ScriptedTransport;

    fn list() -> List {
        let ctx = ClientContext::new(
            ClientConfig::new("https://contoso.sharepoint.com"),
            Arc::new(ScriptedTransport::new()),
        );
        ctx.web().get_list_by_title("Docs")
    }

    #[test]
    fn test_child_collections_are_cached() {
        let list = list();
        let items = list.items().unwrap();
        items.add(serde_json::Map::new());

        assert_eq!(list.items().unwrap().len(), 1);
        assert_eq!(list.clone().items().unwrap().len(), 1);
    }

    #[test]
    fn test_view_parent_shares_collections() {
        let list = list();
        let view = list.views().unwrap().get_by_title("All Items");
        list.items().unwrap().add(serde_json::Map::new());

        let parent = view.parent_list().unwrap();
        assert_eq!(parent.items().unwrap().len(), 1);
        assert_eq!(parent.views().unwrap().path(), list.views().unwrap().path());
    }

    #[test]
    fn test_view_keeps_items_after_list_dropped() {
        let view = list().views().unwrap().get_by_title("All Items");
        let parent = view.parent_list().unwrap();
        parent.items().unwrap().add(serde_json::Map::new());

        assert_eq!(view.parent_list().unwrap().items().unwrap().len(), 1);
        assert_eq!(
            parent.views().unwrap().path().to_relative_url(),
            "Web/Lists/GetByTitle('Docs')/Views"
        );
    }

    #[test]
    fn test_loaded_views_do_not_keep_list_alive() {
        let list = list();
        let views = list.views().unwrap();
        views.add(serde_json::Map::new());
        let slot = match &list.views {
            ViewsSlot::Owned(slot) => Arc::downgrade(slot),
            ViewsSlot::Shared(slot) => slot.clone(),
        };

        drop(views);
        drop(list);
        assert!(slot.upgrade().is_none());
    }

    #[test]
    fn test_unaddressed_list_has_no_items() {
        let ctx = ClientContext::new(
            ClientConfig::new("https://contoso.sharepoint.com"),
            Arc::new(ScriptedTransport::new()),
        );
        let list = ctx.web().lists().add(serde_json::Map::new());
        assert!(list.items().is_err());
        assert!(list.views().is_err());
    }
}
