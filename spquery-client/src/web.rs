use crate::collection::EntityCollection;
use crate::context::ClientContext;
use crate::entity::{ClientObject, EntityCore};
use crate::list::List;
use spquery_core::ResourcePath;

/// The site the context points at; root of every resource path.
#[derive(Debug, Clone)]
pub struct Web {
    core: EntityCore,
}

impl Web {
    pub fn new(context: &ClientContext) -> Self {
        Self {
            core: EntityCore::new(context, Self::ENTITY_TYPE, Some(ResourcePath::root("Web")), None),
        }
    }

    pub fn lists(&self) -> EntityCollection<List> {
        let path = ResourcePath::root("Web").child("Lists");
        EntityCollection::new(self.core.context(), path)
    }

    pub fn get_list_by_title(&self, title: impl Into<String>) -> List {
        self.lists().get_by_title(title)
    }

    pub fn title(&self) -> Option<String> {
        self.core.get_string("Title")
    }

    pub fn url(&self) -> Option<String> {
        self.core.get_string("Url")
    }
}

impl ClientObject for Web {
    const ENTITY_TYPE: &'static str = "SP.Web";

    fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }
}
