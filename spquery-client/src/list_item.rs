use crate::entity::{ClientObject, EntityCore};

#[derive(Debug, Clone)]
pub struct ListItem {
    core: EntityCore,
}

impl ListItem {
    pub fn id(&self) -> Option<i64> {
        self.core.get_i64("Id")
    }

    pub fn title(&self) -> Option<String> {
        self.core.get_string("Title")
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.core.set_property("Title", title.into(), true);
    }
}

impl ClientObject for ListItem {
    const ENTITY_TYPE: &'static str = "SP.ListItem";

    fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }
}
