//! List views.

use crate::caml::CamlQuery;
use crate::collection::EntityCollection;
use crate::entity::{ClientObject, EntityCore};
use crate::list::List;
use crate::list_item::ListItem;
use crate::view_field::ViewFieldCollection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use spquery_core::{ClientError, QueryId, Result};

/// Identifier of the content type a view is associated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeId {
    #[serde(rename = "StringValue", default)]
    pub string_value: String,
}

impl ContentTypeId {
    pub fn new(string_value: impl Into<String>) -> Self {
        Self {
            string_value: string_value.into(),
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "__metadata": {"type": "SP.ContentTypeId"},
            "StringValue": self.string_value,
        })
    }
}

/// A list view.
#[derive(Debug, Clone)]
pub struct View {
    core: EntityCore,
    parent_list: Option<List>,
}

impl View {
    pub fn with_parent_list(core: EntityCore, parent_list: List) -> Self {
        Self {
            core,
            parent_list: Some(parent_list),
        }
    }

    pub fn parent_list(&self) -> Option<&List> {
        self.parent_list.as_ref()
    }

    /// Items of the parent list selected by this view's query.
    ///
    /// Loads `ViewQuery` first when it is missing (one flush), then enqueues
    /// `GetItems` on the parent list with the view query under `"query"`.
    /// The returned collection fills on the next flush.
    pub async fn get_items(&self) -> Result<EntityCollection<ListItem>> {
        let list = self
            .parent_list
            .as_ref()
            .ok_or_else(|| ClientError::addressing("view is not attached to a list"))?;

        self.core.ensure_property_loaded("ViewQuery").await?;
        let caml = CamlQuery::parse(&self.view_query().unwrap_or_default());
        list.get_items(&caml)
    }

    /// Enqueues the delete and drops the view from its parent collection now.
    pub fn delete_object(&self) -> Result<QueryId> {
        self.core.delete_object()
    }

    pub fn id(&self) -> Option<String> {
        self.core.get_string("Id")
    }

    pub fn title(&self) -> Option<String> {
        self.core.get_string("Title")
    }

    pub fn set_title(&self, value: impl Into<String>) {
        self.core.set_property("Title", value.into(), true);
    }

    pub fn content_type_id(&self) -> Option<ContentTypeId> {
        self.core
            .get_property("ContentTypeId")
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn set_content_type_id(&self, value: &ContentTypeId) {
        self.core.set_property("ContentTypeId", value.to_json(), true);
    }

    /// Whether the view is hidden.
    pub fn hidden(&self) -> Option<bool> {
        self.core.get_bool("Hidden")
    }

    pub fn set_hidden(&self, value: bool) {
        self.core.set_property("Hidden", value, true);
    }

    /// Whether this is the list's default view.
    pub fn default_view(&self) -> Option<bool> {
        self.core.get_bool("DefaultView")
    }

    pub fn set_default_view(&self, value: bool) {
        self.core.set_property("DefaultView", value, true);
    }

    /// The CAML `<Query>` body of the view. `None` until loaded.
    pub fn view_query(&self) -> Option<String> {
        self.core.get_string("ViewQuery")
    }

    pub fn set_view_query(&self, value: impl Into<String>) {
        self.core.set_property("ViewQuery", value.into(), true);
    }

    pub fn server_relative_url(&self) -> Option<String> {
        self.core.get_string("ServerRelativeUrl")
    }

    pub fn row_limit(&self) -> Option<i64> {
        self.core.get_i64("RowLimit")
    }

    pub fn set_row_limit(&self, value: u32) {
        self.core.set_property("RowLimit", value, true);
    }

    pub fn paged(&self) -> Option<bool> {
        self.core.get_bool("Paged")
    }

    pub fn personal_view(&self) -> Option<bool> {
        self.core.get_bool("PersonalView")
    }

    pub fn read_only_view(&self) -> Option<bool> {
        self.core.get_bool("ReadOnlyView")
    }

    /// Fields shown by the view. Already-expanded `ViewFields` data is
    /// carried over into the returned collection.
    pub fn view_fields(&self) -> Result<ViewFieldCollection> {
        let fields = ViewFieldCollection::new(self.core.context(), self.core.resource_path()?.child("ViewFields"));
        if let Some(expanded) = self.core.get_property("ViewFields") {
            fields.core().merge_payload(&expanded)?;
        }
        Ok(fields)
    }
}

impl ClientObject for View {
    const ENTITY_TYPE: &'static str = "SP.View";

    fn from_core(core: EntityCore) -> Self {
        Self {
            core,
            parent_list: None,
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
    use std::sync::Arc;

    fn list() -> List {
        let ctx = ClientContext::new(
            ClientConfig::new("https://contoso.sharepoint.com"),
            Arc::new(ScriptedTransport::new()),
        );
        ctx.web().get_list_by_title("Docs")
    }

    #[test]
    fn test_typed_accessors() {
        let view = list().views().unwrap().get_by_title("All Items");
        assert_eq!(view.hidden(), None);

        view.set_hidden(true);
        view.set_default_view(false);
        view.set_row_limit(30);
        view.set_content_type_id(&ContentTypeId::new("0x0101"));

        assert_eq!(view.hidden(), Some(true));
        assert_eq!(view.default_view(), Some(false));
        assert_eq!(view.row_limit(), Some(30));
        assert_eq!(view.content_type_id(), Some(ContentTypeId::new("0x0101")));
    }

    #[test]
    fn test_view_fields_path() {
        let view = list().views().unwrap().get_by_title("All Items");
        let fields = view.view_fields().unwrap();
        assert_eq!(
            fields.core().resource_path().unwrap().to_relative_url(),
            "Web/Lists/GetByTitle('Docs')/Views/GetByTitle('All Items')/ViewFields"
        );
    }

    #[test]
    fn test_expanded_view_fields_carry_over() {
        let view = list().views().unwrap().get_by_title("All Items");
        view.core()
            .merge_payload(&json!({"ViewFields": {"Items": {"results": ["LinkTitle", "Modified"]}}}))
            .unwrap();
        let fields = view.view_fields().unwrap();
        assert_eq!(fields.items(), Some(vec!["LinkTitle".to_string(), "Modified".to_string()]));
    }

    #[test]
    fn test_detached_view_has_no_parent_list() {
        let view = View::from_core(list().views().unwrap().get_by_title("x").core().clone());
        assert!(view.parent_list().is_none());
    }
}
