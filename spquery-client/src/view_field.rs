use crate::context::ClientContext;
use crate::entity::{ClientObject, EntityCore};
use serde_json::{json, Value};
use spquery_core::{OperationArgs, QueryId, ResourcePath, Result, ServiceOperation};

/// Internal names of the fields a view displays, in display order.
#[derive(Debug, Clone)]
pub struct ViewFieldCollection {
    core: EntityCore,
}

impl ViewFieldCollection {
    pub fn new(context: &ClientContext, path: ResourcePath) -> Self {
        Self {
            core: EntityCore::new(context, Self::ENTITY_TYPE, Some(path), None),
        }
    }

    /// Field names, accepting both `{"results": [...]}` and a bare array.
    pub fn items(&self) -> Option<Vec<String>> {
        let items = self.core.get_property("Items")?;
        let array = match &items {
            Value::Array(values) => values,
            other => other.get("results")?.as_array()?,
        };
        Some(
            array
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }

    pub fn schema_xml(&self) -> Option<String> {
        self.core.get_string("SchemaXml")
    }

    pub fn add_view_field(&self, field_name: &str) -> Result<QueryId> {
        self.enqueue(
            ServiceOperation::new(&self.core.resource_path()?, "AddViewField")
                .args(OperationArgs::single(field_name)),
        )
    }

    /// Moves `field_name` to the zero-based position `index`.
    pub fn move_view_field_to(&self, field_name: &str, index: u32) -> Result<QueryId> {
        self.enqueue(
            ServiceOperation::new(&self.core.resource_path()?, "MoveViewFieldTo")
                .payload(json!({"field": field_name, "index": index})),
        )
    }

    pub fn remove_view_field(&self, field_name: &str) -> Result<QueryId> {
        self.enqueue(
            ServiceOperation::new(&self.core.resource_path()?, "RemoveViewField")
                .args(OperationArgs::single(field_name)),
        )
    }

    pub fn remove_all_view_fields(&self) -> Result<QueryId> {
        self.enqueue(ServiceOperation::new(
            &self.core.resource_path()?,
            "RemoveAllViewFields",
        ))
    }

    fn enqueue(&self, operation: ServiceOperation) -> Result<QueryId> {
        Ok(self.core.context().add_query(operation.into_query()))
    }
}

impl ClientObject for ViewFieldCollection {
    const ENTITY_TYPE: &'static str = "SP.ViewFieldCollection";

    fn from_core(core: EntityCore) -> Self {
        Self { core }
    }

    fn core(&self) -> &EntityCore {
        &self.core
    }
}
