use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Structured item query sent to `GetItems`.
///
/// The CAML itself is carried opaquely in `view_xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CamlQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_xml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_server_relative_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates_in_utc: Option<bool>,
}

impl CamlQuery {
    pub const ENTITY_TYPE: &'static str = "SP.CamlQuery";

    /// Wraps a `<Query>` body (a view's `ViewQuery`, e.g.
    /// `<OrderBy><FieldRef Name="ID"/></OrderBy>`) into a full view document.
    pub fn parse(query_expr: &str) -> Self {
        Self {
            view_xml: Some(format!("<View><Query>{}</Query></View>", query_expr)),
            ..Default::default()
        }
    }

    /// Every item, including those in subfolders.
    pub fn all_items() -> Self {
        Self {
            view_xml: Some(r#"<View Scope="RecursiveAll"><Query></Query></View>"#.to_string()),
            ..Default::default()
        }
    }

    pub fn in_folder(mut self, server_relative_url: impl Into<String>) -> Self {
        self.folder_server_relative_url = Some(server_relative_url.into());
        self
    }

    /// Wire form with the `__metadata` type annotation.
    pub fn to_json(&self) -> Value {
        let mut value = json!({"__metadata": {"type": Self::ENTITY_TYPE}});
        if let (Some(target), Ok(Value::Object(fields))) = (value.as_object_mut(), serde_json::to_value(self)) {
            target.extend(fields);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wraps_query() {
        let caml = CamlQuery::parse(r#"<OrderBy><FieldRef Name="ID"/></OrderBy>"#);
        assert_eq!(
            caml.view_xml.as_deref(),
            Some(r#"<View><Query><OrderBy><FieldRef Name="ID"/></OrderBy></Query></View>"#)
        );
    }

    #[test]
    fn test_parse_empty_query() {
        let caml = CamlQuery::parse("");
        assert_eq!(caml.view_xml.as_deref(), Some("<View><Query></Query></View>"));
    }

    #[test]
    fn test_to_json() {
        let caml = CamlQuery::all_items().in_folder("/sites/team/Shared Documents/2024");
        assert_eq!(
            caml.to_json(),
            json!({
                "__metadata": {"type": "SP.CamlQuery"},
                "ViewXml": "<View Scope=\"RecursiveAll\"><Query></Query></View>",
                "FolderServerRelativeUrl": "/sites/team/Shared Documents/2024"
            })
        );
    }
}
