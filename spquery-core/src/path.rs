//! Composable resource addressing.
//!
//! A [`ResourcePath`] is an immutable node holding one segment and a shared
//! link to its parent. Children share their parent through an `Arc`, so
//! building `web.child("Lists").get_by_title("Docs")` never copies the prefix.
//! The string form is always derived by walking the parents up to the root.

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Arguments of a service-operation segment.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationArgs {
    None,
    Positional(Vec<Value>),
    Named(IndexMap<String, Value>),
}

impl OperationArgs {
    pub fn single(value: impl Into<Value>) -> Self {
        OperationArgs::Positional(vec![value.into()])
    }

    fn encode(&self) -> String {
        match self {
            OperationArgs::None => String::new(),
            OperationArgs::Positional(values) => values
                .iter()
                .map(encode_literal)
                .collect::<Vec<_>>()
                .join(","),
            OperationArgs::Named(values) => values
                .iter()
                .map(|(name, value)| format!("{}={}", name, encode_literal(value)))
                .collect::<Vec<_>>()
                .join(","),
        }
    }
}

/// URL literal for one argument: strings are single-quoted with `'` doubled.
pub fn encode_literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Plain navigation, e.g. `Lists`.
    Entity(String),
    /// Service operation invocation, e.g. `GetByTitle('Docs')`.
    ServiceOperation { name: String, args: OperationArgs },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Entity(name) => f.write_str(name),
            Segment::ServiceOperation { name, args } => write!(f, "{}({})", name, args.encode()),
        }
    }
}

#[derive(Debug, PartialEq)]
struct PathNode {
    segment: Segment,
    parent: Option<ResourcePath>,
}

#[derive(Clone, PartialEq)]
pub struct ResourcePath {
    node: Arc<PathNode>,
}

impl ResourcePath {
    pub fn root(name: impl Into<String>) -> Self {
        Self::from_segment(Segment::Entity(name.into()), None)
    }

    fn from_segment(segment: Segment, parent: Option<ResourcePath>) -> Self {
        ResourcePath {
            node: Arc::new(PathNode { segment, parent }),
        }
    }

    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::from_segment(Segment::Entity(name.into()), Some(self.clone()))
    }

    pub fn service_operation(&self, name: impl Into<String>, args: OperationArgs) -> Self {
        Self::from_segment(
            Segment::ServiceOperation {
                name: name.into(),
                args,
            },
            Some(self.clone()),
        )
    }

    pub fn get_by_id(&self, id: impl Into<Value>) -> Self {
        self.service_operation("GetById", OperationArgs::single(id))
    }

    pub fn get_by_title(&self, title: impl Into<String>) -> Self {
        self.service_operation("GetByTitle", OperationArgs::single(title.into()))
    }

    pub fn segment(&self) -> &Segment {
        &self.node.segment
    }

    pub fn parent(&self) -> Option<&ResourcePath> {
        self.node.parent.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// This path followed by each parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &ResourcePath> {
        std::iter::successors(Some(self), |path| path.parent())
    }

    pub fn is_service_operation(&self) -> bool {
        matches!(self.node.segment, Segment::ServiceOperation { .. })
    }

    /// Address relative to the API root, e.g. `Web/Lists/GetByTitle('Docs')`.
    pub fn to_relative_url(&self) -> String {
        let mut segments: Vec<String> = self.ancestors().map(|p| p.segment().to_string()).collect();
        segments.reverse();
        segments.join("/")
    }

    /// Absolute address under `{site_url}/_api/`.
    pub fn to_url(&self, site_url: &str) -> String {
        format!("{}/_api/{}", site_url.trim_end_matches('/'), self.to_relative_url())
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_relative_url())
    }
}

impl fmt::Debug for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourcePath({})", self.to_relative_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_navigation_path() {
        let path = ResourcePath::root("Web").child("Lists");
        assert_eq!(path.to_relative_url(), "Web/Lists");
        assert_eq!(path.depth(), 2);
        assert!(!path.is_service_operation());
    }

    #[test]
    fn test_service_operation_arguments() {
        let lists = ResourcePath::root("Web").child("Lists");
        assert_eq!(
            lists.get_by_title("Docs").to_relative_url(),
            "Web/Lists/GetByTitle('Docs')"
        );
        assert_eq!(lists.get_by_id(42).to_string(), "Web/Lists/GetById(42)");
        assert_eq!(
            lists.get_by_title("Bob's list").to_string(),
            "Web/Lists/GetByTitle('Bob''s list')"
        );

        let mut named = IndexMap::new();
        named.insert("fieldName".to_string(), json!("Title"));
        named.insert("index".to_string(), json!(2));
        let op = lists.service_operation("MoveViewFieldTo", OperationArgs::Named(named));
        assert_eq!(op.segment().to_string(), "MoveViewFieldTo(fieldName='Title',index=2)");

        let none = lists.service_operation("RemoveAllViewFields", OperationArgs::None);
        assert_eq!(none.segment().to_string(), "RemoveAllViewFields()");
    }

    #[test]
    fn test_resolution_is_stable() {
        let web = ResourcePath::root("Web");
        let a = web.child("Lists").get_by_id(7);
        let b = web.child("Lists").get_by_id(7);
        assert_eq!(a, b);
        assert_eq!(a.to_relative_url(), b.to_relative_url());
        assert_ne!(a, web.child("Lists").get_by_id(8));
    }

    #[test]
    fn test_children_share_parent() {
        let lists = ResourcePath::root("Web").child("Lists");
        let first = lists.get_by_id(1);
        let second = lists.get_by_id(2);
        let p1 = first.parent().unwrap();
        let p2 = second.parent().unwrap();
        assert!(Arc::ptr_eq(&p1.node, &p2.node));
    }

    #[test]
    fn test_to_url() {
        let path = ResourcePath::root("Web").child("Lists");
        assert_eq!(
            path.to_url("https://contoso.sharepoint.com/sites/team/"),
            "https://contoso.sharepoint.com/sites/team/_api/Web/Lists"
        );
    }

    #[test]
    fn test_literal_encoding() {
        assert_eq!(encode_literal(&json!(null)), "null");
        assert_eq!(encode_literal(&json!(true)), "true");
        assert_eq!(encode_literal(&json!(1.5)), "1.5");
        assert_eq!(encode_literal(&json!("a'b")), "'a''b'");
    }
}
