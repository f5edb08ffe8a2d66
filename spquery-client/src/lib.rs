//! Typed client object model for list views over a REST API.
//!
//! Operations on entities only enqueue queries on their [`ClientContext`];
//! nothing is sent until [`ClientContext::execute_query`] flushes the queue.

pub mod caml;
pub mod collection;
pub mod config;
pub mod context;
pub mod entity;
pub mod list;
pub mod list_item;
pub mod logging;
pub mod view;
pub mod view_field;
pub mod web;

pub use caml::CamlQuery;
pub use collection::EntityCollection;
pub use config::ClientConfig;
pub use context::ClientContext;
pub use entity::{ClientObject, Detach, EntityCore, ParentLink};
pub use list::List;
pub use list_item::ListItem;
pub use view::{ContentTypeId, View};
pub use view_field::ViewFieldCollection;
pub use web::Web;

pub use spquery_core::{
    ClientError, OperationArgs, PropertyBag, Query, QueryId, QueryKind, QueryOutcome,
    RemoteFault, ResourcePath, Result, ResultSink, ServiceOperation,
};
