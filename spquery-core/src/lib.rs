//! Building blocks of the deferred-query object model: property bags,
//! resource paths, queries and the request envelopes the transports carry.

pub mod bag;
pub mod error;
pub mod ids;
pub mod path;
pub mod query;
pub mod request;

pub use bag::PropertyBag;
pub use error::{ClientError, RemoteFault, Result};
pub use ids::{EntityKey, QueryId, QueryIdAllocator};
pub use path::{OperationArgs, ResourcePath, Segment};
pub use query::{ODataOptions, Query, QueryKind, QueryOutcome, ResultSink, ServiceOperation};
pub use request::{unwrap_envelope, HttpMethod, RestRequest, RestResponse, ODATA_VERBOSE};
