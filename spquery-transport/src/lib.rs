pub mod codec;
#[cfg(feature = "http")]
pub mod http;
pub mod scripted;
pub mod transport;

pub use codec::{decode_response, encode_body, parse_fault};
#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportConfig};
pub use scripted::ScriptedTransport;
pub use transport::{send_in_order, RestTransport, TransportError};
