//! Network plumbing: endpoint descriptors, retry policy, HTTP transport.

pub mod endpoint;
pub mod retrier;
pub mod transport;

pub use endpoint::Endpoint;
pub use retrier::{Retrier, RetryDecision};
pub use transport::{classify_transport_error, HttpTransport, Transport, TransportSetupError};
