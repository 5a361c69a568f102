pub mod gemini;
pub mod model_client;
pub mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use gemini::{ModelRequest, ReqwestTransport};
pub use model_client::{ModelClient, RetryPolicy};
pub use transport::{RawResponse, Transport, TransportError};
