// lfctl-api: Async Rust client for the traffic-generator controller's JSON API

pub mod error;
pub mod http;
pub mod remote;
pub mod transport;

pub use error::Error;
pub use http::HttpClient;
pub use remote::{Query, RemoteClient};
pub use transport::{DEFAULT_MGR_PORT, TransportConfig, manager_url};
