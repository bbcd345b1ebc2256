pub mod error;
pub mod http_server;
pub mod types;
