//! Transport module
//!
//! Runs the gateway router over HTTP.

pub mod http;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, bind, run_http, run_http_blocking, serve};
